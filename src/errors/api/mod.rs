// API-facing error type
pub mod api_error;


pub use api_error::ApiError;
