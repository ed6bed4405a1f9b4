pub mod admin;
pub mod auth;
pub mod common;
pub mod instructor;
pub mod lesson;
pub mod system;
pub mod user;

pub use common::{CountResponse, ErrorResponse, HealthResponse, MessageResponse};
