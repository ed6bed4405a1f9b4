pub mod audit;
pub mod auth;
pub mod context;
pub mod lesson;
pub mod lesson_query;
pub mod role;
pub mod user;
