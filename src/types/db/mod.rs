// Database entities - SeaORM models
pub mod audit_log;
pub mod lesson;
pub mod system_setting;
pub mod user;
