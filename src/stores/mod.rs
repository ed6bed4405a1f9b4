// Stores layer - stateless data access over a caller-supplied connection
pub mod audit_store;
pub mod lesson_store;
pub mod settings_store;
pub mod user_store;

pub use audit_store::AuditStore;
pub use lesson_store::LessonStore;
pub use settings_store::SettingsStore;
pub use user_store::UserStore;
