// Providers layer - Work performers and business logic
//
// Providers hold the rules coordinators compose: credential checks, the
// guard chain, account and lesson invariants. They take a connection from
// the caller so their work joins the caller's transaction.

pub mod authentication_provider;
pub mod crypto_provider;
pub mod guard_provider;
pub mod instructor_role_catalog;
pub mod lesson_provider;
pub mod notification_provider;
pub mod token_provider;
pub mod update_provider;
pub mod user_provider;

pub use authentication_provider::{AuthenticationProvider, LoginOutcome};
pub use crypto_provider::CryptoProvider;
pub use guard_provider::GuardProvider;
pub use instructor_role_catalog::{INSTRUCTOR_ROLES, InstructorRole, InstructorRoleCatalog};
pub use lesson_provider::LessonProvider;
pub use notification_provider::{Notification, NotificationProvider};
pub use token_provider::TokenProvider;
pub use update_provider::UpdateProvider;
pub use user_provider::UserProvider;
