// Coordinators layer - Workflow orchestration
//
// Coordinators compose guard, provider and store calls for one API area.
// They own transactions: a mutation and its audit row commit together.

pub mod admin_coordinator;
pub mod auth_coordinator;
pub mod instructor_coordinator;
pub mod lesson_coordinator;
pub mod system_coordinator;
pub mod time_window;
pub mod user_coordinator;

pub use admin_coordinator::{AdminCoordinator, BulkOutcome};
pub use auth_coordinator::AuthCoordinator;
pub use instructor_coordinator::InstructorCoordinator;
pub use lesson_coordinator::LessonCoordinator;
pub use system_coordinator::SystemCoordinator;
pub use user_coordinator::UserCoordinator;
