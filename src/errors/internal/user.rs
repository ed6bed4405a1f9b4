use thiserror::Error;

#[derive(Error, Debug)]
pub enum UserError {
    #[error("User not found")]
    NotFound(i32),

    #[error("Email already registered")]
    DuplicateEmail(String),

    #[error("Username already taken")]
    DuplicateUsername(String),

    #[error("Cannot delete your own account")]
    SelfDeletion,

    #[error("Cannot promote yourself to teacher role")]
    SelfPromotion,

    #[error("Cannot register with role {0}")]
    RoleNotAllowed(String),

    #[error("User {0} is not an instructor")]
    NotAnInstructor(i32),

    #[error("Instructor role not found")]
    UnknownInstructorRole(String),
}
