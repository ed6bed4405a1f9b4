use thiserror::Error;

pub mod access;
pub mod credential;
pub mod database;
pub mod lesson;
pub mod setting;
pub mod user;

pub use access::AccessError;
pub use credential::CredentialError;
pub use database::DatabaseError;
pub use lesson::LessonError;
pub use setting::SettingError;
pub use user::UserError;

/// Internal error type for stores, providers and coordinators
///
/// Infrastructure variants are shared by every layer; domain variants carry
/// the expected failures of one area. Never exposed via the API: endpoints
/// convert through `ApiError::from_internal_error`.
#[derive(Error, Debug)]
pub enum InternalError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Parse error: failed to parse {value_type}: {message}")]
    Parse { value_type: String, message: String },

    #[error("Crypto error: {operation} failed: {message}")]
    Crypto { operation: String, message: String },

    /// Semantically invalid input that passed payload parsing
    #[error("{message}")]
    Validation { field: String, message: String },

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    User(#[from] UserError),

    #[error(transparent)]
    Lesson(#[from] LessonError),

    #[error(transparent)]
    Setting(#[from] SettingError),
}

impl InternalError {
    pub fn database(operation: &str, source: sea_orm::DbErr) -> InternalError {
        InternalError::Database(DatabaseError::Operation {
            operation: operation.to_string(),
            source,
        })
    }

    pub fn transaction_begin(source: sea_orm::DbErr) -> InternalError {
        InternalError::Database(DatabaseError::TransactionBegin { source })
    }

    pub fn transaction_commit(source: sea_orm::DbErr) -> InternalError {
        InternalError::Database(DatabaseError::TransactionCommit { source })
    }

    pub fn parse(value_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            value_type: value_type.into(),
            message: message.into(),
        }
    }

    pub fn crypto(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Crypto {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}
