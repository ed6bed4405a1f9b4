use poem_openapi::{ApiResponse, payload::Json};

use crate::errors::internal::{
    AccessError, CredentialError, InternalError, LessonError, SettingError, UserError,
};
use crate::types::dto::ErrorResponse;

/// Error returned by every endpoint
///
/// One variant per HTTP status; all share the `{error, message, status_code}` body.
#[derive(ApiResponse, Debug)]
#[oai(bad_request_handler = "malformed_request")]
pub enum ApiError {
    /// Invalid state transition or bad reference
    #[oai(status = 400)]
    BadRequest(Json<ErrorResponse>),

    /// Missing, invalid or expired token, or bad login
    #[oai(status = 401)]
    Unauthorized(Json<ErrorResponse>),

    /// Role guard or ownership failure
    #[oai(status = 403)]
    Forbidden(Json<ErrorResponse>),

    #[oai(status = 404)]
    NotFound(Json<ErrorResponse>),

    /// Duplicate unique field or scheduling clash
    #[oai(status = 409)]
    Conflict(Json<ErrorResponse>),

    #[oai(status = 422)]
    UnprocessableEntity(Json<ErrorResponse>),

    #[oai(status = 500)]
    InternalError(Json<ErrorResponse>),
}

/// Payloads poem-openapi could not parse
fn malformed_request(err: poem::Error) -> ApiError {
    ApiError::bad_request(err.to_string())
}

fn body(error: &str, message: impl Into<String>, status_code: u16) -> Json<ErrorResponse> {
    Json(ErrorResponse {
        error: error.to_string(),
        message: message.into(),
        status_code,
    })
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(body("bad_request", message, 400))
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(body("unauthorized", message, 401))
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(body("forbidden", message, 403))
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(body("not_found", message, 404))
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(body("conflict", message, 409))
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        ApiError::UnprocessableEntity(body("validation_error", message, 422))
    }

    pub fn internal_server_error() -> Self {
        ApiError::InternalError(body("internal_error", "An internal error occurred", 500))
    }

    fn response(&self) -> &ErrorResponse {
        match self {
            ApiError::BadRequest(json)
            | ApiError::Unauthorized(json)
            | ApiError::Forbidden(json)
            | ApiError::NotFound(json)
            | ApiError::Conflict(json)
            | ApiError::UnprocessableEntity(json)
            | ApiError::InternalError(json) => &json.0,
        }
    }

    pub fn message(&self) -> &str {
        &self.response().message
    }

    pub fn status_code(&self) -> u16 {
        self.response().status_code
    }

    /// Convert InternalError to ApiError
    ///
    /// The single translation point from internal errors to the wire.
    /// Infrastructure failures are logged and replaced by a generic message.
    pub fn from_internal_error(err: InternalError) -> Self {
        let message = err.to_string();
        match err {
            InternalError::Database(_) => {
                tracing::error!("Database failure: {}", message);
                Self::internal_server_error()
            }
            InternalError::Parse { ref value_type, .. } => {
                tracing::error!("Parse error for {}: {}", value_type, message);
                Self::internal_server_error()
            }
            InternalError::Crypto { ref operation, .. } => {
                tracing::error!("Crypto error in {}: {}", operation, message);
                Self::internal_server_error()
            }
            InternalError::Validation { ref field, .. } => {
                tracing::debug!("Validation failed on {}: {}", field, message);
                Self::unprocessable(message)
            }

            InternalError::Credential(CredentialError::IncorrectPassword) => Self::bad_request(message),
            InternalError::Credential(CredentialError::InvalidToken { ref reason }) => {
                tracing::debug!("Rejected token: {}", reason);
                Self::unauthorized("Could not validate credentials")
            }
            InternalError::Credential(_) => Self::unauthorized(message),

            InternalError::Access(AccessError::Unauthenticated) => Self::unauthorized(message),
            InternalError::Access(_) => Self::forbidden(message),

            InternalError::User(UserError::NotFound(_))
            | InternalError::User(UserError::UnknownInstructorRole(_)) => Self::not_found(message),
            InternalError::User(UserError::DuplicateEmail(_))
            | InternalError::User(UserError::DuplicateUsername(_)) => Self::conflict(message),
            InternalError::User(UserError::SelfPromotion)
            | InternalError::User(UserError::RoleNotAllowed(_)) => Self::forbidden(message),
            InternalError::User(UserError::SelfDeletion)
            | InternalError::User(UserError::NotAnInstructor(_)) => Self::bad_request(message),

            InternalError::Lesson(LessonError::NotFound(_)) => Self::not_found(message),
            InternalError::Lesson(LessonError::ScheduleConflict { .. }) => Self::conflict(message),
            InternalError::Lesson(_) => Self::bad_request(message),

            InternalError::Setting(SettingError::NotFound(_)) => Self::not_found(message),
            InternalError::Setting(SettingError::AlreadyExists(_)) => Self::conflict(message),
        }
    }
}

impl From<InternalError> for ApiError {
    fn from(err: InternalError) -> Self {
        ApiError::from_internal_error(err)
    }
}
