use chrono::{DateTime, Utc};
use poem_openapi::Object;

/// Response model for health check endpoint
#[derive(Object, Debug)]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,

    /// Timestamp of the health check
    pub timestamp: DateTime<Utc>,
}

/// Standardized error response model
#[derive(Object, Debug)]
pub struct ErrorResponse {
    /// Error type or category
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code
    pub status_code: u16,
}

#[derive(Object, Debug)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

#[derive(Object, Debug)]
pub struct CountResponse {
    pub count: u64,
}

/// Convert a stored Unix timestamp into the API representation
pub fn to_datetime(timestamp: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(timestamp, 0).unwrap_or_default()
}

pub fn to_optional_datetime(timestamp: Option<i64>) -> Option<DateTime<Utc>> {
    timestamp.map(to_datetime)
}
