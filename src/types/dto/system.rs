use chrono::{DateTime, Utc};
use poem_openapi::Object;
use serde::{Deserialize, Serialize};

/// Mail server settings persisted as `email.*` system settings
#[derive(Object, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailSettings {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    /// Masked as `********` in responses
    pub smtp_password: String,
    pub smtp_use_tls: bool,
    pub smtp_use_ssl: bool,
    pub imap_host: String,
    pub imap_port: u16,
    pub imap_username: String,
    /// Masked as `********` in responses
    pub imap_password: String,
    pub from_email: String,
    pub from_name: String,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: String::new(),
            smtp_use_tls: true,
            smtp_use_ssl: false,
            imap_host: "imap.gmail.com".to_string(),
            imap_port: 993,
            imap_username: String::new(),
            imap_password: String::new(),
            from_email: "admin@lessons.local".to_string(),
            from_name: "Lesson Scheduler".to_string(),
        }
    }
}

#[derive(Object, Debug, Serialize, Deserialize)]
pub struct EmailTestResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Object, Debug, Clone, Serialize, Deserialize)]
pub struct BackupRecord {
    pub id: String,
    pub filename: String,
    pub size: u64,
    pub created_at: DateTime<Utc>,
    #[oai(rename = "type")]
    #[serde(rename = "type")]
    pub backup_type: String,
    pub status: String,
    pub description: String,
}

#[derive(Object, Debug, Default, Serialize, Deserialize)]
pub struct BackupCreateRequest {
    pub description: Option<String>,
}

#[derive(Object, Debug, Serialize, Deserialize)]
pub struct BackupDownloadResponse {
    pub download_url: String,
}

/// Result of comparing the working tree with `origin/main`
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct UpdateCheckResponse {
    pub updates_available: bool,
    pub update_count: u32,
    /// Short commit hash, or "unknown"
    pub current_version: String,
    pub last_check: DateTime<Utc>,
    /// "success" or "error"
    pub status: String,
    pub error: Option<String>,
}

#[derive(Object, Debug, Serialize, Deserialize)]
pub struct UpdateLogsResponse {
    pub logs: Vec<String>,
    pub status: String,
}

#[derive(Object, Debug, Serialize, Deserialize)]
pub struct UpdateApplyResponse {
    pub status: String,
    pub message: String,
    pub details: Option<String>,
    pub timestamp: DateTime<Utc>,
}
