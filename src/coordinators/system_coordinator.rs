use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use sea_orm::ConnectionTrait;

use crate::app_data::AppData;
use crate::audit::AuditLogger;
use crate::config::DatabaseConnections;
use crate::errors::InternalError;
use crate::providers::{GuardProvider, UpdateProvider};
use crate::stores::{AuditStore, SettingsStore};
use crate::types::db::{audit_log, system_setting};
use crate::types::dto::admin::SettingCreateRequest;
use crate::types::dto::system::{
    BackupRecord, EmailSettings, EmailTestResponse, UpdateApplyResponse, UpdateCheckResponse, UpdateLogsResponse,
};
use crate::types::internal::audit::{AuditAction, AuditFilter, ResourceType};
use crate::types::internal::auth::Principal;
use crate::types::internal::context::RequestContext;
use crate::types::internal::role::Guard;

pub const MASKED_PASSWORD: &str = "********";
const EMAIL_PREFIX: &str = "email.";
const BACKUP_SIZE_BYTES: u64 = 26_000_000;

/// Admin-only settings, audit trail and maintenance workflows
///
/// Email and backup endpoints have no real backend; update endpoints shell
/// out to git and fold failures into the response.
pub struct SystemCoordinator {
    connections: DatabaseConnections,
    settings_store: Arc<SettingsStore>,
    audit_store: Arc<AuditStore>,
    update_provider: UpdateProvider,
    guard_provider: GuardProvider,
    audit_logger: AuditLogger,
}

impl SystemCoordinator {
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            connections: app_data.connections.clone(),
            settings_store: app_data.settings_store.clone(),
            audit_store: app_data.audit_store.clone(),
            update_provider: UpdateProvider::new(app_data.settings.repository_dir().clone()),
            guard_provider: GuardProvider::new(app_data.user_store.clone()),
            audit_logger: AuditLogger::new(app_data.audit_store.clone()),
        }
    }

    async fn admin(&self, ctx: &RequestContext) -> Result<Principal, InternalError> {
        self.guard_provider
            .authorize(&self.connections.main, ctx, Guard::Admin)
            .await
    }

    // Settings

    pub async fn list_settings(
        &self,
        ctx: &RequestContext,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<system_setting::Model>, InternalError> {
        self.admin(ctx).await?;
        let settings = self.settings_store.list(&self.connections.main).await?;
        Ok(settings
            .into_iter()
            .skip(skip as usize)
            .take(limit as usize)
            .collect())
    }

    pub async fn get_setting(&self, ctx: &RequestContext, key: &str) -> Result<system_setting::Model, InternalError> {
        self.admin(ctx).await?;
        self.settings_store.get(&self.connections.main, key).await
    }

    pub async fn create_setting(
        &self,
        ctx: &RequestContext,
        request: SettingCreateRequest,
    ) -> Result<system_setting::Model, InternalError> {
        let principal = self.admin(ctx).await?;

        let txn = self.connections.begin().await?;
        let setting = self
            .settings_store
            .insert(&txn, &request.key, &request.value, request.description)
            .await?;
        self.audit_logger
            .log_staff_action(
                &txn,
                ctx,
                &principal,
                AuditAction::Create,
                ResourceType::SystemSetting,
                None,
                format!("Admin created setting: {}", setting.key),
            )
            .await?;
        DatabaseConnections::commit(txn).await?;

        Ok(setting)
    }

    pub async fn update_setting(
        &self,
        ctx: &RequestContext,
        key: &str,
        value: &str,
        description: Option<String>,
    ) -> Result<system_setting::Model, InternalError> {
        let principal = self.admin(ctx).await?;

        let txn = self.connections.begin().await?;
        let setting = self.settings_store.update(&txn, key, value, description).await?;
        self.audit_logger
            .log_staff_action(
                &txn,
                ctx,
                &principal,
                AuditAction::Update,
                ResourceType::SystemSetting,
                None,
                format!("Admin updated setting: {}", key),
            )
            .await?;
        DatabaseConnections::commit(txn).await?;

        Ok(setting)
    }

    pub async fn audit_logs(&self, ctx: &RequestContext, filter: AuditFilter) -> Result<Vec<audit_log::Model>, InternalError> {
        self.admin(ctx).await?;
        self.audit_store.list(&self.connections.main, &filter).await
    }

    // Email

    /// Stored `email.*` values over the defaults, passwords masked
    pub async fn email_settings(&self, ctx: &RequestContext) -> Result<EmailSettings, InternalError> {
        self.admin(ctx).await?;
        let stored = self.stored_email_values(&self.connections.main).await?;
        Ok(mask_passwords(email_settings_from(&stored)))
    }

    /// Persist every field; a masked password keeps the stored one
    pub async fn update_email_settings(
        &self,
        ctx: &RequestContext,
        settings: EmailSettings,
    ) -> Result<EmailSettings, InternalError> {
        let principal = self.admin(ctx).await?;

        let txn = self.connections.begin().await?;
        for (field, value) in email_settings_entries(&settings) {
            let is_password = field.ends_with("_password");
            if is_password && value == MASKED_PASSWORD {
                continue;
            }
            let key = format!("{}{}", EMAIL_PREFIX, field);
            self.settings_store.upsert(&txn, &key, &value, None).await?;
        }
        self.audit_logger
            .log_staff_action(
                &txn,
                ctx,
                &principal,
                AuditAction::Update,
                ResourceType::SystemSetting,
                None,
                "Admin updated email settings",
            )
            .await?;
        let stored = self.stored_email_values(&txn).await?;
        DatabaseConnections::commit(txn).await?;

        Ok(mask_passwords(email_settings_from(&stored)))
    }

    async fn stored_email_values(
        &self,
        conn: &impl ConnectionTrait,
    ) -> Result<HashMap<String, String>, InternalError> {
        Ok(self
            .settings_store
            .list(conn)
            .await?
            .into_iter()
            .filter_map(|s| {
                s.key
                    .strip_prefix(EMAIL_PREFIX)
                    .map(|field| (field.to_string(), s.value.clone()))
            })
            .collect())
    }

    /// Shape check only; nothing is sent
    pub async fn test_email_settings(
        &self,
        ctx: &RequestContext,
        settings: EmailSettings,
    ) -> Result<EmailTestResponse, InternalError> {
        self.admin(ctx).await?;

        let problem = if settings.smtp_host.trim().is_empty() {
            Some("SMTP host is required")
        } else if settings.smtp_port == 0 {
            Some("SMTP port is required")
        } else if !settings.from_email.contains('@') {
            Some("From email must be a valid address")
        } else {
            None
        };

        Ok(match problem {
            Some(message) => EmailTestResponse {
                success: false,
                message: message.to_string(),
            },
            None => EmailTestResponse {
                success: true,
                message: format!("Email settings look valid for {}:{}", settings.smtp_host, settings.smtp_port),
            },
        })
    }

    // Backups

    pub async fn list_backups(&self, ctx: &RequestContext) -> Result<Vec<BackupRecord>, InternalError> {
        self.admin(ctx).await?;
        let now = Utc::now();
        Ok(vec![
            BackupRecord {
                id: "backup-1".to_string(),
                filename: "backup-2025-08-15.tar.gz".to_string(),
                size: 25_600_000,
                created_at: now - Duration::days(1),
                backup_type: "manual".to_string(),
                status: "completed".to_string(),
                description: "Full system backup".to_string(),
            },
            BackupRecord {
                id: "backup-2".to_string(),
                filename: "backup-2025-08-14.tar.gz".to_string(),
                size: 24_800_000,
                created_at: now - Duration::days(2),
                backup_type: "automatic".to_string(),
                status: "completed".to_string(),
                description: "Automated daily backup".to_string(),
            },
        ])
    }

    pub async fn create_backup(&self, ctx: &RequestContext, description: Option<String>) -> Result<BackupRecord, InternalError> {
        self.admin(ctx).await?;
        let now = Utc::now();
        tracing::info!(request_id = %ctx.request_id, "Backup requested");
        Ok(BackupRecord {
            id: format!("backup-{}", now.timestamp()),
            filename: format!("backup-{}.tar.gz", now.format("%Y-%m-%d")),
            size: BACKUP_SIZE_BYTES,
            created_at: now,
            backup_type: "manual".to_string(),
            status: "completed".to_string(),
            description: description.unwrap_or_else(|| "Manual backup".to_string()),
        })
    }

    pub async fn backup_download_url(&self, ctx: &RequestContext, backup_id: &str) -> Result<String, InternalError> {
        self.admin(ctx).await?;
        Ok(format!("/api/admin/backups/{}/download", backup_id))
    }

    pub async fn delete_backup(&self, ctx: &RequestContext, backup_id: &str) -> Result<String, InternalError> {
        self.admin(ctx).await?;
        tracing::info!(request_id = %ctx.request_id, backup_id, "Backup deletion requested");
        Ok(format!("Backup {} deleted successfully", backup_id))
    }

    // Updates

    pub async fn check_updates(&self, ctx: &RequestContext) -> Result<UpdateCheckResponse, InternalError> {
        self.admin(ctx).await?;
        let check = self.update_provider.check().await;

        Ok(UpdateCheckResponse {
            updates_available: check.update_count > 0,
            update_count: check.update_count,
            current_version: check.current_version,
            last_check: Utc::now(),
            status: status_label(check.error.is_none()).to_string(),
            error: check.error,
        })
    }

    pub async fn update_logs(&self, ctx: &RequestContext) -> Result<UpdateLogsResponse, InternalError> {
        self.admin(ctx).await?;
        let logs = self.update_provider.logs().await;

        Ok(UpdateLogsResponse {
            status: status_label(logs.error.is_none()).to_string(),
            logs: logs.lines,
        })
    }

    /// Pull the latest code; the attempt is audited whatever its outcome
    pub async fn apply_updates(&self, ctx: &RequestContext) -> Result<UpdateApplyResponse, InternalError> {
        let principal = self.admin(ctx).await?;

        tracing::info!(request_id = %ctx.request_id, repository = ?self.update_provider.repository_dir(), "Applying updates");
        let outcome = self.update_provider.apply(&principal.user.username).await;

        let txn = self.connections.begin().await?;
        self.audit_logger
            .log_staff_action(
                &txn,
                ctx,
                &principal,
                AuditAction::ApplyUpdate,
                ResourceType::System,
                None,
                format!(
                    "Admin applied system updates: {}",
                    if outcome.success { "success" } else { "failed" }
                ),
            )
            .await?;
        DatabaseConnections::commit(txn).await?;

        Ok(UpdateApplyResponse {
            status: status_label(outcome.success).to_string(),
            message: if outcome.success {
                "Updates applied successfully".to_string()
            } else {
                "Update failed".to_string()
            },
            details: Some(outcome.details),
            timestamp: Utc::now(),
        })
    }
}

fn status_label(ok: bool) -> &'static str {
    if ok { "success" } else { "error" }
}

fn email_settings_entries(settings: &EmailSettings) -> Vec<(&'static str, String)> {
    vec![
        ("smtp_host", settings.smtp_host.clone()),
        ("smtp_port", settings.smtp_port.to_string()),
        ("smtp_username", settings.smtp_username.clone()),
        ("smtp_password", settings.smtp_password.clone()),
        ("smtp_use_tls", settings.smtp_use_tls.to_string()),
        ("smtp_use_ssl", settings.smtp_use_ssl.to_string()),
        ("imap_host", settings.imap_host.clone()),
        ("imap_port", settings.imap_port.to_string()),
        ("imap_username", settings.imap_username.clone()),
        ("imap_password", settings.imap_password.clone()),
        ("from_email", settings.from_email.clone()),
        ("from_name", settings.from_name.clone()),
    ]
}

/// Unparseable stored values fall back to the defaults
fn email_settings_from(stored: &HashMap<String, String>) -> EmailSettings {
    let defaults = EmailSettings::default();
    let text = |field: &str, default: String| stored.get(field).cloned().unwrap_or(default);

    EmailSettings {
        smtp_port: stored
            .get("smtp_port")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.smtp_port),
        smtp_use_tls: stored
            .get("smtp_use_tls")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.smtp_use_tls),
        smtp_use_ssl: stored
            .get("smtp_use_ssl")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.smtp_use_ssl),
        imap_port: stored
            .get("imap_port")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.imap_port),
        smtp_host: text("smtp_host", defaults.smtp_host),
        smtp_username: text("smtp_username", defaults.smtp_username),
        smtp_password: text("smtp_password", defaults.smtp_password),
        imap_host: text("imap_host", defaults.imap_host),
        imap_username: text("imap_username", defaults.imap_username),
        imap_password: text("imap_password", defaults.imap_password),
        from_email: text("from_email", defaults.from_email),
        from_name: text("from_name", defaults.from_name),
    }
}

fn mask_passwords(mut settings: EmailSettings) -> EmailSettings {
    for password in [&mut settings.smtp_password, &mut settings.imap_password] {
        if !password.is_empty() {
            *password = MASKED_PASSWORD.to_string();
        }
    }
    settings
}
