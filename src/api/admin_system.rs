use std::sync::Arc;

use poem::Request;
use poem_openapi::param::{Path, Query};
use poem_openapi::payload::Json;
use poem_openapi::{OpenApi, Tags};

use crate::api::{ApiResult, helpers};
use crate::app_data::AppData;
use crate::coordinators::SystemCoordinator;
use crate::providers::TokenProvider;
use crate::types::dto::MessageResponse;
use crate::types::dto::admin::{AuditLogResponse, SettingCreateRequest, SettingResponse, SettingUpdateRequest};
use crate::types::dto::system::{
    BackupCreateRequest, BackupDownloadResponse, BackupRecord, EmailSettings, EmailTestResponse, UpdateApplyResponse,
    UpdateCheckResponse, UpdateLogsResponse,
};
use crate::types::internal::audit::AuditFilter;

/// Admin-only settings, audit trail and maintenance endpoints
pub struct AdminSystemApi {
    system_coordinator: SystemCoordinator,
    token_provider: Arc<TokenProvider>,
}

impl AdminSystemApi {
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            token_provider: app_data.token_provider.clone(),
            system_coordinator: SystemCoordinator::new(app_data),
        }
    }
}

#[derive(Tags)]
enum SystemTags {
    /// System settings and audit trail
    Settings,
    /// Mail, backup and update placeholders
    Maintenance,
}

#[OpenApi(prefix_path = "/admin")]
impl AdminSystemApi {
    #[oai(path = "/settings", method = "get", tag = "SystemTags::Settings")]
    async fn list_settings(
        &self,
        req: &Request,
        skip: Query<Option<u64>>,
        limit: Query<Option<u64>>,
    ) -> ApiResult<Json<Vec<SettingResponse>>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        let (skip, limit) = helpers::pagination(skip.0, limit.0)?;

        let settings = self.system_coordinator.list_settings(&ctx, skip, limit).await?;
        Ok(Json(settings.into_iter().map(SettingResponse::from).collect()))
    }

    #[oai(path = "/settings", method = "post", tag = "SystemTags::Settings")]
    async fn create_setting(
        &self,
        req: &Request,
        body: Json<SettingCreateRequest>,
    ) -> ApiResult<Json<SettingResponse>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        let setting = self.system_coordinator.create_setting(&ctx, body.0).await?;
        Ok(Json(setting.into()))
    }

    #[oai(path = "/settings/:key", method = "get", tag = "SystemTags::Settings")]
    async fn get_setting(&self, req: &Request, key: Path<String>) -> ApiResult<Json<SettingResponse>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        let setting = self.system_coordinator.get_setting(&ctx, &key.0).await?;
        Ok(Json(setting.into()))
    }

    #[oai(path = "/settings/:key", method = "put", tag = "SystemTags::Settings")]
    async fn update_setting(
        &self,
        req: &Request,
        key: Path<String>,
        body: Json<SettingUpdateRequest>,
    ) -> ApiResult<Json<SettingResponse>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        let body = body.0;
        let setting = self
            .system_coordinator
            .update_setting(&ctx, &key.0, &body.value, body.description)
            .await?;
        Ok(Json(setting.into()))
    }

    /// Audit trail, newest first
    #[oai(path = "/audit-logs", method = "get", tag = "SystemTags::Settings")]
    async fn audit_logs(
        &self,
        req: &Request,
        skip: Query<Option<u64>>,
        limit: Query<Option<u64>>,
        user_id: Query<Option<i32>>,
        resource_type: Query<Option<String>>,
        action: Query<Option<String>>,
    ) -> ApiResult<Json<Vec<AuditLogResponse>>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        let (skip, limit) = helpers::pagination(skip.0, limit.0)?;

        let filter = AuditFilter {
            user_id: user_id.0,
            resource_type: resource_type.0,
            action: action.0,
            skip,
            limit,
        };
        let rows = self.system_coordinator.audit_logs(&ctx, filter).await?;
        Ok(Json(rows.into_iter().map(AuditLogResponse::from).collect()))
    }

    /// Stored mail settings with passwords masked
    #[oai(path = "/email-settings", method = "get", tag = "SystemTags::Maintenance")]
    async fn email_settings(&self, req: &Request) -> ApiResult<Json<EmailSettings>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        Ok(Json(self.system_coordinator.email_settings(&ctx).await?))
    }

    /// Save mail settings; a masked password keeps the stored one
    #[oai(path = "/email-settings", method = "put", tag = "SystemTags::Maintenance")]
    async fn update_email_settings(
        &self,
        req: &Request,
        body: Json<EmailSettings>,
    ) -> ApiResult<Json<EmailSettings>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        Ok(Json(self.system_coordinator.update_email_settings(&ctx, body.0).await?))
    }

    /// Check that the settings are complete; no mail is sent
    #[oai(path = "/email-settings/test", method = "post", tag = "SystemTags::Maintenance")]
    async fn test_email_settings(
        &self,
        req: &Request,
        body: Json<EmailSettings>,
    ) -> ApiResult<Json<EmailTestResponse>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        Ok(Json(self.system_coordinator.test_email_settings(&ctx, body.0).await?))
    }

    #[oai(path = "/backups", method = "get", tag = "SystemTags::Maintenance")]
    async fn list_backups(&self, req: &Request) -> ApiResult<Json<Vec<BackupRecord>>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        Ok(Json(self.system_coordinator.list_backups(&ctx).await?))
    }

    #[oai(path = "/backups", method = "post", tag = "SystemTags::Maintenance")]
    async fn create_backup(&self, req: &Request, body: Json<BackupCreateRequest>) -> ApiResult<Json<BackupRecord>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        Ok(Json(
            self.system_coordinator
                .create_backup(&ctx, body.0.description)
                .await?,
        ))
    }

    #[oai(path = "/backups/:backup_id/download", method = "get", tag = "SystemTags::Maintenance")]
    async fn download_backup(
        &self,
        req: &Request,
        backup_id: Path<String>,
    ) -> ApiResult<Json<BackupDownloadResponse>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        let download_url = self
            .system_coordinator
            .backup_download_url(&ctx, &backup_id.0)
            .await?;
        Ok(Json(BackupDownloadResponse { download_url }))
    }

    #[oai(path = "/backups/:backup_id", method = "delete", tag = "SystemTags::Maintenance")]
    async fn delete_backup(&self, req: &Request, backup_id: Path<String>) -> ApiResult<Json<MessageResponse>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        let message = self.system_coordinator.delete_backup(&ctx, &backup_id.0).await?;
        Ok(Json(MessageResponse::new(message)))
    }

    /// Compare the working tree with `origin/main`
    #[oai(path = "/updates/check", method = "get", tag = "SystemTags::Maintenance")]
    async fn check_updates(&self, req: &Request) -> ApiResult<Json<UpdateCheckResponse>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        Ok(Json(self.system_coordinator.check_updates(&ctx).await?))
    }

    #[oai(path = "/updates/logs", method = "get", tag = "SystemTags::Maintenance")]
    async fn update_logs(&self, req: &Request) -> ApiResult<Json<UpdateLogsResponse>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        Ok(Json(self.system_coordinator.update_logs(&ctx).await?))
    }

    /// Pull `origin/main`; failures are reported in the body
    #[oai(path = "/updates/apply", method = "post", tag = "SystemTags::Maintenance")]
    async fn apply_updates(&self, req: &Request) -> ApiResult<Json<UpdateApplyResponse>> {
        let ctx = helpers::request_context(req, &self.token_provider);
        Ok(Json(self.system_coordinator.apply_updates(&ctx).await?))
    }
}
