use std::sync::Arc;

use sea_orm::ConnectionTrait;

use crate::audit::AuditBuilder;
use crate::errors::InternalError;
use crate::stores::AuditStore;
use crate::types::internal::audit::{AuditAction, ResourceType};
use crate::types::internal::auth::Principal;
use crate::types::internal::context::RequestContext;

/// Entry point coordinators use to record mutations
///
/// Only staff (admin and instructor) actions are audited; a student editing
/// their own notes leaves no row.
pub struct AuditLogger {
    pub audit_store: Arc<AuditStore>,
}

impl AuditLogger {
    pub fn new(audit_store: Arc<AuditStore>) -> Self {
        Self { audit_store }
    }

    /// Create an AuditBuilder for a custom row
    pub fn builder(&self, action: AuditAction, resource_type: ResourceType) -> AuditBuilder {
        AuditBuilder::new(self.audit_store.clone(), action, resource_type)
    }

    /// Record a mutation made by `principal`, in the transaction `conn`
    ///
    /// Returns whether a row was written.
    pub async fn log_staff_action(
        &self,
        conn: &impl ConnectionTrait,
        ctx: &RequestContext,
        principal: &Principal,
        action: AuditAction,
        resource_type: ResourceType,
        resource_id: Option<i32>,
        details: impl Into<String>,
    ) -> Result<bool, InternalError> {
        if !principal.is_staff() {
            return Ok(false);
        }

        let mut builder = self
            .builder(action, resource_type)
            .with_context(ctx)
            .actor(principal.id())
            .details(details);
        if let Some(id) = resource_id {
            builder = builder.resource_id(id);
        }

        builder.write(conn).await?;
        Ok(true)
    }

    /// Record a CLI-initiated mutation
    pub async fn log_cli_action(
        &self,
        conn: &impl ConnectionTrait,
        ctx: &RequestContext,
        action: AuditAction,
        resource_type: ResourceType,
        resource_id: i32,
        details: impl Into<String>,
    ) -> Result<(), InternalError> {
        self.builder(action, resource_type)
            .with_context(ctx)
            .resource_id(resource_id)
            .details(details)
            .write(conn)
            .await?;
        Ok(())
    }
}
