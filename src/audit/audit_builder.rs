use std::sync::Arc;

use sea_orm::ConnectionTrait;

use crate::errors::InternalError;
use crate::stores::AuditStore;
use crate::types::db::audit_log;
use crate::types::internal::audit::{AuditAction, AuditEntry, ResourceType};
use crate::types::internal::context::{RequestContext, RequestSource};

/// Builder for audit rows
///
/// Provides a fluent API for assembling an [`AuditEntry`] and appending it on
/// the caller's connection, usually the open transaction of the mutation
/// being recorded.
///
/// # Example
/// ```ignore
/// AuditBuilder::new(audit_store.clone(), AuditAction::Delete, ResourceType::Lesson)
///     .with_context(ctx)
///     .resource_id(lesson.id)
///     .details(format!("Admin deleted lesson: {}", lesson.title))
///     .write(&txn)
///     .await?;
/// ```
pub struct AuditBuilder {
    entry: AuditEntry,
    source: RequestSource,
    store: Arc<AuditStore>,
}

impl AuditBuilder {
    pub fn new(store: Arc<AuditStore>, action: AuditAction, resource_type: ResourceType) -> Self {
        Self {
            entry: AuditEntry::new(action, resource_type),
            source: RequestSource::API,
            store,
        }
    }

    /// Populate actor and request metadata from the RequestContext
    ///
    /// - `actor_id` -> `user_id`
    /// - `ip_address`, `user_agent` copied as strings
    /// - `request_id` for correlating with application logs
    pub fn with_context(mut self, ctx: &RequestContext) -> Self {
        self.entry.user_id = ctx.actor_id;
        self.entry.ip_address = ctx.ip_address.map(|ip| ip.to_string());
        self.entry.user_agent = ctx.user_agent.clone();
        self.entry.request_id = Some(ctx.request_id.to_string());
        self.source = ctx.source;
        self
    }

    /// Override the actor; CLI work has no authenticated user in its context
    pub fn actor(mut self, user_id: i32) -> Self {
        self.entry.user_id = Some(user_id);
        self
    }

    pub fn resource_id(mut self, id: i32) -> Self {
        self.entry.resource_id = Some(id);
        self
    }

    /// Short human-readable description, e.g. "Admin created user: alice"
    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.entry.details = Some(details.into());
        self
    }

    pub fn build(self) -> AuditEntry {
        self.entry
    }

    /// Append the row on `conn`
    pub async fn write(self, conn: &impl ConnectionTrait) -> Result<audit_log::Model, InternalError> {
        let store = self.store.clone();
        let source = self.source;
        let entry = self.build();
        tracing::debug!(
            source = %source,
            action = %entry.action,
            resource_type = %entry.resource_type,
            resource_id = ?entry.resource_id,
            "Writing audit row"
        );
        store.append(conn, entry).await
    }
}
