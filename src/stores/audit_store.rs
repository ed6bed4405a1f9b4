use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, QueryTrait, Set,
};

use crate::errors::InternalError;
use crate::types::db::audit_log;
use crate::types::internal::audit::{AuditEntry, AuditFilter};

/// Append-only access to the audit trail
///
/// Rows are never updated or deleted. Writes take the caller's
/// connection so an audit row commits or rolls back with the change it records.
#[derive(Debug, Default)]
pub struct AuditStore;

impl AuditStore {
    pub fn new() -> Self {
        Self
    }

    pub async fn append(&self, conn: &impl ConnectionTrait, entry: AuditEntry) -> Result<audit_log::Model, InternalError> {
        let model = audit_log::ActiveModel {
            user_id: Set(entry.user_id),
            action: Set(entry.action.as_str().to_string()),
            resource_type: Set(entry.resource_type.as_str().to_string()),
            resource_id: Set(entry.resource_id),
            details: Set(entry.details),
            ip_address: Set(entry.ip_address),
            user_agent: Set(entry.user_agent),
            request_id: Set(entry.request_id),
            created_at: Set(Utc::now().timestamp()),
            ..Default::default()
        };

        model
            .insert(conn)
            .await
            .map_err(|e| InternalError::database("append_audit_log", e))
    }

    fn filtered(filter: &AuditFilter) -> sea_orm::Select<audit_log::Entity> {
        audit_log::Entity::find()
            .apply_if(filter.user_id, |q, id| q.filter(audit_log::Column::UserId.eq(id)))
            .apply_if(filter.resource_type.clone(), |q, rt| q.filter(audit_log::Column::ResourceType.eq(rt)))
            .apply_if(filter.action.clone(), |q, action| q.filter(audit_log::Column::Action.eq(action)))
    }

    /// Newest first
    pub async fn list(&self, conn: &impl ConnectionTrait, filter: &AuditFilter) -> Result<Vec<audit_log::Model>, InternalError> {
        Self::filtered(filter)
            .order_by_desc(audit_log::Column::CreatedAt)
            .order_by_desc(audit_log::Column::Id)
            .offset(filter.skip)
            .limit(filter.limit)
            .all(conn)
            .await
            .map_err(|e| InternalError::database("list_audit_logs", e))
    }

    pub async fn count(&self, conn: &impl ConnectionTrait, filter: &AuditFilter) -> Result<u64, InternalError> {
        Self::filtered(filter)
            .count(conn)
            .await
            .map_err(|e| InternalError::database("count_audit_logs", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::utils::setup_test_db;
    use crate::types::internal::audit::{AuditAction, ResourceType};

    fn entry(user_id: i32, action: AuditAction, resource_type: ResourceType) -> AuditEntry {
        let mut entry = AuditEntry::new(action, resource_type);
        entry.user_id = Some(user_id);
        entry
    }

    #[tokio::test]
    async fn test_append_stores_action_strings() {
        let db = setup_test_db().await;
        let mut e = entry(1, AuditAction::BulkCreate, ResourceType::User);
        e.details = Some("Admin bulk created 2 users. Errors: 0".to_string());

        let row = AuditStore::new().append(&db, e).await.unwrap();

        assert_eq!(row.action, "BULK_CREATE");
        assert_eq!(row.resource_type, "user");
        assert_eq!(row.user_id, Some(1));
        assert!(row.created_at > 0);
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_filterable() {
        let db = setup_test_db().await;
        let store = AuditStore::new();
        store.append(&db, entry(1, AuditAction::Create, ResourceType::User)).await.unwrap();
        store.append(&db, entry(2, AuditAction::Create, ResourceType::Lesson)).await.unwrap();
        store.append(&db, entry(1, AuditAction::Delete, ResourceType::Lesson)).await.unwrap();

        let filter = AuditFilter { limit: 100, ..Default::default() };
        let all = store.list(&db, &filter).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].action, "DELETE");

        let lessons = AuditFilter {
            resource_type: Some("lesson".to_string()),
            limit: 100,
            ..Default::default()
        };
        assert_eq!(store.count(&db, &lessons).await.unwrap(), 2);

        let by_user = AuditFilter { user_id: Some(1), limit: 1, ..Default::default() };
        assert_eq!(store.list(&db, &by_user).await.unwrap().len(), 1);
        assert_eq!(store.count(&db, &by_user).await.unwrap(), 2);
    }
}
