use std::sync::Arc;

use chrono::Utc;

use crate::app_data::AppData;
use crate::audit::AuditLogger;
use crate::config::DatabaseConnections;
use crate::errors::InternalError;
use crate::errors::internal::{AccessError, UserError};
use crate::providers::{GuardProvider, UserProvider};
use crate::stores::{LessonStore, UserStore};
use crate::types::db::{lesson, user};
use crate::types::dto::user::{UserCreateRequest, UserUpdateRequest};
use crate::types::internal::audit::{AuditAction, ResourceType};
use crate::types::internal::auth::Principal;
use crate::types::internal::context::RequestContext;
use crate::types::internal::lesson::LessonStatus;
use crate::types::internal::lesson_query::LessonFilter;
use crate::types::internal::role::Guard;
use crate::types::internal::user::{UserChanges, UserFilter};

/// Account endpoints shared by every role
///
/// Users may read and edit themselves; staff may read and edit anyone, but
/// only admins change roles, activation, or delete accounts.
pub struct UserCoordinator {
    connections: DatabaseConnections,
    user_store: Arc<UserStore>,
    lesson_store: Arc<LessonStore>,
    user_provider: UserProvider,
    guard_provider: GuardProvider,
    audit_logger: AuditLogger,
}

impl UserCoordinator {
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            connections: app_data.connections.clone(),
            user_store: app_data.user_store.clone(),
            lesson_store: app_data.lesson_store.clone(),
            user_provider: UserProvider::new(app_data.user_store.clone(), app_data.crypto_provider.clone()),
            guard_provider: GuardProvider::new(app_data.user_store.clone()),
            audit_logger: AuditLogger::new(app_data.audit_store.clone()),
        }
    }

    pub async fn list(&self, ctx: &RequestContext, skip: u64, limit: u64) -> Result<Vec<user::Model>, InternalError> {
        let conn = &self.connections.main;
        self.guard_provider.authorize(conn, ctx, Guard::AdminOrInstructor).await?;

        let filter = UserFilter {
            skip,
            limit: Some(limit),
            ..Default::default()
        };
        self.user_store.list(conn, &filter).await
    }

    pub async fn create(&self, ctx: &RequestContext, request: UserCreateRequest) -> Result<user::Model, InternalError> {
        let principal = self
            .guard_provider
            .authorize(&self.connections.main, ctx, Guard::Admin)
            .await?;

        let txn = self.connections.begin().await?;
        let user = self.user_provider.create(&txn, request.registration()).await?;
        self.audit_logger
            .log_staff_action(
                &txn,
                ctx,
                &principal,
                AuditAction::Create,
                ResourceType::User,
                Some(user.id),
                format!("Admin created user: {}", user.username),
            )
            .await?;
        DatabaseConnections::commit(txn).await?;

        Ok(user)
    }

    /// Self, or any user for staff
    pub async fn get(&self, ctx: &RequestContext, user_id: i32) -> Result<user::Model, InternalError> {
        let conn = &self.connections.main;
        let principal = self.guard_provider.authenticate(conn, ctx).await?;

        if principal.id() != user_id && !principal.is_staff() {
            return Err(AccessError::not_permitted("Not authorized to view this user").into());
        }

        self.user_store.get_by_id(conn, user_id).await
    }

    pub async fn update(
        &self,
        ctx: &RequestContext,
        user_id: i32,
        request: UserUpdateRequest,
    ) -> Result<user::Model, InternalError> {
        let conn = &self.connections.main;
        let principal = self.guard_provider.authenticate(conn, ctx).await?;

        if principal.id() != user_id && !principal.is_staff() {
            return Err(AccessError::not_permitted("Not authorized to update this user").into());
        }

        let target = self.user_store.get_by_id(conn, user_id).await?;
        let mut changes = request.changes();
        Self::check_privileged_changes(&principal, &target, &mut changes, request.password.is_some())?;

        let txn = self.connections.begin().await?;
        let updated = self
            .user_provider
            .update(&txn, user_id, changes, request.password.as_deref())
            .await?;
        self.audit_logger
            .log_staff_action(
                &txn,
                ctx,
                &principal,
                AuditAction::Update,
                ResourceType::User,
                Some(updated.id),
                format!("User updated: {}", updated.username),
            )
            .await?;
        DatabaseConnections::commit(txn).await?;

        tracing::info!(request_id = %ctx.request_id, actor = principal.id(), user_id, "User updated");
        Ok(updated)
    }

    /// Role and activation are admin-only; a no-op role value is dropped
    ///
    /// Non-admin staff may edit another account's profile fields, but never
    /// its login credentials, and never an admin account at all.
    fn check_privileged_changes(
        principal: &Principal,
        target: &user::Model,
        changes: &mut UserChanges,
        password_change: bool,
    ) -> Result<(), InternalError> {
        if changes.role == Some(target.role()) {
            changes.role = None;
        }
        if principal.role.is_admin() {
            return Ok(());
        }

        if principal.id() != target.id {
            if target.role().is_admin() {
                return Err(AccessError::not_permitted("Only admins can modify admin accounts").into());
            }
            if password_change || changes.email.is_some() || changes.username.is_some() {
                return Err(AccessError::not_permitted("Cannot change another user's login credentials").into());
            }
        }

        if changes.role.is_some() {
            if principal.id() == target.id {
                return Err(UserError::SelfPromotion.into());
            }
            return Err(AccessError::not_permitted("Only admins can change user roles").into());
        }
        if changes.is_active.is_some_and(|active| active != target.is_active) {
            return Err(AccessError::not_permitted("Only admins can change account status").into());
        }
        changes.is_active = None;
        Ok(())
    }

    pub async fn delete(&self, ctx: &RequestContext, user_id: i32) -> Result<(), InternalError> {
        let principal = self
            .guard_provider
            .authorize(&self.connections.main, ctx, Guard::Admin)
            .await?;
        if principal.id() == user_id {
            return Err(UserError::SelfDeletion.into());
        }

        let txn = self.connections.begin().await?;
        let target = self.user_store.get_by_id(&txn, user_id).await?;
        self.user_store.delete(&txn, user_id).await?;
        self.audit_logger
            .log_staff_action(
                &txn,
                ctx,
                &principal,
                AuditAction::Delete,
                ResourceType::User,
                Some(user_id),
                format!("Admin deleted user: {}", target.username),
            )
            .await?;
        DatabaseConnections::commit(txn).await?;

        tracing::info!(request_id = %ctx.request_id, user_id, "User deleted");
        Ok(())
    }

    /// Lessons the caller teaches, or attends when they cannot teach
    pub async fn my_lessons(&self, ctx: &RequestContext, skip: u64, limit: u64) -> Result<Vec<lesson::Model>, InternalError> {
        let conn = &self.connections.main;
        let principal = self.guard_provider.authenticate(conn, ctx).await?;

        let filter = if principal.role.can_teach() {
            LessonFilter::default().teacher(principal.id())
        } else {
            LessonFilter::default().student(principal.id())
        };
        self.lesson_store.list(conn, &filter.page(skip, limit)).await
    }

    /// Future scheduled lessons the caller takes part in, soonest first
    pub async fn my_upcoming_lessons(&self, ctx: &RequestContext) -> Result<Vec<lesson::Model>, InternalError> {
        let conn = &self.connections.main;
        let principal = self.guard_provider.authenticate(conn, ctx).await?;

        let filter = LessonFilter::default()
            .participant(principal.id())
            .status(LessonStatus::Scheduled)
            .after(Utc::now().timestamp());
        self.lesson_store.list(conn, &filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::utils::{TEST_PASSWORD, context_for, new_lesson, seed_user, setup_test_app_data};
    use crate::types::internal::audit::AuditFilter;
    use crate::types::internal::role::Role;

    fn create_request(username: &str) -> UserCreateRequest {
        UserCreateRequest {
            email: format!("{}@example.com", username),
            username: username.to_string(),
            full_name: "Created User".to_string(),
            password: TEST_PASSWORD.to_string(),
            role: None,
            is_teacher: Some(true),
            is_active: None,
            phone: None,
            address: None,
            emergency_contact: None,
            notes: None,
            hourly_rate: None,
            specializations: None,
        }
    }

    #[tokio::test]
    async fn test_admin_create_is_audited() {
        let app_data = setup_test_app_data().await;
        let admin = seed_user(&app_data, "admin", Role::Admin).await;
        let users = UserCoordinator::new(app_data.clone());

        let created = users
            .create(&context_for(&app_data, &admin), create_request("newbie"))
            .await
            .unwrap();
        assert_eq!(created.role(), Role::Instructor);

        let rows = app_data
            .audit_store
            .list(&app_data.connections.main, &AuditFilter { limit: 10, ..Default::default() })
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].details.as_deref(), Some("Admin created user: newbie"));
        assert_eq!(rows[0].user_id, Some(admin.id));
    }

    #[tokio::test]
    async fn test_student_cannot_read_other_users() {
        let app_data = setup_test_app_data().await;
        let student = seed_user(&app_data, "stu", Role::Student).await;
        let other = seed_user(&app_data, "other", Role::Student).await;
        let users = UserCoordinator::new(app_data.clone());
        let ctx = context_for(&app_data, &student);

        assert_eq!(users.get(&ctx, student.id).await.unwrap().id, student.id);
        let denied = users.get(&ctx, other.id).await;
        assert!(matches!(denied, Err(InternalError::Access(AccessError::NotPermitted { .. }))));
    }

    #[tokio::test]
    async fn test_student_cannot_promote_themselves() {
        let app_data = setup_test_app_data().await;
        let student = seed_user(&app_data, "stu", Role::Student).await;
        let users = UserCoordinator::new(app_data.clone());

        let request = UserUpdateRequest {
            is_teacher: Some(true),
            ..Default::default()
        };
        let result = users.update(&context_for(&app_data, &student), student.id, request).await;
        assert!(matches!(result, Err(InternalError::User(UserError::SelfPromotion))));
    }

    #[tokio::test]
    async fn test_self_update_of_profile_leaves_no_audit_row_for_students() {
        let app_data = setup_test_app_data().await;
        let student = seed_user(&app_data, "stu", Role::Student).await;
        let users = UserCoordinator::new(app_data.clone());

        let request = UserUpdateRequest {
            phone: Some("555-0101".to_string()),
            role: Some(Role::Student),
            ..Default::default()
        };
        let updated = users
            .update(&context_for(&app_data, &student), student.id, request)
            .await
            .unwrap();
        assert_eq!(updated.phone.as_deref(), Some("555-0101"));

        let count = app_data
            .audit_store
            .count(&app_data.connections.main, &AuditFilter::default())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_instructor_cannot_change_roles_of_others() {
        let app_data = setup_test_app_data().await;
        let instructor = seed_user(&app_data, "teach", Role::Instructor).await;
        let student = seed_user(&app_data, "stu", Role::Student).await;
        let users = UserCoordinator::new(app_data.clone());

        let request = UserUpdateRequest {
            role: Some(Role::Admin),
            ..Default::default()
        };
        let result = users
            .update(&context_for(&app_data, &instructor), student.id, request)
            .await;
        assert!(matches!(result, Err(InternalError::Access(AccessError::NotPermitted { .. }))));
    }

    #[tokio::test]
    async fn test_instructor_cannot_touch_admin_or_foreign_credentials() {
        let app_data = setup_test_app_data().await;
        let admin = seed_user(&app_data, "root", Role::Admin).await;
        let instructor = seed_user(&app_data, "teach", Role::Instructor).await;
        let student = seed_user(&app_data, "stu", Role::Student).await;
        let users = UserCoordinator::new(app_data.clone());
        let ctx = context_for(&app_data, &instructor);

        let reset = UserUpdateRequest {
            password: Some("hijacked-password".to_string()),
            ..Default::default()
        };
        let result = users.update(&ctx, admin.id, reset.clone()).await;
        assert!(matches!(result, Err(InternalError::Access(AccessError::NotPermitted { .. }))));

        let rename = UserUpdateRequest {
            full_name: Some("Renamed Admin".to_string()),
            ..Default::default()
        };
        assert!(users.update(&ctx, admin.id, rename).await.is_err());

        assert!(users.update(&ctx, student.id, reset).await.is_err());
        let email = UserUpdateRequest {
            email: Some("elsewhere@example.com".to_string()),
            ..Default::default()
        };
        assert!(users.update(&ctx, student.id, email).await.is_err());

        let phone = UserUpdateRequest {
            phone: Some("555-0100".to_string()),
            ..Default::default()
        };
        let updated = users.update(&ctx, student.id, phone).await.unwrap();
        assert_eq!(updated.phone.as_deref(), Some("555-0100"));
    }

    #[tokio::test]
    async fn test_admin_cannot_delete_self() {
        let app_data = setup_test_app_data().await;
        let admin = seed_user(&app_data, "admin", Role::Admin).await;
        let users = UserCoordinator::new(app_data.clone());

        let result = users.delete(&context_for(&app_data, &admin), admin.id).await;
        assert!(matches!(result, Err(InternalError::User(UserError::SelfDeletion))));
    }

    #[tokio::test]
    async fn test_my_lessons_uses_teacher_side_for_instructors() {
        let app_data = setup_test_app_data().await;
        let teacher = seed_user(&app_data, "teach", Role::Instructor).await;
        let student = seed_user(&app_data, "stu", Role::Student).await;
        let future = Utc::now().timestamp() + 3_600;
        app_data
            .lesson_store
            .insert(&app_data.connections.main, new_lesson(teacher.id, student.id, future))
            .await
            .unwrap();
        let users = UserCoordinator::new(app_data.clone());

        let taught = users.my_lessons(&context_for(&app_data, &teacher), 0, 100).await.unwrap();
        let attended = users.my_lessons(&context_for(&app_data, &student), 0, 100).await.unwrap();
        assert_eq!(taught.len(), 1);
        assert_eq!(attended.len(), 1);

        let upcoming = users.my_upcoming_lessons(&context_for(&app_data, &student)).await.unwrap();
        assert_eq!(upcoming.len(), 1);
    }
}
