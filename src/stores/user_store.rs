use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, QueryTrait, Set,
};

use crate::errors::InternalError;
use crate::errors::internal::UserError;
use crate::types::db::user;
use crate::types::internal::user::{NewUser, UserChanges, UserFilter};

/// Persistence for `users`
///
/// Stateless; every method runs on the connection or transaction it is given.
#[derive(Debug, Default)]
pub struct UserStore;

impl UserStore {
    pub fn new() -> Self {
        Self
    }

    pub async fn find_by_id(&self, conn: &impl ConnectionTrait, id: i32) -> Result<Option<user::Model>, InternalError> {
        user::Entity::find_by_id(id)
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_user_by_id", e))
    }

    /// Like `find_by_id` but a missing row is `UserError::NotFound`
    pub async fn get_by_id(&self, conn: &impl ConnectionTrait, id: i32) -> Result<user::Model, InternalError> {
        self.find_by_id(conn, id)
            .await?
            .ok_or_else(|| UserError::NotFound(id).into())
    }

    pub async fn find_by_username(
        &self,
        conn: &impl ConnectionTrait,
        username: &str,
    ) -> Result<Option<user::Model>, InternalError> {
        user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_user_by_username", e))
    }

    pub async fn find_by_email(&self, conn: &impl ConnectionTrait, email: &str) -> Result<Option<user::Model>, InternalError> {
        user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_user_by_email", e))
    }

    /// Resolve a login name, which may be either the username or the email
    pub async fn find_by_login(&self, conn: &impl ConnectionTrait, login: &str) -> Result<Option<user::Model>, InternalError> {
        match self.find_by_username(conn, login).await? {
            Some(user) => Ok(Some(user)),
            None => self.find_by_email(conn, login).await,
        }
    }

    /// Whether another user (not `exclude_id`) already has this email
    pub async fn email_in_use(
        &self,
        conn: &impl ConnectionTrait,
        email: &str,
        exclude_id: Option<i32>,
    ) -> Result<bool, InternalError> {
        let existing = self.find_by_email(conn, email).await?;
        Ok(existing.is_some_and(|u| Some(u.id) != exclude_id))
    }

    pub async fn username_in_use(
        &self,
        conn: &impl ConnectionTrait,
        username: &str,
        exclude_id: Option<i32>,
    ) -> Result<bool, InternalError> {
        let existing = self.find_by_username(conn, username).await?;
        Ok(existing.is_some_and(|u| Some(u.id) != exclude_id))
    }

    pub async fn insert(&self, conn: &impl ConnectionTrait, new_user: NewUser) -> Result<user::Model, InternalError> {
        let email = new_user.email.clone();
        let username = new_user.username.clone();
        let profile = new_user.profile;

        let model = user::ActiveModel {
            email: Set(new_user.email),
            username: Set(new_user.username),
            full_name: Set(new_user.full_name),
            password_hash: Set(new_user.password_hash),
            role: Set(new_user.role.as_str().to_string()),
            is_active: Set(new_user.is_active),
            phone: Set(profile.phone),
            address: Set(profile.address),
            emergency_contact: Set(profile.emergency_contact),
            notes: Set(profile.notes),
            hourly_rate: Set(profile.hourly_rate),
            specializations: Set(profile.specializations),
            instructor_roles: Set(None),
            created_at: Set(Utc::now().timestamp()),
            updated_at: Set(None),
            last_login: Set(None),
            ..Default::default()
        };

        model
            .insert(conn)
            .await
            .map_err(|e| Self::map_unique_violation("insert_user", e, &email, &username))
    }

    /// Apply a partial update and stamp `updated_at`
    pub async fn update(
        &self,
        conn: &impl ConnectionTrait,
        id: i32,
        changes: UserChanges,
    ) -> Result<user::Model, InternalError> {
        let existing = self.get_by_id(conn, id).await?;
        let email = changes.email.clone().unwrap_or_else(|| existing.email.clone());
        let username = changes.username.clone().unwrap_or_else(|| existing.username.clone());

        let mut model: user::ActiveModel = existing.into();
        if let Some(email) = changes.email {
            model.email = Set(email);
        }
        if let Some(username) = changes.username {
            model.username = Set(username);
        }
        if let Some(full_name) = changes.full_name {
            model.full_name = Set(full_name);
        }
        if let Some(password_hash) = changes.password_hash {
            model.password_hash = Set(password_hash);
        }
        if let Some(role) = changes.role {
            model.role = Set(role.as_str().to_string());
        }
        if let Some(is_active) = changes.is_active {
            model.is_active = Set(is_active);
        }

        let profile = changes.profile;
        if profile.phone.is_some() {
            model.phone = Set(profile.phone);
        }
        if profile.address.is_some() {
            model.address = Set(profile.address);
        }
        if profile.emergency_contact.is_some() {
            model.emergency_contact = Set(profile.emergency_contact);
        }
        if profile.notes.is_some() {
            model.notes = Set(profile.notes);
        }
        if profile.hourly_rate.is_some() {
            model.hourly_rate = Set(profile.hourly_rate);
        }
        if profile.specializations.is_some() {
            model.specializations = Set(profile.specializations);
        }
        model.updated_at = Set(Some(Utc::now().timestamp()));

        model
            .update(conn)
            .await
            .map_err(|e| Self::map_unique_violation("update_user", e, &email, &username))
    }

    /// Replace the comma-joined instructor-role list
    pub async fn set_instructor_roles(
        &self,
        conn: &impl ConnectionTrait,
        id: i32,
        role_ids: &[String],
    ) -> Result<user::Model, InternalError> {
        let existing = self.get_by_id(conn, id).await?;
        let joined = if role_ids.is_empty() { None } else { Some(role_ids.join(",")) };

        let mut model: user::ActiveModel = existing.into();
        model.instructor_roles = Set(joined);
        model.updated_at = Set(Some(Utc::now().timestamp()));
        model
            .update(conn)
            .await
            .map_err(|e| InternalError::database("set_instructor_roles", e))
    }

    pub async fn touch_last_login(&self, conn: &impl ConnectionTrait, id: i32) -> Result<(), InternalError> {
        let model = user::ActiveModel {
            id: Set(id),
            last_login: Set(Some(Utc::now().timestamp())),
            ..Default::default()
        };
        model
            .update(conn)
            .await
            .map_err(|e| InternalError::database("touch_last_login", e))?;
        Ok(())
    }

    /// Returns false when no row matched
    pub async fn delete(&self, conn: &impl ConnectionTrait, id: i32) -> Result<bool, InternalError> {
        let result = user::Entity::delete_by_id(id)
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("delete_user", e))?;
        Ok(result.rows_affected > 0)
    }

    fn filtered(filter: &UserFilter) -> sea_orm::Select<user::Entity> {
        user::Entity::find()
            .apply_if(filter.role, |q, role| q.filter(user::Column::Role.eq(role.as_str())))
            .apply_if(filter.is_active, |q, active| q.filter(user::Column::IsActive.eq(active)))
            .apply_if(filter.created_since, |q, since| q.filter(user::Column::CreatedAt.gte(since)))
    }

    pub async fn list(&self, conn: &impl ConnectionTrait, filter: &UserFilter) -> Result<Vec<user::Model>, InternalError> {
        Self::filtered(filter)
            .order_by_asc(user::Column::Id)
            .offset(filter.skip)
            .limit(filter.limit)
            .all(conn)
            .await
            .map_err(|e| InternalError::database("list_users", e))
    }

    pub async fn count(&self, conn: &impl ConnectionTrait, filter: &UserFilter) -> Result<u64, InternalError> {
        Self::filtered(filter)
            .count(conn)
            .await
            .map_err(|e| InternalError::database("count_users", e))
    }

    pub async fn find_many(&self, conn: &impl ConnectionTrait, ids: &[i32]) -> Result<Vec<user::Model>, InternalError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        user::Entity::find()
            .filter(user::Column::Id.is_in(ids.iter().copied()))
            .order_by_asc(user::Column::Id)
            .all(conn)
            .await
            .map_err(|e| InternalError::database("find_users", e))
    }

    /// Unique violations that slipped past the pre-checks become domain errors
    fn map_unique_violation(operation: &str, err: DbErr, email: &str, username: &str) -> InternalError {
        let message = err.to_string();
        if message.contains("UNIQUE") && message.contains("users.email") {
            UserError::DuplicateEmail(email.to_string()).into()
        } else if message.contains("UNIQUE") && message.contains("users.username") {
            UserError::DuplicateUsername(username.to_string()).into()
        } else {
            InternalError::database(operation, err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::utils::{new_user, setup_test_db};
    use crate::types::internal::role::Role;

    #[tokio::test]
    async fn test_insert_and_find_by_login() {
        let db = setup_test_db().await;
        let store = UserStore::new();

        let created = store.insert(&db, new_user("alice", Role::Student)).await.unwrap();
        assert_eq!(created.role(), Role::Student);

        let by_username = store.find_by_login(&db, "alice").await.unwrap().unwrap();
        let by_email = store.find_by_login(&db, "alice@example.com").await.unwrap().unwrap();
        assert_eq!(by_username.id, created.id);
        assert_eq!(by_email.id, created.id);
        assert!(store.find_by_login(&db, "nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_domain_error() {
        let db = setup_test_db().await;
        let store = UserStore::new();
        store.insert(&db, new_user("alice", Role::Student)).await.unwrap();

        let mut clash = new_user("alice2", Role::Student);
        clash.email = "alice@example.com".to_string();

        match store.insert(&db, clash).await {
            Err(InternalError::User(UserError::DuplicateEmail(email))) => assert_eq!(email, "alice@example.com"),
            other => panic!("Expected DuplicateEmail, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_in_use_checks_exclude_self() {
        let db = setup_test_db().await;
        let store = UserStore::new();
        let alice = store.insert(&db, new_user("alice", Role::Student)).await.unwrap();

        assert!(store.username_in_use(&db, "alice", None).await.unwrap());
        assert!(!store.username_in_use(&db, "alice", Some(alice.id)).await.unwrap());
        assert!(!store.email_in_use(&db, "free@example.com", None).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_changes_only_given_fields() {
        let db = setup_test_db().await;
        let store = UserStore::new();
        let alice = store.insert(&db, new_user("alice", Role::Student)).await.unwrap();

        let changes = UserChanges {
            full_name: Some("Alice Liddell".to_string()),
            role: Some(Role::Instructor),
            ..Default::default()
        };
        let updated = store.update(&db, alice.id, changes).await.unwrap();

        assert_eq!(updated.full_name, "Alice Liddell");
        assert_eq!(updated.role(), Role::Instructor);
        assert_eq!(updated.email, alice.email);
        assert!(updated.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_list_and_count_with_filter() {
        let db = setup_test_db().await;
        let store = UserStore::new();
        store.insert(&db, new_user("s1", Role::Student)).await.unwrap();
        store.insert(&db, new_user("s2", Role::Student)).await.unwrap();
        store.insert(&db, new_user("t1", Role::Instructor)).await.unwrap();

        let students = UserFilter {
            role: Some(Role::Student),
            ..Default::default()
        };
        assert_eq!(store.count(&db, &students).await.unwrap(), 2);

        let page = UserFilter {
            skip: 1,
            limit: Some(1),
            ..Default::default()
        };
        let listed = store.list(&db, &page).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].username, "s2");
    }

    #[tokio::test]
    async fn test_instructor_roles_round_trip() {
        let db = setup_test_db().await;
        let store = UserStore::new();
        let teacher = store.insert(&db, new_user("t1", Role::Instructor)).await.unwrap();

        let roles = vec!["role-1".to_string(), "role-4".to_string()];
        let updated = store.set_instructor_roles(&db, teacher.id, &roles).await.unwrap();
        assert_eq!(updated.instructor_roles.as_deref(), Some("role-1,role-4"));
        assert_eq!(updated.instructor_role_ids(), roles);

        let cleared = store.set_instructor_roles(&db, teacher.id, &[]).await.unwrap();
        assert_eq!(cleared.instructor_roles, None);
    }

    #[tokio::test]
    async fn test_delete_missing_user() {
        let db = setup_test_db().await;
        assert!(!UserStore::new().delete(&db, 42).await.unwrap());
    }
}
