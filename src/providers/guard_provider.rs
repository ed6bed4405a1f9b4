use std::sync::Arc;

use sea_orm::ConnectionTrait;

use crate::errors::InternalError;
use crate::errors::internal::AccessError;
use crate::stores::UserStore;
use crate::types::internal::auth::Principal;
use crate::types::internal::context::RequestContext;
use crate::types::internal::role::Guard;

/// Evaluates the authorization chain for a request
///
/// 1. Authenticated: the context carries validated claims whose user exists
/// 2. Active: the user's `is_active` flag is set
/// 3. Role-specific: the requested [`Guard`]
///
/// The role checked is the one persisted on the user row, not the one in
/// the token, so a demotion takes effect on the next request.
pub struct GuardProvider {
    user_store: Arc<UserStore>,
}

impl GuardProvider {
    pub fn new(user_store: Arc<UserStore>) -> Self {
        Self { user_store }
    }

    /// Steps 1 and 2 of the chain
    pub async fn authenticate(&self, conn: &impl ConnectionTrait, ctx: &RequestContext) -> Result<Principal, InternalError> {
        let Some(user_id) = ctx.claimed_user_id() else {
            tracing::debug!(request_id = %ctx.request_id, "No valid credentials on request");
            return Err(AccessError::Unauthenticated.into());
        };

        let Some(user) = self.user_store.find_by_id(conn, user_id).await? else {
            tracing::debug!(request_id = %ctx.request_id, user_id, "Token subject no longer exists");
            return Err(AccessError::Unauthenticated.into());
        };

        if !user.is_active {
            tracing::debug!(request_id = %ctx.request_id, user_id, "Inactive user rejected");
            return Err(AccessError::Inactive.into());
        }

        Ok(Principal::new(user))
    }

    /// Full chain; returns the principal for the coordinator to use
    pub async fn authorize(
        &self,
        conn: &impl ConnectionTrait,
        ctx: &RequestContext,
        guard: Guard,
    ) -> Result<Principal, InternalError> {
        let principal = self.authenticate(conn, ctx).await?;

        if let Err(e) = guard.check(principal.role) {
            tracing::warn!(
                request_id = %ctx.request_id,
                user_id = principal.id(),
                role = %principal.role,
                "Guard {:?} denied request",
                guard
            );
            return Err(e.into());
        }

        Ok(principal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::utils::{context_for, seed_user, setup_test_app_data};
    use crate::types::internal::role::Role;
    use crate::types::internal::user::UserChanges;

    #[tokio::test]
    async fn test_missing_claims_are_unauthenticated() {
        let app_data = setup_test_app_data().await;
        let guard = GuardProvider::new(app_data.user_store.clone());

        let result = guard.authenticate(&app_data.connections.main, &RequestContext::new()).await;
        assert!(matches!(result, Err(InternalError::Access(AccessError::Unauthenticated))));
    }

    #[tokio::test]
    async fn test_deleted_user_is_unauthenticated() {
        let app_data = setup_test_app_data().await;
        let user = seed_user(&app_data, "ghost", Role::Student).await;
        let ctx = context_for(&app_data, &user);
        app_data.user_store.delete(&app_data.connections.main, user.id).await.unwrap();

        let guard = GuardProvider::new(app_data.user_store.clone());
        let result = guard.authenticate(&app_data.connections.main, &ctx).await;
        assert!(matches!(result, Err(InternalError::Access(AccessError::Unauthenticated))));
    }

    #[tokio::test]
    async fn test_inactive_user_is_rejected_before_role_check() {
        let app_data = setup_test_app_data().await;
        let user = seed_user(&app_data, "sleepy", Role::Admin).await;
        let changes = UserChanges {
            is_active: Some(false),
            ..Default::default()
        };
        app_data.user_store.update(&app_data.connections.main, user.id, changes).await.unwrap();

        let guard = GuardProvider::new(app_data.user_store.clone());
        let result = guard
            .authorize(&app_data.connections.main, &context_for(&app_data, &user), Guard::Admin)
            .await;
        assert!(matches!(result, Err(InternalError::Access(AccessError::Inactive))));
    }

    #[tokio::test]
    async fn test_role_guard_uses_persisted_role() {
        let app_data = setup_test_app_data().await;
        let user = seed_user(&app_data, "promoted", Role::Student).await;
        // Token minted while still a student
        let ctx = context_for(&app_data, &user);

        let changes = UserChanges {
            role: Some(Role::Instructor),
            ..Default::default()
        };
        app_data.user_store.update(&app_data.connections.main, user.id, changes).await.unwrap();

        let guard = GuardProvider::new(app_data.user_store.clone());
        let principal = guard
            .authorize(&app_data.connections.main, &ctx, Guard::Instructor)
            .await
            .unwrap();
        assert_eq!(principal.role, Role::Instructor);

        let denied = guard.authorize(&app_data.connections.main, &ctx, Guard::Student).await;
        match denied {
            Err(InternalError::Access(AccessError::RoleRequired { reason })) => {
                assert_eq!(reason, "Student role required")
            }
            other => panic!("Expected RoleRequired, got {:?}", other),
        }
    }
}
