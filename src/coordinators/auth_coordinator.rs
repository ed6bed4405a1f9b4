use std::sync::Arc;

use crate::app_data::AppData;
use crate::config::DatabaseConnections;
use crate::errors::InternalError;
use crate::errors::internal::{CredentialError, UserError};
use crate::providers::{
    AuthenticationProvider, GuardProvider, LoginOutcome, Notification, NotificationProvider, TokenProvider,
    UserProvider,
};
use crate::stores::UserStore;
use crate::types::db::user;
use crate::types::dto::auth::RegisterRequest;
use crate::types::internal::context::RequestContext;
use crate::types::internal::role::Role;
use crate::types::internal::user::{UserProfile, UserRegistration};

/// Orchestrates registration, login and self-service credential changes
pub struct AuthCoordinator {
    connections: DatabaseConnections,
    user_store: Arc<UserStore>,
    authentication_provider: AuthenticationProvider,
    user_provider: UserProvider,
    guard_provider: GuardProvider,
    token_provider: Arc<TokenProvider>,
    notifier: NotificationProvider,
}

impl AuthCoordinator {
    /// Create AuthCoordinator from AppData
    ///
    /// Extracts stores from AppData and creates the providers it composes.
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            connections: app_data.connections.clone(),
            user_store: app_data.user_store.clone(),
            authentication_provider: AuthenticationProvider::new(
                app_data.user_store.clone(),
                app_data.crypto_provider.clone(),
            ),
            user_provider: UserProvider::new(app_data.user_store.clone(), app_data.crypto_provider.clone()),
            guard_provider: GuardProvider::new(app_data.user_store.clone()),
            token_provider: app_data.token_provider.clone(),
            notifier: NotificationProvider::new(),
        }
    }

    /// Useful for the API layer, which validates bearer tokens into the context
    pub fn token_provider(&self) -> Arc<TokenProvider> {
        self.token_provider.clone()
    }

    /// Self-service signup; only student and instructor accounts can be created
    pub async fn register(&self, ctx: &RequestContext, request: RegisterRequest) -> Result<user::Model, InternalError> {
        let role = Role::from_legacy(request.role, request.is_teacher).unwrap_or(Role::Student);
        if role.is_admin() {
            tracing::warn!(request_id = %ctx.request_id, "Registration attempted with admin role");
            return Err(UserError::RoleNotAllowed(role.to_string()).into());
        }

        let registration = UserRegistration {
            email: request.email,
            username: request.username,
            full_name: request.full_name,
            password: request.password,
            role,
            is_active: true,
            profile: UserProfile {
                phone: request.phone,
                address: request.address,
                emergency_contact: request.emergency_contact,
                ..Default::default()
            },
        };

        let txn = self.connections.begin().await?;
        let user = self.user_provider.create(&txn, registration).await?;
        DatabaseConnections::commit(txn).await?;

        self.notifier.dispatch(Notification::Welcome {
            user_id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
        });

        Ok(user)
    }

    /// Verify credentials and issue a session token
    ///
    /// # Returns
    /// * `(access_token, expires_in_seconds)`
    pub async fn login(&self, ctx: &RequestContext, login: &str, password: &str) -> Result<(String, i64), InternalError> {
        let conn = &self.connections.main;

        let user = match self.authentication_provider.verify_credentials(conn, login, password).await? {
            LoginOutcome::Success { user } => user,
            LoginOutcome::InvalidCredentials => {
                tracing::info!(request_id = %ctx.request_id, ip = ?ctx.ip_address, "Failed login attempt");
                return Err(CredentialError::InvalidCredentials.into());
            }
            LoginOutcome::Inactive => {
                tracing::info!(request_id = %ctx.request_id, "Login refused for inactive account");
                return Err(CredentialError::InactiveAccount.into());
            }
        };

        let token = self.token_provider.issue_token(&user)?;
        self.user_store.touch_last_login(conn, user.id).await?;

        tracing::info!(request_id = %ctx.request_id, user_id = user.id, "User logged in");
        Ok((token, self.token_provider.expires_in()))
    }

    /// The authenticated, active caller
    pub async fn me(&self, ctx: &RequestContext) -> Result<user::Model, InternalError> {
        let principal = self.guard_provider.authenticate(&self.connections.main, ctx).await?;
        Ok(principal.user)
    }

    pub async fn change_password(
        &self,
        ctx: &RequestContext,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), InternalError> {
        let principal = self.guard_provider.authenticate(&self.connections.main, ctx).await?;

        let txn = self.connections.begin().await?;
        self.user_provider
            .change_password(&txn, &principal.user, old_password, new_password)
            .await?;
        DatabaseConnections::commit(txn).await?;

        tracing::info!(request_id = %ctx.request_id, user_id = principal.id(), "Password changed");
        Ok(())
    }
}
