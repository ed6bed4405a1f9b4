use std::sync::Arc;

use sea_orm::ConnectionTrait;

use crate::errors::InternalError;
use crate::providers::CryptoProvider;
use crate::stores::UserStore;
use crate::types::db::user;

/// Outcome of checking a login/password pair
#[derive(Debug)]
pub enum LoginOutcome {
    Success { user: user::Model },
    /// Unknown login or wrong password; callers must not tell them apart
    InvalidCredentials,
    Inactive,
}

/// Verifies login credentials against stored hashes
pub struct AuthenticationProvider {
    store: Arc<UserStore>,
    crypto_provider: Arc<CryptoProvider>,
}

impl AuthenticationProvider {
    pub fn new(store: Arc<UserStore>, crypto_provider: Arc<CryptoProvider>) -> Self {
        Self { store, crypto_provider }
    }

    /// `login` may be a username or an email address
    pub async fn verify_credentials(
        &self,
        conn: &impl ConnectionTrait,
        login: &str,
        password: &str,
    ) -> Result<LoginOutcome, InternalError> {
        let Some(user) = self.store.find_by_login(conn, login).await? else {
            return Ok(LoginOutcome::InvalidCredentials);
        };

        if !self.crypto_provider.verify_password(password, &user.password_hash)? {
            return Ok(LoginOutcome::InvalidCredentials);
        }

        if !user.is_active {
            return Ok(LoginOutcome::Inactive);
        }

        Ok(LoginOutcome::Success { user })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::utils::{TEST_PASSWORD, seed_user, setup_test_app_data};
    use crate::types::internal::role::Role;
    use crate::types::internal::user::UserChanges;

    fn provider(app_data: &crate::app_data::AppData) -> AuthenticationProvider {
        AuthenticationProvider::new(app_data.user_store.clone(), app_data.crypto_provider.clone())
    }

    #[tokio::test]
    async fn test_login_by_username_or_email() {
        let app_data = setup_test_app_data().await;
        seed_user(&app_data, "alice", Role::Student).await;
        let auth = provider(&app_data);
        let db = &app_data.connections.main;

        assert!(matches!(
            auth.verify_credentials(db, "alice", TEST_PASSWORD).await.unwrap(),
            LoginOutcome::Success { .. }
        ));
        assert!(matches!(
            auth.verify_credentials(db, "alice@example.com", TEST_PASSWORD).await.unwrap(),
            LoginOutcome::Success { .. }
        ));
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user_look_the_same() {
        let app_data = setup_test_app_data().await;
        seed_user(&app_data, "alice", Role::Student).await;
        let auth = provider(&app_data);
        let db = &app_data.connections.main;

        assert!(matches!(
            auth.verify_credentials(db, "alice", "wrong-password").await.unwrap(),
            LoginOutcome::InvalidCredentials
        ));
        assert!(matches!(
            auth.verify_credentials(db, "nobody", TEST_PASSWORD).await.unwrap(),
            LoginOutcome::InvalidCredentials
        ));
    }

    #[tokio::test]
    async fn test_inactive_account() {
        let app_data = setup_test_app_data().await;
        let user = seed_user(&app_data, "alice", Role::Student).await;
        let changes = UserChanges {
            is_active: Some(false),
            ..Default::default()
        };
        app_data.user_store.update(&app_data.connections.main, user.id, changes).await.unwrap();

        let outcome = provider(&app_data)
            .verify_credentials(&app_data.connections.main, "alice", TEST_PASSWORD)
            .await
            .unwrap();
        assert!(matches!(outcome, LoginOutcome::Inactive));
    }
}
