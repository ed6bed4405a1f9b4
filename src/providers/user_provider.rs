use std::sync::Arc;

use sea_orm::ConnectionTrait;

use crate::errors::InternalError;
use crate::errors::internal::{CredentialError, UserError};
use crate::providers::CryptoProvider;
use crate::stores::UserStore;
use crate::types::db::user;
use crate::types::internal::user::{NewUser, UserChanges, UserRegistration};

/// Account rules shared by registration, admin management and the CLI
pub struct UserProvider {
    user_store: Arc<UserStore>,
    crypto_provider: Arc<CryptoProvider>,
}

impl UserProvider {
    pub fn new(user_store: Arc<UserStore>, crypto_provider: Arc<CryptoProvider>) -> Self {
        Self {
            user_store,
            crypto_provider,
        }
    }

    /// Reject an email or username another account already holds
    ///
    /// Email is checked first so a payload colliding on both reports the email.
    pub async fn ensure_unique(
        &self,
        conn: &impl ConnectionTrait,
        email: Option<&str>,
        username: Option<&str>,
        exclude_id: Option<i32>,
    ) -> Result<(), InternalError> {
        if let Some(email) = email {
            if self.user_store.email_in_use(conn, email, exclude_id).await? {
                return Err(UserError::DuplicateEmail(email.to_string()).into());
            }
        }
        if let Some(username) = username {
            if self.user_store.username_in_use(conn, username, exclude_id).await? {
                return Err(UserError::DuplicateUsername(username.to_string()).into());
            }
        }
        Ok(())
    }

    /// Validate, hash and insert a new account
    pub async fn create(&self, conn: &impl ConnectionTrait, registration: UserRegistration) -> Result<user::Model, InternalError> {
        self.crypto_provider.validate_password(&registration.password)?;
        self.ensure_unique(conn, Some(&registration.email), Some(&registration.username), None)
            .await?;

        let password_hash = self.crypto_provider.hash_password(&registration.password)?;
        let user = self
            .user_store
            .insert(
                conn,
                NewUser {
                    email: registration.email,
                    username: registration.username,
                    full_name: registration.full_name,
                    password_hash,
                    role: registration.role,
                    is_active: registration.is_active,
                    profile: registration.profile,
                },
            )
            .await?;

        tracing::info!(user_id = user.id, role = %user.role(), "Created user {}", user.username);
        Ok(user)
    }

    /// Apply `changes`, hashing `new_password` when given
    pub async fn update(
        &self,
        conn: &impl ConnectionTrait,
        user_id: i32,
        mut changes: UserChanges,
        new_password: Option<&str>,
    ) -> Result<user::Model, InternalError> {
        self.user_store.get_by_id(conn, user_id).await?;
        self.ensure_unique(conn, changes.email.as_deref(), changes.username.as_deref(), Some(user_id))
            .await?;

        if let Some(password) = new_password {
            self.crypto_provider.validate_password(password)?;
            changes.password_hash = Some(self.crypto_provider.hash_password(password)?);
        }

        self.user_store.update(conn, user_id, changes).await
    }

    /// Replace the password after checking the current one
    pub async fn change_password(
        &self,
        conn: &impl ConnectionTrait,
        user: &user::Model,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), InternalError> {
        if !self.crypto_provider.verify_password(old_password, &user.password_hash)? {
            return Err(CredentialError::IncorrectPassword.into());
        }
        self.crypto_provider.validate_password(new_password)?;

        let changes = UserChanges {
            password_hash: Some(self.crypto_provider.hash_password(new_password)?),
            ..Default::default()
        };
        self.user_store.update(conn, user.id, changes).await?;
        Ok(())
    }

    pub fn generate_password(&self) -> String {
        self.crypto_provider.generate_secure_password()
    }
}
