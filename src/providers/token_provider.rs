use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use crate::config::SecretManager;
use crate::errors::InternalError;
use crate::errors::internal::CredentialError;
use crate::types::db::user;
use crate::types::internal::auth::{ACCESS_TOKEN_TYPE, Claims};

/// Issues and validates HS256 session tokens
pub struct TokenProvider {
    secret_manager: Arc<SecretManager>,
    expire_minutes: i64,
}

impl TokenProvider {
    pub fn new(secret_manager: Arc<SecretManager>, expire_minutes: u32) -> Self {
        Self {
            secret_manager,
            expire_minutes: i64::from(expire_minutes),
        }
    }

    /// Seconds a freshly issued token stays valid
    pub fn expires_in(&self) -> i64 {
        self.expire_minutes * 60
    }

    /// Build the claims for `user`; `is_teacher` is derived from the role
    pub fn claims_for(&self, user: &user::Model) -> Claims {
        let now = Utc::now().timestamp();
        let role = user.role();
        Claims {
            sub: user.username.clone(),
            user_id: user.id,
            role,
            is_teacher: role.is_teacher(),
            iat: now,
            exp: now + self.expires_in(),
            token_type: ACCESS_TOKEN_TYPE.to_string(),
        }
    }

    pub fn issue_token(&self, user: &user::Model) -> Result<String, InternalError> {
        self.encode_claims(&self.claims_for(user))
    }

    pub fn encode_claims(&self, claims: &Claims) -> Result<String, InternalError> {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(self.secret_manager.jwt_secret().as_bytes()),
        )
        .map_err(|e| InternalError::crypto("jwt_generation", e.to_string()))
    }

    /// Check signature, expiry and the `type` marker
    pub fn verify_token(&self, token: &str) -> Result<Claims, InternalError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret_manager.jwt_secret().as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => InternalError::from(CredentialError::ExpiredToken),
            _ => InternalError::from(CredentialError::invalid_token(e.to_string())),
        })?;

        if data.claims.token_type != ACCESS_TOKEN_TYPE {
            return Err(CredentialError::invalid_token(format!(
                "unexpected token type '{}'",
                data.claims.token_type
            ))
            .into());
        }

        Ok(data.claims)
    }
}

impl fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenProvider")
            .field("secret_manager", &"<redacted>")
            .field("expire_minutes", &self.expire_minutes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::utils::user_model;
    use crate::types::internal::role::Role;

    const SECRET: &str = "test-secret-key-minimum-32-characters-long";

    fn provider_with(secret: &str, minutes: u32) -> TokenProvider {
        let secrets = SecretManager::from_values(secret, "test-pepper-for-unit-tests").unwrap();
        TokenProvider::new(Arc::new(secrets), minutes)
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let provider = provider_with(SECRET, 30);
        let user = user_model(5, "alice", Role::Instructor);

        let token = provider.issue_token(&user).unwrap();
        let claims = provider.verify_token(&token).unwrap();

        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.user_id, 5);
        assert_eq!(claims.role, Role::Instructor);
        assert!(claims.is_teacher);
        assert_eq!(claims.token_type, "access_token");
        assert_eq!(claims.exp - claims.iat, 1800);
    }

    #[test]
    fn test_ttl_comes_from_settings() {
        let provider = provider_with(SECRET, 5);
        let claims = provider.claims_for(&user_model(1, "bob", Role::Student));
        assert_eq!(claims.exp - claims.iat, 300);
        assert!(!claims.is_teacher);
    }

    #[test]
    fn test_token_signed_with_other_secret_is_invalid() {
        let token = provider_with("another-secret-key-minimum-32-characters", 30)
            .issue_token(&user_model(1, "bob", Role::Student))
            .unwrap();

        match provider_with(SECRET, 30).verify_token(&token) {
            Err(InternalError::Credential(CredentialError::InvalidToken { .. })) => {}
            other => panic!("Expected InvalidToken, got {:?}", other),
        }
    }

    #[test]
    fn test_tampered_token_is_invalid() {
        let provider = provider_with(SECRET, 30);
        let token = provider.issue_token(&user_model(1, "bob", Role::Student)).unwrap();
        let mut tampered = token.clone();
        tampered.push('x');

        assert!(provider.verify_token(&tampered).is_err());
    }

    #[test]
    fn test_expired_token_is_reported_as_expired() {
        let provider = provider_with(SECRET, 30);
        let mut claims = provider.claims_for(&user_model(1, "bob", Role::Student));
        claims.iat -= 7200;
        claims.exp = claims.iat + 60;
        let token = provider.encode_claims(&claims).unwrap();

        match provider.verify_token(&token) {
            Err(InternalError::Credential(CredentialError::ExpiredToken)) => {}
            other => panic!("Expected ExpiredToken, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_type_marker_is_rejected() {
        let provider = provider_with(SECRET, 30);
        let mut claims = provider.claims_for(&user_model(1, "bob", Role::Student));
        claims.token_type = "refresh_token".to_string();
        let token = provider.encode_claims(&claims).unwrap();

        assert!(matches!(
            provider.verify_token(&token),
            Err(InternalError::Credential(CredentialError::InvalidToken { .. }))
        ));
    }

    #[test]
    fn test_debug_does_not_expose_secret() {
        let debug = format!("{:?}", provider_with(SECRET, 30));
        assert!(!debug.contains(SECRET));
        assert!(debug.contains("<redacted>"));
    }
}
