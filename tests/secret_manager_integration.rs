mod common;

use std::sync::Arc;

use lesson_scheduler::app_data::AppData;
use lesson_scheduler::config::{DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES, JWT_SECRET_VAR, PEPPER_VAR, SecretError, SecretManager};
use lesson_scheduler::errors::InternalError;
use lesson_scheduler::errors::internal::CredentialError;
use lesson_scheduler::providers::TokenProvider;
use lesson_scheduler::types::internal::role::Role;

const VALID_SECRET: &str = "this-is-a-valid-jwt-secret-with-32-characters";
const VALID_PEPPER: &str = "valid-pepper-16ch";

#[test]
fn test_application_startup_with_valid_secrets() {
    let _lock = common::ENV_TEST_MUTEX.lock().unwrap();
    let _guard = common::EnvGuard::new(vec![JWT_SECRET_VAR, PEPPER_VAR]);

    unsafe {
        std::env::set_var(JWT_SECRET_VAR, VALID_SECRET);
        std::env::set_var(PEPPER_VAR, VALID_PEPPER);
    }

    let secret_manager = SecretManager::init().expect("SecretManager should initialize with valid secrets");
    assert_eq!(secret_manager.jwt_secret(), VALID_SECRET);
    assert_eq!(secret_manager.pepper(), VALID_PEPPER);
}

#[test]
fn test_missing_secret_key_is_reported_by_name() {
    let _lock = common::ENV_TEST_MUTEX.lock().unwrap();
    let _guard = common::EnvGuard::new(vec![JWT_SECRET_VAR, PEPPER_VAR]);

    unsafe {
        std::env::set_var(PEPPER_VAR, VALID_PEPPER);
    }

    match SecretManager::init() {
        Err(err @ SecretError::Missing { .. }) => {
            assert_eq!(err.to_string(), "Required secret 'SECRET_KEY' is missing");
        }
        other => panic!("Expected Missing error for SECRET_KEY, got {:?}", other.err()),
    }
}

#[test]
fn test_missing_pepper_is_reported_by_name() {
    let _lock = common::ENV_TEST_MUTEX.lock().unwrap();
    let _guard = common::EnvGuard::new(vec![JWT_SECRET_VAR, PEPPER_VAR]);

    unsafe {
        std::env::set_var(JWT_SECRET_VAR, VALID_SECRET);
    }

    match SecretManager::init() {
        Err(SecretError::Missing { secret_name }) => assert_eq!(secret_name, PEPPER_VAR),
        other => panic!("Expected Missing error for PASSWORD_PEPPER, got {:?}", other.err()),
    }
}

#[test]
fn test_short_secrets_are_rejected() {
    let _lock = common::ENV_TEST_MUTEX.lock().unwrap();
    let _guard = common::EnvGuard::new(vec![JWT_SECRET_VAR, PEPPER_VAR]);

    unsafe {
        std::env::set_var(JWT_SECRET_VAR, "too-short");
        std::env::set_var(PEPPER_VAR, VALID_PEPPER);
    }

    match SecretManager::init() {
        Err(SecretError::InvalidLength { secret_name, expected, actual }) => {
            assert_eq!(secret_name, JWT_SECRET_VAR);
            assert_eq!(expected, 32);
            assert_eq!(actual, 9);
        }
        other => panic!("Expected InvalidLength, got {:?}", other.err()),
    }

    unsafe {
        std::env::set_var(JWT_SECRET_VAR, VALID_SECRET);
        std::env::set_var(PEPPER_VAR, "short");
    }
    assert!(matches!(SecretManager::init(), Err(SecretError::InvalidLength { .. })));
}

#[tokio::test]
async fn test_app_data_init_reads_settings_from_environment() {
    let connections = common::setup_test_connections().await;

    let app_data = {
        let _lock = common::ENV_TEST_MUTEX.lock().unwrap();
        let _guard = common::EnvGuard::new(vec![JWT_SECRET_VAR, PEPPER_VAR, "ACCESS_TOKEN_EXPIRE_MINUTES"]);
        unsafe {
            std::env::set_var(JWT_SECRET_VAR, VALID_SECRET);
            std::env::set_var(PEPPER_VAR, VALID_PEPPER);
            std::env::set_var("ACCESS_TOKEN_EXPIRE_MINUTES", "15");
        }
        AppData::init(connections).expect("AppData should initialize")
    };

    assert_eq!(app_data.settings.access_token_expire_minutes(), 15);
    assert_eq!(app_data.token_provider.expires_in(), 15 * 60);
}

#[tokio::test]
async fn test_tokens_do_not_verify_across_secrets() {
    let app_data = common::setup_test_app_data().await;
    let admin_id = common::seed_admin(&app_data, "root").await;
    let admin = app_data
        .user_store
        .get_by_id(&app_data.connections.main, admin_id as i32)
        .await
        .unwrap();

    let token = app_data.token_provider.issue_token(&admin).unwrap();
    let claims = app_data.token_provider.verify_token(&token).unwrap();
    assert_eq!(claims.role, Role::Admin);
    assert_eq!(claims.sub, "root");

    let other_secrets = SecretManager::from_values("another-secret-key-that-is-32-chars-long", VALID_PEPPER).unwrap();
    let other = TokenProvider::new(Arc::new(other_secrets), DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES);
    assert!(matches!(
        other.verify_token(&token),
        Err(InternalError::Credential(CredentialError::InvalidToken { .. }))
    ));
}
