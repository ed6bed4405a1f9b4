// Common test utilities for integration tests
#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use poem::Route;
use poem::test::TestClient;
use serde_json::json;

use lesson_scheduler::api;
use lesson_scheduler::app_data::AppData;
use lesson_scheduler::cli::CreateAdminArgs;
use lesson_scheduler::cli::admin::create_admin;
use lesson_scheduler::config::{ApplicationSettings, DatabaseConnections, SecretManager, SystemEnvironment};

pub const TEST_JWT_SECRET: &str = "integration-secret-key-with-32-plus-chars";
pub const TEST_PEPPER: &str = "integration-pepper-16";
pub const TEST_PASSWORD: &str = "integration-password";

/// Fresh in-memory database with every migration applied
pub async fn setup_test_connections() -> DatabaseConnections {
    let connections = DatabaseConnections::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");
    connections.migrate().await.expect("Failed to run migrations");
    connections
}

pub async fn setup_test_app_data() -> Arc<AppData> {
    let secret_manager = SecretManager::from_values(TEST_JWT_SECRET, TEST_PEPPER).expect("valid test secrets");

    Arc::new(AppData::assemble(
        setup_test_connections().await,
        Arc::new(SystemEnvironment),
        Arc::new(secret_manager),
        Arc::new(ApplicationSettings::new(30, PathBuf::from("."))),
    ))
}

/// The full `/api` route tree over a fresh database
pub async fn test_client() -> (TestClient<Route>, Arc<AppData>) {
    let app_data = setup_test_app_data().await;
    let client = TestClient::new(api::routes(app_data.clone(), "http://localhost/api"));
    (client, app_data)
}

/// Admin created through the CLI path; returns its id
pub async fn seed_admin(app_data: &AppData, username: &str) -> i64 {
    let created = create_admin(
        app_data,
        CreateAdminArgs {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            full_name: format!("Admin {}", username),
            password: Some(TEST_PASSWORD.to_string()),
        },
    )
    .await
    .expect("Failed to seed admin");
    i64::from(created.user.id)
}

/// Self-registered account; returns its id
pub async fn register(client: &TestClient<Route>, username: &str, role: &str) -> i64 {
    let resp = client
        .post("/api/auth/register")
        .body_json(&json!({
            "email": format!("{}@example.com", username),
            "username": username,
            "full_name": format!("User {}", username),
            "password": TEST_PASSWORD,
            "role": role,
        }))
        .send()
        .await;
    resp.assert_status_is_ok();
    resp.json().await.value().object().get("id").i64()
}

/// Form login; returns the bearer token
pub async fn login(client: &TestClient<Route>, username: &str) -> String {
    let resp = client
        .post("/api/auth/login")
        .form(&[("username", username), ("password", TEST_PASSWORD)])
        .send()
        .await;
    resp.assert_status_is_ok();
    resp.json()
        .await
        .value()
        .object()
        .get("access_token")
        .string()
        .to_string()
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// Helper to manage environment variables in tests
///
/// Cleans up specified environment variables on creation and drop,
/// ensuring test isolation when dealing with global environment state.
pub struct EnvGuard {
    vars: Vec<String>,
}

impl EnvGuard {
    pub fn new(vars: Vec<&str>) -> Self {
        for var in &vars {
            unsafe {
                std::env::remove_var(var);
            }
        }
        Self {
            vars: vars.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for var in &self.vars {
            unsafe {
                std::env::remove_var(var);
            }
        }
    }
}

/// Global mutex for tests that modify environment variables
///
/// Environment variables are process-global, so tests that modify them
/// must run serially to avoid race conditions.
pub static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());
