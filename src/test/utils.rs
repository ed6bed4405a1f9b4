// Test utilities shared across unit tests
// Only compiled when running tests

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};

use crate::app_data::AppData;
use crate::config::{ApplicationSettings, DatabaseConnections, MockEnvironment, SecretManager};
use crate::types::db::user;
use crate::types::internal::context::RequestContext;
use crate::types::internal::lesson_query::NewLesson;
use crate::types::internal::role::Role;
use crate::types::internal::user::{NewUser, UserProfile};

pub const TEST_JWT_SECRET: &str = "test-secret-key-minimum-32-characters-long";
pub const TEST_PEPPER: &str = "test-pepper-for-unit-tests";
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// In-memory SQLite database with every migration applied
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

pub fn test_secret_manager() -> Arc<SecretManager> {
    Arc::new(SecretManager::from_values(TEST_JWT_SECRET, TEST_PEPPER).expect("valid test secrets"))
}

/// Full AppData over a fresh in-memory database
///
/// ```rust
/// let app_data = setup_test_app_data().await;
/// let admin = seed_user(&app_data, "admin", Role::Admin).await;
/// let ctx = context_for(&app_data, &admin);
/// ```
pub async fn setup_test_app_data() -> Arc<AppData> {
    let db = setup_test_db().await;
    let settings = ApplicationSettings::new(30, PathBuf::from("."));

    Arc::new(AppData::assemble(
        DatabaseConnections::from_connection(db),
        Arc::new(MockEnvironment::empty()),
        test_secret_manager(),
        Arc::new(settings),
    ))
}

/// Detached user row, useful where no database is involved
pub fn user_model(id: i32, username: &str, role: Role) -> user::Model {
    user::Model {
        id,
        email: format!("{}@example.com", username),
        username: username.to_string(),
        full_name: format!("{} Test", username),
        password_hash: "not-a-real-hash".to_string(),
        role: role.as_str().to_string(),
        is_active: true,
        phone: None,
        address: None,
        emergency_contact: None,
        notes: None,
        hourly_rate: None,
        specializations: None,
        instructor_roles: None,
        created_at: Utc::now().timestamp(),
        updated_at: None,
        last_login: None,
    }
}

/// Insertable user with email `{username}@example.com`
pub fn new_user(username: &str, role: Role) -> NewUser {
    NewUser {
        email: format!("{}@example.com", username),
        username: username.to_string(),
        full_name: format!("{} Test", username),
        password_hash: "not-a-real-hash".to_string(),
        role,
        is_active: true,
        profile: UserProfile::default(),
    }
}

pub fn new_lesson(teacher_id: i32, student_id: i32, scheduled_at: i64) -> NewLesson {
    NewLesson {
        title: "Piano basics".to_string(),
        description: None,
        teacher_id,
        student_id,
        created_by: None,
        scheduled_at,
        duration_minutes: 60,
        instrument: Some("piano".to_string()),
        lesson_type: "individual".to_string(),
        cost: None,
        location: None,
        room_number: None,
        materials_needed: None,
    }
}

/// Persist a user whose password is [`TEST_PASSWORD`]
pub async fn seed_user(app_data: &AppData, username: &str, role: Role) -> user::Model {
    let mut new_user = new_user(username, role);
    new_user.password_hash = app_data
        .crypto_provider
        .hash_password(TEST_PASSWORD)
        .expect("hash test password");

    app_data
        .user_store
        .insert(&app_data.connections.main, new_user)
        .await
        .expect("Failed to seed user")
}

/// API-sourced context authenticated as `user`
pub fn context_for(app_data: &AppData, user: &user::Model) -> RequestContext {
    let claims = app_data.token_provider.claims_for(user);
    RequestContext::new()
        .with_ip_address("127.0.0.1".parse().expect("valid ip"))
        .with_auth(claims)
}
