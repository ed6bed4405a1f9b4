mod common;

use poem::http::StatusCode;
use serde_json::json;

use common::{TEST_PASSWORD, bearer, login, register, test_client};

#[tokio::test]
async fn test_health_is_public() {
    let (client, _) = test_client().await;

    let resp = client.get("/api/health").send().await;
    resp.assert_status_is_ok();
    resp.json().await.value().object().get("status").assert_string("healthy");
}

#[tokio::test]
async fn test_register_login_me_flow() {
    let (client, _) = test_client().await;
    let id = register(&client, "alice", "student").await;

    let resp = client
        .post("/api/auth/login")
        .form(&[("username", "alice"), ("password", TEST_PASSWORD)])
        .send()
        .await;
    resp.assert_status_is_ok();
    let body = resp.json().await;
    let token = body.value().object().get("access_token").string().to_string();
    body.value().object().get("token_type").assert_string("bearer");
    body.value().object().get("expires_in").assert_i64(30 * 60);

    let resp = client
        .get("/api/auth/me")
        .header("Authorization", bearer(&token))
        .send()
        .await;
    resp.assert_status_is_ok();
    let me = resp.json().await;
    me.value().object().get("id").assert_i64(id);
    me.value().object().get("role").assert_string("student");
    me.value().object().get("is_teacher").assert_bool(false);
}

#[tokio::test]
async fn test_login_by_email_is_accepted() {
    let (client, _) = test_client().await;
    register(&client, "bob", "instructor").await;

    let resp = client
        .post("/api/auth/login")
        .form(&[("username", "bob@example.com"), ("password", TEST_PASSWORD)])
        .send()
        .await;
    resp.assert_status_is_ok();
}

#[tokio::test]
async fn test_bad_login_is_uniform_401() {
    let (client, _) = test_client().await;
    register(&client, "alice", "student").await;

    for (username, password) in [("alice", "wrong-password"), ("nobody", TEST_PASSWORD)] {
        let resp = client
            .post("/api/auth/login")
            .form(&[("username", username), ("password", password)])
            .send()
            .await;
        resp.assert_status(StatusCode::UNAUTHORIZED);
        resp.json()
            .await
            .value()
            .object()
            .get("message")
            .assert_string("Incorrect username or password");
    }
}

#[tokio::test]
async fn test_missing_or_tampered_token_is_401() {
    let (client, _) = test_client().await;
    register(&client, "alice", "student").await;
    let token = login(&client, "alice").await;

    let resp = client.get("/api/auth/me").send().await;
    resp.assert_status(StatusCode::UNAUTHORIZED);

    let resp = client
        .get("/api/auth/me")
        .header("Authorization", bearer(&format!("{}x", token)))
        .send()
        .await;
    resp.assert_status(StatusCode::UNAUTHORIZED);
    resp.json()
        .await
        .value()
        .object()
        .get("message")
        .assert_string("Could not validate credentials");
}

#[tokio::test]
async fn test_registration_rules() {
    let (client, _) = test_client().await;
    register(&client, "alice", "student").await;

    let payload = |username: &str, email: &str, password: &str, role: &str| {
        json!({
            "email": email,
            "username": username,
            "full_name": "Someone",
            "password": password,
            "role": role,
        })
    };

    let resp = client
        .post("/api/auth/register")
        .body_json(&payload("mallory", "mallory@example.com", TEST_PASSWORD, "admin"))
        .send()
        .await;
    resp.assert_status(StatusCode::FORBIDDEN);

    let resp = client
        .post("/api/auth/register")
        .body_json(&payload("alice2", "alice@example.com", TEST_PASSWORD, "student"))
        .send()
        .await;
    resp.assert_status(StatusCode::CONFLICT);
    resp.json()
        .await
        .value()
        .object()
        .get("message")
        .assert_string("Email already registered");

    let resp = client
        .post("/api/auth/register")
        .body_json(&payload("shorty", "shorty@example.com", "short", "student"))
        .send()
        .await;
    resp.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_legacy_teacher_flag_registers_instructor() {
    let (client, _) = test_client().await;

    let resp = client
        .post("/api/auth/register")
        .body_json(&json!({
            "email": "carol@example.com",
            "username": "carol",
            "full_name": "Carol",
            "password": TEST_PASSWORD,
            "is_teacher": true,
        }))
        .send()
        .await;
    resp.assert_status_is_ok();
    let body = resp.json().await;
    body.value().object().get("role").assert_string("instructor");
    body.value().object().get("is_teacher").assert_bool(true);
}

#[tokio::test]
async fn test_change_password() {
    let (client, _) = test_client().await;
    register(&client, "alice", "student").await;
    let token = login(&client, "alice").await;

    let resp = client
        .post("/api/auth/change-password")
        .header("Authorization", bearer(&token))
        .body_json(&json!({"old_password": "not-my-password", "new_password": "brand-new-password"}))
        .send()
        .await;
    resp.assert_status(StatusCode::BAD_REQUEST);

    let resp = client
        .post("/api/auth/change-password")
        .header("Authorization", bearer(&token))
        .body_json(&json!({"old_password": TEST_PASSWORD, "new_password": "brand-new-password"}))
        .send()
        .await;
    resp.assert_status_is_ok();

    let resp = client
        .post("/api/auth/login")
        .form(&[("username", "alice"), ("password", "brand-new-password")])
        .send()
        .await;
    resp.assert_status_is_ok();
}

#[tokio::test]
async fn test_malformed_payload_is_400() {
    let (client, _) = test_client().await;

    let resp = client
        .post("/api/auth/register")
        .content_type("application/json")
        .body("{not json")
        .send()
        .await;
    resp.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_registration_payload_is_validated_before_signup() {
    let (client, _) = test_client().await;

    let invalid = [
        json!({"email": "not an email", "username": "alice", "full_name": "Alice", "password": TEST_PASSWORD}),
        json!({"email": "alice@example.com", "username": "al", "full_name": "Alice", "password": TEST_PASSWORD}),
        json!({"email": "alice@example.com", "username": "alice", "full_name": "", "password": TEST_PASSWORD}),
    ];

    for payload in invalid {
        let resp = client.post("/api/auth/register").body_json(&payload).send().await;
        resp.assert_status(StatusCode::BAD_REQUEST);
    }

    // nothing was created, so the valid variant still registers
    register(&client, "alice", "student").await;
}
