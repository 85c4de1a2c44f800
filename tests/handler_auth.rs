mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};

use common::TestApp;

#[tokio::test]
async fn test_signup_success() {
    let app = TestApp::new();

    let response = app
        .server
        .post("/signup")
        .json(&json!({ "email": "a@b.com", "password": "password1", "username": "alice" }))
        .await;

    response.assert_status(StatusCode::CREATED);

    let json = response.json::<Value>();
    assert_eq!(json["success"], true);
    assert_eq!(json["data"], Value::Null);
    assert_eq!(json["error"], Value::Null);
    assert_eq!(json["msg"], "User created successfully");

    let stored = app.users.get_by_email("a@b.com");
    assert!(stored.is_some());
    assert_ne!(stored.unwrap().password_hash, "password1");
}

#[tokio::test]
async fn test_signup_duplicate_email() {
    let app = TestApp::new();
    let body = json!({ "email": "a@b.com", "password": "password1", "username": "alice" });

    app.server
        .post("/signup")
        .json(&body)
        .await
        .assert_status(StatusCode::CREATED);

    let response = app.server.post("/signup").json(&body).await;

    response.assert_status(StatusCode::CONFLICT);
    let json = response.json::<Value>();
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "Conflict");
    assert_eq!(json["msg"], "A user with this email already exists");
}

#[tokio::test]
async fn test_signup_invalid_body() {
    let app = TestApp::new();

    let response = app
        .server
        .post("/signup")
        .json(&json!({ "email": "a@b.com", "password": "short", "username": "alice" }))
        .await;

    response.assert_status_bad_request();
    let json = response.json::<Value>();
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "Bad Request");

    let response = app
        .server
        .post("/signup")
        .json(&json!({ "email": "a@b.com" }))
        .await;

    response.assert_status_bad_request();
    assert_eq!(response.json::<Value>()["msg"], "Invalid request body");
}

#[tokio::test]
async fn test_signin_returns_token() {
    let app = TestApp::new();
    let token = app.register("a@b.com").await;

    assert_eq!(token.split('.').count(), 3);
}

#[tokio::test]
async fn test_signin_wrong_password() {
    let app = TestApp::new();
    app.register("a@b.com").await;

    let response = app
        .server
        .post("/signin")
        .json(&json!({ "email": "a@b.com", "password": "password2" }))
        .await;

    response.assert_status_unauthorized();
    let json = response.json::<Value>();
    assert_eq!(json["success"], false);
    assert_eq!(json["msg"], "Invalid email or password");
}

#[tokio::test]
async fn test_signin_unknown_email_matches_wrong_password() {
    let app = TestApp::new();

    let response = app
        .server
        .post("/signin")
        .json(&json!({ "email": "nobody@b.com", "password": "password1" }))
        .await;

    response.assert_status_unauthorized();
    assert_eq!(response.json::<Value>()["msg"], "Invalid email or password");
}

#[tokio::test]
async fn test_signin_bad_body_is_unauthorized() {
    let app = TestApp::new();

    let response = app
        .server
        .post("/signin")
        .json(&json!({ "email": "a@b.com" }))
        .await;

    response.assert_status_unauthorized();
    assert_eq!(response.json::<Value>()["msg"], "Invalid request body");

    let response = app
        .server
        .post("/signin")
        .json(&json!({ "email": "not-an-email", "password": "password1" }))
        .await;

    response.assert_status_unauthorized();
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let app = TestApp::new();

    let response = app.server.get("/shortLink").await;

    response.assert_status_unauthorized();
    let json = response.json::<Value>();
    assert_eq!(json["error"], "Unauthorized");
    assert_eq!(json["msg"], "Missing verification token");
}

#[tokio::test]
async fn test_protected_route_rejects_forged_token() {
    let app = TestApp::new();

    let response = app
        .server
        .get("/shortLink")
        .add_header("token", "not.a.jwt")
        .await;

    response.assert_status_unauthorized();
    assert_eq!(
        response.json::<Value>()["msg"],
        "Invalid verification token"
    );
}

#[tokio::test]
async fn test_protected_route_accepts_issued_token() {
    let app = TestApp::new();
    let token = app.register("a@b.com").await;

    let response = app.server.get("/shortLink").add_header("token", token.as_str()).await;

    response.assert_status_ok();
    let json = response.json::<Value>();
    assert_eq!(json["data"], json!([]));
    assert_eq!(json["msg"], "Short links retrieved successfully");
}
