//! Registration and email confirmation over HTTP.

mod common;

use axum::http::StatusCode;
use common::{TestApp, FRONTEND_URL, TEST_PASSWORD};
use serde_json::json;

#[tokio::test]
async fn register_creates_unverified_user_and_sends_link() {
    // Arrange
    let app = TestApp::spawn();

    // Act
    let (status, body) = app
        .post("/user/create/", json!({ "email": "  Jane.Doe@Example.com " }))
        .await;

    // Assert
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["detail"], "User created successfully");

    let user = app
        .user_by_email("jane.doe@example.com")
        .await
        .expect("user should exist");
    assert_eq!(user.username, "jane.doe");
    assert!(!user.email_verified);
    assert!(user.password_hash.is_none());
    assert_eq!(user.email_otp.as_deref().map(str::len), Some(6));

    let message = app.email.last().expect("email should be sent");
    assert_eq!(message.recipients, vec!["jane.doe@example.com".to_string()]);
    assert_eq!(message.subject, "Welcome to Acme");
    assert_eq!(message.msg_purpose, "Confirm Email");
    assert!(message
        .url
        .starts_with(&format!("{}/confirm_email/", FRONTEND_URL)));
}

#[tokio::test]
async fn register_then_confirm_allows_login() {
    let app = TestApp::spawn();
    app.post("/user/create/", json!({ "email": "jane@example.com" }))
        .await;
    let token = app.last_email_token();

    let (status, body) = app
        .post(
            "/user/set_password/",
            json!({ "password": TEST_PASSWORD, "token": token }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["detail"], "Password set successfully");

    let user = app.user_by_email("jane@example.com").await.unwrap();
    assert!(user.email_verified);
    assert!(user.email_otp.is_none());

    let (status, body) = app.login("jane", TEST_PASSWORD, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");
}

#[tokio::test]
async fn confirm_twice_is_conflict() {
    let app = TestApp::spawn();
    app.post("/user/create/", json!({ "email": "jane@example.com" }))
        .await;
    let token = app.last_email_token();
    let body = json!({ "password": TEST_PASSWORD, "token": token });

    let (first, _) = app.post("/user/set_password/", body.clone()).await;
    let (second, detail) = app.post("/user/set_password/", body).await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::CONFLICT);
    assert_eq!(detail["detail"], "Email already verified");
}

#[tokio::test]
async fn confirm_with_stale_otp_is_unauthorized() {
    let app = TestApp::spawn();
    app.post("/user/create/", json!({ "email": "jane@example.com" }))
        .await;
    let stale = app.last_email_token();

    // Forge a challenge with a different code for the same email.
    let forged = app
        .state
        .jwt
        .generate_otp_token(
            "jane@example.com",
            "000001",
            chrono::Utc::now() + chrono::Duration::minutes(5),
        )
        .unwrap();
    assert_ne!(stale, forged);

    let (status, body) = app
        .post(
            "/user/set_password/",
            json!({ "password": TEST_PASSWORD, "token": forged }),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "OTP Code is incorrect");
    assert!(!app.user_by_email("jane@example.com").await.unwrap().email_verified);
}

#[tokio::test]
async fn confirm_with_expired_challenge_is_rejected() {
    let app = TestApp::spawn();
    app.post("/user/create/", json!({ "email": "jane@example.com" }))
        .await;
    let otp = app
        .user_by_email("jane@example.com")
        .await
        .unwrap()
        .email_otp
        .unwrap();

    let expired = app
        .state
        .jwt
        .generate_otp_token(
            "jane@example.com",
            &otp,
            chrono::Utc::now() - chrono::Duration::seconds(1),
        )
        .unwrap();

    let (status, body) = app
        .post(
            "/user/set_password/",
            json!({ "password": TEST_PASSWORD, "token": expired }),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Token expired");
}

#[tokio::test]
async fn confirm_for_unknown_email_is_not_found() {
    let app = TestApp::spawn();
    let token = app
        .state
        .jwt
        .generate_otp_token(
            "ghost@example.com",
            "123456",
            chrono::Utc::now() + chrono::Duration::minutes(5),
        )
        .unwrap();

    let (status, body) = app
        .post(
            "/user/set_password/",
            json!({ "password": TEST_PASSWORD, "token": token }),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "User not found");
}

#[tokio::test]
async fn weak_password_is_rejected_before_any_lookup() {
    let app = TestApp::spawn();
    app.post("/user/create/", json!({ "email": "jane@example.com" }))
        .await;
    let token = app.last_email_token();

    let (status, _) = app
        .post(
            "/user/set_password/",
            json!({ "password": "alllowercase1", "token": token }),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(!app.user_by_email("jane@example.com").await.unwrap().email_verified);
}

#[tokio::test]
async fn duplicate_registration_reports_verification_state() {
    let app = TestApp::spawn();
    app.post("/user/create/", json!({ "email": "jane@example.com" }))
        .await;

    let (status, body) = app
        .post("/user/create/", json!({ "email": "jane@example.com" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["detail"], "Email already exists");

    app.create_user("verified@example.com", None).await;
    let (status, body) = app
        .post("/user/create/", json!({ "email": "verified@example.com" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["detail"], "Email already verified");
}

#[tokio::test]
async fn colliding_local_part_gets_suffixed_username() {
    let app = TestApp::spawn();
    app.post("/user/create/", json!({ "email": "jane@one.com" }))
        .await;

    let (status, _) = app
        .post("/user/create/", json!({ "email": "jane@two.com" }))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    let second = app.user_by_email("jane@two.com").await.unwrap();
    assert!(second.username.starts_with("jane_"));
}

#[tokio::test]
async fn concurrent_insert_race_surfaces_as_conflict() {
    let app = TestApp::spawn();
    app.store
        .fail_next_insert_with_unique_violation("Key (email)=(jane@example.com) already exists.");

    let (status, body) = app
        .post("/user/create/", json!({ "email": "jane@example.com" }))
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["detail"],
        "Unique key constraint fails with Key (email)=(jane@example.com) already exists."
    );
    assert!(app.user_by_email("jane@example.com").await.is_none());
}

#[tokio::test]
async fn failed_email_leaves_no_account_behind() {
    let app = TestApp::spawn();
    app.email.set_failing(true);

    let (status, body) = app
        .post("/user/create/", json!({ "email": "jane@example.com" }))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], "Something went wrong");
    assert!(app.user_by_email("jane@example.com").await.is_none());
}

#[tokio::test]
async fn invalid_email_is_unprocessable() {
    let app = TestApp::spawn();

    let (status, _) = app
        .post("/user/create/", json!({ "email": "not-an-email" }))
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(app.email.sent().is_empty());
}

#[tokio::test]
async fn email_longer_than_100_characters_is_unprocessable() {
    let app = TestApp::spawn();
    let email = format!("{}@{}.example.com", "a".repeat(60), "b".repeat(45));

    let (status, body) = app.post("/user/create/", json!({ "email": email })).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].as_str().unwrap().contains("email"));
    assert!(app.email.sent().is_empty());
    assert!(app.user_by_email(&email).await.is_none());
}
