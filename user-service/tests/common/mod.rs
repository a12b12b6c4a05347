//! Test helper module for user-service integration tests.
//!
//! Builds the full router over the in-memory store and a recording email
//! provider, and drives it with `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use jsonwebtoken::Algorithm;
use secrecy::SecretString;
use serde_json::Value;
use std::sync::Arc;
use tower::util::ServiceExt;
use user_service::{
    build_router,
    config::{
        DatabaseConfig, EmailConfig, Environment, JwtConfig, OnboardingConfig, SecurityConfig,
        UserServiceConfig,
    },
    models::{NewUser, RoleName, User},
    services::{EmailProvider, MockEmailService, MockStore, Store},
    utils::{hash_password, Password},
    AppState,
};

pub const TEST_SECRET_KEY: &str = "test-secret-key-for-user-service";
pub const TEST_PASSWORD: &str = "Str0ng!Pass";
pub const FRONTEND_URL: &str = "http://localhost:3000";

pub fn test_config() -> UserServiceConfig {
    UserServiceConfig {
        common: service_core::config::Config { port: 8080 },
        environment: Environment::Dev,
        service_name: "user-service-test".to_string(),
        service_version: "0.0.0-test".to_string(),
        log_level: "error".to_string(),
        otlp_endpoint: None,
        database: DatabaseConfig {
            url: SecretString::new("postgres://unused".to_string()),
            max_connections: 1,
            min_connections: 1,
            acquire_timeout_seconds: 1,
        },
        jwt: JwtConfig {
            secret_key: SecretString::new(TEST_SECRET_KEY.to_string()),
            algorithm: Algorithm::HS256,
            access_token_expiry_minutes: 30,
        },
        email: EmailConfig {
            host: "localhost".to_string(),
            port: 587,
            username: String::new(),
            password: SecretString::new(String::new()),
            from_email: "no-reply@localhost".to_string(),
            from_name: "Test".to_string(),
        },
        security: SecurityConfig {
            allowed_origins: vec![FRONTEND_URL.to_string()],
            allowed_methods: vec!["*".to_string()],
            allowed_headers: vec!["*".to_string()],
        },
        onboarding: OnboardingConfig {
            otp_expiry_minutes: 5,
            company_name: "Acme".to_string(),
            frontend_url: FRONTEND_URL.to_string(),
        },
    }
}

/// Router plus handles on the fakes behind it.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MockStore>,
    pub email: Arc<MockEmailService>,
}

impl TestApp {
    pub fn spawn() -> Self {
        let store = Arc::new(MockStore::with_seeded_roles());
        let email = Arc::new(MockEmailService::new());

        let state = AppState::new(
            test_config(),
            store.clone() as Arc<dyn Store>,
            email.clone() as Arc<dyn EmailProvider>,
        );
        let router = build_router(state.clone()).expect("Failed to build router");

        TestApp {
            router,
            state,
            store,
            email,
        }
    }

    pub async fn request(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("Response body is not JSON")
        };

        (status, body)
    }

    /// Sends a JSON request, optionally with a bearer token.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        self.request(request).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body), None).await
    }

    /// Form-encoded login, optionally asking for a subset of scopes.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        scope: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut fields = vec![("username", username), ("password", password)];
        if let Some(scope) = scope {
            fields.push(("scope", scope));
        }
        let form = serde_urlencoded::to_string(&fields).expect("Failed to encode form");

        let request = Request::builder()
            .method(Method::POST)
            .uri("/login/")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form))
            .expect("Failed to build request");

        self.request(request).await
    }

    pub async fn role_id(&self, role: RoleName) -> i32 {
        self.store
            .list_roles()
            .await
            .expect("Failed to list roles")
            .into_iter()
            .find(|r| r.role_name == role)
            .map(|r| r.id)
            .expect("Role is not seeded")
    }

    /// Inserts a verified user with `TEST_PASSWORD`, bypassing the email flow.
    pub async fn create_user(&self, email: &str, role: Option<RoleName>) -> User {
        let username = email.split('@').next().unwrap_or(email).to_string();
        let user = self
            .store
            .insert_user(&NewUser {
                email: email.to_string(),
                username,
                email_otp: "000000".to_string(),
            })
            .await
            .expect("Failed to insert user");

        let hash = hash_password(&Password::new(TEST_PASSWORD.to_string()))
            .expect("Failed to hash password");
        assert!(self
            .store
            .complete_email_verification(user.id, "000000", hash.as_str())
            .await
            .expect("Failed to verify user"));

        if let Some(role) = role {
            let role_id = self.role_id(role).await;
            assert!(self
                .store
                .set_user_role(user.id, role_id)
                .await
                .expect("Failed to set role"));
        }

        self.store
            .find_user_by_id(user.id)
            .await
            .expect("Failed to reload user")
            .expect("User vanished")
    }

    /// Creates a user with `role` and logs them in.
    pub async fn user_with_token(&self, email: &str, role: Option<RoleName>) -> (User, String) {
        let user = self.create_user(email, role).await;
        let (status, body) = self.login(&user.username, TEST_PASSWORD, None).await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);

        let token = body["access_token"]
            .as_str()
            .expect("access_token missing")
            .to_string();
        (user, token)
    }

    /// Challenge token from the link in the most recent email.
    pub fn last_email_token(&self) -> String {
        let message = self.email.last().expect("No email was sent");
        message
            .url
            .rsplit('/')
            .next()
            .expect("Link has no token")
            .to_string()
    }

    pub async fn store_user(&self, id: i32) -> User {
        self.store
            .find_user_by_id(id)
            .await
            .expect("Failed to query user")
            .expect("User not found")
    }

    pub async fn store_role_count(&self) -> usize {
        self.store
            .list_roles()
            .await
            .expect("Failed to list roles")
            .len()
    }

    pub async fn user_by_email(&self, email: &str) -> Option<User> {
        self.store
            .find_user_by_email(email)
            .await
            .expect("Failed to query user")
    }
}
