#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use memex_api::auth::jwt::JwtConfig;
use memex_api::auth::password::hash_password;
use memex_api::config::{EmbedConfig, ServerConfig};
use memex_api::mailer::Mailer;
use memex_api::router::build_app_router;
use memex_api::state::AppState;
use memex_core::error::CoreError;
use memex_core::types::DbId;
use memex_db::models::user::{CreateUser, User};
use memex_db::repositories::UserRepo;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;

pub const AUTHORITY: &str = "example.org";
pub const PASSWORD: &str = "correct horse battery";

/// A signup mail captured by [`RecordingMailer`].
#[derive(Debug, Clone)]
pub struct SentMail {
    pub user_id: DbId,
    pub email: String,
    pub activation_code: String,
}

/// Mailer that keeps every message in memory.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<SentMail>>,
}

impl RecordingMailer {
    pub fn last(&self) -> Option<SentMail> {
        self.sent.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_signup(
        &self,
        user_id: DbId,
        email: &str,
        activation_code: &str,
    ) -> Result<(), CoreError> {
        self.sent.lock().unwrap().push(SentMail {
            user_id,
            email: email.to_string(),
            activation_code: activation_code.to_string(),
        });
        Ok(())
    }
}

/// Mailer whose delivery always fails.
#[derive(Debug, Default)]
pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send_signup(&self, _: DbId, _: &str, _: &str) -> Result<(), CoreError> {
        Err(CoreError::Internal("mail transport unavailable".to_string()))
    }
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        auth_domain: AUTHORITY.to_string(),
        password_min_length: 8,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
            refresh_token_expiry_days: 7,
        },
        embed: EmbedConfig {
            script_urls: vec!["/assets/scripts/client.js".to_string()],
            style_urls: vec!["/assets/styles/client.css".to_string()],
        },
    }
}

/// Build the full application router, as `main.rs` does, over `pool`.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_mailer(pool, Arc::new(RecordingMailer::default()))
}

pub fn build_test_app_with_mailer(pool: PgPool, mailer: Arc<dyn Mailer>) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        mailer,
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Insert an activated user with [`PASSWORD`].
pub async fn create_active_user(pool: &PgPool, username: &str) -> User {
    let input = CreateUser {
        username: username.to_string(),
        email: format!("{username}@example.org"),
        password_hash: hash_password(PASSWORD).unwrap(),
        authority: AUTHORITY.to_string(),
    };
    let user = UserRepo::create(pool, &input).await.unwrap();
    UserRepo::activate(pool, user.id).await.unwrap();
    UserRepo::find_by_id(pool, user.id).await.unwrap().unwrap()
}

/// Log in through the API and return the full auth response.
pub async fn login(app: Router, username: &str) -> Value {
    let body = serde_json::json!({ "username": username, "password": PASSWORD });
    let response = post_json(app, "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

/// Create an active user and return their access token.
pub async fn user_token(pool: &PgPool, app: Router, username: &str) -> String {
    create_active_user(pool, username).await;
    let json = login(app, username).await;
    json["access_token"].as_str().unwrap().to_string()
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response {
    send(app, Method::POST, uri, None, Some(body)).await
}

pub async fn post_json_auth(app: Router, uri: &str, body: Value, token: &str) -> Response {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn patch_json_auth(app: Router, uri: &str, body: Value, token: &str) -> Response {
    send(app, Method::PATCH, uri, Some(token), Some(body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, Method::DELETE, uri, Some(token), None).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
