//! HTTP-level integration tests for registration, activation and login.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use common::{
    body_json, get_auth, post_json, post_json_auth, FailingMailer, RecordingMailer, AUTHORITY,
    PASSWORD,
};
use memex_db::models::subscription;
use memex_db::repositories::{ActivationRepo, SubscriptionRepo, UserRepo};
use serde_json::json;
use sqlx::PgPool;

fn registration(username: &str) -> serde_json::Value {
    json!({
        "username": username,
        "email": format!("{username}@example.org"),
        "password": PASSWORD,
        "password2": PASSWORD,
    })
}

// ---------------------------------------------------------------------------
// Registration and activation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn register_creates_inactive_user_and_mails_code(pool: PgPool) {
    let mailer = Arc::new(RecordingMailer::default());
    let app = common::build_test_app_with_mailer(pool.clone(), mailer.clone());

    let response = post_json(app, "/api/v1/auth/register", registration("alice")).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert_eq!(json["data"]["userid"], format!("acct:alice@{AUTHORITY}"));
    assert_eq!(json["data"]["is_active"], false);
    assert!(json["data"].get("password_hash").is_none());

    let mail = mailer.last().expect("signup mail should be sent");
    assert_eq!(mail.email, "alice@example.org");

    let activation = ActivationRepo::find_by_user(&pool, mail.user_id)
        .await
        .unwrap()
        .expect("activation row should exist");
    assert_eq!(activation.code, mail.activation_code);
    assert!(activation.activated_at.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn register_subscribes_user_to_reply_notifications(pool: PgPool) {
    let app = common::build_test_app(pool.clone());

    let response = post_json(app, "/api/v1/auth/register", registration("carol")).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let sub = SubscriptionRepo::find(&pool, "acct:carol@example.org", subscription::REPLY)
        .await
        .unwrap()
        .expect("reply subscription should exist");
    assert!(sub.active);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn failed_signup_mail_leaves_no_account_behind(pool: PgPool) {
    let failing = common::build_test_app_with_mailer(pool.clone(), Arc::new(FailingMailer));

    let response = post_json(failing, "/api/v1/auth/register", registration("dave")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(UserRepo::find_by_username(&pool, "dave", AUTHORITY)
        .await
        .unwrap()
        .is_none());
    assert!(SubscriptionRepo::find(&pool, "acct:dave@example.org", subscription::REPLY)
        .await
        .unwrap()
        .is_none());

    // The username is still free once mail works again.
    let mailer = Arc::new(RecordingMailer::default());
    let app = common::build_test_app_with_mailer(pool.clone(), mailer.clone());
    let response = post_json(app, "/api/v1/auth/register", registration("dave")).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(mailer.last().unwrap().email, "dave@example.org");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn activation_enables_login(pool: PgPool) {
    let mailer = Arc::new(RecordingMailer::default());
    let app = common::build_test_app_with_mailer(pool.clone(), mailer.clone());

    post_json(app.clone(), "/api/v1/auth/register", registration("bob")).await;
    let login = json!({ "username": "bob", "password": PASSWORD });

    let before = post_json(app.clone(), "/api/v1/auth/login", login.clone()).await;
    assert_eq!(before.status(), StatusCode::FORBIDDEN);

    let code = mailer.last().unwrap().activation_code;
    let response = post_json(app.clone(), "/api/v1/auth/activate", json!({ "code": code })).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["is_active"], true);

    let after = post_json(app.clone(), "/api/v1/auth/login", login).await;
    assert_eq!(after.status(), StatusCode::OK);

    // Codes are single-use.
    let again = post_json(app, "/api/v1/auth/activate", json!({ "code": code })).await;
    assert_eq!(again.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn mismatched_passwords_are_rejected(pool: PgPool) {
    let app = common::build_test_app(pool);
    let mut body = registration("carol");
    body["password2"] = json!("something else");

    let response = post_json(app, "/api/v1/auth/register", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("Passwords should match!"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn invalid_usernames_are_rejected(pool: PgPool) {
    let app = common::build_test_app(pool);
    for username in ["abc", "has space", "way_too_long_for_a_username_here"] {
        let response = post_json(app.clone(), "/api/v1/auth/register", registration(username)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "username {username:?}");
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn short_password_is_rejected(pool: PgPool) {
    let app = common::build_test_app(pool);
    let body = json!({
        "username": "dave",
        "email": "dave@example.org",
        "password": "short",
        "password2": "short",
    });
    let response = post_json(app, "/api/v1/auth/register", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_username_is_conflict(pool: PgPool) {
    let app = common::build_test_app(pool);
    post_json(app.clone(), "/api/v1/auth/register", registration("erin")).await;

    let mut body = registration("erin");
    body["email"] = json!("other@example.org");
    let response = post_json(app, "/api/v1/auth/register", body).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

// ---------------------------------------------------------------------------
// Login, refresh, logout
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn login_returns_tokens_and_user(pool: PgPool) {
    let user = common::create_active_user(&pool, "frank").await;
    let app = common::build_test_app(pool);

    let json = common::login(app.clone(), "frank").await;
    assert!(json["access_token"].is_string());
    assert!(json["refresh_token"].is_string());
    assert_eq!(json["expires_in"], 15 * 60);
    assert_eq!(json["user"]["id"], user.id);

    let token = json["access_token"].as_str().unwrap();
    let me = get_auth(app, "/api/v1/auth/me", token).await;
    assert_eq!(me.status(), StatusCode::OK);
    assert_eq!(body_json(me).await["data"]["userid"], "acct:frank@example.org");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn wrong_password_is_401(pool: PgPool) {
    common::create_active_user(&pool, "grace").await;
    let app = common::build_test_app(pool);

    let body = json!({ "username": "grace", "password": "incorrect password" });
    let response = post_json(app, "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await["error"],
        "Invalid username or password"
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn wrong_password_on_inactive_account_is_401(pool: PgPool) {
    let app = common::build_test_app(pool);
    post_json(app.clone(), "/api/v1/auth/register", registration("erin")).await;

    let body = json!({ "username": "erin", "password": "incorrect password" });
    let response = post_json(app, "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await["error"],
        "Invalid username or password"
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn deactivated_account_cannot_log_in(pool: PgPool) {
    let user = common::create_active_user(&pool, "heidi").await;
    UserRepo::deactivate(&pool, user.id).await.unwrap();
    let app = common::build_test_app(pool);

    let body = json!({ "username": "heidi", "password": PASSWORD });
    let response = post_json(app, "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn account_locks_after_repeated_failures(pool: PgPool) {
    common::create_active_user(&pool, "ivan").await;
    let app = common::build_test_app(pool);

    let bad = json!({ "username": "ivan", "password": "nope nope nope" });
    for _ in 0..5 {
        let response = post_json(app.clone(), "/api/v1/auth/login", bad.clone()).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    // Even the right password is refused while locked.
    let good = json!({ "username": "ivan", "password": PASSWORD });
    let response = post_json(app, "/api/v1/auth/login", good).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn refresh_rotates_tokens(pool: PgPool) {
    common::create_active_user(&pool, "judy").await;
    let app = common::build_test_app(pool);

    let json = common::login(app.clone(), "judy").await;
    let refresh_token = json["refresh_token"].as_str().unwrap().to_string();

    let body = json!({ "refresh_token": refresh_token });
    let response = post_json(app.clone(), "/api/v1/auth/refresh", body.clone()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let rotated = body_json(response).await;
    assert_ne!(rotated["refresh_token"], refresh_token.as_str());

    let reuse = post_json(app, "/api/v1/auth/refresh", body).await;
    assert_eq!(reuse.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn logout_revokes_refresh_tokens(pool: PgPool) {
    common::create_active_user(&pool, "mallory").await;
    let app = common::build_test_app(pool);

    let json = common::login(app.clone(), "mallory").await;
    let access = json["access_token"].as_str().unwrap();
    let refresh = json["refresh_token"].as_str().unwrap();

    let response = post_json_auth(app.clone(), "/api/v1/auth/logout", json!({}), access).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = post_json(
        app,
        "/api/v1/auth/refresh",
        json!({ "refresh_token": refresh }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
