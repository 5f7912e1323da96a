//! Handlers for the `/auth` resource (register, activate, login, refresh, logout, me).

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use memex_core::error::CoreError;
use memex_core::registration::RegistrationForm;
use memex_db::models::session::NewRefreshSession;
use memex_db::models::user::{User, UserResponse};
use memex_db::repositories::{ActivationRepo, SessionRepo, UserRepo};
use serde::{Deserialize, Serialize};

use crate::auth::jwt::{generate_access_token, generate_refresh_token, hash_refresh_token};
use crate::auth::password::verify_password;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::services::signup::SignupService;
use crate::state::AppState;

/// Maximum consecutive failed login attempts before locking the account.
const MAX_FAILED_ATTEMPTS: i32 = 5;

/// Duration in minutes to lock an account after exceeding failed attempts.
const LOCK_DURATION_MINS: i64 = 15;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Request body for `POST /auth/refresh`.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Request body for `POST /auth/activate`.
#[derive(Debug, Deserialize)]
pub struct ActivateRequest {
    pub code: String,
}

/// Successful authentication response returned by login and refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserResponse,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/register
///
/// Create an inactive account. The activation code goes to the mailer.
pub async fn register(
    State(state): State<AppState>,
    Json(form): Json<RegistrationForm>,
) -> AppResult<impl IntoResponse> {
    let service = SignupService::new(
        &state.pool,
        state.mailer.as_ref(),
        &state.config.auth_domain,
        state.config.password_min_length,
    );
    let user = service.signup(&form).await?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: UserResponse::from(&user),
        }),
    ))
}

/// POST /api/v1/auth/activate
///
/// Redeem an activation code and enable the account it belongs to.
pub async fn activate(
    State(state): State<AppState>,
    Json(input): Json<ActivateRequest>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let activation = ActivationRepo::redeem(&state.pool, input.code.trim())
        .await?
        .ok_or_else(|| {
            CoreError::Validation("Unknown or already used activation code".into())
        })?;

    UserRepo::activate(&state.pool, activation.user_id).await?;
    let user = find_user(&state, activation.user_id).await?;

    tracing::info!(user_id = user.id, "Account activated");

    Ok(Json(DataResponse {
        data: UserResponse::from(&user),
    }))
}

/// POST /api/v1/auth/login
///
/// Authenticate with username + password. Returns access and refresh tokens.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let user = UserRepo::find_by_username(&state.pool, &input.username, &state.config.auth_domain)
        .await?
        .ok_or_else(|| AppError::unauthorized("Invalid username or password"))?;

    if let Some(locked_until) = user.locked_until {
        if locked_until > Utc::now() {
            return Err(AppError::forbidden(
                "Account is temporarily locked. Try again later.",
            ));
        }
    }

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;

    if !password_valid {
        UserRepo::increment_failed_login(&state.pool, user.id).await?;

        let new_count = user.failed_login_count + 1;
        if new_count >= MAX_FAILED_ATTEMPTS {
            let lock_until = Utc::now() + chrono::Duration::minutes(LOCK_DURATION_MINS);
            UserRepo::lock_account(&state.pool, user.id, lock_until).await?;
            tracing::warn!(user_id = user.id, "Account locked after repeated login failures");
        }

        return Err(AppError::unauthorized("Invalid username or password"));
    }

    // Only reported once the credentials check out.
    if !user.is_active {
        return Err(AppError::forbidden("Account is not activated"));
    }

    UserRepo::record_successful_login(&state.pool, user.id).await?;

    let tokens = IssuedTokens::mint(&state, &user)?;
    SessionRepo::issue(&state.pool, &tokens.session).await?;
    tracing::info!(user_id = user.id, "User logged in");

    Ok(Json(tokens.into_response(&state, &user)))
}

/// POST /api/v1/auth/refresh
///
/// Exchange a live refresh token for new access + refresh tokens. The
/// presented token is revoked in the same step.
pub async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let invalid = || AppError::unauthorized("Invalid or expired refresh token");

    let session = SessionRepo::find_live(&state.pool, &hash_refresh_token(&input.refresh_token))
        .await?
        .ok_or_else(invalid)?;

    let user = UserRepo::find_by_id(&state.pool, session.user_id)
        .await?
        .ok_or_else(|| AppError::unauthorized("User no longer exists"))?;

    if !user.is_active {
        return Err(AppError::forbidden("Account is deactivated"));
    }

    let tokens = IssuedTokens::mint(&state, &user)?;
    SessionRepo::rotate(&state.pool, session.id, &tokens.session)
        .await?
        .ok_or_else(invalid)?;

    Ok(Json(tokens.into_response(&state, &user)))
}

/// POST /api/v1/auth/logout
///
/// Revoke every refresh session of the authenticated user. Returns 204 No Content.
pub async fn logout(State(state): State<AppState>, auth_user: AuthUser) -> AppResult<StatusCode> {
    let revoked = SessionRepo::revoke_all_for_user(&state.pool, auth_user.user_id).await?;
    tracing::info!(user_id = auth_user.user_id, revoked, "User logged out");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/auth/me
pub async fn me(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let user = find_user(&state, auth_user.user_id).await?;
    Ok(Json(DataResponse {
        data: UserResponse::from(&user),
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_user(state: &AppState, user_id: memex_core::types::DbId) -> AppResult<User> {
    UserRepo::find_by_id(&state.pool, user_id)
        .await?
        .ok_or_else(|| CoreError::not_found("User", user_id).into())
}

/// Access and refresh tokens for a user, with the session row that will
/// back the refresh token once stored.
struct IssuedTokens {
    access_token: String,
    refresh_token: String,
    session: NewRefreshSession,
}

impl IssuedTokens {
    fn mint(state: &AppState, user: &User) -> AppResult<Self> {
        let access_token = generate_access_token(user.id, &user.userid(), &state.config.jwt)
            .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;
        let (refresh_token, token_hash) = generate_refresh_token();
        let expires_at =
            Utc::now() + chrono::Duration::days(state.config.jwt.refresh_token_expiry_days);

        Ok(Self {
            access_token,
            refresh_token,
            session: NewRefreshSession {
                user_id: user.id,
                token_hash,
                expires_at,
            },
        })
    }

    fn into_response(self, state: &AppState, user: &User) -> AuthResponse {
        AuthResponse {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_in: state.config.jwt.access_token_expiry_mins * 60,
            user: UserResponse::from(user),
        }
    }
}
