//! JWT-based authentication extractors for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use memex_core::acl::{effective_principals, Principal};
use memex_core::types::DbId;
use memex_db::models::annotation::ReadScope;
use memex_db::repositories::GroupRepo;
use memex_db::DbPool;

use crate::auth::jwt::validate_token;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Authenticated user extracted from a JWT Bearer token in the `Authorization` header.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.user_id, userid = %user.userid, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user's internal database id (from `claims.sub`).
    pub user_id: DbId,
    /// The user's `acct:` identifier.
    pub userid: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing Authorization header"))?;

        authenticate(auth_header, state)
    }
}

/// Optional authentication for endpoints anonymous callers may use.
///
/// A missing header yields `MaybeAuthUser(None)`; a present but invalid one
/// is still rejected with 401.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match parts.headers.get("authorization") {
            None => Ok(MaybeAuthUser(None)),
            Some(value) => {
                let header = value
                    .to_str()
                    .map_err(|_| AppError::unauthorized("Malformed Authorization header"))?;
                authenticate(header, state).map(|user| MaybeAuthUser(Some(user)))
            }
        }
    }
}

fn authenticate(auth_header: &str, state: &AppState) -> Result<AuthUser, AppError> {
    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::unauthorized("Invalid Authorization format. Expected: Bearer <token>")
    })?;

    let claims = validate_token(token, &state.config.jwt)
        .map_err(|_| AppError::unauthorized("Invalid or expired token"))?;

    Ok(AuthUser {
        user_id: claims.sub,
        userid: claims.userid,
    })
}

/// Everything the ACL and search need to know about a caller.
#[derive(Debug, Clone)]
pub struct Caller {
    pub principals: Vec<Principal>,
    pub scope: ReadScope,
}

impl Caller {
    /// Resolve the caller's principals, loading group memberships when logged in.
    pub async fn resolve(pool: &DbPool, user: Option<&AuthUser>) -> AppResult<Self> {
        let (userid, groupids) = match user {
            Some(user) => (
                Some(user.userid.clone()),
                GroupRepo::pubids_for_user(pool, user.user_id).await?,
            ),
            None => (None, Vec::new()),
        };
        Ok(Self {
            principals: effective_principals(userid.as_deref(), &groupids),
            scope: ReadScope { userid, groupids },
        })
    }
}
