pub mod annotations;
pub mod auth;
pub mod embed;
pub mod groups;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/register                 register (public)
/// /auth/activate                 activate account (public)
/// /auth/login                    login (public)
/// /auth/refresh                  refresh (public)
/// /auth/logout                   logout (requires auth)
/// /auth/me                       current user (requires auth)
///
/// /annotations                   search (optional auth), create
/// /annotations/{id}              get, update, delete
/// /annotations/{id}/replies      readable replies
///
/// /groups                        list own, create
/// /groups/{pubid}/members        add member
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/annotations", annotations::router())
        .nest("/groups", groups::router())
}
