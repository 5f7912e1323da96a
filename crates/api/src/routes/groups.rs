//! Route definitions for the `/groups` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::groups;
use crate::state::AppState;

/// Routes mounted at `/groups`.
///
/// ```text
/// GET  /                  -> list_groups
/// POST /                  -> create_group
/// POST /{pubid}/members   -> add_member
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(groups::list_groups).post(groups::create_group))
        .route("/{pubid}/members", post(groups::add_member))
}
