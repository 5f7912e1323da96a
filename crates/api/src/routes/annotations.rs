//! Route definitions for the `/annotations` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::annotations;
use crate::state::AppState;

/// Routes mounted at `/annotations`.
///
/// ```text
/// GET    /               -> search_annotations
/// POST   /               -> create_annotation
/// GET    /{id}           -> get_annotation
/// PATCH  /{id}           -> update_annotation
/// DELETE /{id}           -> delete_annotation
/// GET    /{id}/replies   -> list_replies
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(annotations::search_annotations).post(annotations::create_annotation),
        )
        .route(
            "/{id}",
            get(annotations::get_annotation)
                .patch(annotations::update_annotation)
                .delete(annotations::delete_annotation),
        )
        .route("/{id}/replies", get(annotations::list_replies))
}
