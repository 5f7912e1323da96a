use axum::routing::get;
use axum::Router;

use crate::handlers::embed;
use crate::state::AppState;

/// Mount the client loader at `/embed.js` (root level).
pub fn router() -> Router<AppState> {
    Router::new().route("/embed.js", get(embed::embed_js))
}
