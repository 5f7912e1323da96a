//! Refresh-token sessions.

use memex_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A refresh token issued at login or by rotation.
#[derive(Debug, Clone, FromRow)]
pub struct RefreshSession {
    pub id: DbId,
    pub user_id: DbId,
    pub expires_at: Timestamp,
    pub revoked_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

pub struct NewRefreshSession {
    pub user_id: DbId,
    /// SHA-256 of the plaintext token handed to the client.
    pub token_hash: String,
    pub expires_at: Timestamp,
}
