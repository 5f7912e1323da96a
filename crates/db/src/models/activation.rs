//! Account activation model.

use memex_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `activations` table.
#[derive(Debug, Clone, FromRow)]
pub struct Activation {
    pub id: DbId,
    pub user_id: DbId,
    pub code: String,
    pub activated_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
