//! Group model and DTOs.

use memex_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `groups` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Group {
    pub id: DbId,
    pub pubid: String,
    pub name: String,
    pub creator_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a group.
#[derive(Debug)]
pub struct CreateGroup {
    pub pubid: String,
    pub name: String,
    pub creator_id: DbId,
}
