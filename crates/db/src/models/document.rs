//! Document model and DTOs.

use memex_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `document` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Document {
    pub id: DbId,
    pub title: Option<String>,
    pub web_uri: String,
    pub uri_normalized: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for finding or creating a document by its normalized URI.
#[derive(Debug)]
pub struct UpsertDocument {
    pub title: Option<String>,
    pub web_uri: String,
    pub uri_normalized: String,
}
