//! Repository for the `document` table.

use memex_core::types::DbId;
use sqlx::PgPool;

use crate::models::document::{Document, UpsertDocument};

const COLUMNS: &str = "id, title, web_uri, uri_normalized, created_at, updated_at";

/// Provides lookup and upsert operations for documents.
pub struct DocumentRepo;

impl DocumentRepo {
    /// Return the document for `input.uri_normalized`, creating it if needed.
    ///
    /// An existing document keeps its title unless it has none yet.
    pub async fn find_or_create(
        pool: &PgPool,
        input: &UpsertDocument,
    ) -> Result<Document, sqlx::Error> {
        let query = format!(
            "INSERT INTO document (title, web_uri, uri_normalized)
             VALUES ($1, $2, $3)
             ON CONFLICT ON CONSTRAINT uq_document_uri_normalized DO UPDATE
                SET title = COALESCE(document.title, EXCLUDED.title)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Document>(&query)
            .bind(&input.title)
            .bind(&input.web_uri)
            .bind(&input.uri_normalized)
            .fetch_one(pool)
            .await
    }

    /// Find a document by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Document>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM document WHERE id = $1");
        sqlx::query_as::<_, Document>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a document by its normalized URI.
    pub async fn find_by_uri(
        pool: &PgPool,
        uri_normalized: &str,
    ) -> Result<Option<Document>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM document WHERE uri_normalized = $1");
        sqlx::query_as::<_, Document>(&query)
            .bind(uri_normalized)
            .fetch_optional(pool)
            .await
    }
}
