//! Repository for the `annotation` table.

use memex_core::annotation::Annotation;
use memex_core::types::AnnotationId;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::annotation::{AnnotationRow, AnnotationSearch, ReadScope};

/// Column list shared across queries. `references` is a reserved word and
/// must stay quoted.
const COLUMNS: &str = "id, created, updated, userid, groupid, text, text_rendered, tags, \
    shared, target_uri, target_uri_normalized, target_selectors, \"references\", extra, \
    document_id";

/// SQL mirror of the annotation ACL's read rule, bound to `$1` (caller
/// userid, nullable) and `$2` (caller group ids).
///
/// Shared annotations are readable by the group principal (everyone for the
/// public group); private ones only by their owner.
const READABLE: &str = "((shared AND (groupid = '__world__' OR groupid = ANY($2::TEXT[]))) \
    OR (NOT shared AND userid = $1))";

/// Provides CRUD and search operations for annotations.
pub struct AnnotationRepo;

impl AnnotationRepo {
    /// Insert a new annotation, returning the stored row.
    pub async fn create(pool: &PgPool, annotation: &Annotation) -> Result<Annotation, sqlx::Error> {
        let query = format!(
            "INSERT INTO annotation
                (id, created, updated, userid, groupid, text, text_rendered, tags, shared,
                 target_uri, target_uri_normalized, target_selectors, \"references\", extra,
                 document_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, AnnotationRow>(&query)
            .bind(annotation.id())
            .bind(annotation.created())
            .bind(annotation.updated())
            .bind(annotation.userid())
            .bind(annotation.groupid())
            .bind(annotation.text())
            .bind(annotation.text_rendered())
            .bind(annotation.tags())
            .bind(annotation.shared())
            .bind(annotation.target_uri())
            .bind(annotation.target_uri_normalized())
            .bind(Json(annotation.target_selectors()))
            .bind(annotation.references())
            .bind(Json(annotation.extra()))
            .bind(annotation.document_id())
            .fetch_one(pool)
            .await?;
        Ok(row.into_domain())
    }

    /// Find an annotation by id.
    pub async fn find_by_id(
        pool: &PgPool,
        id: AnnotationId,
    ) -> Result<Option<Annotation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM annotation WHERE id = $1");
        let row = sqlx::query_as::<_, AnnotationRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(AnnotationRow::into_domain))
    }

    /// Persist the mutable columns of an edited annotation.
    ///
    /// `userid`, `groupid`, `references` and `created` are never rewritten.
    /// Returns `None` if the row no longer exists.
    pub async fn update(
        pool: &PgPool,
        annotation: &Annotation,
    ) -> Result<Option<Annotation>, sqlx::Error> {
        let query = format!(
            "UPDATE annotation SET
                updated = $2,
                text = $3,
                text_rendered = $4,
                tags = $5,
                shared = $6,
                target_uri = $7,
                target_uri_normalized = $8,
                target_selectors = $9,
                extra = $10,
                document_id = $11
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, AnnotationRow>(&query)
            .bind(annotation.id())
            .bind(annotation.updated())
            .bind(annotation.text())
            .bind(annotation.text_rendered())
            .bind(annotation.tags())
            .bind(annotation.shared())
            .bind(annotation.target_uri())
            .bind(annotation.target_uri_normalized())
            .bind(Json(annotation.target_selectors()))
            .bind(Json(annotation.extra()))
            .bind(annotation.document_id())
            .fetch_optional(pool)
            .await?;
        Ok(row.map(AnnotationRow::into_domain))
    }

    /// Delete an annotation by id. Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: AnnotationId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM annotation WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Search annotations readable within `scope`, most recently updated first.
    pub async fn search(
        pool: &PgPool,
        filters: &AnnotationSearch,
        scope: &ReadScope,
    ) -> Result<Vec<Annotation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM annotation
             WHERE {READABLE}
               AND ($3::TEXT IS NULL OR target_uri_normalized = $3)
               AND ($4::TEXT IS NULL OR userid = $4)
               AND ($5::TEXT IS NULL OR groupid = $5)
               AND (cardinality($6::TEXT[]) = 0 OR tags @> $6::TEXT[])
             ORDER BY updated DESC, id DESC
             LIMIT $7 OFFSET $8"
        );
        let rows = sqlx::query_as::<_, AnnotationRow>(&query)
            .bind(&scope.userid)
            .bind(&scope.groupids)
            .bind(&filters.uri_normalized)
            .bind(&filters.userid)
            .bind(&filters.groupid)
            .bind(&filters.tags)
            .bind(filters.limit)
            .bind(filters.offset)
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().map(AnnotationRow::into_domain).collect())
    }

    /// Count the annotations [`search`](Self::search) would return without
    /// paging.
    pub async fn count(
        pool: &PgPool,
        filters: &AnnotationSearch,
        scope: &ReadScope,
    ) -> Result<i64, sqlx::Error> {
        let query = format!(
            "SELECT COUNT(*) FROM annotation
             WHERE {READABLE}
               AND ($3::TEXT IS NULL OR target_uri_normalized = $3)
               AND ($4::TEXT IS NULL OR userid = $4)
               AND ($5::TEXT IS NULL OR groupid = $5)
               AND (cardinality($6::TEXT[]) = 0 OR tags @> $6::TEXT[])"
        );
        let (total,): (i64,) = sqlx::query_as(&query)
            .bind(&scope.userid)
            .bind(&scope.groupids)
            .bind(&filters.uri_normalized)
            .bind(&filters.userid)
            .bind(&filters.groupid)
            .bind(&filters.tags)
            .fetch_one(pool)
            .await?;
        Ok(total)
    }

    /// List readable replies anywhere below `thread_root`, oldest first.
    pub async fn list_replies(
        pool: &PgPool,
        thread_root: AnnotationId,
        scope: &ReadScope,
    ) -> Result<Vec<Annotation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM annotation
             WHERE {READABLE}
               AND \"references\" @> ARRAY[$3::UUID]
             ORDER BY created ASC, id ASC"
        );
        let rows = sqlx::query_as::<_, AnnotationRow>(&query)
            .bind(&scope.userid)
            .bind(&scope.groupids)
            .bind(thread_root)
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().map(AnnotationRow::into_domain).collect())
    }
}
