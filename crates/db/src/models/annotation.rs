//! Annotation row model and search filters.

use memex_core::annotation::{Annotation, StoredAnnotation};
use memex_core::types::{AnnotationId, DbId, Timestamp};
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `annotation` table.
#[derive(Debug, Clone, FromRow)]
pub struct AnnotationRow {
    pub id: AnnotationId,
    pub created: Timestamp,
    pub updated: Timestamp,
    pub userid: String,
    pub groupid: String,
    pub text: Option<String>,
    pub text_rendered: Option<String>,
    pub tags: Vec<String>,
    pub shared: bool,
    pub target_uri: String,
    pub target_uri_normalized: String,
    pub target_selectors: Json<Vec<Value>>,
    pub references: Vec<AnnotationId>,
    pub extra: Json<Map<String, Value>>,
    pub document_id: DbId,
}

impl AnnotationRow {
    pub fn into_domain(self) -> Annotation {
        Annotation::restore(StoredAnnotation {
            id: self.id,
            created: self.created,
            updated: self.updated,
            userid: self.userid,
            groupid: self.groupid,
            text: self.text,
            text_rendered: self.text_rendered,
            tags: self.tags,
            shared: self.shared,
            target_uri: self.target_uri,
            target_uri_normalized: self.target_uri_normalized,
            target_selectors: self.target_selectors.0,
            references: self.references,
            extra: self.extra.0,
            document_id: self.document_id,
        })
    }
}

/// Who is asking. Search results only include annotations whose ACL grants
/// `read` to these principals.
#[derive(Debug, Clone, Default)]
pub struct ReadScope {
    pub userid: Option<String>,
    pub groupids: Vec<String>,
}

/// Filters for [`AnnotationRepo::search`](crate::repositories::AnnotationRepo::search).
#[derive(Debug, Clone, Default)]
pub struct AnnotationSearch {
    /// Already normalized target URI.
    pub uri_normalized: Option<String>,
    pub userid: Option<String>,
    pub groupid: Option<String>,
    /// Every listed tag must be present.
    pub tags: Vec<String>,
    pub limit: i64,
    pub offset: i64,
}
