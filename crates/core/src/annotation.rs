//! The annotation entity.
//!
//! Derived columns (`text_rendered`, `target_uri_normalized`) are private and
//! only change through the setters of their source fields, so a value of
//! [`Annotation`] can never hold a stale rendering or normalization.

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::acl::{self, Acl, PUBLIC_GROUP};
use crate::error::CoreError;
use crate::markdown;
use crate::types::{AnnotationId, DbId, Timestamp};
use crate::uri;

/// Maximum length of a single tag.
pub const MAX_TAG_LENGTH: usize = 64;

/// Maximum number of tags on one annotation.
pub const MAX_TAGS: usize = 50;

/// Input for creating a brand new annotation.
#[derive(Debug, Clone)]
pub struct NewAnnotation {
    pub userid: String,
    pub groupid: Option<String>,
    pub text: Option<String>,
    pub tags: Vec<String>,
    pub shared: bool,
    pub target_uri: String,
    pub target_selectors: Vec<Value>,
    pub references: Vec<AnnotationId>,
    pub extra: Map<String, Value>,
    pub document_id: DbId,
}

/// Every stored column, used to rehydrate an annotation read from the
/// database.
#[derive(Debug, Clone)]
pub struct StoredAnnotation {
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
    pub target_selectors: Vec<Value>,
    pub references: Vec<AnnotationId>,
    pub extra: Map<String, Value>,
    pub document_id: DbId,
}

/// A partial edit. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct AnnotationChanges {
    /// `Some(None)` clears the body.
    pub text: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub shared: Option<bool>,
    pub target_uri: Option<String>,
    pub target_selectors: Option<Vec<Value>>,
    pub extra: Option<Map<String, Value>>,
}

impl AnnotationChanges {
    pub fn is_empty(&self) -> bool {
        self.text.is_none()
            && self.tags.is_none()
            && self.shared.is_none()
            && self.target_uri.is_none()
            && self.target_selectors.is_none()
            && self.extra.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    id: AnnotationId,
    created: Timestamp,
    updated: Timestamp,
    userid: String,
    groupid: String,
    text: Option<String>,
    text_rendered: Option<String>,
    tags: Vec<String>,
    shared: bool,
    target_uri: String,
    target_uri_normalized: String,
    target_selectors: Vec<Value>,
    references: Vec<AnnotationId>,
    extra: Map<String, Value>,
    document_id: DbId,
}

impl Annotation {
    /// Create a new annotation with a fresh id and timestamps.
    pub fn new(input: NewAnnotation) -> Result<Self, CoreError> {
        if input.target_uri.trim().is_empty() {
            return Err(CoreError::Validation("uri must not be blank".to_string()));
        }
        validate_selectors(&input.target_selectors)?;

        let now = chrono::Utc::now();
        let mut annotation = Self {
            id: Uuid::now_v7(),
            created: now,
            updated: now,
            userid: input.userid,
            groupid: input.groupid.unwrap_or_else(|| PUBLIC_GROUP.to_string()),
            text: None,
            text_rendered: None,
            tags: clean_tags(input.tags)?,
            shared: input.shared,
            target_uri: String::new(),
            target_uri_normalized: String::new(),
            target_selectors: input.target_selectors,
            references: input.references,
            extra: input.extra,
            document_id: input.document_id,
        };
        annotation.set_text(input.text);
        annotation.set_target_uri(input.target_uri);
        Ok(annotation)
    }

    /// Rebuild an annotation from its stored columns.
    ///
    /// Derived columns are taken as stored; they were computed by the setters
    /// when the row was written.
    pub fn restore(stored: StoredAnnotation) -> Self {
        Self {
            id: stored.id,
            created: stored.created,
            updated: stored.updated,
            userid: stored.userid,
            groupid: stored.groupid,
            text: stored.text,
            text_rendered: stored.text_rendered,
            tags: stored.tags,
            shared: stored.shared,
            target_uri: stored.target_uri,
            target_uri_normalized: stored.target_uri_normalized,
            target_selectors: stored.target_selectors,
            references: stored.references,
            extra: stored.extra,
            document_id: stored.document_id,
        }
    }

    pub fn id(&self) -> AnnotationId {
        self.id
    }

    pub fn created(&self) -> Timestamp {
        self.created
    }

    pub fn updated(&self) -> Timestamp {
        self.updated
    }

    pub fn userid(&self) -> &str {
        &self.userid
    }

    pub fn groupid(&self) -> &str {
        &self.groupid
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn text_rendered(&self) -> Option<&str> {
        self.text_rendered.as_deref()
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn shared(&self) -> bool {
        self.shared
    }

    pub fn target_uri(&self) -> &str {
        &self.target_uri
    }

    pub fn target_uri_normalized(&self) -> &str {
        &self.target_uri_normalized
    }

    pub fn target_selectors(&self) -> &[Value] {
        &self.target_selectors
    }

    pub fn references(&self) -> &[AnnotationId] {
        &self.references
    }

    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    pub fn document_id(&self) -> DbId {
        self.document_id
    }

    /// Set the body, re-rendering `text_rendered`.
    pub fn set_text(&mut self, text: Option<String>) {
        self.text_rendered = markdown::render(text.as_deref());
        self.text = text;
    }

    /// Set the target URI, re-normalizing `target_uri_normalized`.
    pub fn set_target_uri(&mut self, target_uri: String) {
        self.target_uri_normalized = uri::normalize(&target_uri);
        self.target_uri = target_uri;
    }

    /// Point the annotation at another document row.
    pub fn set_document_id(&mut self, document_id: DbId) {
        self.document_id = document_id;
    }

    /// Apply a partial edit and bump `updated`.
    ///
    /// Validation happens before any field is touched, so a failed edit
    /// leaves the annotation unchanged.
    pub fn apply(&mut self, changes: AnnotationChanges) -> Result<(), CoreError> {
        let tags = changes.tags.map(clean_tags).transpose()?;
        if let Some(selectors) = &changes.target_selectors {
            validate_selectors(selectors)?;
        }
        if let Some(target_uri) = &changes.target_uri {
            if target_uri.trim().is_empty() {
                return Err(CoreError::Validation("uri must not be blank".to_string()));
            }
        }

        if let Some(text) = changes.text {
            self.set_text(text);
        }
        if let Some(tags) = tags {
            self.tags = tags;
        }
        if let Some(shared) = changes.shared {
            self.shared = shared;
        }
        if let Some(target_uri) = changes.target_uri {
            self.set_target_uri(target_uri);
        }
        if let Some(selectors) = changes.target_selectors {
            self.target_selectors = selectors;
        }
        if let Some(extra) = changes.extra {
            self.extra = extra;
        }
        self.updated = chrono::Utc::now();
        Ok(())
    }

    /// Id of the annotation this one replies to, if any.
    pub fn parent_id(&self) -> Option<AnnotationId> {
        self.references.last().copied()
    }

    /// Id of the first annotation in this annotation's thread. That is this
    /// annotation's own id when it is not a reply.
    pub fn thread_root_id(&self) -> AnnotationId {
        self.references.first().copied().unwrap_or(self.id)
    }

    pub fn is_reply(&self) -> bool {
        !self.references.is_empty()
    }

    pub fn acl(&self) -> Acl {
        acl::annotation_acl(self.shared, &self.groupid, &self.userid)
    }
}

/// Trim tags, drop blanks and duplicates, enforce length limits.
pub fn clean_tags(tags: Vec<String>) -> Result<Vec<String>, CoreError> {
    let mut cleaned: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() || cleaned.iter().any(|t| t == tag) {
            continue;
        }
        if tag.chars().count() > MAX_TAG_LENGTH {
            return Err(CoreError::Validation(format!(
                "tag '{tag}' is longer than {MAX_TAG_LENGTH} characters"
            )));
        }
        cleaned.push(tag.to_string());
    }
    if cleaned.len() > MAX_TAGS {
        return Err(CoreError::Validation(format!(
            "an annotation may carry at most {MAX_TAGS} tags"
        )));
    }
    Ok(cleaned)
}

/// Every selector must be a JSON object carrying a string `type`.
pub fn validate_selectors(selectors: &[Value]) -> Result<(), CoreError> {
    for (i, selector) in selectors.iter().enumerate() {
        let obj = selector.as_object().ok_or_else(|| {
            CoreError::Validation(format!("target selector[{i}] must be a JSON object"))
        })?;
        if !obj.get("type").is_some_and(Value::is_string) {
            return Err(CoreError::Validation(format!(
                "target selector[{i}] is missing a string 'type'"
            )));
        }
    }
    Ok(())
}
