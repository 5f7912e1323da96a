/// Primary keys of relational entities (users, documents, groups) are
/// PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// Annotations are keyed by UUID.
pub type AnnotationId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
