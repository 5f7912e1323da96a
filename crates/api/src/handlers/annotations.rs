//! Handlers for the `/annotations` resource.
//!
//! Every read, update and delete is decided by the annotation's ACL evaluated
//! against the caller's effective principals. Callers who may not read an
//! annotation get a 404 so its existence is not revealed.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use memex_core::acl::{allowed_principals, permits, Action, Principal, PUBLIC_GROUP};
use memex_core::annotation::{Annotation, AnnotationChanges, NewAnnotation};
use memex_core::error::CoreError;
use memex_core::ids;
use memex_core::types::{AnnotationId, DbId, Timestamp};
use memex_core::uri::normalize;
use memex_core::userid::{format_userid, split_userid};
use memex_db::models::annotation::AnnotationSearch;
use memex_db::models::document::UpsertDocument;
use memex_db::repositories::{AnnotationRepo, DocumentRepo, GroupRepo};
use memex_db::DbPool;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthUser, Caller, MaybeAuthUser};
use crate::response::{DataResponse, PagedResponse};
use crate::state::AppState;

/// Page size when the caller does not ask for one.
pub const DEFAULT_LIMIT: i64 = 20;
/// Largest page a caller may request.
pub const MAX_LIMIT: i64 = 200;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// One entry of an annotation's `target` list.
#[derive(Debug, Deserialize)]
pub struct TargetInput {
    #[serde(default)]
    pub selector: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct DocumentInput {
    pub title: Option<String>,
}

/// Request body for `POST /annotations`.
#[derive(Debug, Deserialize)]
pub struct CreateAnnotationRequest {
    pub uri: String,
    pub text: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub group: Option<String>,
    #[serde(default)]
    pub shared: bool,
    #[serde(default)]
    pub target: Vec<TargetInput>,
    /// Url-safe ids of the ancestors, root first.
    #[serde(default)]
    pub references: Vec<String>,
    pub document: Option<DocumentInput>,
    pub extra: Option<Value>,
}

/// Request body for `PATCH /annotations/{id}`. Absent fields are left alone;
/// `"text": null` clears the body.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateAnnotationRequest {
    #[serde(default, deserialize_with = "double_option")]
    pub text: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub shared: Option<bool>,
    pub uri: Option<String>,
    pub target: Option<Vec<TargetInput>>,
    pub document: Option<DocumentInput>,
    pub extra: Option<Value>,
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct TargetView {
    pub source: String,
    pub selector: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub struct DocumentView {
    pub title: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PermissionsView {
    pub read: Vec<Principal>,
    pub admin: Vec<Principal>,
    pub update: Vec<Principal>,
    pub delete: Vec<Principal>,
}

/// External representation of an annotation.
#[derive(Debug, Serialize)]
pub struct AnnotationView {
    #[serde(with = "ids::serde_id")]
    pub id: AnnotationId,
    pub created: Timestamp,
    pub updated: Timestamp,
    pub user: String,
    pub group: String,
    pub uri: String,
    pub text: Option<String>,
    pub text_rendered: Option<String>,
    pub tags: Vec<String>,
    pub shared: bool,
    pub target: Vec<TargetView>,
    #[serde(with = "ids::serde_ids")]
    pub references: Vec<AnnotationId>,
    pub document: DocumentView,
    pub permissions: PermissionsView,
    pub extra: Map<String, Value>,
}

impl AnnotationView {
    pub fn new(annotation: &Annotation, document_title: Option<String>) -> Self {
        let acl = annotation.acl();
        Self {
            id: annotation.id(),
            created: annotation.created(),
            updated: annotation.updated(),
            user: annotation.userid().to_string(),
            group: annotation.groupid().to_string(),
            uri: annotation.target_uri().to_string(),
            text: annotation.text().map(str::to_string),
            text_rendered: annotation.text_rendered().map(str::to_string),
            tags: annotation.tags().to_vec(),
            shared: annotation.shared(),
            target: vec![TargetView {
                source: annotation.target_uri().to_string(),
                selector: annotation.target_selectors().to_vec(),
            }],
            references: annotation.references().to_vec(),
            document: DocumentView {
                title: document_title,
            },
            permissions: PermissionsView {
                read: allowed_principals(&acl, Action::Read),
                admin: allowed_principals(&acl, Action::Admin),
                update: allowed_principals(&acl, Action::Update),
                delete: allowed_principals(&acl, Action::Delete),
            },
            extra: annotation.extra().clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/annotations
///
/// Search readable annotations. Query parameters: `uri`, `user`, `group`,
/// `tag` (repeatable, all must match), `limit`, `offset`.
pub async fn search_annotations(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    Query(params): Query<Vec<(String, String)>>,
) -> AppResult<Json<PagedResponse<AnnotationView>>> {
    let filters = parse_search(&params, &state.config.auth_domain)?;
    let caller = Caller::resolve(&state.pool, user.as_ref()).await?;

    let annotations = AnnotationRepo::search(&state.pool, &filters, &caller.scope).await?;
    let total = AnnotationRepo::count(&state.pool, &filters, &caller.scope).await?;

    let data = present_all(&state.pool, &annotations).await?;
    Ok(Json(PagedResponse { data, total }))
}

/// POST /api/v1/annotations
pub async fn create_annotation(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreateAnnotationRequest>,
) -> AppResult<impl IntoResponse> {
    let caller = Caller::resolve(&state.pool, Some(&auth)).await?;

    let references = ids::decode_all(&input.references)?;
    let (groupid, references) = match references.last() {
        // A reply inherits the parent's group and thread.
        Some(&parent_id) => {
            let parent = AnnotationRepo::find_by_id(&state.pool, parent_id)
                .await?
                .filter(|parent| permits(&parent.acl(), &caller.principals, Action::Read))
                .ok_or_else(|| {
                    CoreError::Validation(format!(
                        "references: annotation {} does not exist",
                        ids::encode(&parent_id)
                    ))
                })?;
            let mut chain = parent.references().to_vec();
            chain.push(parent.id());
            (parent.groupid().to_string(), chain)
        }
        None => {
            let groupid = input.group.unwrap_or_else(|| PUBLIC_GROUP.to_string());
            ensure_group_writable(&state.pool, &auth, &groupid).await?;
            (groupid, Vec::new())
        }
    };

    let mut annotation = Annotation::new(NewAnnotation {
        userid: auth.userid.clone(),
        groupid: Some(groupid),
        text: input.text,
        tags: input.tags,
        shared: input.shared,
        target_uri: input.uri,
        target_selectors: selectors_of(input.target),
        references,
        extra: extra_object(input.extra)?,
        document_id: 0,
    })?;

    let title = input.document.and_then(|d| d.title);
    let document_id = upsert_document(&state.pool, &annotation, title).await?;
    annotation.set_document_id(document_id);

    let annotation = AnnotationRepo::create(&state.pool, &annotation).await?;

    tracing::info!(
        user_id = auth.user_id,
        annotation_id = %ids::encode(&annotation.id()),
        group = %annotation.groupid(),
        is_reply = annotation.is_reply(),
        "Annotation created"
    );

    let view = present(&state.pool, &annotation).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: view })))
}

/// GET /api/v1/annotations/{id}
pub async fn get_annotation(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<AnnotationView>>> {
    let caller = Caller::resolve(&state.pool, user.as_ref()).await?;
    let annotation = load_readable(&state.pool, &id, &caller).await?;

    let view = present(&state.pool, &annotation).await?;
    Ok(Json(DataResponse { data: view }))
}

/// PATCH /api/v1/annotations/{id}
pub async fn update_annotation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(input): Json<UpdateAnnotationRequest>,
) -> AppResult<Json<DataResponse<AnnotationView>>> {
    let caller = Caller::resolve(&state.pool, Some(&auth)).await?;
    let mut annotation = load_readable(&state.pool, &id, &caller).await?;
    require(&annotation, &caller, Action::Update)?;

    let uri_changed = input.uri.is_some();
    let title = input.document.and_then(|d| d.title);
    let changes = AnnotationChanges {
        text: input.text,
        tags: input.tags,
        shared: input.shared,
        target_uri: input.uri,
        target_selectors: input.target.map(selectors_of),
        extra: input.extra.map(|e| extra_object(Some(e))).transpose()?,
    };

    // Nothing to write: leave `updated` alone.
    if changes.is_empty() && title.is_none() {
        let view = present(&state.pool, &annotation).await?;
        return Ok(Json(DataResponse { data: view }));
    }

    annotation.apply(changes)?;

    if uri_changed || title.is_some() {
        let document_id = upsert_document(&state.pool, &annotation, title).await?;
        annotation.set_document_id(document_id);
    }

    let annotation = AnnotationRepo::update(&state.pool, &annotation)
        .await?
        .ok_or_else(|| CoreError::not_found("Annotation", &id))?;

    tracing::info!(
        user_id = auth.user_id,
        annotation_id = %id,
        "Annotation updated"
    );

    let view = present(&state.pool, &annotation).await?;
    Ok(Json(DataResponse { data: view }))
}

/// DELETE /api/v1/annotations/{id}
pub async fn delete_annotation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let caller = Caller::resolve(&state.pool, Some(&auth)).await?;
    let annotation = load_readable(&state.pool, &id, &caller).await?;
    require(&annotation, &caller, Action::Delete)?;

    if !AnnotationRepo::delete(&state.pool, annotation.id()).await? {
        return Err(CoreError::not_found("Annotation", &id).into());
    }

    tracing::info!(user_id = auth.user_id, annotation_id = %id, "Annotation deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/annotations/{id}/replies
///
/// Readable annotations anywhere below `id` in its thread, oldest first.
pub async fn list_replies(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<Vec<AnnotationView>>>> {
    let caller = Caller::resolve(&state.pool, user.as_ref()).await?;
    let annotation = load_readable(&state.pool, &id, &caller).await?;

    let replies = AnnotationRepo::list_replies(&state.pool, annotation.id(), &caller.scope).await?;
    let data = present_all(&state.pool, &replies).await?;
    Ok(Json(DataResponse { data }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Load an annotation by url-safe id, hiding it unless the caller may read it.
async fn load_readable(pool: &DbPool, id: &str, caller: &Caller) -> AppResult<Annotation> {
    let not_found = || AppError::from(CoreError::not_found("Annotation", id));
    // Malformed ids cannot name an annotation.
    let uuid = ids::decode(id).map_err(|_| not_found())?;

    AnnotationRepo::find_by_id(pool, uuid)
        .await?
        .filter(|annotation| permits(&annotation.acl(), &caller.principals, Action::Read))
        .ok_or_else(not_found)
}

fn require(annotation: &Annotation, caller: &Caller, action: Action) -> AppResult<()> {
    if permits(&annotation.acl(), &caller.principals, action) {
        Ok(())
    } else {
        Err(AppError::forbidden(format!(
            "You may not {} this annotation",
            action.as_str()
        )))
    }
}

/// The public group is open to everyone; any other group only to its members.
async fn ensure_group_writable(pool: &DbPool, auth: &AuthUser, groupid: &str) -> AppResult<()> {
    if groupid == PUBLIC_GROUP {
        return Ok(());
    }
    let is_member = match GroupRepo::find_by_pubid(pool, groupid).await? {
        Some(group) => GroupRepo::is_member(pool, group.id, auth.user_id).await?,
        None => false,
    };
    if is_member {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "group: you may not post to group '{groupid}'"
        ))
        .into())
    }
}

async fn upsert_document(
    pool: &DbPool,
    annotation: &Annotation,
    title: Option<String>,
) -> AppResult<DbId> {
    let document = DocumentRepo::find_or_create(
        pool,
        &UpsertDocument {
            title: title.filter(|t| !t.trim().is_empty()),
            web_uri: annotation.target_uri().to_string(),
            uri_normalized: annotation.target_uri_normalized().to_string(),
        },
    )
    .await?;
    Ok(document.id)
}

/// Selectors come from the first target; extra targets are not supported.
fn selectors_of(targets: Vec<TargetInput>) -> Vec<Value> {
    targets
        .into_iter()
        .next()
        .map(|target| target.selector)
        .unwrap_or_default()
}

fn extra_object(extra: Option<Value>) -> Result<Map<String, Value>, CoreError> {
    match extra {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map),
        Some(_) => Err(CoreError::Validation("extra must be a JSON object".into())),
    }
}

async fn present(pool: &DbPool, annotation: &Annotation) -> AppResult<AnnotationView> {
    let title = DocumentRepo::find_by_id(pool, annotation.document_id())
        .await?
        .and_then(|d| d.title);
    Ok(AnnotationView::new(annotation, title))
}

async fn present_all(pool: &DbPool, annotations: &[Annotation]) -> AppResult<Vec<AnnotationView>> {
    let mut titles: HashMap<DbId, Option<String>> = HashMap::new();
    let mut views = Vec::with_capacity(annotations.len());
    for annotation in annotations {
        let document_id = annotation.document_id();
        if !titles.contains_key(&document_id) {
            let title = DocumentRepo::find_by_id(pool, document_id)
                .await?
                .and_then(|d| d.title);
            titles.insert(document_id, title);
        }
        let title = titles.get(&document_id).cloned().flatten();
        views.push(AnnotationView::new(annotation, title));
    }
    Ok(views)
}

/// Build search filters from raw query pairs.
///
/// `user` accepts a full `acct:` userid or a bare username on this server's
/// authority.
pub fn parse_search(params: &[(String, String)], authority: &str) -> AppResult<AnnotationSearch> {
    let mut filters = AnnotationSearch {
        limit: DEFAULT_LIMIT,
        ..Default::default()
    };
    for (key, value) in params {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        match key.as_str() {
            "uri" => filters.uri_normalized = Some(normalize(value)),
            "user" => {
                filters.userid = Some(if value.starts_with("acct:") {
                    split_userid(value)?;
                    value.to_string()
                } else {
                    format_userid(value, authority)
                })
            }
            "group" => filters.groupid = Some(value.to_string()),
            "tag" | "tags" => filters.tags.push(value.to_string()),
            "limit" => {
                let limit: i64 = value
                    .parse()
                    .map_err(|_| AppError::BadRequest(format!("limit must be an integer: {value}")))?;
                filters.limit = limit.clamp(0, MAX_LIMIT);
            }
            "offset" => {
                let offset: i64 = value
                    .parse()
                    .map_err(|_| AppError::BadRequest(format!("offset must be an integer: {value}")))?;
                filters.offset = offset.max(0);
            }
            _ => {}
        }
    }
    Ok(filters)
}
