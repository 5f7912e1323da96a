//! Handlers for the `/groups` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use memex_core::error::CoreError;
use memex_db::models::group::{CreateGroup, Group};
use memex_db::repositories::{GroupRepo, UserRepo};
use rand::distr::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Length of generated group public ids.
pub const PUBID_LEN: usize = 8;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateGroupRequest {
    #[validate(length(min = 4, max = 25, message = "Group name must be between 4 and 25 characters"))]
    pub name: String,
}

impl CreateGroupRequest {
    /// Strip surrounding whitespace so the length rule sees the stored name.
    pub fn trimmed(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct MembershipView {
    pub group: String,
    pub user: String,
    /// `false` when the user already belonged to the group.
    pub added: bool,
}

/// POST /api/v1/groups
///
/// Create a group; the caller becomes its first member.
pub async fn create_group(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreateGroupRequest>,
) -> AppResult<impl IntoResponse> {
    let input = input.trimmed();
    input
        .validate()
        .map_err(|e| CoreError::Validation(e.to_string()))?;

    let group = GroupRepo::create(
        &state.pool,
        &CreateGroup {
            pubid: generate_pubid(),
            name: input.name,
            creator_id: auth.user_id,
        },
    )
    .await?;

    tracing::info!(user_id = auth.user_id, pubid = %group.pubid, "Group created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: group })))
}

/// GET /api/v1/groups
///
/// Groups the caller belongs to.
pub async fn list_groups(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<Vec<Group>>>> {
    let groups = GroupRepo::list_for_user(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: groups }))
}

/// POST /api/v1/groups/{pubid}/members
///
/// Add a user (by username on this server) to a group. Only members may add.
pub async fn add_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(pubid): Path<String>,
    Json(input): Json<AddMemberRequest>,
) -> AppResult<Json<DataResponse<MembershipView>>> {
    let group = GroupRepo::find_by_pubid(&state.pool, &pubid)
        .await?
        .ok_or_else(|| CoreError::not_found("Group", &pubid))?;

    if !GroupRepo::is_member(&state.pool, group.id, auth.user_id).await? {
        return Err(AppError::forbidden("Only group members may add members"));
    }

    let user = UserRepo::find_by_username(&state.pool, input.username.trim(), &state.config.auth_domain)
        .await?
        .ok_or_else(|| CoreError::not_found("User", input.username.trim()))?;

    let added = GroupRepo::add_member(&state.pool, group.id, user.id).await?;

    tracing::info!(
        user_id = auth.user_id,
        pubid = %group.pubid,
        member_id = user.id,
        added,
        "Group member added"
    );

    Ok(Json(DataResponse {
        data: MembershipView {
            group: group.pubid,
            user: user.userid(),
            added,
        },
    }))
}

/// Random lowercase alphanumeric group id.
pub fn generate_pubid() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(PUBID_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}
