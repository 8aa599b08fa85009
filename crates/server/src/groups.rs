//! Group API endpoints

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use api_types::group::{GroupList, GroupNew, GroupView};

use crate::{ServerError, server::ServerState, views};

/// Handle requests for listing every group, newest first
pub async fn list(State(state): State<ServerState>) -> Result<Json<GroupList>, ServerError> {
    let groups = state
        .engine
        .list_groups()
        .await?
        .iter()
        .map(views::group)
        .collect();

    Ok(Json(GroupList { groups }))
}

/// Handle requests for creating a new group
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<GroupNew>,
) -> Result<(StatusCode, Json<GroupView>), ServerError> {
    let group = state
        .engine
        .create_group(&payload.name, &payload.members)
        .await?;

    Ok((StatusCode::CREATED, Json(views::group(&group))))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(group_id): Path<String>,
) -> Result<Json<GroupView>, ServerError> {
    let group_id = engine::parse_id(&group_id, "group")?;
    let group = state.engine.group(group_id).await?;
    Ok(Json(views::group(&group)))
}

pub async fn delete(
    State(state): State<ServerState>,
    Path(group_id): Path<String>,
) -> Result<StatusCode, ServerError> {
    let group_id = engine::parse_id(&group_id, "group")?;
    state.engine.delete_group(group_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handle requests for marking a group settled: every balance goes back to zero
pub async fn settle(
    State(state): State<ServerState>,
    Path(group_id): Path<String>,
) -> Result<Json<GroupView>, ServerError> {
    let group_id = engine::parse_id(&group_id, "group")?;
    let group = state.engine.settle_group(group_id).await?;
    Ok(Json(views::group(&group)))
}
