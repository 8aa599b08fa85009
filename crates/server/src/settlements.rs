//! Settlement API endpoints
//!
//! Plans are computed on every request and never stored.

use axum::{
    Json,
    extract::{Path, State},
};

use api_types::settlement::{CategoryBreakdownView, SettlementList};

use crate::{ServerError, server::ServerState, views};

pub async fn list(
    State(state): State<ServerState>,
    Path(group_id): Path<String>,
) -> Result<Json<SettlementList>, ServerError> {
    let group_id = engine::parse_id(&group_id, "group")?;
    let settlements = state
        .engine
        .settlements(group_id)
        .await?
        .iter()
        .map(views::settlement)
        .collect();

    Ok(Json(SettlementList { settlements }))
}

pub async fn by_category(
    State(state): State<ServerState>,
    Path(group_id): Path<String>,
) -> Result<Json<CategoryBreakdownView>, ServerError> {
    let group_id = engine::parse_id(&group_id, "group")?;
    let breakdown = state.engine.settlements_by_category(group_id).await?;
    Ok(Json(views::breakdown(&breakdown)))
}
