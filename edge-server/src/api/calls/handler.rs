//! Waiter Call API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use shared::error::AppResult;
use shared::models::WaiterCall;

use crate::auth::CurrentUser;
use crate::core::ServerState;

#[derive(Debug, Default, Deserialize)]
pub struct AttendRequest {
    /// Managers may dispatch someone else; defaults to the caller
    pub waiter_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResolveRequest {
    pub notes: Option<String>,
}

/// GET /api/calls - 未完成的呼叫
pub async fn list_open(
    State(state): State<ServerState>,
    _user: CurrentUser,
) -> AppResult<Json<Vec<WaiterCall>>> {
    Ok(Json(state.coordinator().list_open_calls().await?))
}

/// POST /api/calls/{id}/attend - 响应呼叫
pub async fn attend(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<AttendRequest>,
) -> AppResult<Json<WaiterCall>> {
    let waiter_id = payload.waiter_id.unwrap_or(user.id);
    let call = state
        .coordinator()
        .attend_call(id, waiter_id, &user.to_actor())
        .await?;
    Ok(Json(call))
}

/// POST /api/calls/{id}/resolve - 完成呼叫
pub async fn resolve(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<ResolveRequest>,
) -> AppResult<Json<WaiterCall>> {
    let call = state
        .coordinator()
        .resolve_call(id, payload.notes, &user.to_actor())
        .await?;
    Ok(Json(call))
}
