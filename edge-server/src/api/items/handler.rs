//! Order Item API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::error::AppResult;
use shared::models::{ItemStatus, Order, OrderItem, Role};

use crate::auth::CurrentUser;
use crate::core::ServerState;

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: ItemStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct TransitionsQuery {
    /// Defaults to the caller's role
    pub role: Option<Role>,
}

/// PUT /api/items/{id}/status - 变更菜品状态
pub async fn change_status(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<StatusRequest>,
) -> AppResult<Json<OrderItem>> {
    let item = state
        .coordinator()
        .change_item_status(id, payload.status, &user.to_actor())
        .await?;
    Ok(Json(item))
}

/// DELETE /api/items/{id} - 删除未制作的菜品
pub async fn remove(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Order>> {
    let order = state
        .coordinator()
        .remove_item(id, &user.to_actor(), None)
        .await?;
    Ok(Json(order))
}

/// GET /api/items/{id}/transitions - 当前角色可执行的状态变更
pub async fn transitions(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Query(query): Query<TransitionsQuery>,
) -> AppResult<Json<Vec<ItemStatus>>> {
    let role = query.role.unwrap_or(user.role);
    Ok(Json(state.coordinator().item_transitions(id, role).await?))
}
