//! Order API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use shared::error::AppResult;
use shared::models::{Order, OrderDetail, OrderItem};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::orders::AddItem;

#[derive(Debug, Default, Deserialize)]
pub struct CancelRequest {
    pub reason: Option<String>,
}

/// GET /api/orders/{id} - 订单及明细
pub async fn get_by_id(
    State(state): State<ServerState>,
    _user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<OrderDetail>> {
    Ok(Json(state.coordinator().get_order(id).await?))
}

/// POST /api/orders/{id}/items - 点菜
pub async fn add_item(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<AddItem>,
) -> AppResult<Json<OrderItem>> {
    let item = state
        .coordinator()
        .add_item(id, payload, &user.to_actor())
        .await?;
    Ok(Json(item))
}

/// POST /api/orders/{id}/cancel - 作废订单 (管理员/经理)
pub async fn cancel(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<CancelRequest>,
) -> AppResult<Json<Order>> {
    let order = state
        .coordinator()
        .cancel_order(id, payload.reason, &user.to_actor())
        .await?;
    Ok(Json(order))
}
