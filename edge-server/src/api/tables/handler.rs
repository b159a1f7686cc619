//! Dining Table API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::error::AppResult;
use shared::models::{DiningTable, DiningTableCreate, Order, PaymentMethod, TableStatus};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::orders::OpenTable;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<TableStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CloseRequest {
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub dest_table_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct AssignWaiterRequest {
    /// `null` clears the assignment
    pub waiter_id: Option<i64>,
}

/// GET /api/tables - 获取桌台 (可按状态过滤)
pub async fn list(
    State(state): State<ServerState>,
    _user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<DiningTable>>> {
    Ok(Json(state.coordinator().list_tables(query.status).await?))
}

/// GET /api/tables/{id} - 获取单个桌台
pub async fn get_by_id(
    State(state): State<ServerState>,
    _user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<DiningTable>> {
    Ok(Json(state.coordinator().get_table(id).await?))
}

/// POST /api/tables - 创建桌台
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<DiningTableCreate>,
) -> AppResult<Json<DiningTable>> {
    let table = state
        .coordinator()
        .create_table(payload, &user.to_actor())
        .await?;
    Ok(Json(table))
}

/// POST /api/tables/{id}/open - 开台
pub async fn open(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<OpenTable>,
) -> AppResult<Json<Order>> {
    let order = state
        .coordinator()
        .open_table(id, payload, &user.to_actor())
        .await?;
    Ok(Json(order))
}

/// POST /api/tables/{id}/request-close - 请求结账
pub async fn request_close(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<DiningTable>> {
    Ok(Json(
        state
            .coordinator()
            .request_close(id, &user.to_actor())
            .await?,
    ))
}

/// POST /api/tables/{id}/close - 结账关台
pub async fn close(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<CloseRequest>,
) -> AppResult<Json<Order>> {
    let order = state
        .coordinator()
        .close_table(id, payload.payment_method, &user.to_actor())
        .await?;
    Ok(Json(order))
}

/// POST /api/tables/{id}/transfer - 转台
pub async fn transfer(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<TransferRequest>,
) -> AppResult<Json<DiningTable>> {
    let dest = state
        .coordinator()
        .transfer_table(id, payload.dest_table_id, &user.to_actor())
        .await?;
    Ok(Json(dest))
}

/// PUT /api/tables/{id}/waiter - 指派服务员
pub async fn assign_waiter(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<AssignWaiterRequest>,
) -> AppResult<Json<DiningTable>> {
    let table = state
        .coordinator()
        .assign_waiter(id, payload.waiter_id, &user.to_actor())
        .await?;
    Ok(Json(table))
}

/// POST /api/tables/{id}/qr-token - 重新生成二维码令牌
pub async fn rotate_qr_token(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<DiningTable>> {
    Ok(Json(
        state
            .coordinator()
            .rotate_qr_token(id, &user.to_actor())
            .await?,
    ))
}
