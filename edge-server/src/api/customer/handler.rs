//! Customer app API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, AppResult};
use shared::models::{
    Actor, CustomerInfo, DiningTable, Order, OrderDetail, OrderItem, TableStatus, WaiterCall,
};

use crate::core::ServerState;
use crate::orders::{AddItem, CallWaiter};

/// Name recorded for customer-app actions; identity is the CPF
const CUSTOMER_APP: &str = "customer-app";

/// What a customer may see of a table
#[derive(Debug, Serialize)]
pub struct TableView {
    pub table_id: i64,
    pub number: String,
    pub status: TableStatus,
    pub current_order_id: Option<i64>,
}

impl From<DiningTable> for TableView {
    fn from(table: DiningTable) -> Self {
        Self {
            table_id: table.id,
            number: table.number,
            status: table.status,
            current_order_id: table.current_order_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OpenRequest {
    pub occupants: u32,
    pub customer: CustomerInfo,
}

#[derive(Debug, Deserialize)]
pub struct CpfQuery {
    pub cpf: String,
}

#[derive(Debug, Deserialize)]
pub struct BillRequest {
    pub cpf: String,
}

/// GET /api/customer/tables/{token} - 扫码定位桌台
pub async fn resolve_table(
    State(state): State<ServerState>,
    Path(token): Path<String>,
) -> AppResult<Json<TableView>> {
    let table = state.coordinator().resolve_qr_token(&token).await?;
    Ok(Json(table.into()))
}

/// POST /api/customer/tables/{token}/open - 顾客扫码开台
pub async fn open_table(
    State(state): State<ServerState>,
    Path(token): Path<String>,
    Json(payload): Json<OpenRequest>,
) -> AppResult<Json<Order>> {
    let order = state
        .coordinator()
        .open_table_by_qr(&token, payload.occupants, payload.customer)
        .await?;
    Ok(Json(order))
}

/// GET /api/customer/orders/{id}?cpf= - 查看自己的订单
pub async fn get_order(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Query(query): Query<CpfQuery>,
) -> AppResult<Json<OrderDetail>> {
    Ok(Json(
        state
            .coordinator()
            .get_order_for_customer(id, &query.cpf)
            .await?,
    ))
}

/// POST /api/customer/orders/{id}/items - 顾客点菜
pub async fn add_item(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<AddItem>,
) -> AppResult<Json<OrderItem>> {
    if payload.customer_cpf.is_none() {
        return Err(AppError::validation("customer_cpf is required"));
    }
    let item = state
        .coordinator()
        .add_item(id, payload, &Actor::customer(CUSTOMER_APP))
        .await?;
    Ok(Json(item))
}

/// DELETE /api/customer/items/{id}?cpf= - 顾客删除未制作的菜品
pub async fn remove_item(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Query(query): Query<CpfQuery>,
) -> AppResult<Json<Order>> {
    let order = state
        .coordinator()
        .remove_item(id, &Actor::customer(CUSTOMER_APP), Some(&query.cpf))
        .await?;
    Ok(Json(order))
}

/// POST /api/customer/orders/{id}/calls - 呼叫服务员
pub async fn call_waiter(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<CallWaiter>,
) -> AppResult<Json<WaiterCall>> {
    Ok(Json(state.coordinator().call_waiter(id, payload).await?))
}

/// POST /api/customer/orders/{id}/bill - 请求账单
pub async fn request_bill(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<BillRequest>,
) -> AppResult<Json<Order>> {
    Ok(Json(
        state
            .coordinator()
            .request_bill(id, &payload.cpf)
            .await?,
    ))
}
