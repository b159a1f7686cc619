//! Customer app API 模块
//!
//! 公共路由，不接受角色声明：每个请求都以 `Customer` 身份执行，
//! 并由协调器校验 CPF 与订单顾客一致。

mod handler;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/customer", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/tables/{token}", get(handler::resolve_table))
        .route("/tables/{token}/open", post(handler::open_table))
        .route("/orders/{id}", get(handler::get_order))
        .route("/orders/{id}/items", post(handler::add_item))
        .route("/orders/{id}/calls", post(handler::call_waiter))
        .route("/orders/{id}/bill", post(handler::request_bill))
        .route("/items/{id}", delete(handler::remove_item))
}
