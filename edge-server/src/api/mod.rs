//! API 路由模块
//!
//! | 模块 | 前缀 | 认证 |
//! |------|------|------|
//! | [`health`] | /health | 无 |
//! | [`auth`] | /api/auth | 签发: 仅开发环境; /me: 员工令牌 |
//! | [`tables`] | /api/tables | 员工令牌 |
//! | [`orders`] | /api/orders | 员工令牌 |
//! | [`items`] | /api/items | 员工令牌 |
//! | [`calls`] | /api/calls | 员工令牌 |
//! | [`products`] | /api/products | 员工令牌 |
//! | [`kitchen`] | /api/kitchen | 员工令牌 |
//! | [`customer`] | /api/customer | CPF (逐请求校验) |
//! | ws | /ws | 令牌或 order_id + CPF |
//!
//! 角色校验在协调器内完成；路由层只负责身份。

pub mod auth;
pub mod calls;
pub mod customer;
pub mod health;
pub mod items;
pub mod kitchen;
pub mod orders;
pub mod products;
pub mod tables;

use axum::{Router, middleware, routing::get};
use http::{HeaderName, HeaderValue};
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::auth::require_auth;
use crate::core::ServerState;
use crate::realtime::ws::ws_handler;

/// Custom request ID generator
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Staff routes, all behind [`require_auth`]
fn staff_router(state: &ServerState) -> Router<ServerState> {
    Router::new()
        .merge(auth::me_router())
        .merge(tables::router())
        .merge(orders::router())
        .merge(items::router())
        .merge(calls::router())
        .merge(products::router())
        .merge(kitchen::router())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}

/// Build the fully configured application
pub fn build_app(state: ServerState) -> Router {
    let x_request_id = HeaderName::from_static("x-request-id");

    Router::new()
        .merge(health::router())
        .merge(auth::token_router())
        .merge(customer::router())
        .merge(staff_router(&state))
        .route("/ws", get(ws_handler))
        // ========== Tower HTTP Middleware ==========
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(SetRequestIdLayer::new(x_request_id, XRequestId))
        .with_state(state)
}
