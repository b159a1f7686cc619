//! Auth API 模块
//!
//! 生产环境令牌由外部认证服务签发，这里只提供开发用签发接口。

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

/// `POST /api/auth/token` (public, development only)
pub fn token_router() -> Router<ServerState> {
    Router::new().route("/api/auth/token", post(handler::issue_token))
}

/// `GET /api/auth/me` (staff)
pub fn me_router() -> Router<ServerState> {
    Router::new().route("/api/auth/me", get(handler::me))
}
