//! Waiter Call API 模块

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/calls", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list_open))
        .route("/{id}/attend", post(handler::attend))
        .route("/{id}/resolve", post(handler::resolve))
}
