//! Dining Table API 模块

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/tables", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/open", post(handler::open))
        .route("/{id}/request-close", post(handler::request_close))
        .route("/{id}/close", post(handler::close))
        .route("/{id}/transfer", post(handler::transfer))
        .route("/{id}/waiter", put(handler::assign_waiter))
        .route("/{id}/qr-token", post(handler::rotate_qr_token))
}
