//! Order Item API 模块

mod handler;

use axum::{
    Router,
    routing::{delete, get, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/items", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/{id}", delete(handler::remove))
        .route("/{id}/status", put(handler::change_status))
        .route("/{id}/transitions", get(handler::transitions))
}
