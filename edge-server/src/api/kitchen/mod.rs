//! Kitchen display API

use axum::{Json, Router, extract::State, routing::get};
use shared::error::AppResult;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::orders::KitchenItem;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/kitchen/items", get(list_items))
}

/// GET /api/kitchen/items - 待制作/制作中/待上菜的菜品
async fn list_items(
    State(state): State<ServerState>,
    _user: CurrentUser,
) -> AppResult<Json<Vec<KitchenItem>>> {
    Ok(Json(state.coordinator().list_kitchen_items().await?))
}
