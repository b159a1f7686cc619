//! Product API Handlers

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use shared::error::AppResult;
use shared::models::{Product, ProductUpsert};

use crate::auth::CurrentUser;
use crate::core::ServerState;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub available: bool,
}

/// GET /api/products - 商品列表 (`?available=true` 仅可售)
pub async fn list(
    State(state): State<ServerState>,
    _user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Product>>> {
    Ok(Json(state.coordinator().list_products(query.available).await?))
}

/// POST /api/products - 新建或更新商品 (管理员/经理)
pub async fn upsert(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<ProductUpsert>,
) -> AppResult<Json<Product>> {
    let product = state
        .coordinator()
        .upsert_product(payload, &user.to_actor())
        .await?;
    Ok(Json(product))
}
