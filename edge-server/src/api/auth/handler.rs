//! Auth API Handlers

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::Role;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::security_log;

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub user_id: i64,
    pub name: String,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub expires_in_minutes: i64,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: i64,
    pub name: String,
    pub role: Role,
}

/// POST /api/auth/token - 签发开发令牌
pub async fn issue_token(
    State(state): State<ServerState>,
    Json(req): Json<TokenRequest>,
) -> AppResult<Json<TokenResponse>> {
    if !state.config.is_development() {
        security_log!("WARN", "dev_token_refused", environment = state.config.environment.as_str());
        return Err(AppError::with_message(
            ErrorCode::PermissionDenied,
            "token issuing is only available in development",
        ));
    }
    if req.name.trim().is_empty() {
        return Err(AppError::validation("name is required"));
    }

    let token = state
        .jwt_service()
        .generate_token(req.user_id, req.name.trim(), req.role)
        .map_err(|e| AppError::validation(e.to_string()))?;
    security_log!("INFO", "dev_token_issued", user_id = req.user_id, role = req.role.as_str());

    Ok(Json(TokenResponse {
        token,
        expires_in_minutes: state.jwt_service().config.expiration_minutes,
    }))
}

/// GET /api/auth/me - 当前员工
pub async fn me(user: CurrentUser) -> Json<MeResponse> {
    Json(MeResponse {
        id: user.id,
        name: user.name,
        role: user.role,
    })
}
