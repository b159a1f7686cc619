//! 认证中间件
//!
//! 员工 API 路由统一挂载 [`require_auth`]。顾客路由 (`/api/customer/*`)
//! 不经过此中间件，改为逐个请求校验 CPF。

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use shared::error::AppError;

use crate::auth::JwtService;
use crate::auth::extractor::authenticate;
use crate::core::ServerState;
use crate::security_log;

/// 认证中间件 - 要求员工令牌
///
/// 从 `Authorization: Bearer <token>` 头提取并验证 JWT，
/// 成功后将 [`CurrentUser`](super::CurrentUser) 注入请求扩展。
///
/// | 错误 | HTTP 状态码 |
/// |------|------------|
/// | 无 Authorization 头 | 401 NotAuthenticated |
/// | 令牌过期 | 401 TokenExpired |
/// | 无效令牌 | 401 TokenInvalid |
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // CORS 预检
    if req.method() == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    let token = match req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    {
        Some(header) => JwtService::extract_from_header(header)
            .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?
            .to_string(),
        None => {
            security_log!("WARN", "auth_missing", uri = format!("{:?}", req.uri()));
            return Err(AppError::not_authenticated());
        }
    };

    let user = authenticate(state.jwt_service(), &token, &req.uri().to_string())?;
    tracing::debug!(user_id = user.id, role = %user.role, "Authenticated");
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}
