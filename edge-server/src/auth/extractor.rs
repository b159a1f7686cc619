//! JWT Extractor
//!
//! Validates the bearer token in handlers that take a [`CurrentUser`]

use axum::{extract::FromRequestParts, http::request::Parts};
use shared::error::AppError;

use crate::auth::{CurrentUser, JwtError, JwtService};
use crate::core::ServerState;
use crate::security_log;

impl FromRequestParts<ServerState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        // Already extracted by require_auth
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let auth_header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        let token = match auth_header {
            Some(header) => JwtService::extract_from_header(header)
                .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?,
            None => {
                security_log!("WARN", "auth_missing", uri = format!("{:?}", parts.uri));
                return Err(AppError::not_authenticated());
            }
        };

        let user = authenticate(state.jwt_service(), token, &parts.uri.to_string())?;
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}

/// Validate a raw token into a [`CurrentUser`]
///
/// Shared by the extractor, the middleware and the websocket handshake.
pub fn authenticate(jwt: &JwtService, token: &str, uri: &str) -> Result<CurrentUser, AppError> {
    let claims = jwt.validate_token(token).map_err(|e| {
        security_log!("WARN", "auth_failed", error = e.to_string(), uri = uri);
        match e {
            JwtError::ExpiredToken => AppError::token_expired(),
            _ => AppError::invalid_token("Invalid token"),
        }
    })?;

    CurrentUser::try_from(claims).map_err(|e| {
        security_log!("WARN", "auth_failed", error = e.to_string(), uri = uri);
        AppError::invalid_token(format!("Malformed JWT claims: {}", e))
    })
}
