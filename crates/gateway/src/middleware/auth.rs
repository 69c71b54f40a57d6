//! Request authentication
//!
//! Implements the axum extractor that turns a bearer token into an
//! `AuthContext`. Handlers that take `auth: AuthContext` are thereby
//! token-guarded; everything else (login, health, the legacy static
//! mount) stays open.

use crate::AppState;
use auditbase_common::{
    auth::{extract_bearer, AuthContext},
    errors::{AppError, Result},
};
use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

impl FromRequestParts<AppState> for AuthContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let request_id = parts
            .headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized {
                message: "Missing Authorization header".to_string(),
            })?;

        let token = extract_bearer(auth_header).ok_or_else(|| AppError::Unauthorized {
            message: "Expected a bearer token".to_string(),
        })?;

        let claims = state.jwt.validate_token(token)?;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::Unauthorized {
            message: "Malformed token subject".to_string(),
        })?;

        Ok(AuthContext {
            user_id,
            email: claims.email,
            must_change_password: claims.must_change_password,
            request_id,
        })
    }
}
