//! Login and password handlers
//!
//! First login works against the shared bootstrap secret: an allow-listed
//! email plus the shared password creates (or finds) the user record and
//! issues a token flagged `must_change_password`. Once the user stores a
//! personal Argon2 hash via the password route, the shared secret stops
//! working for them.
//!
//! Every failure path answers with the same InvalidCredentials error, so
//! responses do not reveal whether an email is known or allow-listed.

use crate::handlers::users::UserView;
use crate::AppState;
use auditbase_common::{
    auth::{
        hash_password, is_allow_listed, verify_bootstrap_password, verify_password, AuthContext,
    },
    db::repository::NewUser,
    db::Repository,
    errors::{AppError, Result},
};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub must_change_password: bool,
    pub user: UserView,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 12, max = 128))]
    pub new_password: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    req.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let email = req.email.to_lowercase();
    let repo = Repository::new(state.db.clone());

    let user = match repo.find_user_by_email(&email).await? {
        Some(user) => {
            let ok = match user.password_hash.as_deref() {
                Some(hash) => verify_password(&req.password, hash),
                None => {
                    // Account exists but never left bootstrap
                    is_allow_listed(&state.config.auth, &email)
                        && verify_bootstrap_password(&state.config.auth, &req.password)
                }
            };
            if !ok {
                return Err(AppError::InvalidCredentials);
            }
            user
        }
        None => {
            if !is_allow_listed(&state.config.auth, &email)
                || !verify_bootstrap_password(&state.config.auth, &req.password)
            {
                return Err(AppError::InvalidCredentials);
            }

            let user = repo
                .create_user(NewUser {
                    name: email.clone(),
                    email: email.clone(),
                    role: "auditor".to_string(),
                })
                .await?;

            tracing::info!(email = %user.email, "User bootstrapped on first login");
            user
        }
    };

    let must_change_password = user.must_change_password();
    let token = state
        .jwt
        .generate_token(user.id, &user.email, must_change_password)?;

    tracing::info!(email = %user.email, must_change_password, "Login succeeded");

    Ok(Json(LoginResponse {
        token,
        must_change_password,
        user: UserView::from_model(user),
    }))
}

/// Store a personal password for the authenticated user and issue a fresh
/// token without the bootstrap flag.
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<LoginResponse>> {
    req.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    if verify_bootstrap_password(&state.config.auth, &req.new_password) {
        return Err(AppError::Validation {
            message: "new password must differ from the shared bootstrap password".to_string(),
            field: Some("newPassword".to_string()),
        });
    }

    let repo = Repository::new(state.db.clone());
    let hash = hash_password(&req.new_password)?;
    let user = repo.set_user_password(auth.user_id, hash).await?;

    let token = state.jwt.generate_token(user.id, &user.email, false)?;

    tracing::info!(email = %user.email, "Password changed");

    Ok(Json(LoginResponse {
        token,
        must_change_password: false,
        user: UserView::from_model(user),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_validation() {
        let req: LoginRequest = serde_json::from_value(serde_json::json!({
            "email": "lead@example.com",
            "password": "hunter2-hunter2"
        }))
        .unwrap();
        assert!(req.validate().is_ok());

        let req: LoginRequest = serde_json::from_value(serde_json::json!({
            "email": "nope",
            "password": ""
        }))
        .unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_change_password_enforces_minimum_length() {
        let req: ChangePasswordRequest =
            serde_json::from_value(serde_json::json!({ "newPassword": "short" })).unwrap();
        assert!(req.validate().is_err());

        let req: ChangePasswordRequest =
            serde_json::from_value(serde_json::json!({ "newPassword": "a-long-enough-password" }))
                .unwrap();
        assert!(req.validate().is_ok());
    }
}
