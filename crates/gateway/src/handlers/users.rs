//! User management handlers
//!
//! Users are created without a password; they bootstrap through the shared
//! secret on first login. The stored hash never appears in any response.

use crate::AppState;
use auditbase_common::{
    auth::AuthContext,
    db::models::User,
    db::repository::{NewUser, UserChanges},
    db::Repository,
    errors::{AppError, Result},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1, max = 128))]
    pub name: String,

    /// Free-form role label; defaults to "auditor"
    pub role: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 128))]
    pub name: Option<String>,

    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
    pub must_change_password: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl UserView {
    pub fn from_model(user: User) -> Self {
        let must_change_password = user.must_change_password();
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            must_change_password,
            created_at: user.created_at.into(),
            updated_at: user.updated_at.into(),
        }
    }
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserView>)> {
    req.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let repo = Repository::new(state.db.clone());
    let user = repo
        .create_user(NewUser {
            email: req.email.to_lowercase(),
            name: req.name,
            role: req.role.unwrap_or_else(|| "auditor".to_string()),
        })
        .await?;

    tracing::info!(email = %user.email, created_by = %auth.email, "User created");

    Ok((StatusCode::CREATED, Json(UserView::from_model(user))))
}

pub async fn list(State(state): State<AppState>, _auth: AuthContext) -> Result<Json<Vec<UserView>>> {
    let repo = Repository::new(state.db.clone());
    let users = repo.list_users().await?;
    Ok(Json(users.into_iter().map(UserView::from_model).collect()))
}

pub async fn get(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<UserView>> {
    let repo = Repository::new(state.db.clone());
    let user = repo
        .find_user_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("User", id))?;
    Ok(Json(UserView::from_model(user)))
}

pub async fn update(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserView>> {
    req.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let repo = Repository::new(state.db.clone());
    let user = repo
        .update_user(
            id,
            UserChanges {
                name: req.name,
                role: req.role,
            },
        )
        .await?;

    tracing::info!(email = %user.email, updated_by = %auth.email, "User updated");

    Ok(Json(UserView::from_model(user)))
}

pub async fn delete(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    if auth.user_id == id {
        return Err(AppError::Forbidden {
            message: "Users cannot delete their own account".to_string(),
        });
    }

    let repo = Repository::new(state.db.clone());
    repo.delete_user(id).await?;

    tracing::info!(user_id = %id, deleted_by = %auth.email, "User deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_rejects_bad_email() {
        let req: CreateUserRequest = serde_json::from_value(serde_json::json!({
            "email": "not-an-email",
            "name": "Pat"
        }))
        .unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_view_hides_password_hash() {
        let now = chrono::Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: "lead@example.com".to_string(),
            name: "Lead Auditor".to_string(),
            role: "admin".to_string(),
            password_hash: Some("$argon2id$v=19$...".to_string()),
            created_at: now.into(),
            updated_at: now.into(),
        };

        let json = serde_json::to_value(UserView::from_model(user)).unwrap();
        assert!(!json.to_string().contains("argon2"));
        assert_eq!(json["mustChangePassword"], serde_json::json!(false));
    }
}
