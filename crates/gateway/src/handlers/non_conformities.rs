//! Non-conformity CRUD handlers
//!
//! Non-conformities carry severity, a workflow status and an optional link
//! to the audit that raised them. Bulk delete has no state guard; findings
//! may be removed at any point.

use crate::handlers::attachments::{attachment_view, cleanup_orphans, AttachmentView};
use crate::handlers::audits::{BulkDeleteRequest, BulkDeleteResponse};
use crate::AppState;
use auditbase_common::{
    auth::AuthContext,
    db::models::{decode_attachments, NonConformity, ResourceKind},
    db::repository::{NewNonConformity, NonConformityChanges},
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
pub struct CreateNonConformityRequest {
    #[validate(length(min = 1, max = 64))]
    pub document_id: String,

    #[validate(length(min = 1, max = 256))]
    pub title: String,

    pub description: Option<String>,

    #[validate(length(min = 1, max = 32))]
    pub severity: String,

    /// Workflow status label; defaults to Open
    pub status: Option<String>,

    pub audit_id: Option<Uuid>,
    pub due_date: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNonConformityRequest {
    pub document_id: Option<String>,

    #[validate(length(min = 1, max = 256))]
    pub title: Option<String>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    pub description: Option<Option<String>>,

    #[validate(length(min = 1, max = 32))]
    pub severity: Option<String>,

    pub status: Option<String>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    pub audit_id: Option<Option<Uuid>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub due_date: Option<Option<chrono::DateTime<chrono::Utc>>>,

    pub attachments: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NonConformityView {
    pub id: Uuid,
    pub document_id: String,
    pub title: String,
    pub description: Option<String>,
    pub severity: String,
    pub status: String,
    pub audit_id: Option<Uuid>,
    pub due_date: Option<chrono::DateTime<chrono::Utc>>,
    pub attachments: Vec<AttachmentView>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl NonConformityView {
    fn from_model(nc: NonConformity) -> Self {
        let attachments = decode_attachments(&nc.attachments)
            .iter()
            .map(|meta| attachment_view(ResourceKind::NonConformity, nc.id, meta))
            .collect();

        Self {
            id: nc.id,
            document_id: nc.document_id,
            title: nc.title,
            description: nc.description,
            severity: nc.severity,
            status: nc.status,
            audit_id: nc.audit_id,
            due_date: nc.due_date.map(Into::into),
            attachments,
            created_at: nc.created_at.into(),
            updated_at: nc.updated_at.into(),
        }
    }
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<CreateNonConformityRequest>,
) -> Result<(StatusCode, Json<NonConformityView>)> {
    req.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let repo = Repository::new(state.db.clone());

    // A dangling audit link would serve nobody; verify it up front
    if let Some(audit_id) = req.audit_id {
        repo.find_audit_by_id(audit_id)
            .await?
            .ok_or_else(|| AppError::not_found("Audit", audit_id))?;
    }

    let nc = repo
        .create_non_conformity(NewNonConformity {
            document_id: req.document_id,
            title: req.title,
            description: req.description,
            severity: req.severity,
            status: req.status.unwrap_or_else(|| "Open".to_string()),
            audit_id: req.audit_id,
            due_date: req.due_date,
        })
        .await?;

    tracing::info!(document_id = %nc.document_id, user = %auth.email, "Non-conformity created");

    Ok((
        StatusCode::CREATED,
        Json(NonConformityView::from_model(nc)),
    ))
}

pub async fn list(
    State(state): State<AppState>,
    _auth: AuthContext,
) -> Result<Json<Vec<NonConformityView>>> {
    let repo = Repository::new(state.db.clone());
    let items = repo.list_non_conformities().await?;
    Ok(Json(
        items
            .into_iter()
            .map(NonConformityView::from_model)
            .collect(),
    ))
}

pub async fn get(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<NonConformityView>> {
    let repo = Repository::new(state.db.clone());
    let nc = repo
        .find_non_conformity_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Non-conformity", id))?;
    Ok(Json(NonConformityView::from_model(nc)))
}

pub async fn update(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateNonConformityRequest>,
) -> Result<Json<NonConformityView>> {
    req.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    if req.attachments.is_some() {
        return Err(AppError::Validation {
            message: "attachments cannot be modified through update; use the attachment endpoints"
                .to_string(),
            field: Some("attachments".to_string()),
        });
    }

    let repo = Repository::new(state.db.clone());

    if let Some(requested_key) = &req.document_id {
        let current = repo
            .find_non_conformity_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Non-conformity", id))?;
        if *requested_key != current.document_id {
            return Err(AppError::Validation {
                message: "documentId is immutable after creation".to_string(),
                field: Some("documentId".to_string()),
            });
        }
    }

    if let Some(Some(audit_id)) = req.audit_id {
        repo.find_audit_by_id(audit_id)
            .await?
            .ok_or_else(|| AppError::not_found("Audit", audit_id))?;
    }

    let nc = repo
        .update_non_conformity(
            id,
            NonConformityChanges {
                title: req.title,
                description: req.description,
                severity: req.severity,
                status: req.status,
                audit_id: req.audit_id,
                due_date: req.due_date,
            },
        )
        .await?;

    tracing::info!(document_id = %nc.document_id, user = %auth.email, "Non-conformity updated");

    Ok(Json(NonConformityView::from_model(nc)))
}

pub async fn bulk_delete(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<BulkDeleteRequest>,
) -> Result<Json<BulkDeleteResponse>> {
    let repo = Repository::new(state.db.clone());
    let outcome = repo.bulk_delete_non_conformities(&req.ids).await?;

    cleanup_orphans(
        &state,
        ResourceKind::NonConformity,
        &outcome.orphaned_attachments,
    )
    .await;

    tracing::info!(
        user = %auth.email,
        deleted = outcome.deleted_ids.len(),
        orphaned_files = outcome.orphaned_attachments.len(),
        "Non-conformities bulk-deleted"
    );

    Ok(Json(BulkDeleteResponse {
        deleted: outcome.deleted_ids,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_minimal() {
        let req: CreateNonConformityRequest = serde_json::from_value(serde_json::json!({
            "documentId": "NC-2026-007",
            "title": "Calibration records missing",
            "severity": "major"
        }))
        .unwrap();
        assert!(req.validate().is_ok());
        assert!(req.status.is_none());
        assert!(req.audit_id.is_none());
    }

    #[test]
    fn test_update_can_clear_audit_link() {
        let req: UpdateNonConformityRequest =
            serde_json::from_value(serde_json::json!({ "auditId": null })).unwrap();
        assert_eq!(req.audit_id, Some(None));
    }
}
