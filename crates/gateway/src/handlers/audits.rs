//! Audit CRUD handlers
//!
//! Audits differ from the library documents in shape (lifecycle status,
//! schedule, lead auditor) and in their bulk-delete guard: a batch is
//! rejected unless every selected audit is still Planned.

use crate::handlers::attachments::{attachment_view, cleanup_orphans, AttachmentView};
use crate::AppState;
use auditbase_common::{
    auth::AuthContext,
    db::models::{decode_attachments, Audit, AuditStatus, ResourceKind},
    db::repository::{AuditChanges, NewAudit},
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
pub struct CreateAuditRequest {
    #[validate(length(min = 1, max = 64))]
    pub audit_id: String,

    #[validate(length(min = 1, max = 256))]
    pub name: String,

    #[validate(length(min = 1, max = 64))]
    pub audit_type: String,

    /// Lifecycle status label; defaults to Planned
    pub status: Option<String>,

    pub standard: Option<String>,
    pub scope: Option<String>,
    pub lead_auditor: Option<String>,
    pub start_date: Option<chrono::DateTime<chrono::Utc>>,
    pub end_date: Option<chrono::DateTime<chrono::Utc>>,
}

/// Partial update. `auditId` is accepted but must match the stored natural
/// key; attachments are not writable here at all.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAuditRequest {
    pub audit_id: Option<String>,

    #[validate(length(min = 1, max = 256))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 64))]
    pub audit_type: Option<String>,

    pub status: Option<String>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    pub standard: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub scope: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub lead_auditor: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub start_date: Option<Option<chrono::DateTime<chrono::Utc>>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub end_date: Option<Option<chrono::DateTime<chrono::Utc>>>,

    /// Rejected if present; the attachment endpoints own this field
    pub attachments: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest {
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteResponse {
    pub deleted: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditView {
    pub id: Uuid,
    pub audit_id: String,
    pub name: String,
    pub audit_type: String,
    pub status: String,
    pub standard: Option<String>,
    pub scope: Option<String>,
    pub lead_auditor: Option<String>,
    pub start_date: Option<chrono::DateTime<chrono::Utc>>,
    pub end_date: Option<chrono::DateTime<chrono::Utc>>,
    pub attachments: Vec<AttachmentView>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl AuditView {
    fn from_model(audit: Audit) -> Self {
        let attachments = decode_attachments(&audit.attachments)
            .iter()
            .map(|meta| attachment_view(ResourceKind::Audit, audit.id, meta))
            .collect();

        Self {
            id: audit.id,
            audit_id: audit.audit_id,
            name: audit.name,
            audit_type: audit.audit_type,
            status: audit.status,
            standard: audit.standard,
            scope: audit.scope,
            lead_auditor: audit.lead_auditor,
            start_date: audit.start_date.map(Into::into),
            end_date: audit.end_date.map(Into::into),
            attachments,
            created_at: audit.created_at.into(),
            updated_at: audit.updated_at.into(),
        }
    }
}

fn parse_status(label: &str) -> Result<AuditStatus> {
    AuditStatus::parse(label).ok_or_else(|| AppError::Validation {
        message: format!("unknown audit status: {}", label),
        field: Some("status".to_string()),
    })
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<CreateAuditRequest>,
) -> Result<(StatusCode, Json<AuditView>)> {
    req.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let status = match req.status.as_deref() {
        Some(label) => parse_status(label)?,
        None => AuditStatus::Planned,
    };

    let repo = Repository::new(state.db.clone());
    let audit = repo
        .create_audit(NewAudit {
            audit_id: req.audit_id,
            name: req.name,
            audit_type: req.audit_type,
            status,
            standard: req.standard,
            scope: req.scope,
            lead_auditor: req.lead_auditor,
            start_date: req.start_date,
            end_date: req.end_date,
        })
        .await?;

    tracing::info!(audit_id = %audit.audit_id, user = %auth.email, "Audit created");

    Ok((StatusCode::CREATED, Json(AuditView::from_model(audit))))
}

pub async fn list(
    State(state): State<AppState>,
    _auth: AuthContext,
) -> Result<Json<Vec<AuditView>>> {
    let repo = Repository::new(state.db.clone());
    let audits = repo.list_audits().await?;
    Ok(Json(audits.into_iter().map(AuditView::from_model).collect()))
}

pub async fn get(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<AuditView>> {
    let repo = Repository::new(state.db.clone());
    let audit = repo
        .find_audit_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Audit", id))?;
    Ok(Json(AuditView::from_model(audit)))
}

pub async fn update(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateAuditRequest>,
) -> Result<Json<AuditView>> {
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

    // Natural key immutability is enforced here, not trusted to clients
    if let Some(requested_key) = &req.audit_id {
        let current = repo
            .find_audit_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Audit", id))?;
        if *requested_key != current.audit_id {
            return Err(AppError::Validation {
                message: "auditId is immutable after creation".to_string(),
                field: Some("auditId".to_string()),
            });
        }
    }

    let status = match req.status.as_deref() {
        Some(label) => Some(parse_status(label)?),
        None => None,
    };

    let audit = repo
        .update_audit(
            id,
            AuditChanges {
                name: req.name,
                audit_type: req.audit_type,
                status,
                standard: req.standard,
                scope: req.scope,
                lead_auditor: req.lead_auditor,
                start_date: req.start_date,
                end_date: req.end_date,
            },
        )
        .await?;

    tracing::info!(audit_id = %audit.audit_id, user = %auth.email, "Audit updated");

    Ok(Json(AuditView::from_model(audit)))
}

/// Bulk delete. The Planned-only guard runs before anything is removed;
/// orphaned files are cleaned up best-effort afterwards.
pub async fn bulk_delete(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<BulkDeleteRequest>,
) -> Result<Json<BulkDeleteResponse>> {
    let repo = Repository::new(state.db.clone());
    let outcome = repo.bulk_delete_audits(&req.ids).await?;

    cleanup_orphans(&state, ResourceKind::Audit, &outcome.orphaned_attachments).await;

    tracing::info!(
        user = %auth.email,
        deleted = outcome.deleted_ids.len(),
        orphaned_files = outcome.orphaned_attachments.len(),
        "Audits bulk-deleted"
    );

    Ok(Json(BulkDeleteResponse {
        deleted: outcome.deleted_ids,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_defaults_status() {
        let req: CreateAuditRequest = serde_json::from_value(serde_json::json!({
            "auditId": "AUD-2026-01",
            "name": "Annual internal audit",
            "auditType": "internal"
        }))
        .unwrap();
        assert!(req.status.is_none());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_update_request_distinguishes_absent_from_null() {
        let absent: UpdateAuditRequest = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(absent.scope, None);

        let cleared: UpdateAuditRequest =
            serde_json::from_value(serde_json::json!({ "scope": null })).unwrap();
        assert_eq!(cleared.scope, Some(None));

        let set: UpdateAuditRequest =
            serde_json::from_value(serde_json::json!({ "scope": "EU sites" })).unwrap();
        assert_eq!(set.scope, Some(Some("EU sites".to_string())));
    }

    #[test]
    fn test_unknown_status_rejected() {
        assert!(parse_status("Archived").is_err());
        assert!(parse_status("In Progress").is_ok());
    }
}
