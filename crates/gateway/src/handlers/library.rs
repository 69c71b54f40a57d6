//! Library document CRUD handlers
//!
//! Policies, guidelines, templates, certificates and advisories share one
//! shape and one handler set; the concrete kind arrives via the same router
//! Extension the attachment handlers use. The natural key is accepted under
//! `documentId` or the kind-specific alias clients historically sent.

use crate::handlers::attachments::{attachment_view, cleanup_orphans, AttachmentView};
use crate::handlers::audits::{BulkDeleteRequest, BulkDeleteResponse};
use crate::AppState;
use auditbase_common::{
    auth::AuthContext,
    db::models::{decode_attachments, LibraryDocument, ResourceKind},
    db::repository::{LibraryDocumentChanges, NewLibraryDocument},
    db::Repository,
    errors::{AppError, Result},
};
use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateLibraryDocumentRequest {
    #[serde(
        alias = "policyId",
        alias = "guidelineId",
        alias = "templateId",
        alias = "certificateId",
        alias = "advisoryId"
    )]
    #[validate(length(min = 1, max = 64))]
    pub document_id: String,

    #[validate(length(min = 1, max = 256))]
    pub name: String,

    pub description: Option<String>,
    pub version: Option<String>,
    pub standard: Option<String>,
    pub effective_date: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLibraryDocumentRequest {
    #[serde(
        default,
        alias = "policyId",
        alias = "guidelineId",
        alias = "templateId",
        alias = "certificateId",
        alias = "advisoryId"
    )]
    pub document_id: Option<String>,

    #[validate(length(min = 1, max = 256))]
    pub name: Option<String>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub version: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub standard: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub effective_date: Option<Option<chrono::DateTime<chrono::Utc>>>,

    pub attachments: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryDocumentView {
    pub id: Uuid,
    pub document_id: String,
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
    pub standard: Option<String>,
    pub effective_date: Option<chrono::DateTime<chrono::Utc>>,
    pub attachments: Vec<AttachmentView>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl LibraryDocumentView {
    fn from_model(kind: ResourceKind, doc: LibraryDocument) -> Self {
        let attachments = decode_attachments(&doc.attachments)
            .iter()
            .map(|meta| attachment_view(kind, doc.id, meta))
            .collect();

        Self {
            id: doc.id,
            document_id: doc.document_id,
            name: doc.name,
            description: doc.description,
            version: doc.version,
            standard: doc.standard,
            effective_date: doc.effective_date.map(Into::into),
            attachments,
            created_at: doc.created_at.into(),
            updated_at: doc.updated_at.into(),
        }
    }
}

pub async fn create(
    State(state): State<AppState>,
    Extension(kind): Extension<ResourceKind>,
    auth: AuthContext,
    Json(req): Json<CreateLibraryDocumentRequest>,
) -> Result<(StatusCode, Json<LibraryDocumentView>)> {
    req.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let repo = Repository::new(state.db.clone());
    let doc = repo
        .create_library_document(
            kind,
            NewLibraryDocument {
                document_id: req.document_id,
                name: req.name,
                description: req.description,
                version: req.version,
                standard: req.standard,
                effective_date: req.effective_date,
            },
        )
        .await?;

    tracing::info!(
        resource = kind.api_path(),
        document_id = %doc.document_id,
        user = %auth.email,
        "Library document created"
    );

    Ok((
        StatusCode::CREATED,
        Json(LibraryDocumentView::from_model(kind, doc)),
    ))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(kind): Extension<ResourceKind>,
    _auth: AuthContext,
) -> Result<Json<Vec<LibraryDocumentView>>> {
    let repo = Repository::new(state.db.clone());
    let docs = repo.list_library_documents(kind).await?;
    Ok(Json(
        docs.into_iter()
            .map(|doc| LibraryDocumentView::from_model(kind, doc))
            .collect(),
    ))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(kind): Extension<ResourceKind>,
    _auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<LibraryDocumentView>> {
    let repo = Repository::new(state.db.clone());
    let doc = repo
        .find_library_document(kind, id)
        .await?
        .ok_or_else(|| AppError::not_found(kind.display_name(), id))?;
    Ok(Json(LibraryDocumentView::from_model(kind, doc)))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(kind): Extension<ResourceKind>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateLibraryDocumentRequest>,
) -> Result<Json<LibraryDocumentView>> {
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
            .find_library_document(kind, id)
            .await?
            .ok_or_else(|| AppError::not_found(kind.display_name(), id))?;
        if *requested_key != current.document_id {
            return Err(AppError::Validation {
                message: "documentId is immutable after creation".to_string(),
                field: Some("documentId".to_string()),
            });
        }
    }

    let doc = repo
        .update_library_document(
            kind,
            id,
            LibraryDocumentChanges {
                name: req.name,
                description: req.description,
                version: req.version,
                standard: req.standard,
                effective_date: req.effective_date,
            },
        )
        .await?;

    tracing::info!(
        resource = kind.api_path(),
        document_id = %doc.document_id,
        user = %auth.email,
        "Library document updated"
    );

    Ok(Json(LibraryDocumentView::from_model(kind, doc)))
}

pub async fn bulk_delete(
    State(state): State<AppState>,
    Extension(kind): Extension<ResourceKind>,
    auth: AuthContext,
    Json(req): Json<BulkDeleteRequest>,
) -> Result<Json<BulkDeleteResponse>> {
    let repo = Repository::new(state.db.clone());
    let outcome = repo.bulk_delete_library_documents(kind, &req.ids).await?;

    cleanup_orphans(&state, kind, &outcome.orphaned_attachments).await;

    tracing::info!(
        resource = kind.api_path(),
        user = %auth.email,
        deleted = outcome.deleted_ids.len(),
        orphaned_files = outcome.orphaned_attachments.len(),
        "Library documents bulk-deleted"
    );

    Ok(Json(BulkDeleteResponse {
        deleted: outcome.deleted_ids,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_accepts_kind_specific_alias() {
        let req: CreateLibraryDocumentRequest = serde_json::from_value(serde_json::json!({
            "advisoryId": "ADV-2026-03",
            "name": "Supplier qualification advisory"
        }))
        .unwrap();
        assert_eq!(req.document_id, "ADV-2026-03");

        let req: CreateLibraryDocumentRequest = serde_json::from_value(serde_json::json!({
            "documentId": "POL-001",
            "name": "Quality policy"
        }))
        .unwrap();
        assert_eq!(req.document_id, "POL-001");
    }

    #[test]
    fn test_update_version_can_be_cleared() {
        let req: UpdateLibraryDocumentRequest =
            serde_json::from_value(serde_json::json!({ "version": null })).unwrap();
        assert_eq!(req.version, Some(None));

        let req: UpdateLibraryDocumentRequest =
            serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(req.version, None);
    }
}
