//! Attachment lifecycle handlers
//!
//! One generic implementation for every attachment-owning resource type;
//! the owning `ResourceKind` arrives via a router Extension. Uploads are
//! all-or-nothing per batch, deletes are tolerant of files that vanished
//! out-of-band, and serving distinguishes "unknown attachment id" from
//! "metadata exists but the file is gone" (storage drift).

use crate::AppState;
use auditbase_common::{
    auth::AuthContext,
    db::models::{find_attachment, AttachmentMeta, ResourceKind},
    db::Repository,
    errors::{AppError, Result},
    metrics,
    storage::{content_disposition_value, disposition_for, FileRemoval, UploadedFile},
    UPLOAD_FIELD,
};
use axum::{
    extract::{Extension, Multipart, Path, State},
    http::{header, StatusCode},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

/// What callers see of an attachment. The filesystem path and storage name
/// never leave the server; retrieval goes through the constructed URL.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentView {
    pub id: Uuid,
    pub name: String,
    pub mime_type: String,
    pub size: i64,
    pub uploaded_at: chrono::DateTime<chrono::Utc>,
    pub url: String,
}

pub fn attachment_view(kind: ResourceKind, parent_id: Uuid, meta: &AttachmentMeta) -> AttachmentView {
    AttachmentView {
        id: meta.id,
        name: meta.original_name.clone(),
        mime_type: meta.mime_type.clone(),
        size: meta.size,
        uploaded_at: meta.uploaded_at,
        url: format!(
            "/api/{}/{}/attachments/{}",
            kind.api_path(),
            parent_id,
            meta.id
        ),
    }
}

fn views(kind: ResourceKind, parent_id: Uuid, metas: &[AttachmentMeta]) -> Vec<AttachmentView> {
    metas
        .iter()
        .map(|meta| attachment_view(kind, parent_id, meta))
        .collect()
}

/// A multipart read can fail because the body exceeded the configured size
/// cap (the limit layer cuts the stream mid-read) or because the body is
/// genuinely malformed; the caller must see 413 for the former, 400 for the
/// latter.
fn map_multipart_err(status: StatusCode, detail: String, limit: usize) -> AppError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge { limit }
    } else {
        AppError::Validation {
            message: format!("malformed multipart body: {}", detail),
            field: Some(UPLOAD_FIELD.to_string()),
        }
    }
}

/// Upload one or more files to an existing parent resource.
///
/// Multipart field name is `attachments`. The whole request body is read
/// before anything touches disk, so a client abort mid-stream leaves no
/// partial file; a disk failure mid-batch rolls back the files already
/// written (see the store).
pub async fn upload(
    State(state): State<AppState>,
    Extension(kind): Extension<ResourceKind>,
    auth: AuthContext,
    Path(parent_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Vec<AttachmentView>>)> {
    let repo = Repository::new(state.db.clone());

    // Parent must exist before any bytes are accepted
    repo.attachments_of(kind, parent_id).await?;

    let limit = state.config.storage.max_upload_bytes;
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| map_multipart_err(e.status(), e.body_text(), limit))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let original_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation {
                message: "each attachment part must carry a filename".to_string(),
                field: Some(UPLOAD_FIELD.to_string()),
            })?;
        let mime_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();

        let data = field
            .bytes()
            .await
            .map_err(|e| map_multipart_err(e.status(), e.body_text(), limit))?
            .to_vec();

        if data.len() > limit {
            return Err(AppError::PayloadTooLarge { limit });
        }

        files.push(UploadedFile {
            original_name,
            mime_type,
            data,
        });
    }

    if files.is_empty() {
        return Err(AppError::MissingField {
            field: UPLOAD_FIELD.to_string(),
        });
    }

    let count = files.len();
    let bytes: u64 = files.iter().map(|f| f.data.len() as u64).sum();

    let metas = state.store.store_batch(files).await?;
    let storage_names: Vec<String> = metas.iter().map(|m| m.storage_name.clone()).collect();

    // Atomic append; if the parent vanished between the existence check and
    // here, take the files back off disk before reporting
    let all = match repo.append_attachments(kind, parent_id, &metas).await {
        Ok(all) => all,
        Err(e) => {
            state.store.rollback(&storage_names).await;
            return Err(e);
        }
    };

    metrics::record_upload(kind.api_path(), count, bytes);
    tracing::info!(
        resource = kind.api_path(),
        parent_id = %parent_id,
        user = %auth.email,
        files = count,
        bytes,
        "Attachments uploaded"
    );

    Ok((StatusCode::CREATED, Json(views(kind, parent_id, &all))))
}

/// List attachment metadata with constructed retrieval URLs
pub async fn list(
    State(state): State<AppState>,
    Extension(kind): Extension<ResourceKind>,
    _auth: AuthContext,
    Path(parent_id): Path<Uuid>,
) -> Result<Json<Vec<AttachmentView>>> {
    let repo = Repository::new(state.db.clone());
    let metas = repo.attachments_of(kind, parent_id).await?;
    Ok(Json(views(kind, parent_id, &metas)))
}

/// Stream one attachment, inline for PDFs and images, forced download
/// otherwise. Declared MIME type decides; bytes are never re-sniffed.
pub async fn serve(
    State(state): State<AppState>,
    Extension(kind): Extension<ResourceKind>,
    _auth: AuthContext,
    Path((parent_id, file_id)): Path<(Uuid, Uuid)>,
) -> Result<impl axum::response::IntoResponse> {
    let repo = Repository::new(state.db.clone());

    let metas = repo.attachments_of(kind, parent_id).await?;
    let meta = find_attachment(&metas, file_id)?;

    // Record absence is a bad id; a missing backing file is storage drift,
    // and the caller must be able to tell the two apart. Reading first (and
    // branching on absence) keeps that distinction even when the file
    // vanishes between lookup and delivery.
    let data = match state.store.read(&meta.path).await? {
        Some(data) => data,
        None => {
            metrics::record_storage_drift(kind.api_path());
            tracing::warn!(
                resource = kind.api_path(),
                parent_id = %parent_id,
                attachment_id = %file_id,
                "Attachment metadata present but file missing on disk"
            );
            return Err(AppError::FileMissing {
                name: meta.original_name.clone(),
            });
        }
    };

    let disposition = content_disposition_value(
        disposition_for(&meta.mime_type),
        &meta.original_name,
    );

    metrics::record_serve(kind.api_path());

    Ok((
        [
            (header::CONTENT_TYPE, meta.mime_type.clone()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        data,
    ))
}

/// Delete one attachment.
///
/// The metadata record is authoritative: a missing backing file does not
/// fail the operation, and an I/O failure on the file only produces a
/// warning-level signal while the catalog entry still goes away.
pub async fn delete(
    State(state): State<AppState>,
    Extension(kind): Extension<ResourceKind>,
    auth: AuthContext,
    Path((parent_id, file_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Vec<AttachmentView>>> {
    let repo = Repository::new(state.db.clone());

    let metas = repo.attachments_of(kind, parent_id).await?;
    let meta = find_attachment(&metas, file_id)?;

    match state.store.remove(&meta.path).await {
        Ok(FileRemoval::Removed) => {}
        Ok(FileRemoval::AlreadyAbsent) => {
            metrics::record_storage_drift(kind.api_path());
            tracing::warn!(
                resource = kind.api_path(),
                attachment_id = %file_id,
                "Backing file already absent; removing metadata only"
            );
        }
        Err(e) => {
            // Not absence: record for operational visibility, then proceed
            // with the metadata removal the caller actually asked for
            metrics::record_cleanup_failure(kind.api_path());
            tracing::warn!(
                resource = kind.api_path(),
                attachment_id = %file_id,
                error = %e,
                "Backing file removal failed; removing metadata anyway"
            );
        }
    }

    let (_removed, remaining) = repo.remove_attachment(kind, parent_id, file_id).await?;

    metrics::record_delete(kind.api_path());
    tracing::info!(
        resource = kind.api_path(),
        parent_id = %parent_id,
        attachment_id = %file_id,
        user = %auth.email,
        "Attachment deleted"
    );

    Ok(Json(views(kind, parent_id, &remaining)))
}

/// Best-effort removal of backing files after their parents were deleted.
/// Failures are logged and counted, never surfaced: the parents are gone
/// and the files are orphans either way.
pub async fn cleanup_orphans(state: &AppState, kind: ResourceKind, metas: &[AttachmentMeta]) {
    for meta in metas {
        match state.store.remove(&meta.path).await {
            Ok(FileRemoval::Removed) | Ok(FileRemoval::AlreadyAbsent) => {}
            Err(e) => {
                metrics::record_cleanup_failure(kind.api_path());
                tracing::warn!(
                    resource = kind.api_path(),
                    storage_name = %meta.storage_name,
                    error = %e,
                    "Orphaned file cleanup failed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(name: &str, mime: &str) -> AttachmentMeta {
        AttachmentMeta::new(
            format!("1700000000-abcd-{}", name),
            name.to_string(),
            mime.to_string(),
            10,
        )
    }

    #[test]
    fn test_view_constructs_retrieval_url() {
        let parent_id = Uuid::new_v4();
        let m = meta("report.pdf", "application/pdf");
        let view = attachment_view(ResourceKind::Policy, parent_id, &m);

        assert_eq!(
            view.url,
            format!("/api/policies/{}/attachments/{}", parent_id, m.id)
        );
        assert_eq!(view.name, "report.pdf");
    }

    #[test]
    fn test_oversized_multipart_maps_to_payload_too_large() {
        let err = map_multipart_err(
            StatusCode::PAYLOAD_TOO_LARGE,
            "length limit exceeded".to_string(),
            1024,
        );
        assert!(matches!(err, AppError::PayloadTooLarge { limit: 1024 }));

        let err = map_multipart_err(
            StatusCode::BAD_REQUEST,
            "unexpected end of stream".to_string(),
            1024,
        );
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[test]
    fn test_view_never_exposes_filesystem_path() {
        let m = meta("report.pdf", "application/pdf");
        let view = attachment_view(ResourceKind::Audit, Uuid::new_v4(), &m);

        let json = serde_json::to_value(&view).unwrap();
        let object = json.as_object().unwrap();
        assert!(!object.contains_key("path"));
        assert!(!object.contains_key("storageName"));
        assert!(!json.to_string().contains(&m.storage_name));
    }
}
