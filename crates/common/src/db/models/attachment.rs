//! Embedded attachment metadata
//!
//! Attachments never stand alone: each record lives inside its parent
//! resource row as an element of the `attachments` JSONB array. The array is
//! mutated only through the repository's atomic append/remove operations;
//! resource updates never touch it.

use crate::errors::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata for one uploaded file, embedded in the owning resource document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentMeta {
    /// Unique within the parent's attachment sequence
    pub id: Uuid,

    /// Collision-resistant name the bytes are persisted under
    pub storage_name: String,

    /// User-supplied filename, used for display and download disposition
    pub original_name: String,

    /// Location of the bytes relative to the configured upload root
    pub path: String,

    /// Content type declared at upload time. Trusted for delivery
    /// decisions; never re-sniffed from bytes.
    pub mime_type: String,

    /// Byte length at upload time
    pub size: i64,

    pub uploaded_at: DateTime<Utc>,
}

impl AttachmentMeta {
    pub fn new(
        storage_name: String,
        original_name: String,
        mime_type: String,
        size: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            path: storage_name.clone(),
            storage_name,
            original_name,
            mime_type,
            size,
            uploaded_at: Utc::now(),
        }
    }
}

/// Look up one record in a parent's attachment sequence by id.
/// An unknown id is `AttachmentNotFound`; the sequence itself is never
/// modified by a failed lookup.
pub fn find_attachment(metas: &[AttachmentMeta], id: Uuid) -> Result<&AttachmentMeta> {
    metas
        .iter()
        .find(|m| m.id == id)
        .ok_or_else(|| AppError::AttachmentNotFound { id: id.to_string() })
}

/// Decode a JSONB `attachments` column into metadata records.
///
/// Entries that fail to decode are dropped with a warning rather than
/// failing the whole parent read; a corrupt element must not make every
/// other attachment unreachable.
pub fn decode_attachments(value: &serde_json::Value) -> Vec<AttachmentMeta> {
    match value {
        serde_json::Value::Array(items) => items
            .iter()
            .filter_map(|item| match serde_json::from_value(item.clone()) {
                Ok(meta) => Some(meta),
                Err(e) => {
                    tracing::warn!(error = %e, "Dropping undecodable attachment entry");
                    None
                }
            })
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_meta_defaults_path_to_storage_name() {
        let meta = AttachmentMeta::new(
            "1700000000-a1b2-report.pdf".into(),
            "report.pdf".into(),
            "application/pdf".into(),
            42,
        );
        assert_eq!(meta.path, meta.storage_name);
        assert_eq!(meta.original_name, "report.pdf");
    }

    #[test]
    fn test_decode_skips_corrupt_entries() {
        let meta = AttachmentMeta::new("s".into(), "o".into(), "text/plain".into(), 1);
        let value = serde_json::json!([
            serde_json::to_value(&meta).unwrap(),
            {"garbage": true},
        ]);

        let decoded = decode_attachments(&value);
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].id, meta.id);
    }

    #[test]
    fn test_decode_non_array_is_empty() {
        assert!(decode_attachments(&serde_json::Value::Null).is_empty());
    }

    #[test]
    fn test_find_attachment_returns_matching_record() {
        let a = AttachmentMeta::new("s-a".into(), "a.pdf".into(), "application/pdf".into(), 1);
        let b = AttachmentMeta::new("s-b".into(), "b.png".into(), "image/png".into(), 2);
        let metas = vec![a.clone(), b.clone()];

        let found = find_attachment(&metas, b.id).unwrap();
        assert_eq!(found.id, b.id);
        assert_eq!(found.original_name, "b.png");
    }

    #[test]
    fn test_find_attachment_unknown_id_leaves_sequence_intact() {
        let a = AttachmentMeta::new("s-a".into(), "a.pdf".into(), "application/pdf".into(), 1);
        let metas = vec![a.clone()];

        let missing = Uuid::new_v4();
        let err = find_attachment(&metas, missing).unwrap_err();
        match err {
            AppError::AttachmentNotFound { id } => assert_eq!(id, missing.to_string()),
            other => panic!("expected AttachmentNotFound, got {:?}", other),
        }

        assert_eq!(metas.len(), 1);
        assert_eq!(metas[0].id, a.id);
    }
}
