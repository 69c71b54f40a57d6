//! Attachment store: disk persistence for uploaded files
//!
//! Owns the relationship between uploaded bytes on disk and the metadata
//! records embedded in the parent resource rows. The store only handles the
//! bytes; the repository owns the metadata side.
//!
//! Storage names combine an upload-instant component, random hex and a
//! sanitized copy of the original filename, so concurrent uploads of
//! identically-named files never clobber each other and the original name is
//! never used verbatim on disk.
//!
//! Batch semantics are all-or-nothing: if any file in an upload batch fails
//! to write (or the client aborts mid-stream), every file already written
//! for that batch is deleted before the error is reported. No metadata ever
//! points at a file the batch failed to produce.

use crate::db::models::AttachmentMeta;
use crate::errors::{AppError, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// One file payload taken from a multipart upload
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Outcome of removing a backing file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRemoval {
    Removed,
    /// The file was already gone. Not an error: the metadata record, not
    /// the file, is authoritative for whether an attachment exists.
    AlreadyAbsent,
}

/// Delivery disposition derived from the declared MIME type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Inline,
    Attachment,
}

/// Pure function of the stored MIME type: PDFs and images render in-place,
/// everything else forces a download. The declared type is trusted as-is;
/// re-sniffing from bytes would change behavior and is out of scope.
pub fn disposition_for(mime_type: &str) -> Disposition {
    if mime_type == "application/pdf" || mime_type.starts_with("image/") {
        Disposition::Inline
    } else {
        Disposition::Attachment
    }
}

/// Build a Content-Disposition header value advertising the original name
pub fn content_disposition_value(disposition: Disposition, original_name: &str) -> String {
    let token = match disposition {
        Disposition::Inline => "inline",
        Disposition::Attachment => "attachment",
    };
    // Quotes and control characters would break the header
    let name: String = original_name
        .chars()
        .map(|c| if c == '"' || c.is_control() { '_' } else { c })
        .collect();
    format!("{}; filename=\"{}\"", token, name)
}

/// Normalize a user-supplied filename for use inside a storage name.
/// Whitespace, path separators and anything outside `[A-Za-z0-9._-]`
/// become underscores.
pub fn sanitize_file_name(name: &str) -> String {
    // Only the final path component; clients may send full paths
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(name);

    let sanitized: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.trim_matches(['_', '.']).is_empty() {
        "file".to_string()
    } else {
        sanitized
    }
}

/// Disk-backed store rooted at the configured upload directory.
///
/// The directory is one flat, owner-agnostic namespace shared by every
/// resource type; collision-resistant storage names are the only thing
/// preventing cross-request clobbering, which is why they carry randomness.
#[derive(Clone)]
pub struct AttachmentStore {
    root: PathBuf,
}

impl AttachmentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn full_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Derive a collision-resistant storage name for an upload.
    pub fn storage_name(&self, original_name: &str) -> String {
        let millis = chrono::Utc::now().timestamp_millis();
        let nonce: [u8; 4] = rand::random();
        format!(
            "{}-{}-{}",
            millis,
            hex::encode(nonce),
            sanitize_file_name(original_name)
        )
    }

    /// Validate that the upload root can be written, read and deleted.
    /// Runs a full round-trip at startup to catch permission and mount
    /// problems before the first upload does.
    pub async fn validate(&self) -> Result<()> {
        let probe = self.full_path(".health-check");

        fs::create_dir_all(&self.root).await?;

        let data = b"storage-health-check";
        fs::write(&probe, data).await?;

        let read_back = fs::read(&probe).await?;
        if read_back != data {
            return Err(AppError::Storage {
                message: "upload root read-back mismatch".to_string(),
            });
        }

        fs::remove_file(&probe).await?;
        Ok(())
    }

    /// Persist one upload batch, all-or-nothing.
    ///
    /// On any individual write failure the files already written for this
    /// batch are deleted and the whole operation fails; the caller never
    /// sees a partial result.
    pub async fn store_batch(&self, files: Vec<UploadedFile>) -> Result<Vec<AttachmentMeta>> {
        fs::create_dir_all(&self.root).await?;

        let mut written: Vec<String> = Vec::new();
        let mut metas = Vec::with_capacity(files.len());

        for file in files {
            let storage_name = self.storage_name(&file.original_name);
            let size = file.data.len() as i64;

            if let Err(e) = fs::write(self.full_path(&storage_name), &file.data).await {
                warn!(
                    storage_name = %storage_name,
                    error = %e,
                    "Upload write failed; rolling back batch"
                );
                self.rollback(&written).await;
                return Err(e.into());
            }

            debug!(storage_name = %storage_name, size, "Attachment written");
            written.push(storage_name.clone());
            metas.push(AttachmentMeta::new(
                storage_name,
                file.original_name,
                file.mime_type,
                size,
            ));
        }

        Ok(metas)
    }

    /// Best-effort deletion of files written earlier in an aborted batch.
    pub async fn rollback(&self, storage_names: &[String]) {
        for name in storage_names {
            if let Err(e) = fs::remove_file(self.full_path(name)).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(storage_name = %name, error = %e, "Rollback cleanup failed");
                }
            }
        }
    }

    /// Remove the backing file at a recorded path.
    ///
    /// Absence is reported, not failed: delete-attachment must succeed even
    /// when the file disappeared out-of-band. Other I/O errors surface as
    /// `Storage` so the caller can log a warning and still clear metadata.
    pub async fn remove(&self, path: &str) -> Result<FileRemoval> {
        match fs::remove_file(self.full_path(path)).await {
            Ok(()) => Ok(FileRemoval::Removed),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FileRemoval::AlreadyAbsent),
            Err(e) => Err(AppError::Storage {
                message: format!("failed to remove {}: {}", path, e),
            }),
        }
    }

    /// Whether the backing file for a recorded path is present on disk
    pub async fn exists(&self, path: &str) -> bool {
        fs::try_exists(self.full_path(path)).await.unwrap_or(false)
    }

    /// Read the backing file for delivery. `None` means the file is absent,
    /// so a file that vanishes between lookup and read still surfaces as
    /// storage drift rather than an I/O failure.
    pub async fn read(&self, path: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.full_path(path)).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Storage {
                message: format!("failed to read {}: {}", path, e),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store() -> (tempfile::TempDir, AttachmentStore) {
        let dir = tempdir().unwrap();
        let store = AttachmentStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn test_sanitize_strips_whitespace() {
        assert_eq!(sanitize_file_name("a b.txt"), "a_b.txt");
        assert_eq!(sanitize_file_name("  report  .pdf"), "__report__.pdf");
        assert!(!sanitize_file_name("annual report 2026.pdf").contains(' '));
    }

    #[test]
    fn test_sanitize_strips_path_components() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\temp\\notes.txt"), "notes.txt");
    }

    #[test]
    fn test_sanitize_degenerate_names() {
        assert_eq!(sanitize_file_name(""), "file");
        assert_eq!(sanitize_file_name("???"), "file");
        assert_eq!(sanitize_file_name(".."), "file");
    }

    #[test]
    fn test_storage_names_are_distinct() {
        let store = AttachmentStore::new("uploads");
        let a = store.storage_name("report.pdf");
        let b = store.storage_name("report.pdf");
        assert_ne!(a, b);
        assert!(a.ends_with("report.pdf"));
        assert!(!a.contains(' '));
    }

    #[test]
    fn test_disposition_decision() {
        assert_eq!(disposition_for("application/pdf"), Disposition::Inline);
        assert_eq!(disposition_for("image/png"), Disposition::Inline);
        assert_eq!(disposition_for("image/svg+xml"), Disposition::Inline);
        assert_eq!(disposition_for("text/plain"), Disposition::Attachment);
        assert_eq!(
            disposition_for("application/octet-stream"),
            Disposition::Attachment
        );
    }

    #[test]
    fn test_content_disposition_header() {
        assert_eq!(
            content_disposition_value(Disposition::Inline, "report.pdf"),
            "inline; filename=\"report.pdf\""
        );
        assert_eq!(
            content_disposition_value(Disposition::Attachment, "a\"b.txt"),
            "attachment; filename=\"a_b.txt\""
        );
    }

    #[tokio::test]
    async fn test_store_batch_roundtrip() {
        let (_dir, store) = store();

        let metas = store
            .store_batch(vec![
                UploadedFile {
                    original_name: "first report.pdf".into(),
                    mime_type: "application/pdf".into(),
                    data: b"pdf bytes".to_vec(),
                },
                UploadedFile {
                    original_name: "evidence.png".into(),
                    mime_type: "image/png".into(),
                    data: b"png bytes".to_vec(),
                },
            ])
            .await
            .unwrap();

        // Arrival order preserved, original names intact
        assert_eq!(metas.len(), 2);
        assert_eq!(metas[0].original_name, "first report.pdf");
        assert_eq!(metas[1].original_name, "evidence.png");
        assert!(!metas[0].storage_name.contains(' '));

        for meta in &metas {
            assert!(store.exists(&meta.path).await);
        }
        assert_eq!(
            store.read(&metas[0].path).await.unwrap().as_deref(),
            Some(b"pdf bytes".as_slice())
        );
    }

    #[tokio::test]
    async fn test_remove_is_absence_tolerant() {
        let (_dir, store) = store();

        let metas = store
            .store_batch(vec![UploadedFile {
                original_name: "note.txt".into(),
                mime_type: "text/plain".into(),
                data: b"x".to_vec(),
            }])
            .await
            .unwrap();

        assert_eq!(
            store.remove(&metas[0].path).await.unwrap(),
            FileRemoval::Removed
        );
        // Second removal: the file is gone, and that is fine
        assert_eq!(
            store.remove(&metas[0].path).await.unwrap(),
            FileRemoval::AlreadyAbsent
        );
    }

    #[tokio::test]
    async fn test_rollback_removes_written_files() {
        let (_dir, store) = store();

        let metas = store
            .store_batch(vec![UploadedFile {
                original_name: "tmp.bin".into(),
                mime_type: "application/octet-stream".into(),
                data: vec![0u8; 16],
            }])
            .await
            .unwrap();

        let names: Vec<String> = metas.iter().map(|m| m.storage_name.clone()).collect();
        store.rollback(&names).await;

        assert!(!store.exists(&metas[0].path).await);
    }

    #[tokio::test]
    async fn test_read_reports_absent_file_as_none() {
        let (_dir, store) = store();
        assert_eq!(store.read("no-such-file").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_validate_round_trip() {
        let (_dir, store) = store();
        store.validate().await.unwrap();
    }
}
