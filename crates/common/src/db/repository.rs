//! Repository pattern for database operations
//!
//! Provides a clean interface for all data access operations with proper
//! error handling. The embedded `attachments` arrays are only ever mutated
//! through the atomic JSONB operations at the bottom of this file; nothing
//! here loads a document, splices the array in memory and saves it back, so
//! concurrent uploads and deletes against the same parent cannot lose
//! updates.

use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbBackend, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, SqlErr, Statement,
};
use uuid::Uuid;

/// Fields accepted when creating an audit
#[derive(Debug, Clone)]
pub struct NewAudit {
    pub audit_id: String,
    pub name: String,
    pub audit_type: String,
    pub status: AuditStatus,
    pub standard: Option<String>,
    pub scope: Option<String>,
    pub lead_auditor: Option<String>,
    pub start_date: Option<chrono::DateTime<chrono::Utc>>,
    pub end_date: Option<chrono::DateTime<chrono::Utc>>,
}

/// Partial update for an audit. The natural key and the attachments array
/// are deliberately absent: neither is writable through update.
#[derive(Debug, Clone, Default)]
pub struct AuditChanges {
    pub name: Option<String>,
    pub audit_type: Option<String>,
    pub status: Option<AuditStatus>,
    pub standard: Option<Option<String>>,
    pub scope: Option<Option<String>>,
    pub lead_auditor: Option<Option<String>>,
    pub start_date: Option<Option<chrono::DateTime<chrono::Utc>>>,
    pub end_date: Option<Option<chrono::DateTime<chrono::Utc>>>,
}

#[derive(Debug, Clone)]
pub struct NewNonConformity {
    pub document_id: String,
    pub title: String,
    pub description: Option<String>,
    pub severity: String,
    pub status: String,
    pub audit_id: Option<Uuid>,
    pub due_date: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct NonConformityChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub severity: Option<String>,
    pub status: Option<String>,
    pub audit_id: Option<Option<Uuid>>,
    pub due_date: Option<Option<chrono::DateTime<chrono::Utc>>>,
}

#[derive(Debug, Clone)]
pub struct NewLibraryDocument {
    pub document_id: String,
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
    pub standard: Option<String>,
    pub effective_date: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct LibraryDocumentChanges {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub version: Option<Option<String>>,
    pub standard: Option<Option<String>>,
    pub effective_date: Option<Option<chrono::DateTime<chrono::Utc>>>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub role: String,
}

#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub role: Option<String>,
}

/// Result of a bulk delete: the ids actually removed plus the attachment
/// records of the removed parents, so the caller can clean up their files.
#[derive(Debug, Default)]
pub struct BulkDeleteOutcome {
    pub deleted_ids: Vec<Uuid>,
    pub orphaned_attachments: Vec<AttachmentMeta>,
}

/// Bulk-delete guard for audits: every selected record must still be in the
/// initial Planned state, otherwise the whole batch is rejected before
/// anything is deleted.
pub fn ensure_all_planned(audits: &[Audit]) -> Result<()> {
    let blocked: Vec<&str> = audits
        .iter()
        .filter(|a| !a.is_planned())
        .map(|a| a.audit_id.as_str())
        .collect();

    if blocked.is_empty() {
        Ok(())
    } else {
        Err(AppError::DeletionBlocked {
            message: format!(
                "audits not in Planned state cannot be deleted: {}",
                blocked.join(", ")
            ),
        })
    }
}

fn ensure_ids_not_empty(ids: &[Uuid]) -> Result<()> {
    if ids.is_empty() {
        Err(AppError::Validation {
            message: "ids must be a non-empty list of identifiers".into(),
            field: Some("ids".into()),
        })
    } else {
        Ok(())
    }
}

/// Map an insert failure to Conflict when the natural key collided
fn map_insert_err(e: DbErr, field: &str, value: &str) -> AppError {
    if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        AppError::DuplicateNaturalKey {
            field: field.to_string(),
            value: value.to_string(),
        }
    } else {
        AppError::Database(e)
    }
}

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> &sea_orm::DatabaseConnection {
        self.pool.conn()
    }

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // Audit Operations
    // ========================================================================

    pub async fn create_audit(&self, input: NewAudit) -> Result<Audit> {
        let now = chrono::Utc::now();
        let natural_key = input.audit_id.clone();

        let audit = AuditActiveModel {
            id: Set(Uuid::new_v4()),
            audit_id: Set(input.audit_id),
            name: Set(input.name),
            audit_type: Set(input.audit_type),
            status: Set(input.status.as_str().to_string()),
            standard: Set(input.standard),
            scope: Set(input.scope),
            lead_auditor: Set(input.lead_auditor),
            start_date: Set(input.start_date.map(Into::into)),
            end_date: Set(input.end_date.map(Into::into)),
            attachments: Set(serde_json::json!([])),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        audit
            .insert(self.conn())
            .await
            .map_err(|e| map_insert_err(e, "auditId", &natural_key))
    }

    pub async fn find_audit_by_id(&self, id: Uuid) -> Result<Option<Audit>> {
        AuditEntity::find_by_id(id)
            .one(self.conn())
            .await
            .map_err(Into::into)
    }

    /// List all audits. No pagination; acceptable for the data volumes this
    /// domain implies.
    pub async fn list_audits(&self) -> Result<Vec<Audit>> {
        AuditEntity::find()
            .order_by_desc(AuditColumn::CreatedAt)
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    pub async fn update_audit(&self, id: Uuid, changes: AuditChanges) -> Result<Audit> {
        let mut audit: AuditActiveModel = AuditEntity::find_by_id(id)
            .one(self.conn())
            .await?
            .ok_or_else(|| AppError::not_found("Audit", id))?
            .into();

        if let Some(name) = changes.name {
            audit.name = Set(name);
        }
        if let Some(audit_type) = changes.audit_type {
            audit.audit_type = Set(audit_type);
        }
        if let Some(status) = changes.status {
            audit.status = Set(status.as_str().to_string());
        }
        if let Some(standard) = changes.standard {
            audit.standard = Set(standard);
        }
        if let Some(scope) = changes.scope {
            audit.scope = Set(scope);
        }
        if let Some(lead) = changes.lead_auditor {
            audit.lead_auditor = Set(lead);
        }
        if let Some(start) = changes.start_date {
            audit.start_date = Set(start.map(Into::into));
        }
        if let Some(end) = changes.end_date {
            audit.end_date = Set(end.map(Into::into));
        }
        audit.updated_at = Set(chrono::Utc::now().into());

        audit.update(self.conn()).await.map_err(Into::into)
    }

    /// Bulk delete audits behind the Planned-only guard.
    ///
    /// The guard runs over every selected record before any row is removed;
    /// one violation rejects the whole batch.
    pub async fn bulk_delete_audits(&self, ids: &[Uuid]) -> Result<BulkDeleteOutcome> {
        ensure_ids_not_empty(ids)?;

        let selected = AuditEntity::find()
            .filter(AuditColumn::Id.is_in(ids.iter().copied()))
            .all(self.conn())
            .await?;

        ensure_all_planned(&selected)?;

        self.delete_rows("audits", ids).await
    }

    // ========================================================================
    // Non-Conformity Operations
    // ========================================================================

    pub async fn create_non_conformity(&self, input: NewNonConformity) -> Result<NonConformity> {
        let now = chrono::Utc::now();
        let natural_key = input.document_id.clone();

        let nc = NonConformityActiveModel {
            id: Set(Uuid::new_v4()),
            document_id: Set(input.document_id),
            title: Set(input.title),
            description: Set(input.description),
            severity: Set(input.severity),
            status: Set(input.status),
            audit_id: Set(input.audit_id),
            due_date: Set(input.due_date.map(Into::into)),
            attachments: Set(serde_json::json!([])),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        nc.insert(self.conn())
            .await
            .map_err(|e| map_insert_err(e, "documentId", &natural_key))
    }

    pub async fn find_non_conformity_by_id(&self, id: Uuid) -> Result<Option<NonConformity>> {
        NonConformityEntity::find_by_id(id)
            .one(self.conn())
            .await
            .map_err(Into::into)
    }

    pub async fn list_non_conformities(&self) -> Result<Vec<NonConformity>> {
        NonConformityEntity::find()
            .order_by_desc(NonConformityColumn::CreatedAt)
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    pub async fn update_non_conformity(
        &self,
        id: Uuid,
        changes: NonConformityChanges,
    ) -> Result<NonConformity> {
        let mut nc: NonConformityActiveModel = NonConformityEntity::find_by_id(id)
            .one(self.conn())
            .await?
            .ok_or_else(|| AppError::not_found("Non-conformity", id))?
            .into();

        if let Some(title) = changes.title {
            nc.title = Set(title);
        }
        if let Some(description) = changes.description {
            nc.description = Set(description);
        }
        if let Some(severity) = changes.severity {
            nc.severity = Set(severity);
        }
        if let Some(status) = changes.status {
            nc.status = Set(status);
        }
        if let Some(audit_id) = changes.audit_id {
            nc.audit_id = Set(audit_id);
        }
        if let Some(due) = changes.due_date {
            nc.due_date = Set(due.map(Into::into));
        }
        nc.updated_at = Set(chrono::Utc::now().into());

        nc.update(self.conn()).await.map_err(Into::into)
    }

    pub async fn bulk_delete_non_conformities(&self, ids: &[Uuid]) -> Result<BulkDeleteOutcome> {
        ensure_ids_not_empty(ids)?;
        self.delete_rows("non_conformities", ids).await
    }

    // ========================================================================
    // Library Document Operations (policies, guidelines, templates,
    // certificates, advisories)
    // ========================================================================

    pub async fn create_library_document(
        &self,
        kind: ResourceKind,
        input: NewLibraryDocument,
    ) -> Result<LibraryDocument> {
        let library_kind = expect_library_kind(kind)?;
        let now = chrono::Utc::now();
        let natural_key = input.document_id.clone();

        let doc = LibraryDocumentActiveModel {
            id: Set(Uuid::new_v4()),
            kind: Set(library_kind.to_string()),
            document_id: Set(input.document_id),
            name: Set(input.name),
            description: Set(input.description),
            version: Set(input.version),
            standard: Set(input.standard),
            effective_date: Set(input.effective_date.map(Into::into)),
            attachments: Set(serde_json::json!([])),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        doc.insert(self.conn())
            .await
            .map_err(|e| map_insert_err(e, "documentId", &natural_key))
    }

    pub async fn find_library_document(
        &self,
        kind: ResourceKind,
        id: Uuid,
    ) -> Result<Option<LibraryDocument>> {
        let library_kind = expect_library_kind(kind)?;

        LibraryDocumentEntity::find_by_id(id)
            .filter(LibraryDocumentColumn::Kind.eq(library_kind))
            .one(self.conn())
            .await
            .map_err(Into::into)
    }

    pub async fn list_library_documents(&self, kind: ResourceKind) -> Result<Vec<LibraryDocument>> {
        let library_kind = expect_library_kind(kind)?;

        LibraryDocumentEntity::find()
            .filter(LibraryDocumentColumn::Kind.eq(library_kind))
            .order_by_desc(LibraryDocumentColumn::CreatedAt)
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    pub async fn update_library_document(
        &self,
        kind: ResourceKind,
        id: Uuid,
        changes: LibraryDocumentChanges,
    ) -> Result<LibraryDocument> {
        let mut doc: LibraryDocumentActiveModel = self
            .find_library_document(kind, id)
            .await?
            .ok_or_else(|| AppError::not_found(kind.display_name(), id))?
            .into();

        if let Some(name) = changes.name {
            doc.name = Set(name);
        }
        if let Some(description) = changes.description {
            doc.description = Set(description);
        }
        if let Some(version) = changes.version {
            doc.version = Set(version);
        }
        if let Some(standard) = changes.standard {
            doc.standard = Set(standard);
        }
        if let Some(effective) = changes.effective_date {
            doc.effective_date = Set(effective.map(Into::into));
        }
        doc.updated_at = Set(chrono::Utc::now().into());

        doc.update(self.conn()).await.map_err(Into::into)
    }

    pub async fn bulk_delete_library_documents(
        &self,
        kind: ResourceKind,
        ids: &[Uuid],
    ) -> Result<BulkDeleteOutcome> {
        ensure_ids_not_empty(ids)?;
        let library_kind = expect_library_kind(kind)?;

        let (placeholders, mut values) = id_placeholders(ids, 1);
        values.push(library_kind.into());

        let sql = format!(
            "DELETE FROM library_documents WHERE id IN ({}) AND kind = ${} RETURNING id, attachments",
            placeholders,
            ids.len() + 1
        );

        self.collect_deleted(Statement::from_sql_and_values(
            DbBackend::Postgres,
            &sql,
            values,
        ))
        .await
    }

    // ========================================================================
    // User Operations
    // ========================================================================

    pub async fn create_user(&self, input: NewUser) -> Result<User> {
        let now = chrono::Utc::now();
        let email = input.email.clone();

        let user = UserActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(input.email),
            name: Set(input.name),
            role: Set(input.role),
            password_hash: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        user.insert(self.conn())
            .await
            .map_err(|e| map_insert_err(e, "email", &email))
    }

    pub async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        UserEntity::find_by_id(id)
            .one(self.conn())
            .await
            .map_err(Into::into)
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        UserEntity::find()
            .filter(UserColumn::Email.eq(email))
            .one(self.conn())
            .await
            .map_err(Into::into)
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        UserEntity::find()
            .order_by_asc(UserColumn::Email)
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    pub async fn update_user(&self, id: Uuid, changes: UserChanges) -> Result<User> {
        let mut user: UserActiveModel = UserEntity::find_by_id(id)
            .one(self.conn())
            .await?
            .ok_or_else(|| AppError::not_found("User", id))?
            .into();

        if let Some(name) = changes.name {
            user.name = Set(name);
        }
        if let Some(role) = changes.role {
            user.role = Set(role);
        }
        user.updated_at = Set(chrono::Utc::now().into());

        user.update(self.conn()).await.map_err(Into::into)
    }

    pub async fn set_user_password(&self, id: Uuid, password_hash: String) -> Result<User> {
        let mut user: UserActiveModel = UserEntity::find_by_id(id)
            .one(self.conn())
            .await?
            .ok_or_else(|| AppError::not_found("User", id))?
            .into();

        user.password_hash = Set(Some(password_hash));
        user.updated_at = Set(chrono::Utc::now().into());

        user.update(self.conn()).await.map_err(Into::into)
    }

    pub async fn delete_user(&self, id: Uuid) -> Result<()> {
        let result = UserEntity::delete_by_id(id).exec(self.conn()).await?;

        if result.rows_affected == 0 {
            return Err(AppError::not_found("User", id));
        }
        Ok(())
    }

    // ========================================================================
    // Attachment Array Operations (generic over the owning resource)
    //
    // All writes go through single atomic UPDATE statements so concurrent
    // uploads and deletes against the same parent serialize at the row.
    // ========================================================================

    /// Load the parent's attachment sequence. NotFound if the parent is
    /// absent (or, for library kinds, belongs to a different type).
    pub async fn attachments_of(
        &self,
        kind: ResourceKind,
        parent_id: Uuid,
    ) -> Result<Vec<AttachmentMeta>> {
        let (filter, mut values) = kind_filter(kind, 2);
        values.insert(0, parent_id.into());

        let sql = format!(
            "SELECT attachments FROM {} WHERE id = $1{}",
            kind.table(),
            filter
        );

        let row = self
            .conn()
            .query_one(Statement::from_sql_and_values(
                DbBackend::Postgres,
                &sql,
                values,
            ))
            .await?
            .ok_or_else(|| AppError::not_found(kind.display_name(), parent_id))?;

        let attachments: serde_json::Value = row.try_get("", "attachments")?;
        Ok(decode_attachments(&attachments))
    }

    /// Atomically append a batch of attachment records to the parent,
    /// preserving arrival order. Returns the full updated sequence.
    pub async fn append_attachments(
        &self,
        kind: ResourceKind,
        parent_id: Uuid,
        batch: &[AttachmentMeta],
    ) -> Result<Vec<AttachmentMeta>> {
        let batch_json = serde_json::to_value(batch)?;

        let (filter, mut values) = kind_filter(kind, 3);
        values.insert(0, parent_id.into());
        values.insert(1, batch_json.into());

        let sql = format!(
            "UPDATE {} SET attachments = attachments || $2::jsonb, updated_at = now() \
             WHERE id = $1{} RETURNING attachments",
            kind.table(),
            filter
        );

        let row = self
            .conn()
            .query_one(Statement::from_sql_and_values(
                DbBackend::Postgres,
                &sql,
                values,
            ))
            .await?
            .ok_or_else(|| AppError::not_found(kind.display_name(), parent_id))?;

        let attachments: serde_json::Value = row.try_get("", "attachments")?;
        Ok(decode_attachments(&attachments))
    }

    /// Atomically remove one attachment record by id. Returns the removed
    /// record (for file cleanup) and the updated sequence.
    ///
    /// The metadata record, not the file, is authoritative: callers decide
    /// separately what to do about the bytes on disk.
    pub async fn remove_attachment(
        &self,
        kind: ResourceKind,
        parent_id: Uuid,
        attachment_id: Uuid,
    ) -> Result<(AttachmentMeta, Vec<AttachmentMeta>)> {
        let current = self.attachments_of(kind, parent_id).await?;
        let removed = find_attachment(&current, attachment_id)?.clone();

        let (filter, mut values) = kind_filter(kind, 3);
        values.insert(0, parent_id.into());
        values.insert(1, attachment_id.to_string().into());

        let sql = format!(
            "UPDATE {} SET attachments = (\
                 SELECT COALESCE(jsonb_agg(elem), '[]'::jsonb) \
                 FROM jsonb_array_elements(attachments) elem \
                 WHERE elem->>'id' <> $2\
             ), updated_at = now() \
             WHERE id = $1{} RETURNING attachments",
            kind.table(),
            filter
        );

        let row = self
            .conn()
            .query_one(Statement::from_sql_and_values(
                DbBackend::Postgres,
                &sql,
                values,
            ))
            .await?
            .ok_or_else(|| AppError::not_found(kind.display_name(), parent_id))?;

        let attachments: serde_json::Value = row.try_get("", "attachments")?;
        Ok((removed, decode_attachments(&attachments)))
    }

    // ========================================================================
    // Internal helpers
    // ========================================================================

    async fn delete_rows(&self, table: &str, ids: &[Uuid]) -> Result<BulkDeleteOutcome> {
        let (placeholders, values) = id_placeholders(ids, 1);

        let sql = format!(
            "DELETE FROM {} WHERE id IN ({}) RETURNING id, attachments",
            table, placeholders
        );

        self.collect_deleted(Statement::from_sql_and_values(
            DbBackend::Postgres,
            &sql,
            values,
        ))
        .await
    }

    async fn collect_deleted(&self, stmt: Statement) -> Result<BulkDeleteOutcome> {
        let rows = self.conn().query_all(stmt).await?;

        let mut outcome = BulkDeleteOutcome::default();
        for row in rows {
            let id: Uuid = row.try_get("", "id")?;
            let attachments: serde_json::Value = row.try_get("", "attachments")?;
            outcome.deleted_ids.push(id);
            outcome
                .orphaned_attachments
                .extend(decode_attachments(&attachments));
        }
        Ok(outcome)
    }
}

/// `$n` placeholder list and values for an id set
fn id_placeholders(ids: &[Uuid], start: usize) -> (String, Vec<sea_orm::Value>) {
    let placeholders = (0..ids.len())
        .map(|i| format!("${}", start + i))
        .collect::<Vec<_>>()
        .join(", ");
    let values = ids.iter().map(|id| (*id).into()).collect();
    (placeholders, values)
}

/// Extra `AND kind = $n` filter for kinds living in the shared library table
fn kind_filter(kind: ResourceKind, param: usize) -> (String, Vec<sea_orm::Value>) {
    match kind.library_kind() {
        Some(library_kind) => (format!(" AND kind = ${}", param), vec![library_kind.into()]),
        None => (String::new(), Vec::new()),
    }
}

fn expect_library_kind(kind: ResourceKind) -> Result<&'static str> {
    kind.library_kind().ok_or_else(|| AppError::Internal {
        message: format!("{} is not a library document type", kind.display_name()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::AuditStatus;

    fn audit(audit_id: &str, status: AuditStatus) -> Audit {
        let now = chrono::Utc::now();
        Audit {
            id: Uuid::new_v4(),
            audit_id: audit_id.to_string(),
            name: "Annual ISO audit".to_string(),
            audit_type: "internal".to_string(),
            status: status.as_str().to_string(),
            standard: None,
            scope: None,
            lead_auditor: None,
            start_date: None,
            end_date: None,
            attachments: serde_json::json!([]),
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[test]
    fn test_guard_accepts_all_planned() {
        let audits = vec![
            audit("AUD-1", AuditStatus::Planned),
            audit("AUD-2", AuditStatus::Planned),
        ];
        assert!(ensure_all_planned(&audits).is_ok());
    }

    #[test]
    fn test_guard_rejects_whole_batch_on_one_violation() {
        let audits = vec![
            audit("AUD-1", AuditStatus::Planned),
            audit("AUD-2", AuditStatus::InProgress),
        ];
        let err = ensure_all_planned(&audits).unwrap_err();
        match err {
            AppError::DeletionBlocked { message } => {
                assert!(message.contains("AUD-2"));
                assert!(!message.contains("AUD-1"));
            }
            other => panic!("expected DeletionBlocked, got {:?}", other),
        }
    }

    #[test]
    fn test_guard_rejects_unknown_status() {
        let mut stale = audit("AUD-3", AuditStatus::Planned);
        stale.status = "Archived".to_string();
        assert!(ensure_all_planned(&[stale]).is_err());
    }

    #[test]
    fn test_empty_id_set_is_validation_error() {
        let err = ensure_ids_not_empty(&[]).unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[test]
    fn test_id_placeholders_numbering() {
        let ids = vec![Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
        let (placeholders, values) = id_placeholders(&ids, 1);
        assert_eq!(placeholders, "$1, $2, $3");
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn test_kind_filter_only_for_library_kinds() {
        let (filter, values) = kind_filter(ResourceKind::Audit, 2);
        assert!(filter.is_empty());
        assert!(values.is_empty());

        let (filter, values) = kind_filter(ResourceKind::Policy, 2);
        assert_eq!(filter, " AND kind = $2");
        assert_eq!(values.len(), 1);
    }
}
