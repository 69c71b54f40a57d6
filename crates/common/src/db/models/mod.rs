//! SeaORM entity models
//!
//! Database entities for Auditbase, plus the embedded attachment metadata
//! and the resource-kind dispatch used by the generic attachment store.

mod app_user;
mod attachment;
mod audit;
mod library_document;
mod non_conformity;

use serde::{Deserialize, Serialize};

pub use audit::{
    ActiveModel as AuditActiveModel, AuditStatus, Column as AuditColumn, Entity as AuditEntity,
    Model as Audit,
};

pub use non_conformity::{
    ActiveModel as NonConformityActiveModel, Column as NonConformityColumn,
    Entity as NonConformityEntity, Model as NonConformity,
};

pub use library_document::{
    ActiveModel as LibraryDocumentActiveModel, Column as LibraryDocumentColumn,
    Entity as LibraryDocumentEntity, Model as LibraryDocument,
};

pub use app_user::{
    ActiveModel as UserActiveModel, Column as UserColumn, Entity as UserEntity, Model as User,
};

pub use attachment::{decode_attachments, find_attachment, AttachmentMeta};

/// The seven attachment-owning resource types.
///
/// Every type shares the attachment lifecycle (upload, list, serve, delete);
/// this enum is what parameterizes the generic store instead of six
/// copy-pasted route bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    Audit,
    NonConformity,
    Policy,
    Guideline,
    Template,
    Certificate,
    Advisory,
}

impl ResourceKind {
    /// Table holding this resource's rows
    pub fn table(&self) -> &'static str {
        match self {
            ResourceKind::Audit => "audits",
            ResourceKind::NonConformity => "non_conformities",
            ResourceKind::Policy
            | ResourceKind::Guideline
            | ResourceKind::Template
            | ResourceKind::Certificate
            | ResourceKind::Advisory => "library_documents",
        }
    }

    /// Discriminator value for kinds stored in the shared library table
    pub fn library_kind(&self) -> Option<&'static str> {
        match self {
            ResourceKind::Policy => Some("policy"),
            ResourceKind::Guideline => Some("guideline"),
            ResourceKind::Template => Some("template"),
            ResourceKind::Certificate => Some("certificate"),
            ResourceKind::Advisory => Some("advisory"),
            _ => None,
        }
    }

    /// Path segment under `/api` this resource is served at
    pub fn api_path(&self) -> &'static str {
        match self {
            ResourceKind::Audit => "audits",
            ResourceKind::NonConformity => "non-conformities",
            ResourceKind::Policy => "policies",
            ResourceKind::Guideline => "guidelines",
            ResourceKind::Template => "templates",
            ResourceKind::Certificate => "certificates",
            ResourceKind::Advisory => "advisories",
        }
    }

    /// Human-readable name used in error messages
    pub fn display_name(&self) -> &'static str {
        match self {
            ResourceKind::Audit => "Audit",
            ResourceKind::NonConformity => "Non-conformity",
            ResourceKind::Policy => "Policy",
            ResourceKind::Guideline => "Guideline",
            ResourceKind::Template => "Template",
            ResourceKind::Certificate => "Certificate",
            ResourceKind::Advisory => "Advisory",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_kinds_share_table() {
        for kind in [
            ResourceKind::Policy,
            ResourceKind::Guideline,
            ResourceKind::Template,
            ResourceKind::Certificate,
            ResourceKind::Advisory,
        ] {
            assert_eq!(kind.table(), "library_documents");
            assert!(kind.library_kind().is_some());
        }
        assert!(ResourceKind::Audit.library_kind().is_none());
        assert!(ResourceKind::NonConformity.library_kind().is_none());
    }
}
