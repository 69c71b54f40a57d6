//! Audit entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Audit lifecycle status. Only `Planned` audits may be bulk-deleted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditStatus {
    Planned,
    InProgress,
    Completed,
    Closed,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::Planned => "Planned",
            AuditStatus::InProgress => "In Progress",
            AuditStatus::Completed => "Completed",
            AuditStatus::Closed => "Closed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Planned" => Some(AuditStatus::Planned),
            "In Progress" => Some(AuditStatus::InProgress),
            "Completed" => Some(AuditStatus::Completed),
            "Closed" => Some(AuditStatus::Closed),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "audits")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Natural key, unique and immutable after creation
    #[sea_orm(column_type = "Text", unique)]
    pub audit_id: String,

    #[sea_orm(column_type = "Text")]
    pub name: String,

    #[sea_orm(column_type = "Text")]
    pub audit_type: String,

    #[sea_orm(column_type = "Text")]
    pub status: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub standard: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub scope: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub lead_auditor: Option<String>,

    pub start_date: Option<DateTimeWithTimeZone>,

    pub end_date: Option<DateTimeWithTimeZone>,

    /// Embedded attachment metadata, insertion-ordered
    #[sea_orm(column_type = "JsonBinary")]
    pub attachments: serde_json::Value,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Whether this audit still sits in its initial state.
    pub fn is_planned(&self) -> bool {
        self.status == AuditStatus::Planned.as_str()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in [
            AuditStatus::Planned,
            AuditStatus::InProgress,
            AuditStatus::Completed,
            AuditStatus::Closed,
        ] {
            assert_eq!(AuditStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(AuditStatus::parse("Archived"), None);
    }
}
