//! Library document entity
//!
//! One table backs the five uniform document types (policies, guidelines,
//! templates, certificates, advisories); `kind` discriminates. Their API
//! contract is identical, only the route prefix differs.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "library_documents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Document type discriminator: policy, guideline, template,
    /// certificate or advisory
    #[sea_orm(column_type = "Text")]
    pub kind: String,

    /// Natural key, unique per kind and immutable after creation
    #[sea_orm(column_type = "Text")]
    pub document_id: String,

    #[sea_orm(column_type = "Text")]
    pub name: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub version: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub standard: Option<String>,

    pub effective_date: Option<DateTimeWithTimeZone>,

    /// Embedded attachment metadata, insertion-ordered
    #[sea_orm(column_type = "JsonBinary")]
    pub attachments: serde_json::Value,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
