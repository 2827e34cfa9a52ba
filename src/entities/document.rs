use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Kinds of generated manifest documents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    #[sea_orm(string_value = "delivery_challan")]
    DeliveryChallan,

    #[sea_orm(string_value = "grn")]
    Grn,

    #[sea_orm(string_value = "invoice")]
    Invoice,

    #[sea_orm(string_value = "bilty")]
    Bilty,
}

impl DocumentType {
    /// Short code used in document numbers.
    pub fn code(&self) -> &'static str {
        match self {
            DocumentType::DeliveryChallan => "DC",
            DocumentType::Grn => "GRN",
            DocumentType::Invoice => "INV",
            DocumentType::Bilty => "BLT",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentType::DeliveryChallan => write!(f, "delivery_challan"),
            DocumentType::Grn => write!(f, "grn"),
            DocumentType::Invoice => write!(f, "invoice"),
            DocumentType::Bilty => write!(f, "bilty"),
        }
    }
}

/// A generated, content-addressed document snapshot.
///
/// `payload` is a frozen copy of the line items and totals at generation
/// time; later mutation of the live request never alters an issued
/// document. Rows are keyed by (request, type, sequence) so regeneration
/// appends a new sequence instead of mutating history.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub document_number: String,

    pub request_id: Uuid,
    pub doc_type: DocumentType,
    pub sequence: i32,

    pub payload: Json,

    pub generated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::procurement_request::Entity",
        from = "Column::RequestId",
        to = "super::procurement_request::Column::Id"
    )]
    Request,
}

impl Related<super::procurement_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Request.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
