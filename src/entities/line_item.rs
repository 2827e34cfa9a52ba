use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One SKU within a procurement request.
///
/// `line_number` preserves insertion order; listings always sort by it.
/// `name`, `unit` and `quantity` are immutable after creation; the vendor
/// adds `quoted_price`, fulfillment flips `packed`, and the receipt step
/// fills the received/damaged columns under the bound
/// `damaged_quantity ≤ received_quantity ≤ quantity`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "procurement_line_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub request_id: Uuid,
    pub line_number: i32,

    pub name: String,
    pub unit: String,
    pub quantity: i32,

    /// Absent until the vendor quotes.
    pub quoted_price: Option<Decimal>,

    /// Packing-checklist flag; all items checked is half the precondition
    /// for `preparing → ready_for_pickup`.
    pub packed: bool,

    pub received_quantity: Option<i32>,
    pub damaged_quantity: Option<i32>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
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
