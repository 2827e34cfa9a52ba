use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Lifecycle status of a procurement request.
///
/// Several upstream views label the same state differently (`assigned`,
/// `bidding`, `new`); [`ProcurementStatus::normalize`] is the only place
/// those aliases exist. Everything downstream works on the canonical enum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum ProcurementStatus {
    #[sea_orm(string_value = "requested")]
    Requested,

    #[sea_orm(string_value = "quoted")]
    Quoted,

    #[sea_orm(string_value = "approved")]
    Approved,

    #[sea_orm(string_value = "preparing")]
    Preparing,

    #[sea_orm(string_value = "ready_for_pickup")]
    ReadyForPickup,

    #[sea_orm(string_value = "completed")]
    Completed,

    #[sea_orm(string_value = "rejected")]
    Rejected,

    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl fmt::Display for ProcurementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcurementStatus::Requested => write!(f, "requested"),
            ProcurementStatus::Quoted => write!(f, "quoted"),
            ProcurementStatus::Approved => write!(f, "approved"),
            ProcurementStatus::Preparing => write!(f, "preparing"),
            ProcurementStatus::ReadyForPickup => write!(f, "ready_for_pickup"),
            ProcurementStatus::Completed => write!(f, "completed"),
            ProcurementStatus::Rejected => write!(f, "rejected"),
            ProcurementStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl ProcurementStatus {
    /// Terminal states accept no further transition.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProcurementStatus::Completed
                | ProcurementStatus::Rejected
                | ProcurementStatus::Cancelled
        )
    }

    /// Resolves a status label from the wire, folding the legacy view
    /// aliases onto their canonical state.
    pub fn normalize(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "requested" | "assigned" => Some(ProcurementStatus::Requested),
            "quoted" | "bidding" => Some(ProcurementStatus::Quoted),
            "approved" | "new" => Some(ProcurementStatus::Approved),
            "preparing" => Some(ProcurementStatus::Preparing),
            "ready_for_pickup" => Some(ProcurementStatus::ReadyForPickup),
            "completed" => Some(ProcurementStatus::Completed),
            "rejected" => Some(ProcurementStatus::Rejected),
            "cancelled" => Some(ProcurementStatus::Cancelled),
            _ => None,
        }
    }
}

/// Events that drive the fulfillment state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum TransitionEvent {
    SubmitQuotation,
    Approve,
    Reject,
    BeginPacking,
    MarkReady,
    Dispatch,
    Cancel,
}

/// The transition table. Returns the target state when `event` is legal
/// from `from`, `None` otherwise. No status is ever skipped or reverted;
/// `Cancel` is reachable from any non-terminal state.
pub fn transition_target(
    from: ProcurementStatus,
    event: TransitionEvent,
) -> Option<ProcurementStatus> {
    use ProcurementStatus::*;
    use TransitionEvent::*;

    match (from, event) {
        (Requested, SubmitQuotation) => Some(Quoted),
        (Quoted, Approve) => Some(Approved),
        (Quoted, Reject) => Some(Rejected),
        (Approved, BeginPacking) => Some(Preparing),
        (Preparing, MarkReady) => Some(ReadyForPickup),
        (ReadyForPickup, Dispatch) => Some(Completed),
        (state, Cancel) if !state.is_terminal() => Some(Cancelled),
        _ => None,
    }
}

/// Procurement request aggregate header.
///
/// The single source of truth for status and money totals. Settlement
/// columns are caches of figures derivable from the line items; the
/// reconciliation command recomputes them inside the same transaction
/// that records the receipt.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "procurement_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub request_number: String,

    pub franchise_id: Uuid,
    pub franchise_name: String,
    pub owner_name: Option<String>,

    /// Bound when a quotation is accepted; at most one vendor per
    /// non-terminal request.
    pub vendor_id: Option<Uuid>,

    pub status: ProcurementStatus,

    /// Derived: Σ(quantity × quoted_price) over quoted items. Never edited
    /// directly.
    pub total_quoted_amount: Decimal,

    /// Set once during fulfillment, must be > 0.
    pub actual_weight: Option<Decimal>,

    pub received_value: Option<Decimal>,
    pub damaged_loss: Option<Decimal>,
    pub net_settlement: Option<Decimal>,
    pub discrepancy_flag: bool,
    pub receipt_recorded_at: Option<DateTime<Utc>>,

    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::line_item::Entity")]
    LineItems,
    #[sea_orm(has_many = "super::document::Entity")]
    Documents,
}

impl Related<super::line_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LineItems.def()
    }
}

impl Related<super::document::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Documents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
