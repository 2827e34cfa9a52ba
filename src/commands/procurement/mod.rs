pub mod approve_request_command;
pub mod begin_packing_command;
pub mod cancel_request_command;
pub mod create_request_command;
pub mod dispatch_request_command;
pub mod record_packing_check_command;
pub mod record_receipt_command;
pub mod record_weight_command;
pub mod reject_request_command;
pub mod submit_quotation_command;

pub use approve_request_command::ApproveRequestCommand;
pub use begin_packing_command::BeginPackingCommand;
pub use cancel_request_command::CancelRequestCommand;
pub use create_request_command::{CreateRequestCommand, NewLineItem};
pub use dispatch_request_command::DispatchRequestCommand;
pub use record_packing_check_command::RecordPackingCheckCommand;
pub use record_receipt_command::{ReceiptItem, RecordReceiptCommand, SettlementSummary};
pub use record_weight_command::RecordWeightCommand;
pub use reject_request_command::RejectRequestCommand;
pub use submit_quotation_command::{QuotedItem, SubmitQuotationCommand};

use chrono::Utc;
use sea_orm::{ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::{
    entities::{
        line_item,
        procurement_request::{self, transition_target, ProcurementStatus, TransitionEvent},
    },
    errors::ServiceError,
};

impl TransitionEvent {
    /// The from-state the transition table requires for this event,
    /// as reported in `InvalidTransition` errors.
    pub fn expected_from(&self) -> &'static str {
        match self {
            TransitionEvent::SubmitQuotation => "requested",
            TransitionEvent::Approve | TransitionEvent::Reject => "quoted",
            TransitionEvent::BeginPacking => "approved",
            TransitionEvent::MarkReady => "preparing",
            TransitionEvent::Dispatch => "ready_for_pickup",
            TransitionEvent::Cancel => "any non-terminal status",
        }
    }
}

/// Loads a request header, mapping absence to `NotFound`.
pub(crate) async fn load_request<C: ConnectionTrait>(
    db: &C,
    request_id: Uuid,
) -> Result<procurement_request::Model, ServiceError> {
    procurement_request::Entity::find_by_id(request_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("request {} not found", request_id)))
}

/// Loads the line items of a request in insertion order.
pub(crate) async fn load_line_items<C: ConnectionTrait>(
    db: &C,
    request_id: Uuid,
) -> Result<Vec<line_item::Model>, ServiceError> {
    Ok(line_item::Entity::find()
        .filter(line_item::Column::RequestId.eq(request_id))
        .order_by_asc(line_item::Column::LineNumber)
        .all(db)
        .await?)
}

/// Rejects callers that are not the vendor bound to the request.
pub(crate) fn require_bound_vendor(
    request: &procurement_request::Model,
    vendor_id: Uuid,
) -> Result<(), ServiceError> {
    match request.vendor_id {
        Some(bound) if bound == vendor_id => Ok(()),
        _ => Err(ServiceError::Forbidden(format!(
            "vendor {} is not assigned to request {}",
            vendor_id, request.request_number
        ))),
    }
}

/// Applies a plain status transition as an atomic compare-and-swap.
///
/// Legality is checked against the snapshot the caller read; the UPDATE
/// itself is guarded by `status = snapshot.status`, so a concurrent writer
/// that moved the row first makes this call fail with `StaleState` instead
/// of silently overwriting.
pub(crate) async fn cas_transition<C: ConnectionTrait>(
    db: &C,
    request: &procurement_request::Model,
    event: TransitionEvent,
    action: &str,
) -> Result<ProcurementStatus, ServiceError> {
    let target = transition_target(request.status, event).ok_or_else(|| {
        ServiceError::invalid_transition(action, event.expected_from(), request.status.to_string())
    })?;

    let result = procurement_request::Entity::update_many()
        .set(procurement_request::ActiveModel {
            status: Set(target),
            updated_at: Set(Utc::now()),
            ..Default::default()
        })
        .filter(procurement_request::Column::Id.eq(request.id))
        .filter(procurement_request::Column::Status.eq(request.status))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(ServiceError::StaleState(request.id.to_string()));
    }

    Ok(target)
}

/// Engine-side evaluation of the `preparing → ready_for_pickup`
/// precondition: all line items packed and a weight recorded. Called after
/// every packing check and weight write; concurrent evaluators race on the
/// CAS and exactly one advances the status.
pub(crate) async fn advance_if_ready<C: ConnectionTrait>(
    db: &C,
    request_id: Uuid,
) -> Result<bool, ServiceError> {
    let request = load_request(db, request_id).await?;
    if request.status != ProcurementStatus::Preparing || request.actual_weight.is_none() {
        return Ok(false);
    }

    let items = load_line_items(db, request_id).await?;
    if items.is_empty() || items.iter().any(|item| !item.packed) {
        return Ok(false);
    }

    match cas_transition(db, &request, TransitionEvent::MarkReady, "mark_ready").await {
        Ok(_) => Ok(true),
        // Another evaluator advanced the row first; the precondition holds
        // either way.
        Err(ServiceError::StaleState(_)) => Ok(false),
        Err(e) => Err(e),
    }
}
