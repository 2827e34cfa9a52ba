use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    commands::{
        procurement::{load_line_items, load_request},
        Command,
    },
    db::DbPool,
    entities::{
        line_item,
        procurement_request::{self, ProcurementStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReceiptItem {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    pub received_quantity: i32,
    pub damaged_quantity: i32,
}

/// Records what actually arrived at the franchise and derives the
/// settlement figures.
///
/// All-or-nothing: every item is validated against
/// `0 ≤ damaged ≤ received ≤ quantity` before anything is written, and the
/// whole receipt lands in one transaction guarded by
/// `receipt_recorded_at IS NULL`. Quoted prices and requested quantities
/// are never touched; the settlement columns are caches re-derivable from
/// the line items.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RecordReceiptCommand {
    pub request_id: Uuid,
    pub franchise_id: Uuid,
    #[validate]
    pub items: Vec<ReceiptItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementSummary {
    pub id: Uuid,
    pub received_value: Decimal,
    pub damaged_loss: Decimal,
    pub net_settlement: Decimal,
    pub discrepancy_flag: bool,
    pub receipt_recorded_at: DateTime<Utc>,
}

#[async_trait::async_trait]
impl Command for RecordReceiptCommand {
    type Result = SettlementSummary;

    #[instrument(skip(self, db_pool, event_sender))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()?;
        if self.items.is_empty() {
            return Err(ServiceError::ValidationError(
                "a receipt needs at least one item".to_string(),
            ));
        }

        let db = db_pool.as_ref();
        let txn = db.begin().await?;

        let request = load_request(&txn, self.request_id).await?;
        if request.franchise_id != self.franchise_id {
            return Err(ServiceError::Forbidden(format!(
                "request {} belongs to another franchise",
                request.request_number
            )));
        }
        if request.status != ProcurementStatus::Completed {
            return Err(ServiceError::invalid_transition(
                "record_receipt",
                "completed",
                request.status.to_string(),
            ));
        }
        if request.receipt_recorded_at.is_some() {
            return Err(ServiceError::invalid_transition(
                "record_receipt",
                "completed with no recorded receipt",
                "receipt already recorded",
            ));
        }

        let lines = load_line_items(&txn, self.request_id).await?;

        let mut receipts: HashMap<&str, &ReceiptItem> = HashMap::new();
        for item in &self.items {
            if receipts.insert(item.name.as_str(), item).is_some() {
                return Err(ServiceError::InvalidReceiptQuantity(format!(
                    "duplicate receipt entry for item '{}'",
                    item.name
                )));
            }
            if !lines.iter().any(|line| line.name == item.name) {
                return Err(ServiceError::InvalidReceiptQuantity(format!(
                    "item '{}' is not part of request {}",
                    item.name, request.request_number
                )));
            }
        }

        // Validate every line before writing anything: a single violation
        // fails the whole call with the ledger unchanged.
        let mut received_value = Decimal::ZERO;
        let mut damaged_loss = Decimal::ZERO;
        for line in &lines {
            let receipt = receipts.get(line.name.as_str()).ok_or_else(|| {
                ServiceError::InvalidReceiptQuantity(format!(
                    "missing receipt entry for item '{}'",
                    line.name
                ))
            })?;

            if receipt.damaged_quantity < 0
                || receipt.received_quantity < receipt.damaged_quantity
                || line.quantity < receipt.received_quantity
            {
                return Err(ServiceError::InvalidReceiptQuantity(format!(
                    "item '{}': expected 0 <= damaged ({}) <= received ({}) <= ordered ({})",
                    line.name, receipt.damaged_quantity, receipt.received_quantity, line.quantity
                )));
            }

            let price = line.quoted_price.unwrap_or(Decimal::ZERO);
            received_value += Decimal::from(receipt.received_quantity) * price;
            damaged_loss += Decimal::from(receipt.damaged_quantity) * price;
        }

        let net_settlement = request.total_quoted_amount - damaged_loss;
        let discrepancy_flag = request.total_quoted_amount != received_value;
        let now = Utc::now();

        let result = procurement_request::Entity::update_many()
            .set(procurement_request::ActiveModel {
                received_value: Set(Some(received_value)),
                damaged_loss: Set(Some(damaged_loss)),
                net_settlement: Set(Some(net_settlement)),
                discrepancy_flag: Set(discrepancy_flag),
                receipt_recorded_at: Set(Some(now)),
                updated_at: Set(now),
                ..Default::default()
            })
            .filter(procurement_request::Column::Id.eq(self.request_id))
            .filter(procurement_request::Column::Status.eq(ProcurementStatus::Completed))
            .filter(procurement_request::Column::ReceiptRecordedAt.is_null())
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::StaleState(self.request_id.to_string()));
        }

        for line in &lines {
            let receipt = receipts[line.name.as_str()];
            let update = line_item::ActiveModel {
                id: Set(line.id),
                received_quantity: Set(Some(receipt.received_quantity)),
                damaged_quantity: Set(Some(receipt.damaged_quantity)),
                updated_at: Set(now),
                ..Default::default()
            };
            line_item::Entity::update(update).exec(&txn).await?;
        }

        txn.commit().await?;

        event_sender
            .send_or_log(Event::ReceiptRecorded {
                request_id: self.request_id,
                net_settlement,
                discrepancy: discrepancy_flag,
            })
            .await;

        info!(
            request_id = %self.request_id,
            %received_value,
            %damaged_loss,
            %net_settlement,
            discrepancy_flag,
            "receipt recorded"
        );

        Ok(SettlementSummary {
            id: self.request_id,
            received_value,
            damaged_loss,
            net_settlement,
            discrepancy_flag,
            receipt_recorded_at: now,
        })
    }
}
