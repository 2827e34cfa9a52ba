use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    commands::{procurement::load_line_items, procurement::load_request, Command},
    db::DbPool,
    entities::{
        line_item,
        procurement_request::{self, ProcurementStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct QuotedItem {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    pub quoted_price: Decimal,
}

/// Binds a vendor to a `requested` request and prices every line item.
///
/// The write is guarded by `status = requested AND vendor_id IS NULL`:
/// exactly one of two concurrent submissions wins the compare-and-swap,
/// the other fails with `ConflictingQuotation`.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SubmitQuotationCommand {
    pub request_id: Uuid,
    pub vendor_id: Uuid,
    #[validate]
    pub items: Vec<QuotedItem>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitQuotationResult {
    pub id: Uuid,
    pub status: String,
    pub total_quoted_amount: Decimal,
}

#[async_trait::async_trait]
impl Command for SubmitQuotationCommand {
    type Result = SubmitQuotationResult;

    #[instrument(skip(self, db_pool, event_sender))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()?;
        if self.items.is_empty() {
            return Err(ServiceError::ValidationError(
                "a quotation needs at least one priced item".to_string(),
            ));
        }
        if let Some(bad) = self.items.iter().find(|i| i.quoted_price < Decimal::ZERO) {
            return Err(ServiceError::ValidationError(format!(
                "quoted price for '{}' must be >= 0",
                bad.name
            )));
        }

        let db = db_pool.as_ref();
        let txn = db.begin().await?;

        let request = load_request(&txn, self.request_id).await?;
        if request.status != ProcurementStatus::Requested || request.vendor_id.is_some() {
            return Err(quotation_conflict(&request));
        }

        let lines = load_line_items(&txn, self.request_id).await?;

        let mut prices: HashMap<&str, Decimal> = HashMap::new();
        for item in &self.items {
            if prices.insert(item.name.as_str(), item.quoted_price).is_some() {
                return Err(ServiceError::ValidationError(format!(
                    "duplicate quote for item '{}'",
                    item.name
                )));
            }
        }

        for item in &self.items {
            if !lines.iter().any(|line| line.name == item.name) {
                return Err(ServiceError::ValidationError(format!(
                    "item '{}' is not part of request {}",
                    item.name, request.request_number
                )));
            }
        }

        // Every line item of the request must be priced before the
        // quotation is accepted.
        let missing: Vec<&str> = lines
            .iter()
            .filter(|line| !prices.contains_key(line.name.as_str()))
            .map(|line| line.name.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(ServiceError::IncompleteQuotation(missing.join(", ")));
        }

        let total: Decimal = lines
            .iter()
            .map(|line| Decimal::from(line.quantity) * prices[line.name.as_str()])
            .sum();

        let now = Utc::now();
        let result = procurement_request::Entity::update_many()
            .set(procurement_request::ActiveModel {
                status: Set(ProcurementStatus::Quoted),
                vendor_id: Set(Some(self.vendor_id)),
                total_quoted_amount: Set(total),
                updated_at: Set(now),
                ..Default::default()
            })
            .filter(procurement_request::Column::Id.eq(self.request_id))
            .filter(procurement_request::Column::Status.eq(ProcurementStatus::Requested))
            .filter(procurement_request::Column::VendorId.is_null())
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            // Lost the race: report what the winner did.
            let current = load_request(&txn, self.request_id).await?;
            if current.vendor_id.is_some() || current.status == ProcurementStatus::Quoted {
                return Err(ServiceError::ConflictingQuotation(format!(
                    "request {} already has a quotation in flight",
                    current.request_number
                )));
            }
            return Err(ServiceError::StaleState(current.id.to_string()));
        }

        for line in &lines {
            let update = line_item::ActiveModel {
                id: Set(line.id),
                quoted_price: Set(Some(prices[line.name.as_str()])),
                updated_at: Set(now),
                ..Default::default()
            };
            line_item::Entity::update(update).exec(&txn).await?;
        }

        txn.commit().await?;

        event_sender
            .send_or_log(Event::QuotationSubmitted {
                request_id: self.request_id,
                vendor_id: self.vendor_id,
                total_quoted_amount: total,
            })
            .await;

        info!(
            request_id = %self.request_id,
            vendor_id = %self.vendor_id,
            %total,
            "quotation submitted"
        );

        Ok(SubmitQuotationResult {
            id: self.request_id,
            status: ProcurementStatus::Quoted.to_string(),
            total_quoted_amount: total,
        })
    }
}

fn quotation_conflict(request: &procurement_request::Model) -> ServiceError {
    if request.status == ProcurementStatus::Quoted {
        ServiceError::ConflictingQuotation(format!(
            "request {} already has a quotation in flight",
            request.request_number
        ))
    } else if request.status != ProcurementStatus::Requested {
        ServiceError::invalid_transition(
            "submit_quotation",
            "requested",
            request.status.to_string(),
        )
    } else {
        // Still labelled requested but a vendor is bound.
        ServiceError::ConflictingQuotation(format!(
            "request {} is already bound to a vendor",
            request.request_number
        ))
    }
}
