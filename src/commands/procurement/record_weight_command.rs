use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    commands::{
        procurement::{advance_if_ready, load_request, require_bound_vendor},
        Command,
    },
    db::DbPool,
    entities::procurement_request::{self, ProcurementStatus},
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Records the calibrated dispatch weight, once, while the request is in
/// `preparing`. The UPDATE is guarded by `actual_weight IS NULL`, so of
/// two concurrent recordings exactly one lands.
#[derive(Debug, Serialize, Deserialize)]
pub struct RecordWeightCommand {
    pub request_id: Uuid,
    pub vendor_id: Uuid,
    pub weight_kg: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecordWeightResult {
    pub id: Uuid,
    pub status: String,
    pub actual_weight: Decimal,
    /// True when the weight completed the precondition and the request
    /// advanced to `ready_for_pickup`.
    pub advanced: bool,
}

#[async_trait::async_trait]
impl Command for RecordWeightCommand {
    type Result = RecordWeightResult;

    #[instrument(skip(self, db_pool, event_sender))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        if self.weight_kg <= Decimal::ZERO {
            return Err(ServiceError::InvalidWeight(format!(
                "weight must be > 0 kg, got {}",
                self.weight_kg
            )));
        }

        let db = db_pool.as_ref();
        let txn = db.begin().await?;

        let request = load_request(&txn, self.request_id).await?;
        require_bound_vendor(&request, self.vendor_id)?;
        if request.status != ProcurementStatus::Preparing {
            return Err(ServiceError::invalid_transition(
                "record_weight",
                "preparing",
                request.status.to_string(),
            ));
        }

        let result = procurement_request::Entity::update_many()
            .set(procurement_request::ActiveModel {
                actual_weight: Set(Some(self.weight_kg)),
                updated_at: Set(Utc::now()),
                ..Default::default()
            })
            .filter(procurement_request::Column::Id.eq(self.request_id))
            .filter(procurement_request::Column::Status.eq(ProcurementStatus::Preparing))
            .filter(procurement_request::Column::ActualWeight.is_null())
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            let current = load_request(&txn, self.request_id).await?;
            if current.actual_weight.is_some() {
                return Err(ServiceError::invalid_transition(
                    "record_weight",
                    "preparing with no recorded weight",
                    "weight already recorded",
                ));
            }
            return Err(ServiceError::StaleState(current.id.to_string()));
        }

        let advanced = advance_if_ready(&txn, self.request_id).await?;
        let status = if advanced {
            ProcurementStatus::ReadyForPickup
        } else {
            ProcurementStatus::Preparing
        };

        txn.commit().await?;

        event_sender
            .send_or_log(Event::WeightRecorded {
                request_id: self.request_id,
                weight_kg: self.weight_kg,
            })
            .await;
        if advanced {
            event_sender
                .send_or_log(Event::ReadyForPickup(self.request_id))
                .await;
        }

        info!(
            request_id = %self.request_id,
            weight_kg = %self.weight_kg,
            advanced,
            "weight recorded"
        );

        Ok(RecordWeightResult {
            id: self.request_id,
            status: status.to_string(),
            actual_weight: self.weight_kg,
            advanced,
        })
    }
}
