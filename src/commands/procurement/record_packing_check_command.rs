use chrono::Utc;
use sea_orm::{ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    commands::{
        procurement::{advance_if_ready, load_request, require_bound_vendor},
        Command,
    },
    db::DbPool,
    entities::{line_item, procurement_request::ProcurementStatus},
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Marks one line item as verified on the packing checklist.
///
/// Pure bookkeeping: no status change of its own, but after the write the
/// engine re-evaluates the ready-for-pickup precondition.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RecordPackingCheckCommand {
    pub request_id: Uuid,
    pub vendor_id: Uuid,
    #[validate(length(min = 1, max = 120))]
    pub item_name: String,
    pub checked: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecordPackingCheckResult {
    pub id: Uuid,
    pub status: String,
    /// True when this check completed the precondition and the request
    /// advanced to `ready_for_pickup`.
    pub advanced: bool,
}

#[async_trait::async_trait]
impl Command for RecordPackingCheckCommand {
    type Result = RecordPackingCheckResult;

    #[instrument(skip(self, db_pool, event_sender))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()?;

        let db = db_pool.as_ref();
        let txn = db.begin().await?;

        let request = load_request(&txn, self.request_id).await?;
        require_bound_vendor(&request, self.vendor_id)?;
        if request.status != ProcurementStatus::Preparing {
            return Err(ServiceError::invalid_transition(
                "record_packing_check",
                "preparing",
                request.status.to_string(),
            ));
        }

        let line = line_item::Entity::find()
            .filter(line_item::Column::RequestId.eq(self.request_id))
            .filter(line_item::Column::Name.eq(self.item_name.clone()))
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "item '{}' is not part of request {}",
                    self.item_name, request.request_number
                ))
            })?;

        let update = line_item::ActiveModel {
            id: Set(line.id),
            packed: Set(self.checked),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        line_item::Entity::update(update).exec(&txn).await?;

        let advanced = advance_if_ready(&txn, self.request_id).await?;
        let status = if advanced {
            ProcurementStatus::ReadyForPickup
        } else {
            ProcurementStatus::Preparing
        };

        txn.commit().await?;

        event_sender
            .send_or_log(Event::PackingCheckRecorded {
                request_id: self.request_id,
                item_name: self.item_name.clone(),
                checked: self.checked,
            })
            .await;
        if advanced {
            event_sender
                .send_or_log(Event::ReadyForPickup(self.request_id))
                .await;
        }

        info!(
            request_id = %self.request_id,
            item = %self.item_name,
            checked = self.checked,
            advanced,
            "packing check recorded"
        );

        Ok(RecordPackingCheckResult {
            id: self.request_id,
            status: status.to_string(),
            advanced,
        })
    }
}
