use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    commands::Command,
    db::DbPool,
    entities::{line_item, procurement_request, procurement_request::ProcurementStatus},
    errors::ServiceError,
    events::{Event, EventSender},
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewLineItem {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(min = 1, max = 32))]
    pub unit: String,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateRequestCommand {
    pub franchise_id: Uuid,
    #[validate(length(min = 1, max = 120))]
    pub franchise_name: String,
    pub owner_name: Option<String>,
    #[validate]
    pub items: Vec<NewLineItem>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateRequestResult {
    pub id: Uuid,
    pub request_number: String,
}

#[async_trait::async_trait]
impl Command for CreateRequestCommand {
    type Result = CreateRequestResult;

    #[instrument(skip(self, db_pool, event_sender))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()?;
        if self.items.is_empty() {
            return Err(ServiceError::ValidationError(
                "a request needs at least one line item".to_string(),
            ));
        }

        let db = db_pool.as_ref();
        let now = Utc::now();
        let request_id = Uuid::new_v4();
        let request_number = format!("PR-{}", &request_id.simple().to_string()[..8].to_uppercase());

        let txn = db.begin().await?;

        let header = procurement_request::ActiveModel {
            id: Set(request_id),
            request_number: Set(request_number.clone()),
            franchise_id: Set(self.franchise_id),
            franchise_name: Set(self.franchise_name.clone()),
            owner_name: Set(self.owner_name.clone()),
            vendor_id: Set(None),
            status: Set(ProcurementStatus::Requested),
            total_quoted_amount: Set(Decimal::ZERO),
            actual_weight: Set(None),
            received_value: Set(None),
            damaged_loss: Set(None),
            net_settlement: Set(None),
            discrepancy_flag: Set(false),
            receipt_recorded_at: Set(None),
            notes: Set(self.notes.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        };
        header.insert(&txn).await?;

        // Insertion order is the request order; line_number freezes it.
        for (index, item) in self.items.iter().enumerate() {
            let line = line_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                request_id: Set(request_id),
                line_number: Set(index as i32 + 1),
                name: Set(item.name.clone()),
                unit: Set(item.unit.clone()),
                quantity: Set(item.quantity),
                quoted_price: Set(None),
                packed: Set(false),
                received_quantity: Set(None),
                damaged_quantity: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
            };
            line.insert(&txn).await?;
        }

        txn.commit().await?;

        event_sender
            .send_or_log(Event::RequestCreated {
                request_id,
                franchise_id: self.franchise_id,
            })
            .await;

        info!(%request_id, %request_number, "procurement request created");

        Ok(CreateRequestResult {
            id: request_id,
            request_number,
        })
    }
}
