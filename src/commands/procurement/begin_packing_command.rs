use sea_orm::TransactionTrait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    commands::{
        procurement::{cas_transition, load_request, require_bound_vendor},
        Command,
    },
    db::DbPool,
    entities::procurement_request::TransitionEvent,
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Moves an approved request into the packing stage.
#[derive(Debug, Serialize, Deserialize)]
pub struct BeginPackingCommand {
    pub request_id: Uuid,
    pub vendor_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BeginPackingResult {
    pub id: Uuid,
    pub status: String,
}

#[async_trait::async_trait]
impl Command for BeginPackingCommand {
    type Result = BeginPackingResult;

    #[instrument(skip(self, db_pool, event_sender))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let db = db_pool.as_ref();
        let txn = db.begin().await?;

        let request = load_request(&txn, self.request_id).await?;
        require_bound_vendor(&request, self.vendor_id)?;
        let target =
            cas_transition(&txn, &request, TransitionEvent::BeginPacking, "begin_packing").await?;

        txn.commit().await?;

        event_sender
            .send_or_log(Event::PackingStarted(self.request_id))
            .await;

        info!(request_id = %self.request_id, vendor_id = %self.vendor_id, "packing started");

        Ok(BeginPackingResult {
            id: self.request_id,
            status: target.to_string(),
        })
    }
}
