use sea_orm::TransactionTrait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    commands::{
        procurement::{cas_transition, load_request},
        Command,
    },
    db::DbPool,
    entities::procurement_request::TransitionEvent,
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Authorizes a quoted request for fulfillment.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApproveRequestCommand {
    pub request_id: Uuid,
    pub approver_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApproveRequestResult {
    pub id: Uuid,
    pub status: String,
}

#[async_trait::async_trait]
impl Command for ApproveRequestCommand {
    type Result = ApproveRequestResult;

    #[instrument(skip(self, db_pool, event_sender))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let db = db_pool.as_ref();
        let txn = db.begin().await?;

        let request = load_request(&txn, self.request_id).await?;
        let target = cas_transition(&txn, &request, TransitionEvent::Approve, "approve").await?;

        txn.commit().await?;

        event_sender
            .send_or_log(Event::RequestApproved(self.request_id))
            .await;

        info!(request_id = %self.request_id, approver = %self.approver_id, "request approved");

        Ok(ApproveRequestResult {
            id: self.request_id,
            status: target.to_string(),
        })
    }
}
