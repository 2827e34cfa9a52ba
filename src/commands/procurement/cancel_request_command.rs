use sea_orm::TransactionTrait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

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

/// Administrative cancellation; legal from any non-terminal state.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CancelRequestCommand {
    pub request_id: Uuid,
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CancelRequestResult {
    pub id: Uuid,
    pub status: String,
}

#[async_trait::async_trait]
impl Command for CancelRequestCommand {
    type Result = CancelRequestResult;

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
        let target = cas_transition(&txn, &request, TransitionEvent::Cancel, "cancel").await?;

        txn.commit().await?;

        event_sender
            .send_or_log(Event::RequestCancelled {
                request_id: self.request_id,
                reason: self.reason.clone(),
            })
            .await;

        info!(request_id = %self.request_id, "request cancelled");

        Ok(CancelRequestResult {
            id: self.request_id,
            status: target.to_string(),
        })
    }
}
