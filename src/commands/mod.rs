use crate::{db::DbPool, errors::ServiceError, events::EventSender};
use async_trait::async_trait;
use std::sync::Arc;

/// Command trait for the engine's mutating operations.
///
/// Each business operation is encapsulated as a command that validates its
/// input, performs its write as a single atomic compare-and-swap inside a
/// transaction, and publishes a domain event on success.
#[async_trait]
pub trait Command: Send + Sync {
    /// The return type of the command when executed successfully
    type Result;

    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError>;
}

pub mod procurement;
