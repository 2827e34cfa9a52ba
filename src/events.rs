use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::entities::document::DocumentType;

/// Domain events emitted on every accepted transition and generated
/// document. Consumed by the background processor; the engine itself never
/// blocks on a consumer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    RequestCreated {
        request_id: Uuid,
        franchise_id: Uuid,
    },
    QuotationSubmitted {
        request_id: Uuid,
        vendor_id: Uuid,
        total_quoted_amount: Decimal,
    },
    RequestApproved(Uuid),
    RequestRejected {
        request_id: Uuid,
        reason: Option<String>,
    },
    PackingStarted(Uuid),
    PackingCheckRecorded {
        request_id: Uuid,
        item_name: String,
        checked: bool,
    },
    WeightRecorded {
        request_id: Uuid,
        weight_kg: Decimal,
    },
    ReadyForPickup(Uuid),
    RequestDispatched(Uuid),
    RequestCancelled {
        request_id: Uuid,
        reason: Option<String>,
    },
    ReceiptRecorded {
        request_id: Uuid,
        net_settlement: Decimal,
        discrepancy: bool,
    },
    DocumentGenerated {
        request_id: Uuid,
        doc_type: DocumentType,
        document_number: String,
        generated_at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the channel is
    /// closed. Transitions must not be rolled back for a lost event.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("Dropping domain event: {}", e);
        }
    }
}

/// Background consumer: drains the channel and logs each event. Runs until
/// every sender is dropped.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::QuotationSubmitted {
                request_id,
                vendor_id,
                total_quoted_amount,
            } => {
                info!(
                    %request_id,
                    %vendor_id,
                    %total_quoted_amount,
                    "quotation submitted"
                );
            }
            Event::ReceiptRecorded {
                request_id,
                net_settlement,
                discrepancy,
            } => {
                info!(%request_id, %net_settlement, discrepancy, "receipt recorded");
            }
            Event::DocumentGenerated {
                request_id,
                doc_type,
                document_number,
                ..
            } => {
                info!(%request_id, %doc_type, %document_number, "document generated");
            }
            other => info!(event = ?other, "domain event"),
        }
    }
    info!("event channel closed; processor exiting");
}
