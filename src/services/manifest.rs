use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, QueryOrder,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::DbPool,
    entities::{
        document::{self, DocumentType},
        line_item,
        procurement_request::{self, ProcurementStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Carrier details captured on a consignment note.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, Validate)]
pub struct BiltyDetails {
    #[validate(length(min = 1, max = 120))]
    pub delivery_partner: String,
    #[validate(length(min = 1, max = 32))]
    pub vehicle_number: String,
    #[validate(length(min = 1, max = 32))]
    pub vehicle_type: String,
    #[validate(range(min = 1))]
    pub number_of_packages: i32,
}

/// Deterministic construction of manifest documents from ledger state.
///
/// Generators are pure functions of the request at call time: they check
/// their stated preconditions, snapshot the line items into the document
/// payload and return the frozen row. Generation is idempotent: a second
/// call returns the existing document instead of issuing a duplicate, so
/// retrying after a timeout needs no caller-side deduplication.
#[derive(Clone)]
pub struct ManifestService {
    db: Arc<DbPool>,
    event_sender: Option<EventSender>,
}

impl ManifestService {
    pub fn new(db: Arc<DbPool>, event_sender: Option<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn generate_delivery_challan(
        &self,
        request_id: Uuid,
    ) -> Result<document::Model, ServiceError> {
        let (request, items) = self.load(request_id).await?;

        let dispatchable = matches!(
            request.status,
            ProcurementStatus::ReadyForPickup | ProcurementStatus::Completed
        );
        if !dispatchable || request.actual_weight.is_none() {
            return Err(ServiceError::invalid_transition(
                "generate_delivery_challan",
                "ready_for_pickup or completed, with recorded weight",
                request.status.to_string(),
            ));
        }

        let payload = json!({
            "items": item_snapshots(&items),
            "totalWeight": request.actual_weight,
            "actualWeight": request.actual_weight,
            "fromFranchise": request.vendor_id,
            "destNode": request.franchise_id,
            "franchise": request.franchise_name,
            "requestNumber": request.request_number,
        });

        self.get_or_create(&request, DocumentType::DeliveryChallan, payload)
            .await
    }

    #[instrument(skip(self))]
    pub async fn generate_grn(&self, request_id: Uuid) -> Result<document::Model, ServiceError> {
        let (request, items) = self.load(request_id).await?;

        if request.receipt_recorded_at.is_none() {
            return Err(ServiceError::invalid_transition(
                "generate_grn",
                "receipt recorded",
                "no receipt on file",
            ));
        }

        let item_rows: Vec<serde_json::Value> = items
            .iter()
            .map(|item| {
                json!({
                    "name": item.name,
                    "quantity": item.quantity,
                    "qty": item.quantity,
                    "unit": item.unit,
                    "quotedPrice": item.quoted_price,
                    "price": item.quoted_price,
                    "receivedQuantity": item.received_quantity,
                    "damagedQuantity": item.damaged_quantity,
                })
            })
            .collect();

        let payload = json!({
            "items": item_rows,
            "franchise": request.franchise_name,
            "destNode": request.franchise_id,
            "receivedValue": request.received_value,
            "damagedLoss": request.damaged_loss,
            "netSettlement": request.net_settlement,
            "discrepancyFlag": request.discrepancy_flag,
            "requestNumber": request.request_number,
        });

        self.get_or_create(&request, DocumentType::Grn, payload).await
    }

    #[instrument(skip(self))]
    pub async fn generate_invoice(
        &self,
        request_id: Uuid,
    ) -> Result<document::Model, ServiceError> {
        let (request, items) = self.load(request_id).await?;

        if request.status != ProcurementStatus::Completed {
            return Err(ServiceError::invalid_transition(
                "generate_invoice",
                "completed",
                request.status.to_string(),
            ));
        }

        let invoice_number = document_number(&request, DocumentType::Invoice, 1);
        let payload = json!({
            "items": item_snapshots(&items),
            "invoiceNumber": invoice_number,
            "invoiceDate": Utc::now().to_rfc3339(),
            "totalQuotedAmount": request.total_quoted_amount,
            "franchise": request.franchise_name,
            "destNode": request.franchise_id,
            "vendor": request.vendor_id,
            "requestNumber": request.request_number,
        });

        self.get_or_create(&request, DocumentType::Invoice, payload)
            .await
    }

    #[instrument(skip(self, details))]
    pub async fn generate_bilty(
        &self,
        request_id: Uuid,
        details: BiltyDetails,
    ) -> Result<document::Model, ServiceError> {
        details
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let (request, items) = self.load(request_id).await?;

        let dispatchable = matches!(
            request.status,
            ProcurementStatus::ReadyForPickup | ProcurementStatus::Completed
        );
        if !dispatchable {
            return Err(ServiceError::invalid_transition(
                "generate_bilty",
                "ready_for_pickup or completed",
                request.status.to_string(),
            ));
        }

        let bilty_number = document_number(&request, DocumentType::Bilty, 1);
        let payload = json!({
            "items": item_snapshots(&items),
            "biltyNumber": bilty_number,
            "deliveryPartner": details.delivery_partner,
            "vehicleNumber": details.vehicle_number,
            "vehicleType": details.vehicle_type,
            "numberOfPackages": details.number_of_packages,
            "totalWeight": request.actual_weight,
            "fromFranchise": request.vendor_id,
            "destNode": request.franchise_id,
            "requestNumber": request.request_number,
        });

        self.get_or_create(&request, DocumentType::Bilty, payload)
            .await
    }

    /// Latest issued document of a type for a request, if any.
    pub async fn find_document(
        &self,
        request_id: Uuid,
        doc_type: DocumentType,
    ) -> Result<Option<document::Model>, ServiceError> {
        Ok(document::Entity::find()
            .filter(document::Column::RequestId.eq(request_id))
            .filter(document::Column::DocType.eq(doc_type))
            .order_by_desc(document::Column::Sequence)
            .one(&*self.db)
            .await?)
    }

    async fn load(
        &self,
        request_id: Uuid,
    ) -> Result<(procurement_request::Model, Vec<line_item::Model>), ServiceError> {
        let db = &*self.db;
        let request = procurement_request::Entity::find_by_id(request_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("request {} not found", request_id)))?;
        let items = line_item::Entity::find()
            .filter(line_item::Column::RequestId.eq(request_id))
            .order_by_asc(line_item::Column::LineNumber)
            .all(db)
            .await?;
        Ok((request, items))
    }

    /// Content-addressed issue: one document per (request, type) until an
    /// explicit regeneration bumps the sequence. Two concurrent calls race
    /// on the unique index; the loser re-reads the winner's row.
    async fn get_or_create(
        &self,
        request: &procurement_request::Model,
        doc_type: DocumentType,
        payload: serde_json::Value,
    ) -> Result<document::Model, ServiceError> {
        if let Some(existing) = self.find_document(request.id, doc_type).await? {
            return Ok(existing);
        }

        let sequence = 1;
        let number = document_number(request, doc_type, sequence);
        let now = Utc::now();
        let row = document::ActiveModel {
            id: Set(Uuid::new_v4()),
            document_number: Set(number.clone()),
            request_id: Set(request.id),
            doc_type: Set(doc_type),
            sequence: Set(sequence),
            payload: Set(payload),
            generated_at: Set(now),
        };

        match row.insert(&*self.db).await {
            Ok(created) => {
                if let Some(sender) = &self.event_sender {
                    sender
                        .send_or_log(Event::DocumentGenerated {
                            request_id: request.id,
                            doc_type,
                            document_number: number.clone(),
                            generated_at: now,
                        })
                        .await;
                }
                info!(
                    request_id = %request.id,
                    %doc_type,
                    document_number = %number,
                    "document generated"
                );
                Ok(created)
            }
            Err(insert_err) => {
                // Unique-index collision: someone else generated it first.
                match self.find_document(request.id, doc_type).await? {
                    Some(existing) => Ok(existing),
                    None => Err(insert_err.into()),
                }
            }
        }
    }
}

fn document_number(
    request: &procurement_request::Model,
    doc_type: DocumentType,
    sequence: i32,
) -> String {
    format!("{}-{}-{}", doc_type.code(), request.request_number, sequence)
}

fn item_snapshots(items: &[line_item::Model]) -> Vec<serde_json::Value> {
    items
        .iter()
        .map(|item| {
            json!({
                "name": item.name,
                "quantity": item.quantity,
                "qty": item.quantity,
                "unit": item.unit,
                "quotedPrice": item.quoted_price.unwrap_or(Decimal::ZERO),
                "price": item.quoted_price.unwrap_or(Decimal::ZERO),
            })
        })
        .collect()
}
