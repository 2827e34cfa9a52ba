use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    commands::{
        procurement::{
            approve_request_command::ApproveRequestResult,
            begin_packing_command::BeginPackingResult,
            cancel_request_command::CancelRequestResult,
            create_request_command::CreateRequestResult,
            dispatch_request_command::DispatchRequestResult,
            record_packing_check_command::RecordPackingCheckResult,
            record_weight_command::RecordWeightResult,
            reject_request_command::RejectRequestResult,
            submit_quotation_command::SubmitQuotationResult,
            ApproveRequestCommand, BeginPackingCommand, CancelRequestCommand,
            CreateRequestCommand, DispatchRequestCommand, RecordPackingCheckCommand,
            RecordReceiptCommand, RecordWeightCommand, RejectRequestCommand, SettlementSummary,
            SubmitQuotationCommand,
        },
        Command,
    },
    db::DbPool,
    entities::{
        line_item,
        procurement_request::{self, ProcurementStatus},
    },
    errors::ServiceError,
    events::EventSender,
    services::manifest::ManifestService,
};

/// Service facade over the procurement lifecycle commands and read views.
///
/// The ledger is the single source of truth; every read here re-queries it
/// and every write goes through a command's compare-and-swap.
#[derive(Clone)]
pub struct ProcurementService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    manifest: Arc<ManifestService>,
}

impl ProcurementService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        manifest: Arc<ManifestService>,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            manifest,
        }
    }

    #[instrument(skip(self, command))]
    pub async fn create_request(
        &self,
        command: CreateRequestCommand,
    ) -> Result<CreateRequestResult, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    #[instrument(skip(self, command))]
    pub async fn submit_quotation(
        &self,
        command: SubmitQuotationCommand,
    ) -> Result<SubmitQuotationResult, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    #[instrument(skip(self, command))]
    pub async fn approve_request(
        &self,
        command: ApproveRequestCommand,
    ) -> Result<ApproveRequestResult, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    #[instrument(skip(self, command))]
    pub async fn reject_request(
        &self,
        command: RejectRequestCommand,
    ) -> Result<RejectRequestResult, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    #[instrument(skip(self, command))]
    pub async fn begin_packing(
        &self,
        command: BeginPackingCommand,
    ) -> Result<BeginPackingResult, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    #[instrument(skip(self, command))]
    pub async fn record_packing_check(
        &self,
        command: RecordPackingCheckCommand,
    ) -> Result<RecordPackingCheckResult, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    #[instrument(skip(self, command))]
    pub async fn record_weight(
        &self,
        command: RecordWeightCommand,
    ) -> Result<RecordWeightResult, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    /// Dispatch plus challan: the transition commits first, then the
    /// delivery challan is ensured (idempotent, safe to retry).
    #[instrument(skip(self, command))]
    pub async fn dispatch_request(
        &self,
        command: DispatchRequestCommand,
    ) -> Result<DispatchRequestResult, ServiceError> {
        let request_id = command.request_id;
        let result = command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await?;
        self.manifest.generate_delivery_challan(request_id).await?;
        Ok(result)
    }

    #[instrument(skip(self, command))]
    pub async fn cancel_request(
        &self,
        command: CancelRequestCommand,
    ) -> Result<CancelRequestResult, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    #[instrument(skip(self, command))]
    pub async fn record_receipt(
        &self,
        command: RecordReceiptCommand,
    ) -> Result<SettlementSummary, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    /// Full aggregate view: header plus line items in request order.
    #[instrument(skip(self))]
    pub async fn get_request(
        &self,
        request_id: Uuid,
    ) -> Result<Option<(procurement_request::Model, Vec<line_item::Model>)>, ServiceError> {
        let db = &*self.db_pool;
        let Some(request) = procurement_request::Entity::find_by_id(request_id)
            .one(db)
            .await?
        else {
            return Ok(None);
        };
        let items = line_item::Entity::find()
            .filter(line_item::Column::RequestId.eq(request_id))
            .order_by_asc(line_item::Column::LineNumber)
            .all(db)
            .await?;
        Ok(Some((request, items)))
    }

    /// A franchise's own requests, newest first, optionally narrowed to
    /// one (normalized) status.
    #[instrument(skip(self))]
    pub async fn list_by_franchise(
        &self,
        franchise_id: Uuid,
        status: Option<ProcurementStatus>,
    ) -> Result<Vec<procurement_request::Model>, ServiceError> {
        let db = &*self.db_pool;
        let mut query = procurement_request::Entity::find()
            .filter(procurement_request::Column::FranchiseId.eq(franchise_id));
        if let Some(status) = status {
            query = query.filter(procurement_request::Column::Status.eq(status));
        }
        Ok(query
            .order_by_desc(procurement_request::Column::CreatedAt)
            .all(db)
            .await?)
    }

    /// Non-terminal requests assigned to a vendor (the active-dispatch
    /// view).
    #[instrument(skip(self))]
    pub async fn list_vendor_active(
        &self,
        vendor_id: Uuid,
    ) -> Result<Vec<procurement_request::Model>, ServiceError> {
        let db = &*self.db_pool;
        Ok(procurement_request::Entity::find()
            .filter(procurement_request::Column::VendorId.eq(vendor_id))
            .filter(procurement_request::Column::Status.is_not_in([
                ProcurementStatus::Completed,
                ProcurementStatus::Rejected,
                ProcurementStatus::Cancelled,
            ]))
            .order_by_desc(procurement_request::Column::CreatedAt)
            .all(db)
            .await?)
    }

    /// Everything ever assigned to a vendor, terminal or not.
    #[instrument(skip(self))]
    pub async fn list_vendor_assignments(
        &self,
        vendor_id: Uuid,
    ) -> Result<Vec<procurement_request::Model>, ServiceError> {
        let db = &*self.db_pool;
        Ok(procurement_request::Entity::find()
            .filter(procurement_request::Column::VendorId.eq(vendor_id))
            .order_by_desc(procurement_request::Column::CreatedAt)
            .all(db)
            .await?)
    }
}
