use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::common::{created_response, map_service_error, success_response, validate_input};
use super::requests::RequestView;
use crate::{
    auth::{ActorIdentity, ActorRole},
    commands::procurement::{
        ApproveRequestCommand, CreateRequestCommand, NewLineItem, ReceiptItem,
        RecordReceiptCommand, RejectRequestCommand,
    },
    entities::procurement_request::ProcurementStatus,
    errors::ApiError,
    handlers::AppState,
};

// Request and response DTOs

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequestBody {
    pub franchise_id: Option<Uuid>,
    #[validate(length(min = 1, max = 120))]
    pub franchise_name: String,
    pub owner_name: Option<String>,
    pub items: Vec<NewItemBody>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewItemBody {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(min = 1, max = 32))]
    pub unit: String,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct RejectRequestBody {
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptBody {
    pub items: Vec<ReceiptItemBody>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptItemBody {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    pub received_quantity: i32,
    pub damaged_quantity: i32,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListRequestsParams {
    /// Status filter; legacy view labels (`assigned`, `bidding`, `new`)
    /// are accepted and normalized.
    pub status: Option<String>,
}

// Handler functions

/// Create a procurement request
#[utoipa::path(
    post,
    path = "/procurement/franchise/requests",
    request_body = CreateRequestBody,
    responses(
        (status = 201, description = "Request created", body = serde_json::Value),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "franchise"
)]
pub async fn create_request(
    State(state): State<AppState>,
    actor: ActorIdentity,
    Json(payload): Json<CreateRequestBody>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    actor.require_role(&[ActorRole::Franchise, ActorRole::Admin])?;
    validate_input(&payload)?;
    for item in &payload.items {
        validate_input(item)?;
    }

    // Franchise actors create for themselves; admins may act on behalf of
    // a node by naming it.
    let franchise_id = match actor.role {
        ActorRole::Franchise => actor.actor_id,
        _ => payload.franchise_id.ok_or_else(|| {
            ApiError::ValidationError("franchiseId is required".to_string())
        })?,
    };

    let command = CreateRequestCommand {
        franchise_id,
        franchise_name: payload.franchise_name,
        owner_name: payload.owner_name,
        items: payload
            .items
            .into_iter()
            .map(|item| NewLineItem {
                name: item.name,
                unit: item.unit,
                quantity: item.quantity,
            })
            .collect(),
        notes: payload.notes,
    };

    let result = state
        .services
        .procurement
        .create_request(command)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(serde_json::json!({
        "id": result.id,
        "requestNumber": result.request_number,
        "status": "requested",
    })))
}

/// List the calling franchise's requests
#[utoipa::path(
    get,
    path = "/procurement/franchise/requests",
    params(ListRequestsParams),
    responses(
        (status = 200, description = "Requests for this franchise", body = [RequestView])
    ),
    tag = "franchise"
)]
pub async fn list_requests(
    State(state): State<AppState>,
    actor: ActorIdentity,
    Query(params): Query<ListRequestsParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    actor.require_role(&[ActorRole::Franchise])?;

    let status = match params.status.as_deref() {
        None => None,
        Some(label) => Some(ProcurementStatus::normalize(label).ok_or_else(|| {
            ApiError::ValidationError(format!("unknown status label '{}'", label))
        })?),
    };

    let requests = state
        .services
        .procurement
        .list_by_franchise(actor.actor_id, status)
        .await
        .map_err(map_service_error)?;

    let views: Vec<RequestView> = requests.iter().map(RequestView::from_header).collect();
    Ok(success_response(views))
}

/// Approve a quoted request
#[utoipa::path(
    post,
    path = "/procurement/franchise/requests/{id}/approve",
    params(("id" = Uuid, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Request approved", body = serde_json::Value),
        (status = 409, description = "Wrong status for approval", body = crate::errors::ErrorResponse)
    ),
    tag = "franchise"
)]
pub async fn approve_request(
    State(state): State<AppState>,
    actor: ActorIdentity,
    Path(request_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    actor.require_role(&[ActorRole::Franchise, ActorRole::Admin])?;
    require_franchise_ownership(&state, &actor, request_id).await?;

    let command = ApproveRequestCommand {
        request_id,
        approver_id: actor.actor_id,
    };

    let result = state
        .services
        .procurement
        .approve_request(command)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(serde_json::json!({
        "id": result.id,
        "status": result.status,
    })))
}

/// Reject a quoted request
#[utoipa::path(
    post,
    path = "/procurement/franchise/requests/{id}/reject",
    request_body = RejectRequestBody,
    params(("id" = Uuid, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Request rejected", body = serde_json::Value),
        (status = 409, description = "Wrong status for rejection", body = crate::errors::ErrorResponse)
    ),
    tag = "franchise"
)]
pub async fn reject_request(
    State(state): State<AppState>,
    actor: ActorIdentity,
    Path(request_id): Path<Uuid>,
    Json(payload): Json<RejectRequestBody>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    actor.require_role(&[ActorRole::Franchise, ActorRole::Admin])?;
    require_franchise_ownership(&state, &actor, request_id).await?;
    validate_input(&payload)?;

    let command = RejectRequestCommand {
        request_id,
        rejector_id: actor.actor_id,
        reason: payload.reason,
    };

    let result = state
        .services
        .procurement
        .reject_request(command)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(serde_json::json!({
        "id": result.id,
        "status": result.status,
    })))
}

/// Record what was actually received, deriving the settlement
#[utoipa::path(
    post,
    path = "/procurement/franchise/requests/{id}/receipt",
    request_body = ReceiptBody,
    params(("id" = Uuid, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Receipt recorded with settlement figures", body = serde_json::Value),
        (status = 422, description = "Quantity bound violated", body = crate::errors::ErrorResponse)
    ),
    tag = "franchise"
)]
pub async fn record_receipt(
    State(state): State<AppState>,
    actor: ActorIdentity,
    Path(request_id): Path<Uuid>,
    Json(payload): Json<ReceiptBody>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    actor.require_role(&[ActorRole::Franchise])?;
    for item in &payload.items {
        validate_input(item)?;
    }

    let command = RecordReceiptCommand {
        request_id,
        franchise_id: actor.actor_id,
        items: payload
            .items
            .into_iter()
            .map(|item| ReceiptItem {
                name: item.name,
                received_quantity: item.received_quantity,
                damaged_quantity: item.damaged_quantity,
            })
            .collect(),
    };

    let settlement = state
        .services
        .procurement
        .record_receipt(command)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(serde_json::json!({
        "id": settlement.id,
        "receivedValue": settlement.received_value,
        "damagedLoss": settlement.damaged_loss,
        "netSettlement": settlement.net_settlement,
        "discrepancyFlag": settlement.discrepancy_flag,
        "receiptRecordedAt": settlement.receipt_recorded_at,
    })))
}

/// Generate (or fetch) the goods received note
#[utoipa::path(
    post,
    path = "/procurement/franchise/requests/{id}/grn",
    params(("id" = Uuid, Path, description = "Request ID")),
    responses(
        (status = 200, description = "GRN document", body = serde_json::Value),
        (status = 409, description = "No receipt on file", body = crate::errors::ErrorResponse)
    ),
    tag = "franchise"
)]
pub async fn generate_grn(
    State(state): State<AppState>,
    actor: ActorIdentity,
    Path(request_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    actor.require_role(&[ActorRole::Franchise, ActorRole::Admin])?;
    require_franchise_ownership(&state, &actor, request_id).await?;

    let doc = state
        .services
        .manifest
        .generate_grn(request_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(doc))
}

/// Franchise actors may only touch their own requests; admins see all.
async fn require_franchise_ownership(
    state: &AppState,
    actor: &ActorIdentity,
    request_id: Uuid,
) -> Result<(), ApiError> {
    if actor.role != ActorRole::Franchise {
        return Ok(());
    }
    let (request, _) = state
        .services
        .procurement
        .get_request(request_id)
        .await
        .map_err(map_service_error)?
        .ok_or_else(|| ApiError::NotFound(format!("request {} not found", request_id)))?;
    if request.franchise_id != actor.actor_id {
        return Err(ApiError::Forbidden(format!(
            "request {} belongs to another franchise",
            request.request_number
        )));
    }
    Ok(())
}

/// Creates the router for franchise endpoints
pub fn franchise_routes() -> Router<AppState> {
    Router::new()
        .route("/requests", post(create_request))
        .route("/requests", get(list_requests))
        .route("/requests/:id/approve", post(approve_request))
        .route("/requests/:id/reject", post(reject_request))
        .route("/requests/:id/receipt", post(record_receipt))
        .route("/requests/:id/grn", post(generate_grn))
}
