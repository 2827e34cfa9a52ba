use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::common::{map_service_error, success_response, validate_input};
use super::requests::RequestView;
use crate::{
    auth::{ActorIdentity, ActorRole},
    commands::procurement::{
        BeginPackingCommand, DispatchRequestCommand, QuotedItem, RecordPackingCheckCommand,
        RecordWeightCommand, SubmitQuotationCommand,
    },
    errors::ApiError,
    handlers::AppState,
    services::manifest::BiltyDetails,
};

// Request and response DTOs

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuoteBody {
    pub items: Vec<QuoteItemBody>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuoteItemBody {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    pub quoted_price: Decimal,
    /// Echoed by some clients; the requested quantity is immutable and
    /// this field is ignored.
    pub quantity: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PackingCheckBody {
    #[validate(length(min = 1, max = 120))]
    pub item_name: String,
    pub checked: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WeightBody {
    pub weight_kg: Decimal,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BiltyBody {
    #[validate(length(min = 1, max = 120))]
    pub delivery_partner: String,
    #[validate(length(min = 1, max = 32))]
    pub vehicle_number: String,
    #[validate(length(min = 1, max = 32))]
    pub vehicle_type: String,
    #[validate(range(min = 1))]
    pub number_of_packages: i32,
}

// Handler functions

/// Submit a quotation for a requested dispatch
#[utoipa::path(
    post,
    path = "/procurement/vendor/{id}/quote",
    request_body = QuoteBody,
    params(("id" = Uuid, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Quotation accepted", body = serde_json::Value),
        (status = 409, description = "Conflicting quotation or wrong status", body = crate::errors::ErrorResponse),
        (status = 422, description = "Quotation does not price every item", body = crate::errors::ErrorResponse)
    ),
    tag = "vendor"
)]
pub async fn submit_quotation(
    State(state): State<AppState>,
    actor: ActorIdentity,
    Path(request_id): Path<Uuid>,
    Json(payload): Json<QuoteBody>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    actor.require_role(&[ActorRole::Vendor])?;
    for item in &payload.items {
        validate_input(item)?;
    }

    let command = SubmitQuotationCommand {
        request_id,
        vendor_id: actor.actor_id,
        items: payload
            .items
            .into_iter()
            .map(|item| QuotedItem {
                name: item.name,
                quoted_price: item.quoted_price,
            })
            .collect(),
    };

    let result = state
        .services
        .procurement
        .submit_quotation(command)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(serde_json::json!({
        "id": result.id,
        "status": result.status,
        "totalQuotedAmount": result.total_quoted_amount,
    })))
}

/// Non-terminal requests assigned to the calling vendor
#[utoipa::path(
    get,
    path = "/procurement/vendor/active-dispatch",
    responses(
        (status = 200, description = "Active assignments", body = [RequestView])
    ),
    tag = "vendor"
)]
pub async fn active_dispatch(
    State(state): State<AppState>,
    actor: ActorIdentity,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    actor.require_role(&[ActorRole::Vendor])?;

    let requests = state
        .services
        .procurement
        .list_vendor_active(actor.actor_id)
        .await
        .map_err(map_service_error)?;

    let views: Vec<RequestView> = requests.iter().map(RequestView::from_header).collect();
    Ok(success_response(views))
}

/// All-time assignments of the calling vendor
#[utoipa::path(
    get,
    path = "/procurement/vendor/my-assignments",
    responses(
        (status = 200, description = "All assignments", body = [RequestView])
    ),
    tag = "vendor"
)]
pub async fn my_assignments(
    State(state): State<AppState>,
    actor: ActorIdentity,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    actor.require_role(&[ActorRole::Vendor])?;

    let requests = state
        .services
        .procurement
        .list_vendor_assignments(actor.actor_id)
        .await
        .map_err(map_service_error)?;

    let views: Vec<RequestView> = requests.iter().map(RequestView::from_header).collect();
    Ok(success_response(views))
}

/// Begin the packing stage
#[utoipa::path(
    post,
    path = "/procurement/vendor/{id}/packing",
    params(("id" = Uuid, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Packing started", body = serde_json::Value),
        (status = 409, description = "Wrong status", body = crate::errors::ErrorResponse)
    ),
    tag = "vendor"
)]
pub async fn begin_packing(
    State(state): State<AppState>,
    actor: ActorIdentity,
    Path(request_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    actor.require_role(&[ActorRole::Vendor])?;

    let command = BeginPackingCommand {
        request_id,
        vendor_id: actor.actor_id,
    };

    let result = state
        .services
        .procurement
        .begin_packing(command)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(serde_json::json!({
        "id": result.id,
        "status": result.status,
    })))
}

/// Tick (or untick) one item on the packing checklist
#[utoipa::path(
    post,
    path = "/procurement/vendor/{id}/packing-check",
    request_body = PackingCheckBody,
    params(("id" = Uuid, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Check recorded", body = serde_json::Value),
        (status = 409, description = "Not in preparing", body = crate::errors::ErrorResponse)
    ),
    tag = "vendor"
)]
pub async fn record_packing_check(
    State(state): State<AppState>,
    actor: ActorIdentity,
    Path(request_id): Path<Uuid>,
    Json(payload): Json<PackingCheckBody>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    actor.require_role(&[ActorRole::Vendor])?;
    validate_input(&payload)?;

    let command = RecordPackingCheckCommand {
        request_id,
        vendor_id: actor.actor_id,
        item_name: payload.item_name,
        checked: payload.checked,
    };

    let result = state
        .services
        .procurement
        .record_packing_check(command)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(serde_json::json!({
        "id": result.id,
        "status": result.status,
        "advanced": result.advanced,
    })))
}

/// Record the calibrated dispatch weight
#[utoipa::path(
    post,
    path = "/procurement/vendor/{id}/weight",
    request_body = WeightBody,
    params(("id" = Uuid, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Weight recorded", body = serde_json::Value),
        (status = 422, description = "Invalid weight", body = crate::errors::ErrorResponse)
    ),
    tag = "vendor"
)]
pub async fn record_weight(
    State(state): State<AppState>,
    actor: ActorIdentity,
    Path(request_id): Path<Uuid>,
    Json(payload): Json<WeightBody>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    actor.require_role(&[ActorRole::Vendor])?;

    let command = RecordWeightCommand {
        request_id,
        vendor_id: actor.actor_id,
        weight_kg: payload.weight_kg,
    };

    let result = state
        .services
        .procurement
        .record_weight(command)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(serde_json::json!({
        "id": result.id,
        "status": result.status,
        "actualWeight": result.actual_weight,
        "advanced": result.advanced,
    })))
}

/// Dispatch a ready-for-pickup request
#[utoipa::path(
    post,
    path = "/procurement/vendor/{id}/dispatch",
    params(("id" = Uuid, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Dispatched", body = serde_json::Value),
        (status = 409, description = "Wrong status", body = crate::errors::ErrorResponse)
    ),
    tag = "vendor"
)]
pub async fn dispatch_request(
    State(state): State<AppState>,
    actor: ActorIdentity,
    Path(request_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    actor.require_role(&[ActorRole::Vendor])?;

    let command = DispatchRequestCommand {
        request_id,
        vendor_id: actor.actor_id,
    };

    let result = state
        .services
        .procurement
        .dispatch_request(command)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(serde_json::json!({
        "id": result.id,
        "status": result.status,
    })))
}

/// Generate (or fetch) the delivery challan
#[utoipa::path(
    post,
    path = "/procurement/vendor/{id}/challan",
    params(("id" = Uuid, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Delivery challan document", body = serde_json::Value),
        (status = 409, description = "Preconditions not met", body = crate::errors::ErrorResponse)
    ),
    tag = "vendor"
)]
pub async fn generate_challan(
    State(state): State<AppState>,
    actor: ActorIdentity,
    Path(request_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    actor.require_role(&[ActorRole::Vendor, ActorRole::Admin])?;

    let doc = state
        .services
        .manifest
        .generate_delivery_challan(request_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(doc))
}

/// Generate (or fetch) the invoice
#[utoipa::path(
    post,
    path = "/procurement/vendor/{id}/invoice",
    params(("id" = Uuid, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Invoice document", body = serde_json::Value),
        (status = 409, description = "Preconditions not met", body = crate::errors::ErrorResponse)
    ),
    tag = "vendor"
)]
pub async fn generate_invoice(
    State(state): State<AppState>,
    actor: ActorIdentity,
    Path(request_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    actor.require_role(&[ActorRole::Vendor, ActorRole::Admin])?;

    let doc = state
        .services
        .manifest
        .generate_invoice(request_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(doc))
}

/// Generate (or fetch) the consignment note for the logistics leg
#[utoipa::path(
    post,
    path = "/procurement/vendor/{id}/bilty",
    request_body = BiltyBody,
    params(("id" = Uuid, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Bilty document", body = serde_json::Value),
        (status = 409, description = "Preconditions not met", body = crate::errors::ErrorResponse)
    ),
    tag = "vendor"
)]
pub async fn generate_bilty(
    State(state): State<AppState>,
    actor: ActorIdentity,
    Path(request_id): Path<Uuid>,
    Json(payload): Json<BiltyBody>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    actor.require_role(&[ActorRole::Vendor, ActorRole::DeliveryPartner, ActorRole::Admin])?;
    validate_input(&payload)?;

    let details = BiltyDetails {
        delivery_partner: payload.delivery_partner,
        vehicle_number: payload.vehicle_number,
        vehicle_type: payload.vehicle_type,
        number_of_packages: payload.number_of_packages,
    };

    let doc = state
        .services
        .manifest
        .generate_bilty(request_id, details)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(doc))
}

/// Creates the router for vendor endpoints
pub fn vendor_routes() -> Router<AppState> {
    Router::new()
        .route("/active-dispatch", get(active_dispatch))
        .route("/my-assignments", get(my_assignments))
        .route("/:id/quote", post(submit_quotation))
        .route("/:id/packing", post(begin_packing))
        .route("/:id/packing-check", post(record_packing_check))
        .route("/:id/weight", post(record_weight))
        .route("/:id/dispatch", post(dispatch_request))
        .route("/:id/challan", post(generate_challan))
        .route("/:id/invoice", post(generate_invoice))
        .route("/:id/bilty", post(generate_bilty))
}
