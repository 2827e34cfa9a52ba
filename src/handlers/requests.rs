use axum::{
    extract::{Path, State},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::common::{map_service_error, success_response};
use crate::{
    auth::ActorIdentity,
    entities::{line_item, procurement_request},
    errors::ApiError,
    handlers::AppState,
};

/// Wire view of a line item; both `quantity`/`qty` and
/// `quotedPrice`/`price` spellings are emitted for caller compatibility.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LineItemView {
    pub name: String,
    pub unit: String,
    pub quantity: i32,
    pub qty: i32,
    pub quoted_price: Option<Decimal>,
    pub price: Option<Decimal>,
    pub packed: bool,
    pub received_quantity: Option<i32>,
    pub damaged_quantity: Option<i32>,
}

impl From<&line_item::Model> for LineItemView {
    fn from(item: &line_item::Model) -> Self {
        Self {
            name: item.name.clone(),
            unit: item.unit.clone(),
            quantity: item.quantity,
            qty: item.quantity,
            quoted_price: item.quoted_price,
            price: item.quoted_price,
            packed: item.packed,
            received_quantity: item.received_quantity,
            damaged_quantity: item.damaged_quantity,
        }
    }
}

/// Full aggregate view of a request.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestView {
    pub id: Uuid,
    pub request_number: String,
    pub franchise_id: Uuid,
    pub franchise_name: String,
    pub owner_name: Option<String>,
    pub vendor_id: Option<Uuid>,
    pub status: String,
    pub total_quoted_amount: Decimal,
    pub actual_weight: Option<Decimal>,
    pub received_value: Option<Decimal>,
    pub damaged_loss: Option<Decimal>,
    pub net_settlement: Option<Decimal>,
    pub discrepancy_flag: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<LineItemView>,
}

impl RequestView {
    pub fn from_parts(
        request: &procurement_request::Model,
        items: &[line_item::Model],
    ) -> Self {
        Self {
            id: request.id,
            request_number: request.request_number.clone(),
            franchise_id: request.franchise_id,
            franchise_name: request.franchise_name.clone(),
            owner_name: request.owner_name.clone(),
            vendor_id: request.vendor_id,
            status: request.status.to_string(),
            total_quoted_amount: request.total_quoted_amount,
            actual_weight: request.actual_weight,
            received_value: request.received_value,
            damaged_loss: request.damaged_loss,
            net_settlement: request.net_settlement,
            discrepancy_flag: request.discrepancy_flag,
            notes: request.notes.clone(),
            created_at: request.created_at,
            updated_at: request.updated_at,
            items: items.iter().map(LineItemView::from).collect(),
        }
    }

    /// Header-only view for listings that skip the item fetch.
    pub fn from_header(request: &procurement_request::Model) -> Self {
        Self::from_parts(request, &[])
    }
}

/// Get the full aggregate view of a request (any authenticated actor)
#[utoipa::path(
    get,
    path = "/procurement/requests/{id}",
    params(
        ("id" = Uuid, Path, description = "Request ID")
    ),
    responses(
        (status = 200, description = "Request fetched", body = RequestView),
        (status = 404, description = "Request not found", body = crate::errors::ErrorResponse)
    ),
    tag = "procurement"
)]
pub async fn get_request(
    State(state): State<AppState>,
    _actor: ActorIdentity,
    Path(request_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let (request, items) = state
        .services
        .procurement
        .get_request(request_id)
        .await
        .map_err(map_service_error)?
        .ok_or_else(|| ApiError::NotFound(format!("request {} not found", request_id)))?;

    Ok(success_response(RequestView::from_parts(&request, &items)))
}

pub fn request_routes() -> Router<AppState> {
    Router::new().route("/:id", get(get_request))
}
