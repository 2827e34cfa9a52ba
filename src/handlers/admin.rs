use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::common::{map_service_error, success_response, validate_input};
use crate::{
    auth::{ActorIdentity, ActorRole},
    commands::procurement::CancelRequestCommand,
    errors::ApiError,
    handlers::AppState,
    services::reports::{DateRange, ProcurementReport, ReportFilter},
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct ReportParams {
    /// Case-insensitive substring over invoice number, franchise name and
    /// owner name.
    pub search: Option<String>,
    /// today | week | month | all (default all), against the invoice date.
    pub date_range: Option<DateRange>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CancelRequestBody {
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

/// Audit rollup over all procurement requests
#[utoipa::path(
    get,
    path = "/procurement/admin/reports",
    params(ReportParams),
    responses(
        (status = 200, description = "Filtered report with summary totals", body = ProcurementReport)
    ),
    tag = "admin"
)]
pub async fn list_reports(
    State(state): State<AppState>,
    actor: ActorIdentity,
    Query(params): Query<ReportParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    actor.require_role(&[ActorRole::Admin])?;

    let filter = ReportFilter {
        search: params.search,
        date_range: params.date_range.unwrap_or_default(),
        page: params.page.unwrap_or(1),
        per_page: params.per_page.unwrap_or(20),
    };

    let report = state
        .services
        .reports
        .list_reports(filter)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(report))
}

/// Cancel a request from any non-terminal state
#[utoipa::path(
    post,
    path = "/procurement/admin/requests/{id}/cancel",
    request_body = CancelRequestBody,
    params(("id" = Uuid, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Request cancelled", body = serde_json::Value),
        (status = 409, description = "Already terminal", body = crate::errors::ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn cancel_request(
    State(state): State<AppState>,
    actor: ActorIdentity,
    Path(request_id): Path<Uuid>,
    Json(payload): Json<CancelRequestBody>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    actor.require_role(&[ActorRole::Admin])?;
    validate_input(&payload)?;

    let command = CancelRequestCommand {
        request_id,
        reason: payload.reason,
    };

    let result = state
        .services
        .procurement
        .cancel_request(command)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(serde_json::json!({
        "id": result.id,
        "status": result.status,
    })))
}

/// Creates the router for admin endpoints
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/reports", get(list_reports))
        .route("/requests/:id/cancel", post(cancel_request))
}
