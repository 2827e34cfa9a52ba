use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "supplyline-api",
        description = "Procurement and dispatch lifecycle engine for franchise supply networks"
    ),
    paths(
        crate::handlers::requests::get_request,
        crate::handlers::franchise::create_request,
        crate::handlers::franchise::list_requests,
        crate::handlers::franchise::approve_request,
        crate::handlers::franchise::reject_request,
        crate::handlers::franchise::record_receipt,
        crate::handlers::franchise::generate_grn,
        crate::handlers::vendor::submit_quotation,
        crate::handlers::vendor::active_dispatch,
        crate::handlers::vendor::my_assignments,
        crate::handlers::vendor::begin_packing,
        crate::handlers::vendor::record_packing_check,
        crate::handlers::vendor::record_weight,
        crate::handlers::vendor::dispatch_request,
        crate::handlers::vendor::generate_challan,
        crate::handlers::vendor::generate_invoice,
        crate::handlers::vendor::generate_bilty,
        crate::handlers::admin::list_reports,
        crate::handlers::admin::cancel_request,
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        crate::handlers::requests::RequestView,
        crate::handlers::requests::LineItemView,
        crate::handlers::franchise::CreateRequestBody,
        crate::handlers::franchise::NewItemBody,
        crate::handlers::franchise::RejectRequestBody,
        crate::handlers::franchise::ReceiptBody,
        crate::handlers::franchise::ReceiptItemBody,
        crate::handlers::vendor::QuoteBody,
        crate::handlers::vendor::QuoteItemBody,
        crate::handlers::vendor::PackingCheckBody,
        crate::handlers::vendor::WeightBody,
        crate::handlers::vendor::BiltyBody,
        crate::handlers::admin::CancelRequestBody,
        crate::services::reports::ProcurementReport,
        crate::services::reports::ReportRow,
        crate::services::reports::ReportItem,
        crate::services::reports::ReportInvoice,
        crate::services::reports::ReportTotals,
        crate::services::reports::DateRange,
    )),
    tags(
        (name = "procurement", description = "Shared request views"),
        (name = "franchise", description = "Requesting node operations"),
        (name = "vendor", description = "Supplying vendor operations"),
        (name = "admin", description = "Administrative operations and audit reports"),
    )
)]
pub struct ApiDoc;

/// Swagger UI mounted at /docs, serving the generated document.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
