use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::PurchaseRequestStatus;
use crate::errors::ErrorResponse;
use crate::handlers;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Warehub API",
        version = "1.0.0",
        description = r#"
Warehouse inventory and purchase request API.

Purchase requests move through a one-directional lifecycle:
`DRAFT -> PENDING -> COMPLETED | REJECTED`. Submitting a DRAFT to the
procurement hub flips it to PENDING; the hub settles it later via the
`/api/webhook/receive-stock` callback, which applies delivered
quantities to the stock ledger atomically.
        "#
    ),
    paths(
        handlers::purchase_requests::create_purchase_request,
        handlers::purchase_requests::list_purchase_requests,
        handlers::purchase_requests::get_purchase_request,
        handlers::purchase_requests::update_purchase_request,
        handlers::purchase_requests::delete_purchase_request,
        handlers::webhooks::receive_stock,
        handlers::stocks::list_stocks,
        handlers::products::list_products,
    ),
    components(schemas(
        handlers::purchase_requests::CreatePurchaseRequestBody,
        handlers::purchase_requests::UpdatePurchaseRequestBody,
        handlers::purchase_requests::PurchaseRequestItemBody,
        handlers::webhooks::ReceiveStockBody,
        handlers::webhooks::ReceiveStockLineBody,
        services::purchase_requests::PurchaseRequestSummary,
        services::purchase_requests::PurchaseRequestDetail,
        services::purchase_requests::PurchaseRequestItemDetail,
        services::purchase_requests::WarehouseRef,
        services::purchase_requests::ProductRef,
        services::stocks::StockRow,
        services::products::ProductRow,
        PurchaseRequestStatus,
        ErrorResponse,
    )),
    tags(
        (name = "purchase-requests", description = "Purchase request lifecycle"),
        (name = "webhooks", description = "Inbound hub callbacks"),
        (name = "stocks", description = "Stock ledger listings"),
        (name = "products", description = "Product catalog")
    )
)]
pub struct ApiDoc;

/// Mounts Swagger UI at /swagger-ui backed by the generated document.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_builds() {
        let doc = ApiDoc::openapi();
        let json = doc.to_json().expect("openapi serializes");
        assert!(json.contains("/api/purchase/request"));
        assert!(json.contains("/api/webhook/receive-stock"));
    }
}
