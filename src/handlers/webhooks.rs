use super::common::{map_service_error, message_response};
use crate::{
    errors::ApiError,
    handlers::AppState,
    services::settlements::{SettlementOutcome, StockReceipt, StockReceiptLine},
};
use axum::{
    extract::{Json, State},
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Inbound webhook payload from the procurement hub.
///
/// Fields are optional at the wire level; presence rules are enforced by
/// the settlement contract so malformed payloads answer 400 instead of a
/// deserialization rejection.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReceiveStockBody {
    pub reference: Option<String>,
    pub details: Option<Vec<ReceiveStockLineBody>>,
    pub status_request: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReceiveStockLineBody {
    pub sku_barcode: String,
    pub qty: i32,
}

/// Receive delivered stock (or a rejection) for a PENDING purchase request
#[utoipa::path(
    post,
    path = "/api/webhook/receive-stock",
    request_body = ReceiveStockBody,
    responses(
        (status = 200, description = "Settlement applied, or replay of an already finalized request"),
        (status = 400, description = "Invalid payload or request not PENDING", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown reference", body = crate::errors::ErrorResponse)
    ),
    tag = "webhooks"
)]
pub async fn receive_stock(
    State(state): State<AppState>,
    Json(payload): Json<ReceiveStockBody>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let reference = payload
        .reference
        .filter(|r| !r.trim().is_empty())
        .ok_or_else(|| ApiError::ValidationError("Invalid payload format".to_string()))?;

    let details = payload
        .details
        .unwrap_or_default()
        .into_iter()
        .map(|line| StockReceiptLine {
            sku_barcode: line.sku_barcode,
            qty: line.qty,
        })
        .collect();

    let receipt = StockReceipt {
        reference,
        details,
        status_request: payload.status_request,
    };

    let outcome = state
        .services
        .settlements
        .settle(receipt)
        .await
        .map_err(map_service_error)?;

    let message = match outcome {
        SettlementOutcome::Completed => "Stock received and updated successfully".to_string(),
        SettlementOutcome::Rejected => "Purchase Request rejected by vendor".to_string(),
        SettlementOutcome::AlreadyFinal(status) => format!(
            "Purchase Request already {}",
            status.to_string().to_lowercase()
        ),
    };

    Ok(message_response(&message))
}

/// Creates the router for webhook endpoints
pub fn webhook_routes() -> Router<AppState> {
    Router::new().route("/receive-stock", post(receive_stock))
}
