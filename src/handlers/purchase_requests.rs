use super::common::{
    created_response, map_service_error, message_response, success_response, validate_input,
};
use crate::{
    entities::PurchaseRequestStatus,
    errors::ApiError,
    handlers::AppState,
    services::purchase_requests::{
        CreatePurchaseRequest, PurchaseRequestItemInput, UpdatePurchaseRequest,
    },
};
use axum::{
    extract::{Json, Path, State},
    routing::{delete, get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

// Request DTOs

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreatePurchaseRequestBody {
    /// Explicit reference; allocated sequentially when omitted
    pub reference: Option<String>,
    pub warehouse_id: i64,
    #[serde(default)]
    #[validate]
    pub items: Vec<PurchaseRequestItemBody>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct PurchaseRequestItemBody {
    pub product_id: i64,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdatePurchaseRequestBody {
    pub reference: Option<String>,
    pub warehouse_id: Option<i64>,
    /// Replaces all existing lines when present
    #[validate]
    pub items: Option<Vec<PurchaseRequestItemBody>>,
    /// Target status; only DRAFT or PENDING are accepted
    pub status: Option<PurchaseRequestStatus>,
}

impl From<PurchaseRequestItemBody> for PurchaseRequestItemInput {
    fn from(body: PurchaseRequestItemBody) -> Self {
        Self {
            product_id: body.product_id,
            quantity: body.quantity,
        }
    }
}

// Handler functions

/// Create a new purchase request
#[utoipa::path(
    post,
    path = "/api/purchase/request",
    request_body = CreatePurchaseRequestBody,
    responses(
        (status = 201, description = "Purchase request created"),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 409, description = "Duplicate reference", body = crate::errors::ErrorResponse)
    ),
    tag = "purchase-requests"
)]
pub async fn create_purchase_request(
    State(state): State<AppState>,
    Json(payload): Json<CreatePurchaseRequestBody>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let input = CreatePurchaseRequest {
        reference: payload.reference,
        warehouse_id: payload.warehouse_id,
        items: payload.items.into_iter().map(Into::into).collect(),
    };

    let created = state
        .services
        .purchase_requests
        .create(input)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(created))
}

/// List purchase requests, newest first
#[utoipa::path(
    get,
    path = "/api/purchase/request",
    responses(
        (status = 200, description = "Purchase requests listed")
    ),
    tag = "purchase-requests"
)]
pub async fn list_purchase_requests(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let requests = state
        .services
        .purchase_requests
        .list()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(requests))
}

/// Get a purchase request with its items and product details
#[utoipa::path(
    get,
    path = "/api/purchase/request/{id}",
    params(("id" = i64, Path, description = "Purchase request ID")),
    responses(
        (status = 200, description = "Purchase request fetched"),
        (status = 404, description = "Purchase request not found", body = crate::errors::ErrorResponse)
    ),
    tag = "purchase-requests"
)]
pub async fn get_purchase_request(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let detail = state
        .services
        .purchase_requests
        .get(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(detail))
}

/// Update a DRAFT purchase request, optionally submitting it to the hub
#[utoipa::path(
    put,
    path = "/api/purchase/request/{id}",
    request_body = UpdatePurchaseRequestBody,
    params(("id" = i64, Path, description = "Purchase request ID")),
    responses(
        (status = 200, description = "Purchase request updated"),
        (status = 400, description = "Status disallows update or hub call failed", body = crate::errors::ErrorResponse),
        (status = 404, description = "Purchase request not found", body = crate::errors::ErrorResponse)
    ),
    tag = "purchase-requests"
)]
pub async fn update_purchase_request(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdatePurchaseRequestBody>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let input = UpdatePurchaseRequest {
        reference: payload.reference,
        warehouse_id: payload.warehouse_id,
        items: payload
            .items
            .map(|items| items.into_iter().map(Into::into).collect()),
        status: payload.status,
    };

    state
        .services
        .purchase_requests
        .update(id, input)
        .await
        .map_err(map_service_error)?;

    Ok(message_response("Purchase Request updated successfully"))
}

/// Delete a DRAFT purchase request and its items
#[utoipa::path(
    delete,
    path = "/api/purchase/request/{id}",
    params(("id" = i64, Path, description = "Purchase request ID")),
    responses(
        (status = 200, description = "Purchase request deleted"),
        (status = 400, description = "Only DRAFT can be deleted", body = crate::errors::ErrorResponse),
        (status = 404, description = "Purchase request not found", body = crate::errors::ErrorResponse)
    ),
    tag = "purchase-requests"
)]
pub async fn delete_purchase_request(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .purchase_requests
        .delete(id)
        .await
        .map_err(map_service_error)?;

    Ok(message_response("Purchase Request deleted successfully"))
}

/// Creates the router for purchase request endpoints
pub fn purchase_request_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_purchase_request))
        .route("/", get(list_purchase_requests))
        .route("/:id", get(get_purchase_request))
        .route("/:id", put(update_purchase_request))
        .route("/:id", delete(delete_purchase_request))
}
