use super::common::{map_service_error, paginated_response, PaginationMeta};
use crate::{errors::ApiError, handlers::AppState, services::products::ProductListParams};
use axum::{
    extract::{Query, State},
    routing::get,
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ProductListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub search: Option<String>,
}

/// List catalog products
#[utoipa::path(
    get,
    path = "/api/products",
    params(ProductListQuery),
    responses(
        (status = 200, description = "Products listed")
    ),
    tag = "products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(10);

    let params = ProductListParams {
        page,
        limit,
        search: query.search,
    };

    let (rows, total) = state
        .services
        .products
        .list(params)
        .await
        .map_err(map_service_error)?;

    Ok(paginated_response(
        rows,
        PaginationMeta::new(page, limit, total),
    ))
}

/// Creates the router for product endpoints
pub fn product_routes() -> Router<AppState> {
    Router::new().route("/", get(list_products))
}
