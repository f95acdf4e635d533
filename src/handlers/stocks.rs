use super::common::{map_service_error, paginated_response, PaginationMeta};
use crate::{errors::ApiError, handlers::AppState, services::stocks::StockListParams};
use axum::{
    extract::{Query, State},
    routing::get,
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct StockListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub warehouse_id: Option<i64>,
}

/// List stock levels joined with product and warehouse details
#[utoipa::path(
    get,
    path = "/api/stocks",
    params(StockListQuery),
    responses(
        (status = 200, description = "Stock rows listed")
    ),
    tag = "stocks"
)]
pub async fn list_stocks(
    State(state): State<AppState>,
    Query(query): Query<StockListQuery>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(10);

    let params = StockListParams {
        page,
        limit,
        search: query.search,
        sort_by: query.sort_by,
        order: query.order,
        warehouse_id: query.warehouse_id,
    };

    let (rows, total) = state
        .services
        .stocks
        .list(params)
        .await
        .map_err(map_service_error)?;

    Ok(paginated_response(
        rows,
        PaginationMeta::new(page, limit, total),
    ))
}

/// Creates the router for stock endpoints
pub fn stock_routes() -> Router<AppState> {
    Router::new().route("/", get(list_stocks))
}
