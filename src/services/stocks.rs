use crate::{
    db::DbPool,
    entities::{product, stock, warehouse},
    errors::ServiceError,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, FromQueryResult, JoinType, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;

/// Query options for the stock listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StockListParams {
    pub page: u64,
    pub limit: u64,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub warehouse_id: Option<i64>,
}

/// Stock row joined with product and warehouse names.
#[derive(Debug, Serialize, FromQueryResult, ToSchema)]
pub struct StockRow {
    pub id: i64,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub product_id: i64,
    pub product_name: String,
    pub product_sku: String,
    pub warehouse_id: i64,
    pub warehouse_name: String,
}

/// Read model over the stock ledger. Listing only; all mutation goes
/// through the settlement transaction.
#[derive(Clone)]
pub struct StockService {
    db: Arc<DbPool>,
}

impl StockService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Lists stock rows with pagination, optional warehouse filter, search
    /// over product name/SKU, and sorting by stock or joined columns.
    #[instrument(skip(self))]
    pub async fn list(&self, params: StockListParams) -> Result<(Vec<StockRow>, u64), ServiceError> {
        let db = &*self.db;
        let page = params.page.max(1);
        let limit = params.limit.clamp(1, 100);

        let mut query = stock::Entity::find()
            .join(JoinType::InnerJoin, stock::Relation::Product.def())
            .join(JoinType::InnerJoin, stock::Relation::Warehouse.def())
            .select_only()
            .column(stock::Column::Id)
            .column(stock::Column::Quantity)
            .column(stock::Column::CreatedAt)
            .column_as(product::Column::Id, "product_id")
            .column_as(product::Column::Name, "product_name")
            .column_as(product::Column::Sku, "product_sku")
            .column_as(warehouse::Column::Id, "warehouse_id")
            .column_as(warehouse::Column::Name, "warehouse_name");

        if let Some(warehouse_id) = params.warehouse_id {
            query = query.filter(stock::Column::WarehouseId.eq(warehouse_id));
        }

        if let Some(search) = params.search.as_deref().filter(|s| !s.trim().is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(product::Column::Name.contains(search))
                    .add(product::Column::Sku.contains(search)),
            );
        }

        let order = match params.order.as_deref() {
            Some(value) if value.eq_ignore_ascii_case("desc") => Order::Desc,
            _ => Order::Asc,
        };
        query = match params.sort_by.as_deref() {
            Some("quantity") => query.order_by(stock::Column::Quantity, order),
            Some("created_at") => query.order_by(stock::Column::CreatedAt, order),
            Some("product_name") => query.order_by(product::Column::Name, order),
            Some("warehouse_name") => query.order_by(warehouse::Column::Name, order),
            _ => query.order_by(stock::Column::Id, order),
        };

        let paginator = query.into_model::<StockRow>().paginate(db, limit);
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page - 1).await?;

        Ok((rows, total))
    }
}
