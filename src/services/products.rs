use crate::{db::DbPool, entities::product, errors::ServiceError};
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter,
    QuerySelect,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;

/// Query options for the product listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductListParams {
    pub page: u64,
    pub limit: u64,
    pub search: Option<String>,
}

/// Catalog row exposed by the listing endpoint.
#[derive(Debug, Serialize, FromQueryResult, ToSchema)]
pub struct ProductRow {
    pub id: i64,
    pub name: String,
    pub sku: String,
}

/// Read-only product catalog lookups.
#[derive(Clone)]
pub struct ProductService {
    db: Arc<DbPool>,
}

impl ProductService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Lists products with pagination and optional search over name/SKU.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        params: ProductListParams,
    ) -> Result<(Vec<ProductRow>, u64), ServiceError> {
        let db = &*self.db;
        let page = params.page.max(1);
        let limit = params.limit.clamp(1, 100);

        let mut query = product::Entity::find()
            .select_only()
            .column(product::Column::Id)
            .column(product::Column::Name)
            .column(product::Column::Sku);

        if let Some(search) = params.search.as_deref().filter(|s| !s.trim().is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(product::Column::Name.contains(search))
                    .add(product::Column::Sku.contains(search)),
            );
        }

        let paginator = query.into_model::<ProductRow>().paginate(db, limit);
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page - 1).await?;

        Ok((rows, total))
    }
}
