use crate::{
    db::DbPool,
    entities::{
        product, purchase_request, purchase_request_item,
        purchase_request::PurchaseRequestStatus,
        warehouse,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    hub::{HubGateway, PurchaseSubmission, PurchaseSubmissionLine},
};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, SqlErr,
    TransactionTrait,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

static REFERENCE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"PR(\d+)").expect("reference pattern is valid"));

/// Computes the next sequential reference from the most recently created
/// request's reference (by creation order, not lexical order).
pub fn next_reference(latest: Option<&str>) -> String {
    if let Some(reference) = latest {
        if let Some(captures) = REFERENCE_PATTERN.captures(reference) {
            if let Ok(last_number) = captures[1].parse::<u64>() {
                return format!("PR{:05}", last_number + 1);
            }
        }
    }
    "PR00001".to_string()
}

/// New purchase request input.
#[derive(Debug, Clone)]
pub struct CreatePurchaseRequest {
    pub reference: Option<String>,
    pub warehouse_id: i64,
    pub items: Vec<PurchaseRequestItemInput>,
}

/// DRAFT edit input. A `Some` item list replaces all existing lines;
/// `status` may only request DRAFT (no-op) or PENDING.
#[derive(Debug, Clone)]
pub struct UpdatePurchaseRequest {
    pub reference: Option<String>,
    pub warehouse_id: Option<i64>,
    pub items: Option<Vec<PurchaseRequestItemInput>>,
    pub status: Option<PurchaseRequestStatus>,
}

#[derive(Debug, Clone)]
pub struct PurchaseRequestItemInput {
    pub product_id: i64,
    pub quantity: i32,
}

/// List row decorated with the configured vendor and the summed quantity.
#[derive(Debug, Serialize, ToSchema)]
pub struct PurchaseRequestSummary {
    pub id: i64,
    pub reference: String,
    pub warehouse_id: i64,
    pub warehouse_name: Option<String>,
    pub status: PurchaseRequestStatus,
    pub vendor: String,
    pub qty_total: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Full aggregate view with joined warehouse and product details.
#[derive(Debug, Serialize, ToSchema)]
pub struct PurchaseRequestDetail {
    pub id: i64,
    pub reference: String,
    pub status: PurchaseRequestStatus,
    pub warehouse: Option<WarehouseRef>,
    pub items: Vec<PurchaseRequestItemDetail>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WarehouseRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PurchaseRequestItemDetail {
    pub id: i64,
    pub product_id: i64,
    pub quantity: i32,
    pub product: Option<ProductRef>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductRef {
    pub id: i64,
    pub name: String,
    pub sku: String,
}

/// Owns the purchase request lifecycle: creation with reference allocation,
/// DRAFT edits, the DRAFT -> PENDING transition with its outbound hub
/// notification, and DRAFT deletion.
#[derive(Clone)]
pub struct PurchaseRequestService {
    db: Arc<DbPool>,
    event_sender: EventSender,
    hub: Option<Arc<dyn HubGateway>>,
    vendor_name: String,
}

impl PurchaseRequestService {
    pub fn new(
        db: Arc<DbPool>,
        event_sender: EventSender,
        hub: Option<Arc<dyn HubGateway>>,
        vendor_name: String,
    ) -> Self {
        Self {
            db,
            event_sender,
            hub,
            vendor_name,
        }
    }

    /// Creates a new DRAFT purchase request, allocating a sequential
    /// reference when the caller does not supply one. Header and lines are
    /// persisted in one transaction; a reference race surfaces as a
    /// conflict, not a retry.
    #[instrument(skip(self, input), fields(warehouse_id = input.warehouse_id))]
    pub async fn create(
        &self,
        input: CreatePurchaseRequest,
    ) -> Result<purchase_request::Model, ServiceError> {
        let db = &*self.db;
        let now = Utc::now();

        let txn = db.begin().await?;

        let reference = match input.reference {
            Some(reference) => reference,
            None => {
                // Read-then-write inside the insert transaction; see
                // next_reference for the numbering contract.
                let latest = purchase_request::Entity::find()
                    .order_by_desc(purchase_request::Column::Id)
                    .one(&txn)
                    .await?;
                next_reference(latest.as_ref().map(|m| m.reference.as_str()))
            }
        };

        let header = purchase_request::ActiveModel {
            reference: Set(reference.clone()),
            warehouse_id: Set(input.warehouse_id),
            status: Set(PurchaseRequestStatus::Draft),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let header = header
            .insert(&txn)
            .await
            .map_err(|e| map_reference_conflict(e, &reference))?;

        if !input.items.is_empty() {
            let rows = input
                .items
                .iter()
                .map(|item| purchase_request_item::ActiveModel {
                    purchase_request_id: Set(header.id),
                    product_id: Set(item.product_id),
                    quantity: Set(item.quantity),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                });
            purchase_request_item::Entity::insert_many(rows)
                .exec(&txn)
                .await?;
        }

        txn.commit().await?;

        info!(id = header.id, reference = %header.reference, "Purchase request created");
        self.emit(Event::PurchaseRequestCreated {
            id: header.id,
            reference: header.reference.clone(),
        })
        .await;

        Ok(header)
    }

    /// Updates a DRAFT request, optionally transitioning it to PENDING.
    ///
    /// The PENDING transition notifies the hub synchronously before the
    /// status change is persisted; any hub failure aborts the whole update
    /// and the request stays DRAFT. A supplied item list replaces all
    /// existing lines.
    #[instrument(skip(self, input), fields(id))]
    pub async fn update(&self, id: i64, input: UpdatePurchaseRequest) -> Result<(), ServiceError> {
        let db = &*self.db;
        let now = Utc::now();

        let txn = db.begin().await?;

        let header = purchase_request::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Purchase Request not found".to_string()))?;

        if header.status != PurchaseRequestStatus::Draft {
            return Err(ServiceError::InvalidOperation(format!(
                "Cannot update Purchase Request with status {}. Only DRAFT can be updated.",
                header.status
            )));
        }

        let target_status = match input.status {
            None | Some(PurchaseRequestStatus::Draft) => None,
            Some(PurchaseRequestStatus::Pending) => Some(PurchaseRequestStatus::Pending),
            Some(other) => {
                return Err(ServiceError::ValidationError(format!(
                    "Cannot transition a DRAFT Purchase Request directly to {}",
                    other
                )));
            }
        };

        let submitting = target_status == Some(PurchaseRequestStatus::Pending);
        if submitting {
            let submission = self.build_submission(&txn, &header).await?;
            let hub = self.hub.as_ref().ok_or_else(|| {
                ServiceError::MissingConfiguration(
                    "HUB_API_URL or HUB_SECRET_KEY is not configured".to_string(),
                )
            })?;
            // Blocking call made before commit; a failure here rolls the
            // whole update back and the request remains DRAFT.
            hub.submit_purchase(&submission).await?;
        }

        let reference = input.reference.clone().unwrap_or(header.reference.clone());
        let mut active: purchase_request::ActiveModel = header.clone().into();
        if let Some(new_reference) = input.reference {
            active.reference = Set(new_reference);
        }
        if let Some(new_warehouse) = input.warehouse_id {
            active.warehouse_id = Set(new_warehouse);
        }
        if let Some(status) = target_status {
            active.status = Set(status);
        }
        active.updated_at = Set(now);
        active
            .update(&txn)
            .await
            .map_err(|e| map_reference_conflict(e, &reference))?;

        if let Some(items) = input.items {
            purchase_request_item::Entity::delete_many()
                .filter(purchase_request_item::Column::PurchaseRequestId.eq(id))
                .exec(&txn)
                .await?;

            if !items.is_empty() {
                let rows = items
                    .iter()
                    .map(|item| purchase_request_item::ActiveModel {
                        purchase_request_id: Set(id),
                        product_id: Set(item.product_id),
                        quantity: Set(item.quantity),
                        created_at: Set(now),
                        updated_at: Set(now),
                        ..Default::default()
                    });
                purchase_request_item::Entity::insert_many(rows)
                    .exec(&txn)
                    .await?;
            }
        }

        txn.commit().await?;

        if submitting {
            info!(id, reference = %reference, "Purchase request submitted to hub");
            self.emit(Event::PurchaseRequestSubmitted { id, reference })
                .await;
        } else {
            info!(id, reference = %reference, "Purchase request updated");
        }

        Ok(())
    }

    /// Deletes a DRAFT request together with its lines.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        let db = &*self.db;

        let txn = db.begin().await?;

        let header = purchase_request::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Purchase Request not found".to_string()))?;

        if header.status != PurchaseRequestStatus::Draft {
            return Err(ServiceError::InvalidOperation(
                "Cannot delete Purchase Request. Only DRAFT can be deleted.".to_string(),
            ));
        }

        purchase_request_item::Entity::delete_many()
            .filter(purchase_request_item::Column::PurchaseRequestId.eq(id))
            .exec(&txn)
            .await?;
        purchase_request::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;

        info!(id, reference = %header.reference, "Purchase request deleted");
        self.emit(Event::PurchaseRequestDeleted {
            id,
            reference: header.reference,
        })
        .await;

        Ok(())
    }

    /// Fetches the full aggregate with warehouse and product details.
    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<PurchaseRequestDetail, ServiceError> {
        let db = &*self.db;

        let (header, warehouse) = purchase_request::Entity::find_by_id(id)
            .find_also_related(warehouse::Entity)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Purchase Request not found".to_string()))?;

        let items = purchase_request_item::Entity::find()
            .filter(purchase_request_item::Column::PurchaseRequestId.eq(id))
            .find_also_related(product::Entity)
            .all(db)
            .await?;

        Ok(PurchaseRequestDetail {
            id: header.id,
            reference: header.reference,
            status: header.status,
            warehouse: warehouse.map(|w| WarehouseRef {
                id: w.id,
                name: w.name,
            }),
            items: items
                .into_iter()
                .map(|(item, product)| PurchaseRequestItemDetail {
                    id: item.id,
                    product_id: item.product_id,
                    quantity: item.quantity,
                    product: product.map(|p| ProductRef {
                        id: p.id,
                        name: p.name,
                        sku: p.sku,
                    }),
                })
                .collect(),
            created_at: header.created_at,
            updated_at: header.updated_at,
        })
    }

    /// Lists all requests, newest first, decorated with the vendor name and
    /// the summed line quantity.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<PurchaseRequestSummary>, ServiceError> {
        let db = &*self.db;

        let requests = purchase_request::Entity::find()
            .order_by_desc(purchase_request::Column::CreatedAt)
            .find_with_related(purchase_request_item::Entity)
            .all(db)
            .await?;

        let warehouse_names: HashMap<i64, String> = warehouse::Entity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|w| (w.id, w.name))
            .collect();

        Ok(requests
            .into_iter()
            .map(|(header, items)| PurchaseRequestSummary {
                id: header.id,
                reference: header.reference,
                warehouse_name: warehouse_names.get(&header.warehouse_id).cloned(),
                warehouse_id: header.warehouse_id,
                status: header.status,
                vendor: self.vendor_name.clone(),
                qty_total: items.iter().map(|item| item.quantity as i64).sum(),
                created_at: header.created_at,
                updated_at: header.updated_at,
            })
            .collect())
    }

    /// Builds the hub submission payload from the request's current lines.
    async fn build_submission(
        &self,
        txn: &sea_orm::DatabaseTransaction,
        header: &purchase_request::Model,
    ) -> Result<PurchaseSubmission, ServiceError> {
        let lines = purchase_request_item::Entity::find()
            .filter(purchase_request_item::Column::PurchaseRequestId.eq(header.id))
            .find_also_related(product::Entity)
            .all(txn)
            .await?;

        let mut details = Vec::with_capacity(lines.len());
        let mut qty_total: i64 = 0;
        for (item, product) in lines {
            let product = product.ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "product {} missing for purchase request item {}",
                    item.product_id, item.id
                ))
            })?;
            qty_total += item.quantity as i64;
            details.push(PurchaseSubmissionLine {
                product_name: product.name,
                sku_barcode: product.sku,
                qty: item.quantity,
            });
        }

        Ok(PurchaseSubmission {
            vendor: self.vendor_name.clone(),
            reference: header.reference.clone(),
            qty_total,
            details,
        })
    }

    async fn emit(&self, event: Event) {
        if let Err(e) = self.event_sender.send(event).await {
            warn!(error = %e, "Failed to send purchase request event");
        }
    }
}

fn map_reference_conflict(err: sea_orm::DbErr, reference: &str) -> ServiceError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => ServiceError::Conflict(format!(
            "Purchase Request reference {} already exists",
            reference
        )),
        _ => ServiceError::DatabaseError(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_reference_without_predecessor() {
        assert_eq!(next_reference(None), "PR00001");
    }

    #[test]
    fn increments_numeric_suffix_with_padding() {
        assert_eq!(next_reference(Some("PR00001")), "PR00002");
        assert_eq!(next_reference(Some("PR00042")), "PR00043");
        assert_eq!(next_reference(Some("PR09999")), "PR10000");
    }

    #[test]
    fn grows_past_five_digits_without_truncation() {
        assert_eq!(next_reference(Some("PR99999")), "PR100000");
        assert_eq!(next_reference(Some("PR100000")), "PR100001");
    }

    #[test]
    fn malformed_reference_restarts_numbering() {
        assert_eq!(next_reference(Some("PO-77")), "PR00001");
        assert_eq!(next_reference(Some("")), "PR00001");
        assert_eq!(next_reference(Some("PRX")), "PR00001");
    }
}
