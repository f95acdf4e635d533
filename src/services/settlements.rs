use crate::{
    db::DbPool,
    entities::{
        product, purchase_request, purchase_request::PurchaseRequestStatus, stock,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Rejection signal carried in the webhook's `status_request` field.
pub const REQUEST_REJECTED: &str = "REQUEST_REJECTED";

/// Inbound webhook payload after handler-level validation.
#[derive(Debug, Clone)]
pub struct StockReceipt {
    pub reference: String,
    pub details: Vec<StockReceiptLine>,
    pub status_request: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StockReceiptLine {
    pub sku_barcode: String,
    pub qty: i32,
}

/// Result of applying a settlement, used by the webhook handler to phrase
/// its confirmation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementOutcome {
    /// The request had already reached a terminal state; nothing was
    /// reapplied. Webhook replays land here.
    AlreadyFinal(PurchaseRequestStatus),
    /// The vendor rejected the request; no stock was mutated.
    Rejected,
    /// All delivered quantities were applied and the request completed.
    Completed,
}

/// Applies vendor deliveries to the stock ledger and finalizes the
/// purchase request, as one all-or-nothing transaction.
#[derive(Clone)]
pub struct SettlementService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl SettlementService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Settles a PENDING purchase request from a hub webhook.
    ///
    /// Terminal requests short-circuit to success without reapplying
    /// anything, making retried deliveries safe. Any failure (unknown SKU
    /// included) aborts every stock increment of this call.
    #[instrument(skip(self, receipt), fields(reference = %receipt.reference))]
    pub async fn settle(&self, receipt: StockReceipt) -> Result<SettlementOutcome, ServiceError> {
        let db = &*self.db;
        let now = Utc::now();

        let txn = db.begin().await?;

        let request = purchase_request::Entity::find()
            .filter(purchase_request::Column::Reference.eq(&receipt.reference))
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Purchase Request not found".to_string()))?;

        if request.status.is_terminal() {
            info!(
                id = request.id,
                status = %request.status,
                "Settlement replay for already finalized request; ignoring"
            );
            return Ok(SettlementOutcome::AlreadyFinal(request.status));
        }

        if request.status != PurchaseRequestStatus::Pending {
            return Err(ServiceError::InvalidOperation(
                "Purchase Request is not in PENDING status".to_string(),
            ));
        }

        if receipt.status_request.as_deref() == Some(REQUEST_REJECTED) {
            let request_id = request.id;
            let reference = request.reference.clone();
            finalize_from_pending(&txn, request_id, PurchaseRequestStatus::Rejected, now).await?;
            txn.commit().await?;

            info!(id = request_id, "Purchase request rejected by vendor");
            self.emit(Event::PurchaseRequestRejected {
                id: request_id,
                reference,
            })
            .await;
            return Ok(SettlementOutcome::Rejected);
        }

        if receipt.details.is_empty() {
            return Err(ServiceError::ValidationError(
                "Invalid payload format - details required".to_string(),
            ));
        }

        let mut applied: Vec<(i64, i32)> = Vec::with_capacity(receipt.details.len());
        for line in &receipt.details {
            // The stock ledger only ever grows through settlement; a
            // non-positive delivered quantity is a malformed payload.
            if line.qty < 1 {
                return Err(ServiceError::ValidationError(format!(
                    "Invalid qty {} for SKU {} - qty must be positive",
                    line.qty, line.sku_barcode
                )));
            }

            let product = product::Entity::find()
                .filter(product::Column::Sku.eq(&line.sku_barcode))
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::ValidationError(format!(
                        "Product with SKU {} not found",
                        line.sku_barcode
                    ))
                })?;

            let stock_id = match stock::Entity::find()
                .filter(stock::Column::WarehouseId.eq(request.warehouse_id))
                .filter(stock::Column::ProductId.eq(product.id))
                .one(&txn)
                .await?
            {
                Some(existing) => existing.id,
                None => {
                    let created = stock::ActiveModel {
                        warehouse_id: Set(request.warehouse_id),
                        product_id: Set(product.id),
                        quantity: Set(0),
                        created_at: Set(now),
                        updated_at: Set(now),
                        ..Default::default()
                    }
                    .insert(&txn)
                    .await?;
                    created.id
                }
            };

            // SQL-level increment; never read-modify-write in the
            // application, so concurrent settlements for different
            // references cannot lose updates.
            stock::Entity::update_many()
                .col_expr(
                    stock::Column::Quantity,
                    Expr::col(stock::Column::Quantity).add(line.qty),
                )
                .col_expr(stock::Column::UpdatedAt, Expr::value(now))
                .filter(stock::Column::Id.eq(stock_id))
                .exec(&txn)
                .await?;

            applied.push((product.id, line.qty));
        }

        let request_id = request.id;
        let reference = request.reference.clone();
        let warehouse_id = request.warehouse_id;
        finalize_from_pending(&txn, request_id, PurchaseRequestStatus::Completed, now).await?;

        txn.commit().await?;

        info!(
            id = request_id,
            lines = applied.len(),
            "Stock received and purchase request completed"
        );
        for (product_id, quantity) in applied {
            self.emit(Event::StockReceived {
                warehouse_id,
                product_id,
                quantity,
            })
            .await;
        }
        self.emit(Event::PurchaseRequestCompleted {
            id: request_id,
            reference,
        })
        .await;

        Ok(SettlementOutcome::Completed)
    }

    async fn emit(&self, event: Event) {
        if let Err(e) = self.event_sender.send(event).await {
            warn!(error = %e, "Failed to send settlement event");
        }
    }
}

/// Flips a PENDING request to the given terminal status with a
/// status-guarded update. Zero rows affected means another settlement won
/// the race after our read; surfacing the conflict rolls the caller's
/// transaction (stock increments included) back.
async fn finalize_from_pending(
    txn: &DatabaseTransaction,
    request_id: i64,
    status: PurchaseRequestStatus,
    now: DateTime<Utc>,
) -> Result<(), ServiceError> {
    let result = purchase_request::Entity::update_many()
        .col_expr(purchase_request::Column::Status, Expr::value(status))
        .col_expr(purchase_request::Column::UpdatedAt, Expr::value(now))
        .filter(purchase_request::Column::Id.eq(request_id))
        .filter(purchase_request::Column::Status.eq(PurchaseRequestStatus::Pending))
        .exec(txn)
        .await?;

    if result.rows_affected == 0 {
        return Err(ServiceError::Conflict(
            "Purchase Request was settled concurrently".to_string(),
        ));
    }

    Ok(())
}
