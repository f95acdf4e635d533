pub mod common;
pub mod health;
pub mod products;
pub mod purchase_requests;
pub mod stocks;
pub mod webhooks;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::errors::ServiceError;
use crate::events::EventSender;
use crate::hub::HttpHubGateway;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub purchase_requests: Arc<crate::services::purchase_requests::PurchaseRequestService>,
    pub settlements: Arc<crate::services::settlements::SettlementService>,
    pub stocks: Arc<crate::services::stocks::StockService>,
    pub products: Arc<crate::services::products::ProductService>,
}

impl AppServices {
    /// Builds the service container, wiring the hub gateway from
    /// configuration when present.
    pub fn new(
        db: Arc<DbPool>,
        event_sender: EventSender,
        config: &AppConfig,
    ) -> Result<Self, ServiceError> {
        let hub = HttpHubGateway::from_config(config)?;

        let purchase_requests = Arc::new(
            crate::services::purchase_requests::PurchaseRequestService::new(
                db.clone(),
                event_sender.clone(),
                hub,
                config.vendor_name.clone(),
            ),
        );
        let settlements = Arc::new(crate::services::settlements::SettlementService::new(
            db.clone(),
            event_sender,
        ));
        let stocks = Arc::new(crate::services::stocks::StockService::new(db.clone()));
        let products = Arc::new(crate::services::products::ProductService::new(db));

        Ok(Self {
            purchase_requests,
            settlements,
            stocks,
            products,
        })
    }
}
