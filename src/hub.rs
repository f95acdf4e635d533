//! Outbound client for the external procurement hub.
//!
//! The hub receives purchase submissions when a request transitions to
//! PENDING and later answers asynchronously through the inbound
//! `/webhook/receive-stock` endpoint.

use crate::config::AppConfig;
use crate::errors::ServiceError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};
use utoipa::ToSchema;

/// Payload posted to `{HUB_API_URL}/api/request/purchase`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PurchaseSubmission {
    pub vendor: String,
    pub reference: String,
    pub qty_total: i64,
    pub details: Vec<PurchaseSubmissionLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PurchaseSubmissionLine {
    pub product_name: String,
    pub sku_barcode: String,
    pub qty: i32,
}

/// Outbound contract of the procurement hub.
///
/// The lifecycle service calls this synchronously inside the PENDING
/// transition; implementations must bound their own timeout so the holding
/// transaction cannot block indefinitely.
#[async_trait]
pub trait HubGateway: Send + Sync {
    async fn submit_purchase(&self, submission: &PurchaseSubmission) -> Result<(), ServiceError>;
}

/// reqwest-based hub client authenticated with a shared secret header.
pub struct HttpHubGateway {
    client: reqwest::Client,
    base_url: String,
    secret_key: String,
}

impl HttpHubGateway {
    pub fn new(
        base_url: String,
        secret_key: String,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::InternalError(format!("HTTP client build failed: {e}")))?;
        Ok(Self {
            client,
            base_url,
            secret_key,
        })
    }

    /// Builds a gateway from configuration; `None` when the hub settings
    /// are absent, in which case the PENDING transition fails with a
    /// missing-configuration error.
    pub fn from_config(cfg: &AppConfig) -> Result<Option<Arc<dyn HubGateway>>, ServiceError> {
        match (cfg.hub_api_url.clone(), cfg.hub_secret_key.clone()) {
            (Some(url), Some(key)) => {
                let gateway =
                    Self::new(url, key, Duration::from_secs(cfg.hub_timeout_secs))?;
                Ok(Some(Arc::new(gateway)))
            }
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl HubGateway for HttpHubGateway {
    #[instrument(skip(self, submission), fields(reference = %submission.reference))]
    async fn submit_purchase(&self, submission: &PurchaseSubmission) -> Result<(), ServiceError> {
        let url = format!(
            "{}/api/request/purchase",
            self.base_url.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .header("secret-key", &self.secret_key)
            .json(submission)
            .send()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::ExternalServiceError(format!(
                "hub responded with status {}: {}",
                status, body
            )));
        }

        info!(
            qty_total = submission.qty_total,
            lines = submission.details.len(),
            "Purchase submission accepted by hub"
        );
        Ok(())
    }
}
