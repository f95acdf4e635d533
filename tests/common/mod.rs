use axum::{
    body::{self, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use warehub_api::{config::AppConfig, db, events, handlers::AppServices, AppState};

/// Helper harness for spinning up an application backed by an in-memory
/// SQLite database.
pub struct TestApp {
    router: Router,
    #[allow(dead_code)]
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a test application without hub settings; the PENDING
    /// transition is refused in this configuration.
    pub async fn new() -> Self {
        Self::build(None).await
    }

    /// Construct a test application pointed at the given hub endpoint.
    #[allow(dead_code)]
    pub async fn with_hub(hub_api_url: &str, secret_key: &str) -> Self {
        Self::build(Some((hub_api_url.to_string(), secret_key.to_string()))).await
    }

    async fn build(hub: Option<(String, String)>) -> Self {
        let mut cfg = AppConfig::new("sqlite::memory:", "127.0.0.1", 18_080, "test");
        // A single pooled connection keeps the in-memory database alive
        // for the whole test.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        if let Some((url, key)) = hub {
            cfg.hub_api_url = Some(url);
            cfg.hub_secret_key = Some(key);
        }

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_sender, event_rx) = events::channel(64);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let services = AppServices::new(db_arc.clone(), event_sender.clone(), &cfg)
            .expect("failed to build services");

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
        };
        let router = warehub_api::app_router(state.clone());

        Self {
            router,
            state,
            _event_task: event_task,
        }
    }

    /// Issues a request against the in-process router and parses the JSON
    /// response body (Null when the body is empty).
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .expect("request builds"),
            None => builder.body(Body::empty()).expect("request builds"),
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router handles request");
        let status = response.status();
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("response body reads");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("response body is JSON")
        };

        (status, value)
    }
}
