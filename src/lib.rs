//! Warehub API Library
//!
//! Warehouse inventory and purchase request management with hub-driven
//! stock settlement.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod hub;
pub mod migrator;
pub mod openapi;
pub mod services;

use axum::Router;
use std::sync::Arc;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<db::DbPool>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

/// API routes mounted under /api.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest(
            "/purchase/request",
            handlers::purchase_requests::purchase_request_routes(),
        )
        .nest("/webhook", handlers::webhooks::webhook_routes())
        .nest("/stocks", handlers::stocks::stock_routes())
        .nest("/products", handlers::products::product_routes())
}

/// Builds the full application router over the given state. Shared by the
/// binary and the integration tests.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .nest("/health", handlers::health::health_routes())
        .with_state(state)
}
