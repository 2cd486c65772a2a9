//! HTTP surface of the service.
//!
//! Handlers are thin: they extract the caller and the payload, call into
//! [`crate::core`] and serialize the result. Errors are turned into JSON
//! responses by the `IntoResponse` impl in [`error`].

use crate::config::AppConfig;
use axum::{
    Json, Router,
    http::{Method, header::CONTENT_TYPE},
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use std::{sync::Arc, time::Duration};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Admin order management
pub mod admin;
/// Identity extractors
pub mod auth;
/// Error to response mapping
pub mod error;
/// Body and query extractors
pub mod extract;
/// Gateway callbacks
pub mod gateway;
/// Catalog and buyer order endpoints
pub mod orders;
/// Wallet endpoints
pub mod wallet;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    #[must_use]
    pub fn new(db: DatabaseConnection, config: AppConfig) -> Self {
        Self {
            db: Arc::new(db),
            config: Arc::new(config),
        }
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, state.config.server.identity_header_name()])
        .max_age(Duration::from_secs(60 * 60));

    let confirmation_path = state.config.payments.confirmation_path.clone();
    let response_path = state.config.payments.response_path.clone();
    Router::new()
        .route("/health", get(health))
        .route("/api/products", get(orders::products))
        .route("/api/balance", get(wallet::balance).post(wallet::balance))
        .route("/api/user/saldo", get(wallet::balance))
        .route("/api/balance/transactions", get(wallet::transactions))
        .route("/api/balance/topup", post(wallet::top_up))
        .route("/api/pagos", post(orders::pay_with_balance))
        .route("/api/pagos/numerodepagos", get(admin::count))
        .route("/api/pagos/todas", get(admin::list).post(admin::list_from_body))
        .route("/api/pagos/actualizar", post(admin::update_status))
        .route("/api/user-orders", get(orders::user_orders))
        .route("/api/epayco/order", post(orders::create_gateway_order))
        .route("/api/epayco/order/:id", get(orders::order_detail))
        .route(&confirmation_path, post(gateway::confirmation))
        .route(
            &response_path,
            get(gateway::landing).post(gateway::response),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
