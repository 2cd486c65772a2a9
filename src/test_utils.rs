//! Shared test utilities for the checkout service.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    config::AppConfig,
    core::{
        order::{self, CartItem, CheckoutRequest, CreatedOrder, DeliveryInfo},
        product, user,
    },
    entities,
    errors::Result,
};
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Configuration used across tests.
///
/// # Defaults
/// * public base URL `https://tienda.co`
/// * one admin, `admin_1`
/// * 19% tax, COP
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.server.public_base_url = "https://tienda.co".to_string();
    config.server.admin_user_ids = vec!["admin_1".to_string()];
    config.payments.epayco_public_key = "pk_test".to_string();
    config
}

/// Creates a catalog product.
pub async fn create_test_product(
    db: &DatabaseConnection,
    name: &str,
    price: f64,
    quantity: i64,
) -> Result<entities::product::Model> {
    product::create_product(db, name.to_string(), price, quantity).await
}

/// Creates a user with a wallet balance.
///
/// # Defaults
/// * name: "Ana Gómez"
/// * email: `<clerk_id>@example.co`
pub async fn create_test_user(
    db: &DatabaseConnection,
    clerk_id: &str,
    balance: f64,
) -> Result<entities::user::Model> {
    user::create_user(
        db,
        clerk_id.to_string(),
        "Ana".to_string(),
        "Gómez".to_string(),
        format!("{clerk_id}@example.co"),
        balance,
    )
    .await
}

/// A cart line with no variant details.
pub fn cart_item(product_id: i64, quantity: i64) -> CartItem {
    CartItem {
        id: product_id,
        quantity,
        image: None,
        color: None,
        size: None,
        size_range: None,
    }
}

/// Complete delivery details.
pub fn sample_delivery_info() -> DeliveryInfo {
    DeliveryInfo {
        email: Some("ana@example.co".to_string()),
        name: Some("Ana Gómez".to_string()),
        address: Some("Calle 10 # 5-20".to_string()),
        city: Some("Medellín".to_string()),
        phone: Some("3001234567".to_string()),
        document_type: Some("CC".to_string()),
        document: Some("1020304050".to_string()),
    }
}

/// Creates a `PENDING` gateway order for a single product.
pub async fn create_test_gateway_order(
    db: &DatabaseConnection,
    config: &AppConfig,
    clerk_id: &str,
    product_id: i64,
    quantity: i64,
) -> Result<CreatedOrder> {
    order::create_gateway_order(
        db,
        config,
        clerk_id,
        CheckoutRequest {
            items: vec![cart_item(product_id, quantity)],
            delivery_info: sample_delivery_info(),
            tip: 0.0,
            total: None,
        },
    )
    .await
}

/// An unsaved order row: one item at 100.00 plus 19% tax.
pub fn sample_order_model() -> entities::order::Model {
    let now = chrono::Utc::now();
    entities::order::Model {
        id: 1,
        reference_code: "ORD-1700000000000-ABCD1234".to_string(),
        clerk_id: "user_ana".to_string(),
        payment_method: "epayco".to_string(),
        amount: 119.0,
        tax: 19.0,
        tax_base: 100.0,
        tip: 0.0,
        currency: "COP".to_string(),
        status: "PENDING".to_string(),
        transaction_id: None,
        ref_payco: None,
        processing_date: None,
        buyer_email: "ana@example.co".to_string(),
        buyer_name: "Ana Gómez".to_string(),
        shipping_address: "Calle 10 # 5-20".to_string(),
        shipping_city: "Medellín".to_string(),
        shipping_country: "Colombia".to_string(),
        phone: "3001234567".to_string(),
        document_type: "CC".to_string(),
        document_number: "1020304050".to_string(),
        created_at: now,
        updated_at: now,
    }
}
