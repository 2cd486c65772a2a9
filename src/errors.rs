//! Unified error type for the checkout service.
//!
//! Business failures carry structured fields so the HTTP layer can map them
//! to status codes without string matching.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Malformed payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed form payload: {0}")]
    Form(#[from] serde_urlencoded::de::Error),

    #[error("Malformed request: {details}")]
    MalformedRequest { details: String },

    #[error("Query string encoding error: {0}")]
    FormEncode(#[from] serde_urlencoded::ser::Error),

    #[error("Invalid amount: {amount}")]
    InvalidAmount { amount: f64 },

    #[error("Invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: i64, quantity: i64 },

    #[error("Order has no items")]
    EmptyOrder,

    #[error("Amount mismatch: expected {expected:.2}, received {received:.2}")]
    AmountMismatch { expected: f64, received: f64 },

    #[error("Insufficient funds: balance {current:.2}, required {required:.2}")]
    InsufficientFunds { current: f64, required: f64 },

    #[error("Insufficient stock for {product}")]
    InsufficientStock { product: String },

    #[error("Incomplete delivery information: missing {field}")]
    IncompleteDeliveryInfo { field: &'static str },

    #[error("Incomplete confirmation data: missing {field}")]
    IncompleteConfirmation { field: &'static str },

    #[error("Invalid order status: {value}")]
    InvalidStatus { value: String },

    #[error("Invalid order id: {value}")]
    InvalidOrderId { value: String },

    #[error("User not found: {clerk_id}")]
    UserNotFound { clerk_id: String },

    #[error("Product not found: {id}")]
    ProductNotFound { id: String },

    #[error("Order not found: {reference}")]
    OrderNotFound { reference: String },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
