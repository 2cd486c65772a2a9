//! Catalog and buyer-facing order endpoints.

use super::{AppState, auth::AuthUser, extract::AppJson};
use crate::{
    core::{
        order::{self, CheckoutRequest, CreatedOrder, OrderDetail},
        product,
        purchase::{self, BalancePurchaseRequest},
    },
    entities::product as product_entity,
    errors::{Error, Result},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::{Value, json};

/// `GET /api/products` - catalog with current stock.
pub async fn products(State(state): State<AppState>) -> Result<Json<Vec<product_entity::Model>>> {
    Ok(Json(product::get_all_products(&state.db).await?))
}

/// `POST /api/pagos` - pay with the wallet balance.
pub async fn pay_with_balance(
    State(state): State<AppState>,
    AuthUser(clerk_id): AuthUser,
    AppJson(request): AppJson<BalancePurchaseRequest>,
) -> Result<Json<Value>> {
    let receipt = purchase::pay_with_balance(&state.db, &state.config, &clerk_id, request).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Payment completed",
        "orderId": receipt.order_id,
        "referenceCode": receipt.reference_code,
        "amount": receipt.amount,
        "newBalance": receipt.new_balance,
    })))
}

/// `POST /api/epayco/order` - create an order to pay through the gateway.
pub async fn create_gateway_order(
    State(state): State<AppState>,
    AuthUser(clerk_id): AuthUser,
    AppJson(request): AppJson<CheckoutRequest>,
) -> Result<(StatusCode, Json<CreatedOrder>)> {
    let created = order::create_gateway_order(&state.db, &state.config, &clerk_id, request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /api/epayco/order/:id`
pub async fn order_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OrderDetail>> {
    let order_id: i64 = id
        .trim()
        .parse()
        .map_err(|_| Error::InvalidOrderId { value: id.clone() })?;
    Ok(Json(order::get_order_detail(&state.db, order_id).await?))
}

/// `GET /api/user-orders`
pub async fn user_orders(
    State(state): State<AppState>,
    AuthUser(clerk_id): AuthUser,
) -> Result<Json<Vec<OrderDetail>>> {
    Ok(Json(order::orders_for_user(&state.db, &clerk_id).await?))
}
