//! Admin order management.

use super::{
    AppState,
    auth::AdminUser,
    extract::{AppJson, AppQuery},
};
use crate::{
    core::{
        order::{self, ListOrdersQuery, OrderPage},
        status::OrderStatus,
    },
    errors::Result,
};
use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

/// `GET /api/pagos/numerodepagos`
pub async fn count(State(state): State<AppState>, _admin: AdminUser) -> Result<Json<Value>> {
    let count = order::count_orders(&state.db).await?;
    Ok(Json(json!({ "count": count })))
}

/// `GET /api/pagos/todas`
pub async fn list(
    State(state): State<AppState>,
    _admin: AdminUser,
    AppQuery(query): AppQuery<ListOrdersQuery>,
) -> Result<Json<OrderPage>> {
    Ok(Json(order::list_orders(&state.db, query).await?))
}

/// `POST /api/pagos/todas` - same listing with the parameters in the body.
pub async fn list_from_body(
    State(state): State<AppState>,
    _admin: AdminUser,
    AppJson(query): AppJson<ListOrdersQuery>,
) -> Result<Json<OrderPage>> {
    Ok(Json(order::list_orders(&state.db, query).await?))
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub id: i64,
    pub status: String,
}

/// `POST /api/pagos/actualizar`
pub async fn update_status(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
    AppJson(update): AppJson<StatusUpdate>,
) -> Result<Json<Value>> {
    let status: OrderStatus = update.status.parse()?;
    let transition = order::update_status(&state.db, update.id, status).await?;
    info!(admin = %admin_id, order_id = update.id, status = %status, "Admin status change");
    Ok(Json(json!({ "success": true, "order": transition })))
}
