//! Wallet endpoints: balance, ledger and admin top-ups.

use super::{
    AppState,
    auth::{AdminUser, AuthUser},
    extract::AppJson,
};
use crate::{
    core::user::{self, WalletCredit},
    entities::transaction,
    errors::Result,
};
use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};

/// `GET|POST /api/balance`, `GET /api/user/saldo`
pub async fn balance(
    State(state): State<AppState>,
    AuthUser(clerk_id): AuthUser,
) -> Result<Json<Value>> {
    let saldo = user::get_balance(&state.db, &clerk_id).await?;
    Ok(Json(json!({ "saldo": saldo })))
}

/// `GET /api/balance/transactions`
pub async fn transactions(
    State(state): State<AppState>,
    AuthUser(clerk_id): AuthUser,
) -> Result<Json<Vec<transaction::Model>>> {
    Ok(Json(user::list_wallet_transactions(&state.db, &clerk_id).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopUpRequest {
    #[serde(alias = "clerkId")]
    pub user_id: String,
    pub amount: f64,
    #[serde(default)]
    pub description: Option<String>,
}

/// `POST /api/balance/topup`
pub async fn top_up(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
    AppJson(request): AppJson<TopUpRequest>,
) -> Result<Json<WalletCredit>> {
    let description = request
        .description
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| format!("Top-up by {admin_id}"));
    let credit = user::top_up(&state.db, &request.user_id, request.amount, description).await?;
    Ok(Json(credit))
}
