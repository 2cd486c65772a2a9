//! Payment confirmation reconciliation.
//!
//! The gateway reports the outcome of a checkout twice: a server-to-server
//! confirmation (webhook) and a browser redirect carrying the same fields.
//! Both are folded into the order here, and the storefront page the buyer
//! should land on is derived from the resulting status.
//!
//! Side effects are tied to the `APPROVED` boundary only:
//! - entering `APPROVED` takes the items out of stock (and debits the wallet
//!   for balance orders),
//! - leaving `APPROVED` puts them back (and refunds the wallet).
//!
//! Repeated deliveries of the same state therefore change nothing but the
//! gateway identifiers and timestamps.

use crate::{
    config::AppConfig,
    core::{
        order as orders,
        pricing::amounts_match,
        product,
        reference::PaymentMethod,
        status::{OrderStatus, map_gateway_state},
        user::{self, TransactionKind},
    },
    entities::order,
    errors::{Error, Result},
};
use sea_orm::{Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{info, warn};

/// Scalar the gateway may send as text, number or boolean.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Int(value) => value.to_string(),
            Self::Float(value) => value.to_string(),
            Self::Bool(value) => value.to_string(),
        }
    }
}

fn lenient<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?
        .map(Scalar::into_string)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty()))
}

/// Fields of a gateway confirmation or response callback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GatewayConfirmation {
    #[serde(default, deserialize_with = "lenient")]
    pub x_ref_payco: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub x_transaction_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub x_transaction_state: Option<String>,
    /// Our reference code
    #[serde(default, deserialize_with = "lenient")]
    pub x_id_invoice: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub x_amount: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub x_currency_code: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub x_test_request: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub x_response_reason_text: Option<String>,
}

impl GatewayConfirmation {
    /// Parses a callback body, form-encoded or JSON depending on `content_type`.
    ///
    /// # Errors
    /// Returns `Form` or `Json` errors for malformed bodies.
    pub fn from_body(content_type: Option<&str>, body: &[u8]) -> Result<Self> {
        let is_form = content_type
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));
        if is_form {
            Ok(serde_urlencoded::from_bytes(body)?)
        } else {
            Ok(serde_json::from_slice(body)?)
        }
    }

    /// Reported amount, if any.
    ///
    /// The decimal separator is `.`; commas are accepted only as thousands
    /// separators (`1,190.00`).
    ///
    /// # Errors
    /// `InvalidAmount` when present but not a number, including decimal
    /// commas such as `119,50`.
    pub fn amount(&self) -> Result<Option<f64>> {
        self.x_amount
            .as_deref()
            .map(|raw| parse_amount(raw).ok_or(Error::InvalidAmount { amount: f64::NAN }))
            .transpose()
    }
}

fn parse_amount(raw: &str) -> Option<f64> {
    let (whole, fraction) = match raw.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (raw, None),
    };

    let mut groups = whole.split(',');
    let mut digits = groups.next()?.to_string();
    if whole.contains(',') {
        let lead = digits.trim_start_matches('-');
        if lead.is_empty() || lead.len() > 3 {
            return None;
        }
    }
    for group in groups {
        if group.len() != 3 || !group.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.push_str(group);
    }
    if let Some(fraction) = fraction {
        digits.push('.');
        digits.push_str(fraction);
    }

    digits.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Gateway identifiers recorded on a confirmed order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatewayIds {
    pub transaction_id: Option<String>,
    pub ref_payco: Option<String>,
}

/// Outcome of a status change.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    pub order_id: i64,
    pub reference_code: String,
    pub previous: OrderStatus,
    pub status: OrderStatus,
}

impl Transition {
    /// Whether the status actually changed.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.previous != self.status
    }
}

async fn take_from_stock<C>(db: &C, order: &order::Model, method: PaymentMethod) -> Result<()>
where
    C: ConnectionTrait,
{
    for item in orders::get_order_items(db, order.id).await? {
        product::reserve_stock(db, item.product_id, item.quantity).await?;
    }
    // Free orders have nothing to debit
    if method == PaymentMethod::Balance && order.amount > 0.0 {
        user::debit_balance_atomic(db, &order.clerk_id, order.amount).await?;
        user::record_transaction(
            db,
            &order.clerk_id,
            Some(order.id),
            -order.amount,
            TransactionKind::Purchase,
            format!("Payment for order {}", order.reference_code),
        )
        .await?;
    }
    Ok(())
}

async fn return_to_stock<C>(db: &C, order: &order::Model, method: PaymentMethod) -> Result<()>
where
    C: ConnectionTrait,
{
    for item in orders::get_order_items(db, order.id).await? {
        product::release_stock(db, item.product_id, item.quantity).await?;
    }
    if method == PaymentMethod::Balance && order.amount > 0.0 {
        user::credit_balance_atomic(db, &order.clerk_id, order.amount).await?;
        user::record_transaction(
            db,
            &order.clerk_id,
            Some(order.id),
            order.amount,
            TransactionKind::Refund,
            format!("Refund for order {}", order.reference_code),
        )
        .await?;
    }
    Ok(())
}

/// Moves `order` to `status`, applying stock and wallet side effects.
///
/// Callers own the database transaction; nothing is committed here.
pub async fn apply_status<C>(
    db: &C,
    order: order::Model,
    status: OrderStatus,
    gateway: Option<GatewayIds>,
) -> Result<Transition>
where
    C: ConnectionTrait,
{
    let previous: OrderStatus = order.status.parse()?;
    let method = PaymentMethod::from_column(&order.payment_method, &order.reference_code);

    if !previous.holds_stock() && status.holds_stock() {
        take_from_stock(db, &order, method).await?;
    } else if previous.holds_stock() && !status.holds_stock() {
        return_to_stock(db, &order, method).await?;
    }

    let transition = Transition {
        order_id: order.id,
        reference_code: order.reference_code.clone(),
        previous,
        status,
    };

    let now = chrono::Utc::now();
    let mut active: order::ActiveModel = order.into();
    active.status = Set(status.as_str().to_string());
    active.processing_date = Set(Some(now));
    active.updated_at = Set(now);
    if let Some(ids) = gateway {
        if let Some(transaction_id) = ids.transaction_id {
            active.transaction_id = Set(Some(transaction_id));
        }
        if let Some(ref_payco) = ids.ref_payco {
            active.ref_payco = Set(Some(ref_payco));
        }
    }
    active.update(db).await?;

    Ok(transition)
}

/// Applies a gateway confirmation to the order it references.
///
/// Only gateway orders are touched. An unrecognized transaction state keeps
/// the order's current status and records just the gateway identifiers.
///
/// # Errors
/// - `IncompleteConfirmation` if the invoice or state is missing
/// - `OrderNotFound` if no gateway order has that reference
/// - `AmountMismatch` if the reported amount differs from the order's
/// - stock or wallet errors when approving
pub async fn apply_confirmation(
    db: &DatabaseConnection,
    confirmation: &GatewayConfirmation,
) -> Result<Transition> {
    let reference = confirmation
        .x_id_invoice
        .as_deref()
        .ok_or(Error::IncompleteConfirmation {
            field: "x_id_invoice",
        })?;
    let state = confirmation
        .x_transaction_state
        .as_deref()
        .ok_or(Error::IncompleteConfirmation {
            field: "x_transaction_state",
        })?;
    let reported_amount = confirmation.amount()?;

    let txn = db.begin().await?;
    let order = orders::get_order_by_reference(&txn, reference)
        .await?
        .ok_or_else(|| Error::OrderNotFound {
            reference: reference.to_string(),
        })?;

    // Wallet orders are settled locally and never confirmed by the gateway
    if PaymentMethod::from_column(&order.payment_method, &order.reference_code)
        != PaymentMethod::Epayco
    {
        warn!(reference, "Gateway confirmation for a non-gateway order ignored");
        return Err(Error::OrderNotFound {
            reference: reference.to_string(),
        });
    }

    if let Some(received) = reported_amount {
        if !amounts_match(order.amount, received) {
            warn!(
                reference,
                expected = order.amount,
                received,
                "Gateway amount does not match order"
            );
            return Err(Error::AmountMismatch {
                expected: order.amount,
                received,
            });
        }
    }

    let status = match map_gateway_state(state) {
        Some(status) => status,
        None => order.status.parse()?,
    };
    let transition = apply_status(
        &txn,
        order,
        status,
        Some(GatewayIds {
            transaction_id: confirmation.x_transaction_id.clone(),
            ref_payco: confirmation.x_ref_payco.clone(),
        }),
    )
    .await?;
    txn.commit().await?;

    info!(
        reference,
        state,
        from = %transition.previous,
        to = %transition.status,
        changed = transition.changed(),
        "Gateway confirmation applied"
    );
    Ok(transition)
}

fn with_query(config: &AppConfig, path: &str, pairs: &[(&str, String)]) -> Result<String> {
    let query = serde_urlencoded::to_string(pairs)?;
    Ok(config.absolute_url(&format!("{path}?{query}")))
}

/// Storefront page for the buyer after a confirmation.
pub fn redirect_for(
    config: &AppConfig,
    transition: &Transition,
    reason: Option<&str>,
) -> Result<String> {
    let order_id = transition.order_id.to_string();
    match transition.status {
        OrderStatus::Approved => with_query(
            config,
            "/thankyou",
            &[("orderId", order_id), ("status", "approved".to_string())],
        ),
        OrderStatus::Rejected | OrderStatus::Failed => with_query(
            config,
            "/order-failed",
            &[
                ("orderId", order_id),
                ("status", "failed".to_string()),
                ("reason", reason.unwrap_or_default().to_string()),
            ],
        ),
        OrderStatus::Pending => with_query(
            config,
            "/order-pending",
            &[("orderId", order_id), ("status", "pending".to_string())],
        ),
    }
}

/// Where the browser goes when the gateway sends it back with `ref_payco`.
pub fn landing_redirect(config: &AppConfig, ref_payco: Option<&str>) -> Result<String> {
    match ref_payco.map(str::trim).filter(|r| !r.is_empty()) {
        Some(reference) => with_query(
            config,
            "/thankyou/ok",
            &[("ref_payco", reference.to_string())],
        ),
        None => Ok(config.absolute_url("/checkout")),
    }
}
