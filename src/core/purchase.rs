//! Balance payments - checkout paid from the buyer's internal wallet.
//!
//! The whole purchase runs in one database transaction: the order is inserted
//! as `PENDING` and immediately moved to `APPROVED` through
//! [`reconcile::apply_status`], which takes the stock, debits the wallet and
//! writes the ledger entry. Any failure rolls all of it back.

use crate::{
    config::AppConfig,
    core::{
        order::{self, Buyer, CartItem, NewOrder},
        pricing,
        reconcile,
        reference::{self, PaymentMethod},
        status::OrderStatus,
        user,
    },
    errors::{Error, Result},
};
use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Request body for a balance purchase.
///
/// Buyer fields are optional; missing ones are filled from the user profile
/// or left blank.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalancePurchaseRequest {
    #[serde(alias = "productos")]
    pub items: Vec<CartItem>,
    /// Total the storefront displayed, checked against the server quote
    #[serde(default)]
    pub total: Option<f64>,
    #[serde(default)]
    pub tip: f64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub document_type: Option<String>,
    #[serde(default)]
    pub document: Option<String>,
}

/// Result of a successful balance purchase.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseReceipt {
    pub order_id: i64,
    pub reference_code: String,
    pub amount: f64,
    pub new_balance: f64,
}

fn or_blank(value: Option<&String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

/// Pays for a cart with the buyer's wallet balance.
///
/// # Errors
/// - `UserNotFound` if the buyer has no wallet
/// - `EmptyOrder`, `InvalidQuantity`, `ProductNotFound`, `InsufficientStock`
///   for cart problems
/// - `AmountMismatch` if the claimed total disagrees with catalog prices
/// - `InsufficientFunds` if the balance does not cover the total
pub async fn pay_with_balance(
    db: &DatabaseConnection,
    config: &AppConfig,
    clerk_id: &str,
    request: BalancePurchaseRequest,
) -> Result<PurchaseReceipt> {
    let txn = db.begin().await?;

    let buyer_profile = user::get_user_by_clerk_id(&txn, clerk_id)
        .await?
        .ok_or_else(|| Error::UserNotFound {
            clerk_id: clerk_id.to_string(),
        })?;

    let lines = order::load_cart(&txn, &request.items).await?;
    let quote = order::quote_cart(&lines, config.payments.tax_rate, request.tip)?;
    pricing::reconcile(&quote, request.total)?;

    if buyer_profile.balance < quote.total {
        warn!(
            clerk_id,
            balance = buyer_profile.balance,
            total = quote.total,
            "Balance purchase rejected"
        );
        return Err(Error::InsufficientFunds {
            current: buyer_profile.balance,
            required: quote.total,
        });
    }

    let buyer_name = request
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map_or_else(
            || format!("{} {}", buyer_profile.first_name, buyer_profile.last_name)
                .trim()
                .to_string(),
            str::to_string,
        );
    let document_type = request
        .document_type
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or("CC")
        .to_string();

    let pending = order::insert_order(
        &txn,
        NewOrder {
            reference_code: reference::balance_reference(),
            clerk_id: clerk_id.to_string(),
            payment_method: PaymentMethod::Balance,
            quote,
            currency: config.payments.currency.clone(),
            buyer: Buyer {
                email: buyer_profile.email.clone(),
                name: buyer_name,
                address: or_blank(request.address.as_ref()),
                city: or_blank(request.city.as_ref()),
                phone: or_blank(request.phone.as_ref()),
                document_type,
                document_number: or_blank(request.document.as_ref()),
            },
            shipping_country: config.payments.shipping_country.clone(),
        },
    )
    .await?;
    order::insert_order_items(&txn, pending.id, &lines).await?;

    let transition = reconcile::apply_status(&txn, pending, OrderStatus::Approved, None).await?;
    let new_balance = user::get_user_by_clerk_id(&txn, clerk_id)
        .await?
        .map_or(0.0, |u| u.balance);
    txn.commit().await?;

    info!(
        clerk_id,
        order_id = transition.order_id,
        reference = %transition.reference_code,
        amount = quote.total,
        new_balance,
        "Balance purchase completed"
    );

    Ok(PurchaseReceipt {
        order_id: transition.order_id,
        reference_code: transition.reference_code,
        amount: quote.total,
        new_balance,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::{order::get_order_detail, product};
    use crate::test_utils::*;

    fn purchase(items: Vec<CartItem>, total: Option<f64>) -> BalancePurchaseRequest {
        BalancePurchaseRequest {
            items,
            total,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_pay_with_balance() -> Result<()> {
        let db = setup_test_db().await?;
        let config = test_config();
        create_test_user(&db, "user_ana", 500.0).await?;
        let gorra = create_test_product(&db, "Gorra", 100.0, 5).await?;

        let receipt = pay_with_balance(
            &db,
            &config,
            "user_ana",
            purchase(vec![cart_item(gorra.id, 2)], Some(238.0)),
        )
        .await?;

        assert!(receipt.reference_code.starts_with("SALDO_"));
        assert_eq!(receipt.amount, 238.0);
        assert_eq!(receipt.new_balance, 262.0);
        assert_eq!(user::get_balance(&db, "user_ana").await?, 262.0);

        let stock = product::get_product_by_id(&db, gorra.id).await?.unwrap();
        assert_eq!(stock.quantity, 3);

        let detail = get_order_detail(&db, receipt.order_id).await?;
        assert_eq!(detail.order.status, "APPROVED");
        assert_eq!(detail.order.payment_method, "balance");
        assert_eq!(detail.order.buyer_name, "Ana Gómez");
        assert_eq!(detail.order.buyer_email, "user_ana@example.co");
        assert_eq!(detail.order.document_type, "CC");
        assert_eq!(detail.order.shipping_country, "Colombia");
        assert_eq!(detail.items.len(), 1);

        let ledger = user::list_wallet_transactions(&db, "user_ana").await?;
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].kind, "purchase");
        assert_eq!(ledger[0].amount, -238.0);
        assert_eq!(ledger[0].order_id, Some(receipt.order_id));
        Ok(())
    }

    #[tokio::test]
    async fn test_pay_with_balance_insufficient_funds_changes_nothing() -> Result<()> {
        let db = setup_test_db().await?;
        let config = test_config();
        create_test_user(&db, "user_ana", 100.0).await?;
        let gorra = create_test_product(&db, "Gorra", 100.0, 5).await?;

        let result = pay_with_balance(
            &db,
            &config,
            "user_ana",
            purchase(vec![cart_item(gorra.id, 1)], None),
        )
        .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InsufficientFunds {
                current: 100.0,
                required: 119.0
            }
        ));

        assert_eq!(user::get_balance(&db, "user_ana").await?, 100.0);
        let stock = product::get_product_by_id(&db, gorra.id).await?.unwrap();
        assert_eq!(stock.quantity, 5);
        assert_eq!(order::count_orders(&db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_pay_with_balance_insufficient_stock_changes_nothing() -> Result<()> {
        let db = setup_test_db().await?;
        let config = test_config();
        create_test_user(&db, "user_ana", 10_000.0).await?;
        let gorra = create_test_product(&db, "Gorra", 100.0, 1).await?;

        let result = pay_with_balance(
            &db,
            &config,
            "user_ana",
            purchase(vec![cart_item(gorra.id, 2)], None),
        )
        .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InsufficientStock { product } if product == "Gorra"
        ));
        assert_eq!(user::get_balance(&db, "user_ana").await?, 10_000.0);
        assert!(user::list_wallet_transactions(&db, "user_ana").await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_pay_with_balance_unknown_user() -> Result<()> {
        let db = setup_test_db().await?;
        let config = test_config();
        let gorra = create_test_product(&db, "Gorra", 100.0, 1).await?;

        let result = pay_with_balance(
            &db,
            &config,
            "ghost",
            purchase(vec![cart_item(gorra.id, 1)], None),
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::UserNotFound { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_pay_with_balance_uses_catalog_prices() -> Result<()> {
        let db = setup_test_db().await?;
        let config = test_config();
        create_test_user(&db, "user_ana", 10_000.0).await?;
        let gorra = create_test_product(&db, "Gorra", 100.0, 5).await?;

        // A client that lowered the price is caught by the total check
        let result = pay_with_balance(
            &db,
            &config,
            "user_ana",
            purchase(vec![cart_item(gorra.id, 1)], Some(1.19)),
        )
        .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::AmountMismatch {
                expected: 119.0,
                ..
            }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_pay_with_balance_free_order() -> Result<()> {
        let db = setup_test_db().await?;
        let config = test_config();
        create_test_user(&db, "user_ana", 50.0).await?;
        let muestra = create_test_product(&db, "Muestra", 0.0, 3).await?;

        let receipt = pay_with_balance(
            &db,
            &config,
            "user_ana",
            purchase(vec![cart_item(muestra.id, 1)], Some(0.0)),
        )
        .await?;
        assert_eq!(receipt.amount, 0.0);
        assert_eq!(receipt.new_balance, 50.0);
        assert!(user::list_wallet_transactions(&db, "user_ana").await?.is_empty());

        let stock = product::get_product_by_id(&db, muestra.id).await?.unwrap();
        assert_eq!(stock.quantity, 2);

        // Reversal puts the item back without touching the wallet
        order::update_status(&db, receipt.order_id, OrderStatus::Rejected).await?;
        assert_eq!(user::get_balance(&db, "user_ana").await?, 50.0);
        let stock = product::get_product_by_id(&db, muestra.id).await?.unwrap();
        assert_eq!(stock.quantity, 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_rejecting_balance_order_refunds_wallet() -> Result<()> {
        let db = setup_test_db().await?;
        let config = test_config();
        create_test_user(&db, "user_ana", 500.0).await?;
        let gorra = create_test_product(&db, "Gorra", 100.0, 5).await?;

        let receipt = pay_with_balance(
            &db,
            &config,
            "user_ana",
            purchase(vec![cart_item(gorra.id, 1)], None),
        )
        .await?;
        assert_eq!(receipt.new_balance, 381.0);

        order::update_status(&db, receipt.order_id, OrderStatus::Rejected).await?;

        assert_eq!(user::get_balance(&db, "user_ana").await?, 500.0);
        let stock = product::get_product_by_id(&db, gorra.id).await?.unwrap();
        assert_eq!(stock.quantity, 5);

        let ledger = user::list_wallet_transactions(&db, "user_ana").await?;
        assert_eq!(ledger.len(), 2);
        assert!(ledger.iter().any(|t| t.kind == "refund" && t.amount == 119.0));
        Ok(())
    }
}
