//! User wallet business logic - balances and the ledger behind them.
//!
//! Balance changes are applied with single guarded `UPDATE` statements and are
//! always paired with a row in the `transactions` ledger, written on the same
//! connection so callers can wrap both in one database transaction.

use crate::{
    entities::{Transaction, User, transaction, user},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::Serialize;
use tracing::info;

/// Kind of wallet ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    /// Debit for an order paid from the balance
    Purchase,
    /// Credit added by an administrator
    Topup,
    /// Credit returned when a balance order is reversed
    Refund,
}

impl TransactionKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Purchase => "purchase",
            Self::Topup => "topup",
            Self::Refund => "refund",
        }
    }
}

/// Result of crediting a wallet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletCredit {
    pub new_balance: f64,
    pub transaction: transaction::Model,
}

fn validate_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(())
}

/// Finds a user by external identity id.
pub async fn get_user_by_clerk_id<C>(db: &C, clerk_id: &str) -> Result<Option<user::Model>>
where
    C: ConnectionTrait,
{
    User::find()
        .filter(user::Column::ClerkId.eq(clerk_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Registers a user with an opening balance.
///
/// # Errors
/// Returns an error if the identity id is blank, the balance is negative or
/// not finite, or the insert fails (for example a duplicate `clerk_id`).
pub async fn create_user(
    db: &DatabaseConnection,
    clerk_id: String,
    first_name: String,
    last_name: String,
    email: String,
    balance: f64,
) -> Result<user::Model> {
    if clerk_id.trim().is_empty() {
        return Err(Error::Config {
            message: "User id cannot be empty".to_string(),
        });
    }
    if !balance.is_finite() || balance < 0.0 {
        return Err(Error::InvalidAmount { amount: balance });
    }

    let user = user::ActiveModel {
        clerk_id: Set(clerk_id.trim().to_string()),
        first_name: Set(first_name),
        last_name: Set(last_name),
        email: Set(email),
        balance: Set(balance),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    user.insert(db).await.map_err(Into::into)
}

/// Current wallet balance. Users without a wallet row have a balance of zero.
pub async fn get_balance(db: &DatabaseConnection, clerk_id: &str) -> Result<f64> {
    Ok(get_user_by_clerk_id(db, clerk_id)
        .await?
        .map_or(0.0, |user| user.balance))
}

/// Subtracts `amount` from the wallet if, and only if, it covers the amount.
///
/// Runs `UPDATE users SET balance = balance - x WHERE clerk_id = ? AND balance >= x`.
/// Returns the new balance.
///
/// # Errors
/// `UserNotFound` for unknown users, `InsufficientFunds` if the balance is
/// lower than `amount`.
pub async fn debit_balance_atomic<C>(db: &C, clerk_id: &str, amount: f64) -> Result<f64>
where
    C: ConnectionTrait,
{
    validate_amount(amount)?;

    let result = User::update_many()
        .col_expr(
            user::Column::Balance,
            Expr::col(user::Column::Balance).sub(amount),
        )
        .filter(user::Column::ClerkId.eq(clerk_id))
        .filter(user::Column::Balance.gte(amount))
        .exec(db)
        .await?;

    let user = get_user_by_clerk_id(db, clerk_id)
        .await?
        .ok_or_else(|| Error::UserNotFound {
            clerk_id: clerk_id.to_string(),
        })?;

    if result.rows_affected == 0 {
        return Err(Error::InsufficientFunds {
            current: user.balance,
            required: amount,
        });
    }
    Ok(user.balance)
}

/// Adds `amount` to the wallet and returns the new balance.
pub async fn credit_balance_atomic<C>(db: &C, clerk_id: &str, amount: f64) -> Result<f64>
where
    C: ConnectionTrait,
{
    validate_amount(amount)?;

    let result = User::update_many()
        .col_expr(
            user::Column::Balance,
            Expr::col(user::Column::Balance).add(amount),
        )
        .filter(user::Column::ClerkId.eq(clerk_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::UserNotFound {
            clerk_id: clerk_id.to_string(),
        });
    }

    get_user_by_clerk_id(db, clerk_id)
        .await?
        .map(|user| user.balance)
        .ok_or_else(|| Error::UserNotFound {
            clerk_id: clerk_id.to_string(),
        })
}

/// Appends a ledger entry. `amount` is signed: negative for debits.
pub async fn record_transaction<C>(
    db: &C,
    clerk_id: &str,
    order_id: Option<i64>,
    amount: f64,
    kind: TransactionKind,
    description: String,
) -> Result<transaction::Model>
where
    C: ConnectionTrait,
{
    let entry = transaction::ActiveModel {
        clerk_id: Set(clerk_id.to_string()),
        order_id: Set(order_id),
        amount: Set(amount),
        kind: Set(kind.as_str().to_string()),
        description: Set(description),
        timestamp: Set(chrono::Utc::now()),
        ..Default::default()
    };
    entry.insert(db).await.map_err(Into::into)
}

/// Credits a wallet and records a `topup` ledger entry atomically.
pub async fn top_up(
    db: &DatabaseConnection,
    clerk_id: &str,
    amount: f64,
    description: String,
) -> Result<WalletCredit> {
    validate_amount(amount)?;

    let txn = db.begin().await?;
    let new_balance = credit_balance_atomic(&txn, clerk_id, amount).await?;
    let transaction = record_transaction(
        &txn,
        clerk_id,
        None,
        amount,
        TransactionKind::Topup,
        description,
    )
    .await?;
    txn.commit().await?;

    info!(clerk_id, amount, new_balance, "Wallet topped up");
    Ok(WalletCredit {
        new_balance,
        transaction,
    })
}

/// Ledger entries for a wallet, newest first.
pub async fn list_wallet_transactions(
    db: &DatabaseConnection,
    clerk_id: &str,
) -> Result<Vec<transaction::Model>> {
    Transaction::find()
        .filter(transaction::Column::ClerkId.eq(clerk_id))
        .order_by_desc(transaction::Column::Timestamp)
        .order_by_desc(transaction::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
