//! Product business logic - catalog lookups and stock control.
//!
//! Stock only moves through [`reserve_stock`] and [`release_stock`], which run
//! as single guarded `UPDATE` statements so concurrent checkouts cannot drive
//! `quantity` below zero.

use crate::{
    entities::{Product, product},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*, sea_query::Expr};

/// Retrieves all catalog products, ordered alphabetically by name.
pub async fn get_all_products(db: &DatabaseConnection) -> Result<Vec<product::Model>> {
    Product::find()
        .order_by_asc(product::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a product by its exact name.
pub async fn get_product_by_name(
    db: &DatabaseConnection,
    name: &str,
) -> Result<Option<product::Model>> {
    Product::find()
        .filter(product::Column::Name.eq(name))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a specific product by its unique ID.
///
/// Generic over the connection so it can run inside a checkout transaction.
pub async fn get_product_by_id<C>(db: &C, product_id: i64) -> Result<Option<product::Model>>
where
    C: ConnectionTrait,
{
    Product::find_by_id(product_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a new catalog product.
///
/// # Errors
/// Returns an error if:
/// - The product name is empty or whitespace-only
/// - The price is negative or not finite (NaN, infinity)
/// - The initial stock is negative
/// - The database insert operation fails
pub async fn create_product(
    db: &DatabaseConnection,
    name: String,
    price: f64,
    quantity: i64,
) -> Result<product::Model> {
    if name.trim().is_empty() {
        return Err(Error::Config {
            message: "Product name cannot be empty".to_string(),
        });
    }

    if price < 0.0 || !price.is_finite() {
        return Err(Error::InvalidAmount { amount: price });
    }

    if quantity < 0 {
        return Err(Error::InvalidQuantity {
            product_id: 0,
            quantity,
        });
    }

    let now = chrono::Utc::now();
    let product = product::ActiveModel {
        name: Set(name.trim().to_string()),
        price: Set(price),
        quantity: Set(quantity),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    product.insert(db).await.map_err(Into::into)
}

/// Overwrites the stock on hand for a product (restocking, inventory counts).
pub async fn set_stock(
    db: &DatabaseConnection,
    product_id: i64,
    quantity: i64,
) -> Result<product::Model> {
    if quantity < 0 {
        return Err(Error::InvalidQuantity {
            product_id,
            quantity,
        });
    }

    let mut product: product::ActiveModel = Product::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::ProductNotFound {
            id: product_id.to_string(),
        })?
        .into();

    product.quantity = Set(quantity);
    product.updated_at = Set(chrono::Utc::now());
    product.update(db).await.map_err(Into::into)
}

/// Takes `quantity` units out of stock.
///
/// Runs `UPDATE products SET quantity = quantity - n WHERE id = ? AND quantity >= n`
/// so the check and the decrement cannot be separated by another writer.
///
/// # Errors
/// `ProductNotFound` if the product does not exist, `InsufficientStock` if
/// fewer than `quantity` units are available.
pub async fn reserve_stock<C>(db: &C, product_id: i64, quantity: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    if quantity <= 0 {
        return Err(Error::InvalidQuantity {
            product_id,
            quantity,
        });
    }

    let result = Product::update_many()
        .col_expr(
            product::Column::Quantity,
            Expr::col(product::Column::Quantity).sub(quantity),
        )
        .col_expr(product::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
        .filter(product::Column::Id.eq(product_id))
        .filter(product::Column::Quantity.gte(quantity))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        let product = get_product_by_id(db, product_id)
            .await?
            .ok_or_else(|| Error::ProductNotFound {
                id: product_id.to_string(),
            })?;
        return Err(Error::InsufficientStock {
            product: product.name,
        });
    }
    Ok(())
}

/// Puts `quantity` units back into stock.
pub async fn release_stock<C>(db: &C, product_id: i64, quantity: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    if quantity <= 0 {
        return Err(Error::InvalidQuantity {
            product_id,
            quantity,
        });
    }

    let result = Product::update_many()
        .col_expr(
            product::Column::Quantity,
            Expr::col(product::Column::Quantity).add(quantity),
        )
        .col_expr(product::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
        .filter(product::Column::Id.eq(product_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::ProductNotFound {
            id: product_id.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_product_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        // Test empty name validation
        let result = create_product(&db, "   ".to_string(), 10.0, 1).await;
        assert!(matches!(result.unwrap_err(), Error::Config { message: _ }));

        // Test negative price validation
        let result = create_product(&db, "Gorra".to_string(), -10.0, 1).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidAmount { amount: -10.0 }
        ));

        // Test NaN price validation
        let result = create_product(&db, "Gorra".to_string(), f64::NAN, 1).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidAmount { amount: _ }
        ));

        // Test negative stock validation
        let result = create_product(&db, "Gorra".to_string(), 10.0, -1).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidQuantity { quantity: -1, .. }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_and_list_products() -> Result<()> {
        let db = setup_test_db().await?;

        let zapatos = create_test_product(&db, "Zapatos", 120_000.0, 4).await?;
        let bolso = create_test_product(&db, "Bolso", 80_000.0, 2).await?;

        let all = get_all_products(&db).await?;
        assert_eq!(all, vec![bolso.clone(), zapatos]);

        let found = get_product_by_name(&db, "Bolso").await?.unwrap();
        assert_eq!(found.id, bolso.id);
        assert!(get_product_by_name(&db, "Nada").await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_reserve_stock_decrements() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Gorra", 35_000.0, 5).await?;

        reserve_stock(&db, product.id, 3).await?;

        let updated = get_product_by_id(&db, product.id).await?.unwrap();
        assert_eq!(updated.quantity, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_reserve_stock_never_goes_negative() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Gorra", 35_000.0, 2).await?;

        let result = reserve_stock(&db, product.id, 3).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InsufficientStock { product } if product == "Gorra"
        ));

        let unchanged = get_product_by_id(&db, product.id).await?.unwrap();
        assert_eq!(unchanged.quantity, 2);

        // Taking exactly what is left succeeds
        reserve_stock(&db, product.id, 2).await?;
        let empty = get_product_by_id(&db, product.id).await?.unwrap();
        assert_eq!(empty.quantity, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_reserve_stock_unknown_product() -> Result<()> {
        let db = setup_test_db().await?;
        let result = reserve_stock(&db, 404, 1).await;
        assert!(matches!(result.unwrap_err(), Error::ProductNotFound { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_release_stock_increments() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Gorra", 35_000.0, 1).await?;

        release_stock(&db, product.id, 4).await?;
        let updated = get_product_by_id(&db, product.id).await?.unwrap();
        assert_eq!(updated.quantity, 5);

        assert!(matches!(
            release_stock(&db, 999, 1).await.unwrap_err(),
            Error::ProductNotFound { .. }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_set_stock() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Gorra", 35_000.0, 1).await?;

        let updated = set_stock(&db, product.id, 10).await?;
        assert_eq!(updated.quantity, 10);

        assert!(matches!(
            set_stock(&db, product.id, -1).await.unwrap_err(),
            Error::InvalidQuantity { .. }
        ));
        Ok(())
    }
}
