//! Catalog seeding from config.toml.
//!
//! Products listed under `[[products]]` are inserted on startup when no
//! product with the same name exists yet. Existing rows are left untouched so
//! stock levels survive restarts.

use crate::core::product;
use crate::errors::Result;
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use tracing::info;

/// A product to seed
#[derive(Debug, Deserialize, Clone)]
pub struct ProductSeed {
    pub name: String,
    /// Unit price before tax
    pub price: f64,
    /// Initial stock
    pub quantity: i64,
}

/// Inserts every seed whose name is not in the catalog yet.
///
/// Returns the number of products created.
pub async fn seed_products(db: &DatabaseConnection, seeds: &[ProductSeed]) -> Result<usize> {
    let mut created = 0;
    for seed in seeds {
        if product::get_product_by_name(db, &seed.name).await?.is_some() {
            continue;
        }
        product::create_product(db, seed.name.clone(), seed.price, seed.quantity).await?;
        created += 1;
    }
    if created > 0 {
        info!(created, "Seeded catalog products");
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::setup_test_db;

    #[tokio::test]
    async fn test_seed_products_skips_existing() -> Result<()> {
        let db = setup_test_db().await?;
        let seeds = vec![
            ProductSeed {
                name: "Gorra".to_string(),
                price: 35000.0,
                quantity: 5,
            },
            ProductSeed {
                name: "Camiseta".to_string(),
                price: 50000.0,
                quantity: 3,
            },
        ];

        assert_eq!(seed_products(&db, &seeds).await?, 2);
        let gorra = product::get_product_by_name(&db, "Gorra").await?.unwrap();
        product::set_stock(&db, gorra.id, 1).await?;

        // Second run creates nothing and keeps the adjusted stock
        assert_eq!(seed_products(&db, &seeds).await?, 0);
        let gorra = product::get_product_by_name(&db, "Gorra").await?.unwrap();
        assert_eq!(gorra.quantity, 1);
        Ok(())
    }
}
