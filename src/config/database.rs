//! Database configuration module.
//!
//! This module handles the database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust models without hand-written SQL.

use crate::entities::{Order, Product};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use std::path::Path;
use tracing::{debug, info};

/// Default local `SQLite` file used when `DATABASE_URL` is not set.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/storefront.sqlite?mode=rwc";

/// Gets the database URL from the environment or returns the default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the given database URL.
///
/// The returned connection is owned by the process entry point and passed by
/// reference to every operation; it is closed explicitly at shutdown.
///
/// # Errors
/// Returns [`crate::errors::Error::Io`] if the `SQLite` data directory cannot be
/// created, or [`crate::errors::Error::Database`] if the connection fails.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    debug!("Connecting to database at {}", database_url);
    if let Some(rest) = database_url.strip_prefix("sqlite://") {
        let file = rest.split('?').next().unwrap_or(rest);
        if let Some(parent) = Path::new(file).parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
    }
    Database::connect(database_url).await.map_err(Into::into)
}

/// Creates the `products` and `orders` tables if they do not exist yet.
///
/// # Errors
/// Returns [`crate::errors::Error::Database`] if a `CREATE TABLE` statement fails.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut product_table = schema.create_table_from_entity(Product);
    let mut order_table = schema.create_table_from_entity(Order);

    product_table.if_not_exists();
    order_table.if_not_exists();

    db.execute(builder.build(&product_table)).await?;
    db.execute(builder.build(&order_table)).await?;

    info!("Database tables ensured.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{OrderModel, ProductModel};
    use sea_orm::{EntityTrait, QuerySelect};

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        let _: Vec<ProductModel> = Product::find().limit(1).all(&db).await?;
        let _: Vec<OrderModel> = Order::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = create_connection("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }
}
