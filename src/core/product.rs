//! Product business logic - Catalog management and stock mutations.
//!
//! Storefront reads only ever see active products. All stock changes go through
//! single `UPDATE ... SET stock = stock ± n` statements so concurrent checkouts
//! and cancellations never work from a stale in-memory count.

use crate::{
    config::catalog::CatalogConfig,
    entities::{BenefitTags, Product, ProductCategory, product},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, PaginatorTrait, QueryOrder, Set, prelude::*, sea_query::Expr};
use serde::Deserialize;
use std::str::FromStr;
use tracing::{debug, info, instrument, warn};

impl ProductCategory {
    /// The stored slug for this category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Protein => "proteinas",
            Self::Vitamins => "vitaminas",
            Self::Energy => "energia",
            Self::Wellness => "bienestar",
        }
    }
}

impl FromStr for ProductCategory {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim() {
            "proteinas" => Ok(Self::Protein),
            "vitaminas" => Ok(Self::Vitamins),
            "energia" => Ok(Self::Energy),
            "bienestar" => Ok(Self::Wellness),
            _ => Err(Error::validation("Categoría inválida.")),
        }
    }
}

/// Fields an administrator submits when creating or editing a product.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    /// Required, trimmed
    pub name: String,
    /// Short tagline
    #[serde(default)]
    pub subtitle: Option<String>,
    /// Long description
    #[serde(default)]
    pub description: String,
    /// Category slug, e.g. `proteinas`
    pub category: String,
    /// Unit price, must not be negative
    pub price: Decimal,
    /// Units on hand, must not be negative
    pub stock: i32,
    /// Sellable on the storefront (default `true`)
    #[serde(default = "default_active")]
    pub active: bool,
    /// Product image
    #[serde(default)]
    pub image_url: Option<String>,
    /// Benefit tags shown on the landing page
    #[serde(default)]
    pub benefits: Vec<String>,
}

const fn default_active() -> bool {
    true
}

/// Input after validation, ready to be written.
struct ValidProduct {
    name: String,
    subtitle: Option<String>,
    description: String,
    category: ProductCategory,
    price: Decimal,
    stock: i32,
    active: bool,
    image_url: Option<String>,
    benefits: BenefitTags,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_input(input: ProductInput) -> Result<ValidProduct> {
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(Error::validation("Nombre requerido."));
    }
    if input.price < Decimal::ZERO {
        return Err(Error::validation("Precio inválido."));
    }
    if input.stock < 0 {
        return Err(Error::validation("Stock inválido."));
    }
    let category = input.category.parse()?;

    let benefits = input
        .benefits
        .into_iter()
        .map(|b| b.trim().to_string())
        .filter(|b| !b.is_empty())
        .collect();

    Ok(ValidProduct {
        name,
        subtitle: non_blank(input.subtitle),
        description: input.description.trim().to_string(),
        category,
        price: input.price.round_dp(2),
        stock: input.stock,
        active: input.active,
        image_url: non_blank(input.image_url),
        benefits: BenefitTags(benefits),
    })
}

/// Retrieves all active products for the public storefront, ordered by name.
///
/// # Errors
/// Returns [`Error::Database`] on store failures.
pub async fn list_active_products(db: &DatabaseConnection) -> Result<Vec<product::Model>> {
    Product::find()
        .filter(product::Column::Active.eq(true))
        .order_by_asc(product::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves every product, active or not, for the admin dashboard.
///
/// # Errors
/// Returns [`Error::Database`] on store failures.
pub async fn list_all_products(db: &DatabaseConnection) -> Result<Vec<product::Model>> {
    Product::find()
        .order_by_asc(product::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a product by id regardless of its active flag.
///
/// # Errors
/// Returns [`Error::Database`] on store failures.
pub async fn get_product_by_id<C>(db: &C, product_id: i64) -> Result<Option<product::Model>>
where
    C: ConnectionTrait,
{
    Product::find_by_id(product_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a product only if the storefront may show it.
///
/// # Errors
/// Returns [`Error::Database`] on store failures.
pub async fn get_active_product(
    db: &DatabaseConnection,
    product_id: i64,
) -> Result<Option<product::Model>> {
    Ok(get_product_by_id(db, product_id)
        .await?
        .filter(|p| p.active))
}

/// Creates a new product after validating the submitted fields.
///
/// # Errors
/// Returns a validation error if the name is blank, the price or stock is
/// negative, or the category is not one of the fixed set.
#[instrument(skip(db, input), fields(name = %input.name))]
pub async fn create_product(db: &DatabaseConnection, input: ProductInput) -> Result<product::Model> {
    let valid = validate_input(input)?;
    let now = chrono::Utc::now();

    let model = product::ActiveModel {
        name: Set(valid.name),
        subtitle: Set(valid.subtitle),
        description: Set(valid.description),
        category: Set(valid.category),
        price: Set(valid.price),
        stock: Set(valid.stock),
        active: Set(valid.active),
        image_url: Set(valid.image_url),
        benefits: Set(valid.benefits),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(product_id = model.id, "Created product '{}'", model.name);
    Ok(model)
}

/// Replaces the editable fields of an existing product.
///
/// Orders already placed keep their own price snapshot.
///
/// # Errors
/// Returns a validation error for bad fields (checked before any query) and
/// [`Error::ProductNotFound`] for an unknown id.
#[instrument(skip(db, input))]
pub async fn update_product(
    db: &DatabaseConnection,
    product_id: i64,
    input: ProductInput,
) -> Result<product::Model> {
    let valid = validate_input(input)?;

    let mut product: product::ActiveModel = Product::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or(Error::ProductNotFound { id: product_id })?
        .into();

    product.name = Set(valid.name);
    product.subtitle = Set(valid.subtitle);
    product.description = Set(valid.description);
    product.category = Set(valid.category);
    product.price = Set(valid.price);
    product.stock = Set(valid.stock);
    product.active = Set(valid.active);
    product.image_url = Set(valid.image_url);
    product.benefits = Set(valid.benefits);
    product.updated_at = Set(chrono::Utc::now());

    let updated = product.update(db).await?;
    info!(product_id, "Updated product '{}'", updated.name);
    Ok(updated)
}

/// Sets the absolute stock count of a product.
///
/// # Errors
/// Returns `Stock inválido.` for a negative count and [`Error::ProductNotFound`]
/// for an unknown id.
#[instrument(skip(db))]
pub async fn set_product_stock(
    db: &DatabaseConnection,
    product_id: i64,
    stock: i32,
) -> Result<product::Model> {
    if stock < 0 {
        return Err(Error::validation("Stock inválido."));
    }

    let mut product: product::ActiveModel = Product::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or(Error::ProductNotFound { id: product_id })?
        .into();

    product.stock = Set(stock);
    product.updated_at = Set(chrono::Utc::now());

    let updated = product.update(db).await?;
    info!(product_id, stock, "Stock set");
    Ok(updated)
}

/// Permanently removes a product. Existing orders keep their snapshot.
///
/// # Errors
/// Returns [`Error::ProductNotFound`] when no row was removed.
#[instrument(skip(db))]
pub async fn delete_product(db: &DatabaseConnection, product_id: i64) -> Result<()> {
    let result = Product::delete_by_id(product_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::ProductNotFound { id: product_id });
    }
    info!(product_id, "Deleted product");
    Ok(())
}

/// Takes `quantity` units out of stock if, and only if, enough are available.
///
/// Runs as one conditional `UPDATE`, so two concurrent callers can never both
/// succeed against the same last units. Returns `false` when no row matched
/// (missing, inactive, or not enough stock).
///
/// # Errors
/// Returns [`Error::Database`] on store failures.
pub async fn take_stock_if_available<C>(db: &C, product_id: i64, quantity: i32) -> Result<bool>
where
    C: ConnectionTrait,
{
    let result = Product::update_many()
        .col_expr(
            product::Column::Stock,
            Expr::col(product::Column::Stock).sub(quantity),
        )
        .col_expr(
            product::Column::UpdatedAt,
            Expr::value(chrono::Utc::now()),
        )
        .filter(product::Column::Id.eq(product_id))
        .filter(product::Column::Active.eq(true))
        .filter(product::Column::Stock.gte(quantity))
        .exec(db)
        .await?;

    debug!(product_id, quantity, rows = result.rows_affected, "Conditional stock decrement");
    Ok(result.rows_affected == 1)
}

/// Returns `quantity` units to stock. Returns `false` if the product no longer exists.
///
/// # Errors
/// Returns [`Error::Database`] on store failures.
pub async fn return_stock<C>(db: &C, product_id: i64, quantity: i32) -> Result<bool>
where
    C: ConnectionTrait,
{
    let result = Product::update_many()
        .col_expr(
            product::Column::Stock,
            Expr::col(product::Column::Stock).add(quantity),
        )
        .col_expr(
            product::Column::UpdatedAt,
            Expr::value(chrono::Utc::now()),
        )
        .filter(product::Column::Id.eq(product_id))
        .exec(db)
        .await?;

    Ok(result.rows_affected == 1)
}

/// Inserts the catalog seed when the products table is empty.
///
/// Returns the number of products inserted (zero if the table already had rows).
///
/// # Errors
/// Returns [`Error::Database`] if the table cannot be counted; invalid entries
/// are skipped with a warning.
pub async fn seed_catalog(db: &DatabaseConnection, catalog: &CatalogConfig) -> Result<usize> {
    let existing = Product::find().count(db).await?;
    if existing > 0 {
        debug!(existing, "Catalog already populated; skipping seed");
        return Ok(0);
    }

    let mut inserted = 0;
    for seed in &catalog.products {
        let input = ProductInput {
            name: seed.name.clone(),
            subtitle: seed.subtitle.clone(),
            description: seed.description.clone(),
            category: seed.category.as_str().to_string(),
            price: seed.price,
            stock: seed.stock,
            active: seed.active,
            image_url: seed.image_url.clone(),
            benefits: seed.benefits.clone(),
        };
        match create_product(db, input).await {
            Ok(_) => inserted += 1,
            Err(e) => warn!("Skipping catalog entry '{}': {}", seed.name, e),
        }
    }

    info!(inserted, "Seeded catalog");
    Ok(inserted)
}
