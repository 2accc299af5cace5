//! Product entity - A sellable supplement in the storefront catalog.
//!
//! The stored price is the only price the checkout ever charges; client-submitted
//! prices are never read. Stock is a non-negative unit count that order creation
//! decrements and order deletion restores.

use sea_orm::entity::prelude::*;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

/// Catalog category. The set is fixed; values are stored as lowercase Spanish slugs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ProductCategory {
    /// Protein powders
    #[sea_orm(string_value = "proteinas")]
    #[serde(rename = "proteinas")]
    Protein,
    /// Vitamins and minerals
    #[sea_orm(string_value = "vitaminas")]
    #[serde(rename = "vitaminas")]
    Vitamins,
    /// Pre-workout and energy
    #[sea_orm(string_value = "energia")]
    #[serde(rename = "energia")]
    Energy,
    /// General wellness
    #[sea_orm(string_value = "bienestar")]
    #[serde(rename = "bienestar")]
    Wellness,
}

/// Free-form benefit tags shown on the landing page (e.g. "Sin azúcar").
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct BenefitTags(pub Vec<String>);

/// Product database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Auto-increment id
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (e.g., "Colágeno Hidrolizado")
    pub name: String,
    /// Short tagline
    pub subtitle: Option<String>,
    /// Long description
    pub description: String,
    /// Catalog category
    pub category: ProductCategory,
    /// Authoritative unit price
    pub price: Decimal,
    /// Sellable units on hand, never negative
    pub stock: i32,
    /// Inactive products stay in the admin list but cannot be ordered
    pub active: bool,
    /// Product image
    pub image_url: Option<String>,
    /// Benefit tags, stored as JSON
    pub benefits: BenefitTags,
    /// Creation time (UTC)
    pub created_at: DateTimeUtc,
    /// Last edit (UTC)
    pub updated_at: DateTimeUtc,
}

/// Products hold no relations; orders look them up by id.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
