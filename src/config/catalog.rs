//! Catalog seed loading from catalog.toml
//!
//! The products defined in the catalog file are inserted on first run, when the
//! products table is still empty. Afterwards the catalog is managed through the
//! admin API and the file is ignored.

use crate::entities::ProductCategory;
use crate::errors::{Error, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire catalog.toml file
#[derive(Debug, Deserialize)]
pub struct CatalogConfig {
    /// Products to seed
    #[serde(default)]
    pub products: Vec<ProductSeed>,
}

/// A single seeded product
#[derive(Debug, Deserialize, Clone)]
pub struct ProductSeed {
    /// Display name; also the key used to skip duplicates
    pub name: String,
    /// Short tagline under the name
    #[serde(default)]
    pub subtitle: Option<String>,
    /// Long description
    #[serde(default)]
    pub description: String,
    /// One of the fixed catalog categories
    pub category: ProductCategory,
    /// Unit price
    pub price: Decimal,
    /// Initial units on hand
    pub stock: i32,
    /// Visible on the storefront (default `true`)
    #[serde(default = "default_active")]
    pub active: bool,
    /// Product image
    #[serde(default)]
    pub image_url: Option<String>,
    /// Benefit tags
    #[serde(default)]
    pub benefits: Vec<String>,
}

const fn default_active() -> bool {
    true
}

/// Loads the catalog seed from a TOML file.
///
/// Returns `Ok(None)` when the file does not exist, since seeding is optional.
///
/// # Errors
/// Returns an error if the file exists but cannot be read or its TOML is invalid.
pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<Option<CatalogConfig>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(path)?;
    toml::from_str(&contents)
        .map(Some)
        .map_err(|e| Error::Config {
            message: format!("Failed to parse catalog file {}: {e}", path.display()),
        })
}
