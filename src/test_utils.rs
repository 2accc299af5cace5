//! Shared test utilities for the storefront.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{
        order::{CheckoutForm, RequestMetadata},
        product::{self, ProductInput},
    },
    entities,
    errors::Result,
    integrations::notify::{NotifyError, Notifier, OrderSummary},
};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Routes `tracing` output to the test harness; safe to call from every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates an in-memory database with no tables.
///
/// Any query against it fails, so an operation that returns a validation
/// error here has provably not touched the store.
pub async fn setup_schemaless_db() -> Result<DatabaseConnection> {
    Ok(sea_orm::Database::connect("sqlite::memory:").await?)
}

/// Builds a product submission.
///
/// # Defaults
/// * `category`: "bienestar"
/// * `active`: true
pub fn product_input(name: &str, price: i64, stock: i32) -> ProductInput {
    ProductInput {
        name: name.to_string(),
        subtitle: None,
        description: format!("{name} de prueba"),
        category: "bienestar".to_string(),
        price: Decimal::from(price),
        stock,
        active: true,
        image_url: None,
        benefits: Vec::new(),
    }
}

/// Creates an active test product priced at 50000 with 10 units in stock.
pub async fn create_test_product(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::product::Model> {
    product::create_product(db, product_input(name, 50_000, 10)).await
}

/// Creates a test product with custom price, stock and active flag.
pub async fn create_custom_product(
    db: &DatabaseConnection,
    name: &str,
    price: i64,
    stock: i32,
    active: bool,
) -> Result<entities::product::Model> {
    let mut input = product_input(name, price, stock);
    input.active = active;
    product::create_product(db, input).await
}

/// A complete, valid checkout submission for `product_id`.
pub fn checkout_form(product_id: i64, quantity: i64) -> CheckoutForm {
    CheckoutForm {
        product_id: Some(product_id.into()),
        quantity: Some(quantity.into()),
        full_name: Some("Laura Gómez".to_string()),
        phone: Some("3001234567".to_string()),
        email: Some("laura@example.com".to_string()),
        document_id: None,
        country: None,
        city: Some("Medellín".to_string()),
        address: Some("Cra 43A # 1-50".to_string()),
        neighborhood: Some("El Poblado".to_string()),
        notes: None,
        fbclid: None,
    }
}

/// Request metadata as captured from a typical browser.
pub fn browser_metadata() -> RequestMetadata {
    RequestMetadata {
        client_ip: Some("203.0.113.7".to_string()),
        user_agent: Some("Mozilla/5.0 (test)".to_string()),
        fbclid: None,
        fbc: Some("fb.1.1700000000.abc".to_string()),
        fbp: Some("fb.1.1700000000.123".to_string()),
    }
}

/// Records every summary it receives.
#[derive(Default)]
pub struct RecordingNotifier {
    /// Summaries in delivery order
    pub sent: Mutex<Vec<OrderSummary>>,
}

impl Notifier for RecordingNotifier {
    async fn notify_order(&self, summary: &OrderSummary) -> std::result::Result<(), NotifyError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(summary.clone());
        }
        Ok(())
    }
}

/// Fails every send, as an unreachable SMTP relay would.
pub struct FailingNotifier;

impl Notifier for FailingNotifier {
    async fn notify_order(&self, _summary: &OrderSummary) -> std::result::Result<(), NotifyError> {
        Err(NotifyError::Build("smtp relay unreachable".to_string()))
    }
}
