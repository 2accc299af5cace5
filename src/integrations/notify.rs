//! Order notification emails to the store owner.
//!
//! [`EmailNotifier`] sends a plain-text summary of each new order over SMTP with
//! `lettre`. Delivery is best-effort: callers wrap [`Notifier::notify_order`] in
//! [`crate::integrations::best_effort`] so a failed send never affects the order.

use crate::config::settings::optional_var;
use rust_decimal::Decimal;
use serde::Serialize;
use std::future::Future;
use tracing::{debug, info};

/// Error type for notification delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),
}

/// Everything the store owner needs to call the customer and dispatch the order.
#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    /// New order id
    pub order_id: i64,
    /// Ordered product id
    pub product_id: i64,
    /// Product name snapshot
    pub product_name: String,
    /// Units ordered
    pub quantity: i32,
    /// Price charged per unit
    pub unit_price: Decimal,
    /// Frozen order total
    pub total: Decimal,
    /// Shopper full name
    pub customer_name: String,
    /// Shopper phone
    pub phone: String,
    /// Shopper email, if given
    pub email: Option<String>,
    /// Delivery city
    pub city: String,
    /// Street address
    pub address: String,
    /// Neighborhood
    pub neighborhood: Option<String>,
    /// Delivery notes
    pub notes: Option<String>,
}

impl OrderSummary {
    /// Email subject line.
    #[must_use]
    pub fn subject(&self) -> String {
        format!("Nuevo pedido #{} - {}", self.order_id, self.product_name)
    }

    /// Plain-text email body with every field the owner needs to dispatch.
    #[must_use]
    pub fn body(&self) -> String {
        let optional = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
        format!(
            "Pedido #{id}\n\
             Producto: {product} (ID {product_id})\n\
             Cantidad: {qty}\n\
             Precio unitario: ${unit}\n\
             Total: ${total}\n\n\
             Cliente: {name}\n\
             Teléfono: {phone}\n\
             Email: {email}\n\
             Ciudad: {city}\n\
             Dirección: {address}\n\
             Barrio: {neighborhood}\n\
             Notas: {notes}\n",
            id = self.order_id,
            product = self.product_name,
            product_id = self.product_id,
            qty = self.quantity,
            unit = self.unit_price,
            total = self.total,
            name = self.customer_name,
            phone = self.phone,
            email = optional(&self.email),
            city = self.city,
            address = self.address,
            neighborhood = optional(&self.neighborhood),
            notes = optional(&self.notes),
        )
    }
}

/// Outbound notification collaborator for new orders.
pub trait Notifier: Send + Sync {
    /// Delivers one order summary to the store owner.
    ///
    /// # Errors
    /// Returns a [`NotifyError`] when the summary could not be delivered; callers
    /// only log it.
    fn notify_order(
        &self,
        summary: &OrderSummary,
    ) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "pedidos@tienda.local";

/// Configuration for the SMTP notifier.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// `SMTP_HOST`, relay with STARTTLS
    pub smtp_host: String,
    /// `SMTP_PORT`
    pub smtp_port: u16,
    /// Sender address
    pub from_address: String,
    /// Store owner inbox that receives order summaries.
    pub notify_address: String,
    /// Relay login; both user and password are needed to authenticate
    pub smtp_user: Option<String>,
    /// Relay password
    pub smtp_password: Option<String>,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` unless both `SMTP_HOST` and `NOTIFY_EMAIL` are set.
    ///
    /// | Variable        | Required | Default                 |
    /// |-----------------|----------|-------------------------|
    /// | `SMTP_HOST`     | yes      | --                      |
    /// | `NOTIFY_EMAIL`  | yes      | --                      |
    /// | `SMTP_PORT`     | no       | `587`                   |
    /// | `SMTP_FROM`     | no       | `pedidos@tienda.local`  |
    /// | `SMTP_USER`     | no       | --                      |
    /// | `SMTP_PASSWORD` | no       | --                      |
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let smtp_host = optional_var("SMTP_HOST")?;
        let notify_address = optional_var("NOTIFY_EMAIL")?;
        Some(Self {
            smtp_host,
            smtp_port: optional_var("SMTP_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: optional_var("SMTP_FROM")
                .unwrap_or_else(|| DEFAULT_FROM_ADDRESS.to_string()),
            notify_address,
            smtp_user: optional_var("SMTP_USER"),
            smtp_password: optional_var("SMTP_PASSWORD"),
        })
    }
}

/// Sends order summaries over SMTP, or does nothing when unconfigured.
#[derive(Debug, Clone)]
pub struct EmailNotifier {
    config: Option<EmailConfig>,
}

impl EmailNotifier {
    /// `None` builds a notifier that accepts and drops every summary.
    #[must_use]
    pub const fn new(config: Option<EmailConfig>) -> Self {
        Self { config }
    }

    /// Whether summaries are actually sent.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.config.is_some()
    }
}

impl Notifier for EmailNotifier {
    async fn notify_order(&self, summary: &OrderSummary) -> Result<(), NotifyError> {
        use lettre::{
            AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
            message::header::ContentType, transport::smtp::authentication::Credentials,
        };

        let Some(config) = &self.config else {
            debug!(order_id = summary.order_id, "Email notifications disabled; skipping");
            return Ok(());
        };

        let email = Message::builder()
            .from(config.from_address.parse()?)
            .to(config.notify_address.parse()?)
            .subject(summary.subject())
            .header(ContentType::TEXT_PLAIN)
            .body(summary.body())
            .map_err(|e| NotifyError::Build(e.to_string()))?;

        let mut transport_builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
                .port(config.smtp_port);

        if let (Some(user), Some(pass)) = (&config.smtp_user, &config.smtp_password) {
            transport_builder =
                transport_builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        transport_builder.build().send(email).await?;

        info!(order_id = summary.order_id, "Order notification email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn summary() -> OrderSummary {
        OrderSummary {
            order_id: 42,
            product_id: 7,
            product_name: "Colágeno".to_string(),
            quantity: 2,
            unit_price: Decimal::from(50_000),
            total: Decimal::from(100_000),
            customer_name: "Laura Gómez".to_string(),
            phone: "3001234567".to_string(),
            email: None,
            city: "Medellín".to_string(),
            address: "Cra 43A # 1-50".to_string(),
            neighborhood: None,
            notes: Some("Llamar antes".to_string()),
        }
    }

    #[test]
    fn test_summary_body_lists_order_details() {
        let body = summary().body();
        assert!(body.contains("Pedido #42"));
        assert!(body.contains("Cantidad: 2"));
        assert!(body.contains("Total: $100000"));
        assert!(body.contains("Email: -"));
        assert!(body.contains("Notas: Llamar antes"));
        assert_eq!(summary().subject(), "Nuevo pedido #42 - Colágeno");
    }

    #[tokio::test]
    async fn test_unconfigured_notifier_is_a_no_op() {
        let notifier = EmailNotifier::new(None);
        assert!(!notifier.is_enabled());
        assert!(notifier.notify_order(&summary()).await.is_ok());
    }

    #[tokio::test]
    async fn test_bad_sender_address_is_reported() {
        let notifier = EmailNotifier::new(Some(EmailConfig {
            smtp_host: "smtp.invalid".to_string(),
            smtp_port: DEFAULT_SMTP_PORT,
            from_address: "not-an-email".to_string(),
            notify_address: "owner@example.com".to_string(),
            smtp_user: None,
            smtp_password: None,
        }));
        let err = notifier.notify_order(&summary()).await.unwrap_err();
        assert!(matches!(err, NotifyError::Address(_)));
    }
}
