//! Unified error type for the storefront.
//!
//! Every operation returns [`Result`]. Variants fall into the same classes the
//! checkout and back-office flows care about: validation, not-found, business
//! rule, configuration and infrastructure. [`Error::user_message`] turns any of
//! them into the short message shown to shoppers and administrators.

use thiserror::Error;

/// Message returned for any failure whose detail must stay server-side.
pub const GENERIC_FAILURE_MESSAGE: &str = "Error del servidor. Intenta de nuevo.";

/// Every failure an operation can report.
#[derive(Debug, Error)]
pub enum Error {
    /// A submitted field is missing or malformed.
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// The requested status string is outside the fixed status set.
    #[error("Invalid order status: {value}")]
    InvalidStatus { value: String },

    /// The status change is not an edge of the transition table.
    #[error("Illegal status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// No product row has this id.
    #[error("Product not found: {id}")]
    ProductNotFound { id: i64 },

    /// The product exists but is hidden from the storefront.
    #[error("Product is not available for sale: {id}")]
    ProductInactive { id: i64 },

    /// No order row has this id.
    #[error("Order not found: {id}")]
    OrderNotFound { id: i64 },

    /// The requested quantity exceeds the units on hand.
    #[error("Insufficient stock: available {available}, requested {requested}")]
    InsufficientStock { available: i32, requested: i32 },

    /// A collaborator was invoked without the settings it needs.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Store failure reported by SeaORM.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Filesystem failure, e.g. reading the catalog or creating the data directory.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Outbound request to the conversions API failed.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Session token could not be signed or verified.
    #[error("Session token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

impl Error {
    /// Shorthand for a [`Error::Validation`] carrying a user-facing message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Whether the failure comes from infrastructure rather than the request itself.
    #[must_use]
    pub const fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            Self::Database(_)
                | Self::Io(_)
                | Self::Http(_)
                | Self::Token(_)
        )
    }

    /// Short, human-readable message without internal detail.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { message } => message.clone(),
            Self::InvalidStatus { .. } => "Estado inválido.".to_string(),
            Self::InvalidTransition { .. } => "Transición de estado no permitida.".to_string(),
            Self::ProductNotFound { .. } => "Producto no encontrado.".to_string(),
            Self::ProductInactive { .. } => "Producto no disponible.".to_string(),
            Self::OrderNotFound { .. } => "Orden no encontrada".to_string(),
            Self::InsufficientStock { .. } => "Stock insuficiente.".to_string(),
            Self::Config { .. } => "Servicio no configurado.".to_string(),
            Self::Database(_)
            | Self::Io(_)
            | Self::Http(_)
            | Self::Token(_) => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_distinguish_causes() {
        assert_eq!(
            Error::InsufficientStock {
                available: 1,
                requested: 3
            }
            .user_message(),
            "Stock insuficiente."
        );
        assert_eq!(
            Error::OrderNotFound { id: 999 }.user_message(),
            "Orden no encontrada"
        );
        assert_eq!(
            Error::InvalidStatus {
                value: "pendiente".to_string()
            }
            .user_message(),
            "Estado inválido."
        );
        assert_eq!(
            Error::validation("Dirección requerida.").user_message(),
            "Dirección requerida."
        );
    }

    #[test]
    fn test_infrastructure_errors_hide_detail() {
        let err = Error::Database(sea_orm::DbErr::Custom("disk I/O error at page 42".into()));
        assert!(err.is_infrastructure());
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
        assert!(!err.user_message().contains("42"));

        assert!(!Error::ProductInactive { id: 1 }.is_infrastructure());
    }
}
