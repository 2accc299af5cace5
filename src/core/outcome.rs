//! The `{ok, ...}` result shape returned to the storefront and admin UI.

use crate::{entities::OrderStatus, errors::Result};
use serde::Serialize;
use tracing::{error, info};

/// Success flag plus either the operation's data or a short user message.
#[derive(Debug, Serialize)]
pub struct Outcome<T> {
    /// Whether the operation succeeded
    pub ok: bool,
    /// Operation payload, flattened into the object on success
    #[serde(flatten)]
    pub data: Option<T>,
    /// User-facing reason on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> Outcome<T> {
    /// Converts an operation result, logging the underlying cause of failures.
    ///
    /// Infrastructure failures are logged at `error` with full detail and surface
    /// only the generic message; rejected requests are logged at `info`.
    pub fn from_result(operation: &'static str, result: Result<T>) -> Self {
        match result {
            Ok(data) => Self {
                ok: true,
                data: Some(data),
                message: None,
            },
            Err(e) => {
                if e.is_infrastructure() {
                    error!(operation, error = %e, "Operation failed");
                } else {
                    info!(operation, reason = %e, "Operation rejected");
                }
                Self {
                    ok: false,
                    data: None,
                    message: Some(e.user_message()),
                }
            }
        }
    }
}

/// Payload of a successful checkout.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreated {
    /// Id of the new order
    pub order_id: i64,
}

/// Payload of a status change.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct StatusChanged {
    /// Order id
    pub id: i64,
    /// Status after the change
    pub status: OrderStatus,
}

/// No payload beyond `ok`.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Done {}
