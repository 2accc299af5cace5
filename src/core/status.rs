//! Order status state machine.
//!
//! Fulfillment moves forward only: `nuevo → en_proceso → enviado → entregado`,
//! with `cancelado` reachable from every non-terminal state. Skipping forward
//! (e.g. `nuevo → enviado`) is allowed; moving backwards or leaving a terminal
//! state is not.

use crate::entities::OrderStatus;
use crate::errors::{Error, Result};
use std::fmt;
use std::str::FromStr;

impl OrderStatus {
    /// Every status in fulfillment order.
    pub const ALL: [Self; 5] = [
        Self::New,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// The stored slug for this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "nuevo",
            Self::Processing => "en_proceso",
            Self::Shipped => "enviado",
            Self::Delivered => "entregado",
            Self::Cancelled => "cancelado",
        }
    }

    /// `entregado` and `cancelado` allow no further change.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Position along the forward path; `None` for `cancelado`.
    const fn rank(self) -> Option<u8> {
        match self {
            Self::New => Some(0),
            Self::Processing => Some(1),
            Self::Shipped => Some(2),
            Self::Delivered => Some(3),
            Self::Cancelled => None,
        }
    }

    /// Whether `self → next` is an edge of the transition table.
    ///
    /// Staying in the same state is always accepted and treated as a no-op.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        if self == next {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        match (self.rank(), next.rank()) {
            (_, None) => true,
            (Some(from), Some(to)) => to > from,
            (None, Some(_)) => false,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| Error::InvalidStatus {
                value: value.to_string(),
            })
    }
}

/// Validates a requested status change against the transition table.
///
/// # Errors
/// Returns [`Error::InvalidTransition`] for edges the table does not contain.
pub fn check_transition(from: OrderStatus, to: OrderStatus) -> Result<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(Error::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_known_statuses() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_parse_rejects_unknown_status() {
        for raw in ["pendiente", "", "NUEVO", " nuevo", "en proceso"] {
            let err = raw.parse::<OrderStatus>().unwrap_err();
            assert!(matches!(err, Error::InvalidStatus { .. }), "{raw:?}");
        }
    }

    #[test]
    fn test_forward_path_is_allowed() {
        use OrderStatus::{Delivered, New, Processing, Shipped};
        assert!(New.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Delivered));
        assert!(New.can_transition_to(Shipped));
    }

    #[test]
    fn test_cancellation_from_non_terminal_states() {
        for status in [
            OrderStatus::New,
            OrderStatus::Processing,
            OrderStatus::Shipped,
        ] {
            assert!(status.can_transition_to(OrderStatus::Cancelled));
        }
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Cancelled));
    }

    #[test]
    fn test_terminal_states_and_backwards_moves_are_rejected() {
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::New));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Processing));
        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Processing));

        let err = check_transition(OrderStatus::Delivered, OrderStatus::New).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidTransition { ref from, ref to } if from == "entregado" && to == "nuevo"
        ));
    }

    #[test]
    fn test_same_state_is_a_no_op() {
        for status in OrderStatus::ALL {
            assert!(check_transition(status, status).is_ok());
        }
    }
}
