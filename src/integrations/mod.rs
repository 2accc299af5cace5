//! Outbound collaborators: owner notification email and ad-platform conversions.

/// Server-side conversion events for the ad platform
pub mod conversions;
/// Order notification emails
pub mod notify;

use std::fmt::Display;
use std::future::Future;
use tracing::warn;

/// Runs a side effect whose failure must never fail the surrounding operation.
///
/// The future is awaited so its error can be observed and logged; the return
/// value only reports whether it succeeded.
pub async fn best_effort<F, E>(task: &'static str, effect: F) -> bool
where
    F: Future<Output = Result<(), E>>,
    E: Display,
{
    match effect.await {
        Ok(()) => true,
        Err(e) => {
            warn!(task, error = %e, "Best-effort task failed");
            false
        }
    }
}
