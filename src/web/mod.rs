//! HTTP surface: public storefront API, checkout, and the session-gated admin API.

/// Session-gated order and product management
pub mod admin;
/// Checkout and conversion forwarding
pub mod checkout;
/// Request metadata capture for attribution
pub mod metadata;
/// Admin session issuing and verification
pub mod session;
/// Public catalog reads
pub mod storefront;

use crate::errors::{Error, Result};
use crate::integrations::{conversions::ConversionClient, notify::EmailNotifier};
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
};
use sea_orm::DatabaseConnection;
use serde_json::json;
use session::SessionConfig;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

/// Shared state handed to every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Pooled connection owned by `main`
    pub db: DatabaseConnection,
    /// Owner notification on new orders
    pub notifier: Arc<EmailNotifier>,
    /// Ad-platform conversions client
    pub conversions: Arc<ConversionClient>,
    /// Admin session signing key and password
    pub session: Arc<SessionConfig>,
}

/// Message shown when a request body is not the JSON a write endpoint expects.
pub const INVALID_BODY_MESSAGE: &str = "Solicitud inválida.";

/// A JSON body extraction that lets the handler answer a malformed payload itself.
pub type JsonBody<T> = std::result::Result<Json<T>, JsonRejection>;

/// Unwraps a [`JsonBody`], turning a rejected payload into a validation error.
///
/// # Errors
/// Returns [`Error::Validation`] with [`INVALID_BODY_MESSAGE`] when the body is
/// missing, not JSON, or does not fit `T`.
pub fn json_body<T>(body: JsonBody<T>) -> Result<T> {
    body.map(|Json(value)| value).map_err(|rejection| {
        debug!(%rejection, "Request body rejected");
        Error::validation(INVALID_BODY_MESSAGE)
    })
}

/// Builds the full application router.
pub fn build_router(state: AppState) -> Router {
    let admin_api = Router::new()
        .route("/orders", get(admin::list_orders))
        .route(
            "/orders/{id}",
            get(admin::get_order).delete(admin::delete_order),
        )
        .route("/orders/{id}/status", patch(admin::update_order_status))
        .route(
            "/products",
            get(admin::list_products).post(admin::create_product),
        )
        .route(
            "/products/{id}",
            put(admin::update_product).delete(admin::delete_product),
        )
        .route("/products/{id}/stock", patch(admin::set_product_stock));

    Router::new()
        .route("/health", get(health))
        .route("/api/products", get(storefront::list_products))
        .route("/api/products/{id}", get(storefront::get_product))
        .route("/api/checkout", post(checkout::checkout))
        .route("/api/conversions", post(checkout::forward_conversion))
        .route("/admin/login", post(admin::login))
        .route("/admin/logout", post(admin::logout))
        .nest("/admin/api", admin_api)
        .fallback(|| async { StatusCode::NOT_FOUND })
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let db_healthy = state.db.ping().await.is_ok();
    Json(json!({
        "status": if db_healthy { "ok" } else { "degraded" },
        "version": env!("CARGO_PKG_VERSION"),
        "db_healthy": db_healthy,
    }))
}

/// Read endpoints surface errors with a status code; mutations use [`crate::core::outcome::Outcome`].
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::ProductNotFound { .. } | Self::OrderNotFound { .. } => StatusCode::NOT_FOUND,
            Self::Validation { .. }
            | Self::InvalidStatus { .. }
            | Self::InvalidTransition { .. }
            | Self::ProductInactive { .. }
            | Self::InsufficientStock { .. } => StatusCode::BAD_REQUEST,
            Self::Config { .. } => StatusCode::SERVICE_UNAVAILABLE,
            _ => {
                error!(error = %self, "Request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "ok": false, "message": self.user_message() }))).into_response()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::integrations::conversions::ConversionConfig;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;

    pub const TEST_SECRET: &str = "test-session-secret";
    pub const TEST_PASSWORD: &str = "admin-pass";

    pub fn test_state(db: DatabaseConnection) -> AppState {
        AppState {
            db,
            notifier: Arc::new(EmailNotifier::new(None)),
            conversions: Arc::new(ConversionClient::new(ConversionConfig::default())),
            session: Arc::new(SessionConfig {
                secret: TEST_SECRET.to_string(),
                admin_password: TEST_PASSWORD.to_string(),
            }),
        }
    }

    /// A `Cookie` header value carrying a valid admin session.
    pub fn admin_cookie(state: &AppState) -> String {
        let token = session::issue_token(&state.session).unwrap();
        format!("{}={token}", session::SESSION_COOKIE)
    }

    pub fn json_request(method: &str, uri: &str, body: &serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }
}
