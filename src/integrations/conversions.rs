//! Server-side conversion events for the ad platform.
//!
//! Customer identifiers are normalised (trimmed, lowercased) and SHA-256 hashed
//! before they leave the process. The platform's JSON acknowledgment is passed
//! back untouched.

use crate::config::settings::optional_var;
use crate::errors::{Error, Result};
use serde::Deserialize;
use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

const DEFAULT_API_BASE: &str = "https://graph.facebook.com";
const DEFAULT_API_VERSION: &str = "v18.0";

/// Settings for the conversions endpoint. Both ids are required to send anything.
#[derive(Debug, Clone, Default)]
pub struct ConversionConfig {
    /// `META_PIXEL_ID`
    pub pixel_id: Option<String>,
    /// `META_ACCESS_TOKEN`
    pub access_token: Option<String>,
    /// Routes events to the platform's test console when set
    pub test_event_code: Option<String>,
    /// Graph API origin
    pub api_base: String,
    /// Graph API version segment, e.g. `v18.0`
    pub api_version: String,
}

impl ConversionConfig {
    /// | Variable               | Default                       |
    /// |------------------------|-------------------------------|
    /// | `META_PIXEL_ID`        | --                            |
    /// | `META_ACCESS_TOKEN`    | --                            |
    /// | `META_TEST_EVENT_CODE` | --                            |
    /// | `META_API_BASE`        | `https://graph.facebook.com`  |
    /// | `META_API_VERSION`     | `v18.0`                       |
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            pixel_id: optional_var("META_PIXEL_ID"),
            access_token: optional_var("META_ACCESS_TOKEN"),
            test_event_code: optional_var("META_TEST_EVENT_CODE"),
            api_base: optional_var("META_API_BASE")
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            api_version: optional_var("META_API_VERSION")
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
        }
    }
}

/// A conversion reported by the storefront, merged with request metadata.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConversionEvent {
    /// Platform event name, e.g. `Lead` or `Purchase`
    pub event_name: String,
    /// Deduplication id shared with the browser pixel
    #[serde(default)]
    pub event_id: Option<String>,
    /// Page where the event happened
    #[serde(default)]
    pub event_source_url: Option<String>,
    /// Raw email; hashed before sending
    #[serde(default)]
    pub email: Option<String>,
    /// Raw phone; hashed before sending
    #[serde(default)]
    pub phone: Option<String>,
    /// `_fbc` click cookie
    #[serde(default)]
    pub fbc: Option<String>,
    /// `_fbp` browser cookie
    #[serde(default)]
    pub fbp: Option<String>,
    /// Shopper address
    #[serde(default)]
    pub client_ip: Option<String>,
    /// Shopper browser
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Passed through untouched (value, currency, ...)
    #[serde(default)]
    pub custom_data: Option<Value>,
}

/// Lowercase-trims an identifier and returns its SHA-256 hex digest.
///
/// Blank input yields `None` so empty fields are omitted rather than hashed.
#[must_use]
pub fn hash_identifier(raw: &str) -> Option<String> {
    let normalized = raw.trim().to_lowercase();
    if normalized.is_empty() {
        return None;
    }
    Some(hex::encode(Sha256::digest(normalized.as_bytes())))
}

/// Builds the request body for one event.
#[must_use]
pub fn build_payload(event: &ConversionEvent, event_time: i64, test_event_code: Option<&str>) -> Value {
    let mut user_data = serde_json::Map::new();
    if let Some(em) = event.email.as_deref().and_then(hash_identifier) {
        user_data.insert("em".to_string(), json!([em]));
    }
    if let Some(ph) = event.phone.as_deref().and_then(hash_identifier) {
        user_data.insert("ph".to_string(), json!([ph]));
    }
    let passthrough = [
        ("fbc", &event.fbc),
        ("fbp", &event.fbp),
        ("client_ip_address", &event.client_ip),
        ("client_user_agent", &event.user_agent),
    ];
    for (key, value) in passthrough {
        if let Some(v) = value {
            user_data.insert(key.to_string(), json!(v));
        }
    }

    let mut data = json!({
        "event_name": event.event_name,
        "event_time": event_time,
        "action_source": "website",
        "user_data": user_data,
    });
    if let Some(id) = &event.event_id {
        data["event_id"] = json!(id);
    }
    if let Some(url) = &event.event_source_url {
        data["event_source_url"] = json!(url);
    }
    if let Some(custom) = &event.custom_data {
        data["custom_data"] = custom.clone();
    }

    let mut payload = json!({ "data": [data] });
    if let Some(code) = test_event_code {
        payload["test_event_code"] = json!(code);
    }
    payload
}

/// HTTP client for the conversions endpoint.
#[derive(Debug, Clone)]
pub struct ConversionClient {
    http: reqwest::Client,
    config: ConversionConfig,
}

impl ConversionClient {
    /// Builds a client with its own connection pool.
    #[must_use]
    pub fn new(config: ConversionConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Sends one event and returns the platform's acknowledgment verbatim.
    ///
    /// # Errors
    /// Returns [`Error::Config`] without any network call when the pixel id or
    /// access token is missing, and [`Error::Http`] on transport failures.
    #[instrument(skip(self, event), fields(event_name = %event.event_name))]
    pub async fn send(&self, event: &ConversionEvent) -> Result<Value> {
        let (Some(pixel_id), Some(access_token)) =
            (&self.config.pixel_id, &self.config.access_token)
        else {
            return Err(Error::Config {
                message: "Conversion API credentials are not configured".to_string(),
            });
        };
        if event.event_name.trim().is_empty() {
            return Err(Error::validation("Evento requerido."));
        }

        let url = format!(
            "{}/{}/{}/events",
            self.config.api_base.trim_end_matches('/'),
            self.config.api_version,
            pixel_id
        );
        let payload = build_payload(
            event,
            chrono::Utc::now().timestamp(),
            self.config.test_event_code.as_deref(),
        );
        debug!(%url, "Posting conversion event");

        let response = self
            .http
            .post(&url)
            .query(&[("access_token", access_token)])
            .json(&payload)
            .send()
            .await?;
        let status = response.status();
        let body: Value = response.json().await?;

        info!(%status, "Conversion event forwarded");
        Ok(body)
    }
}
