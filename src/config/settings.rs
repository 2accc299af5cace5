//! Process-wide settings read from the environment.
//!
//! `main` loads `.env` first (via `dotenvy`), then calls [`AppConfig::from_env`].
//! Optional collaborators (SMTP, ad-tracking) stay disabled when their variables
//! are absent; the admin session settings are mandatory.

use crate::config::database;
use crate::errors::{Error, Result};
use crate::integrations::conversions::ConversionConfig;
use crate::integrations::notify::EmailConfig;
use crate::web::session::SessionConfig;
use std::path::PathBuf;

/// Default listen address for the HTTP API.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Default location of the catalog seed file.
pub const DEFAULT_CATALOG_PATH: &str = "catalog.toml";

/// Process-wide settings, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `DATABASE_URL`
    pub database_url: String,
    /// `BIND_ADDR`
    pub bind_addr: String,
    /// `CATALOG_PATH`
    pub catalog_path: PathBuf,
    /// Admin session secret and password
    pub session: SessionConfig,
    /// `None` disables order notification emails.
    pub email: Option<EmailConfig>,
    /// Ad-platform conversions settings
    pub conversions: ConversionConfig,
}

impl AppConfig {
    /// Load the application configuration from environment variables.
    ///
    /// | Variable        | Required | Default          |
    /// |-----------------|----------|------------------|
    /// | `DATABASE_URL`  | no       | local `SQLite`   |
    /// | `BIND_ADDR`     | no       | `0.0.0.0:3000`   |
    /// | `CATALOG_PATH`  | no       | `catalog.toml`   |
    /// | `SESSION_SECRET`| **yes**  | --               |
    /// | `ADMIN_PASSWORD`| **yes**  | --               |
    ///
    /// # Errors
    /// Returns [`Error::Config`] when a mandatory variable is missing or empty.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: database::get_database_url(),
            bind_addr: std::env::var("BIND_ADDR")
                .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            catalog_path: std::env::var("CATALOG_PATH")
                .unwrap_or_else(|_| DEFAULT_CATALOG_PATH.to_string())
                .into(),
            session: SessionConfig::from_env()?,
            email: EmailConfig::from_env(),
            conversions: ConversionConfig::from_env(),
        })
    }
}

/// Reads a variable that must be present and non-empty.
pub(crate) fn required_var(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(Error::Config {
            message: format!("{name} must be set in the environment"),
        }),
    }
}

/// Reads an optional variable, treating blank values as unset.
pub(crate) fn optional_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_var_rejects_missing() {
        let result = required_var("STOREFRONT_TEST_SURELY_UNSET_VARIABLE");
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_optional_var_missing_is_none() {
        assert!(optional_var("STOREFRONT_TEST_SURELY_UNSET_VARIABLE").is_none());
    }
}
