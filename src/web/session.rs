//! Admin session: a signed, expiring credential kept in an HTTP-only cookie.
//!
//! Tokens are HS256 JWTs valid for [`SESSION_TTL_HOURS`]. Any admin handler that
//! takes an [`AdminSession`] argument is gated; a missing, expired or tampered
//! cookie redirects the browser to the login page instead of failing the request.

use crate::config::settings::required_var;
use crate::errors::Result;
use crate::web::AppState;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::Redirect;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "admin_session";

/// Where unauthenticated admin requests are sent.
pub const LOGIN_PATH: &str = "/admin/login";

/// Session lifetime in hours.
pub const SESSION_TTL_HOURS: i64 = 24;

const ADMIN_SUBJECT: &str = "admin";

/// Signing key and the shared admin password.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// HMAC secret used to sign and verify tokens.
    pub secret: String,
    /// The single administrator password.
    pub admin_password: String,
}

impl SessionConfig {
    /// | Variable         | Required |
    /// |------------------|----------|
    /// | `SESSION_SECRET` | **yes**  |
    /// | `ADMIN_PASSWORD` | **yes**  |
    ///
    /// # Errors
    /// Returns a configuration error when either variable is missing or blank.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            secret: required_var("SESSION_SECRET")?,
            admin_password: required_var("ADMIN_PASSWORD")?,
        })
    }

    /// Compares a submitted password with the configured one.
    ///
    /// Both sides are hashed first so the comparison takes the same time
    /// regardless of where the inputs differ or how long they are.
    #[must_use]
    pub fn password_matches(&self, candidate: &str) -> bool {
        let submitted = Sha256::digest(candidate.as_bytes());
        let expected = Sha256::digest(self.admin_password.as_bytes());
        let difference = submitted
            .iter()
            .zip(expected.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b));
        difference == 0 && !candidate.is_empty()
    }
}

/// JWT payload of an admin session.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Always `admin`
    pub sub: String,
    /// Issued at, unix seconds
    pub iat: i64,
    /// Expiry, unix seconds
    pub exp: i64,
}

/// Signs a new admin session token.
///
/// # Errors
/// Returns [`crate::errors::Error::Token`] if encoding fails.
pub fn issue_token(config: &SessionConfig) -> Result<String> {
    let now = chrono::Utc::now().timestamp();
    let claims = SessionClaims {
        sub: ADMIN_SUBJECT.to_string(),
        iat: now,
        exp: now + SESSION_TTL_HOURS * 3600,
    };
    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )?)
}

/// Checks signature and expiry, returning the embedded claims.
///
/// # Errors
/// Returns [`crate::errors::Error::Token`] for a malformed, tampered or expired token.
pub fn verify_token(token: &str, config: &SessionConfig) -> Result<SessionClaims> {
    let data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

/// The session cookie for a freshly issued token.
#[must_use]
pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

/// A cookie that, once removed from the jar, clears the session in the browser.
#[must_use]
pub fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}

/// Proof that the request carries a valid admin session.
#[derive(Debug, Clone, Copy)]
pub struct AdminSession;

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = Redirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let Some(cookie) = jar.get(SESSION_COOKIE) else {
            debug!(path = %parts.uri.path(), "No admin session cookie");
            return Err(Redirect::to(LOGIN_PATH));
        };

        match verify_token(cookie.value(), &state.session) {
            Ok(_) => Ok(Self),
            Err(e) => {
                debug!(path = %parts.uri.path(), error = %e, "Rejected admin session");
                Err(Redirect::to(LOGIN_PATH))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn config(secret: &str) -> SessionConfig {
        SessionConfig {
            secret: secret.to_string(),
            admin_password: "hunter2".to_string(),
        }
    }

    #[test]
    fn test_token_round_trip_expires_in_a_day() {
        let token = issue_token(&config("s3cret")).unwrap();
        let claims = verify_token(&token, &config("s3cret")).unwrap();
        assert_eq!(claims.sub, ADMIN_SUBJECT);
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let token = issue_token(&config("s3cret")).unwrap();
        assert!(verify_token(&token, &config("other")).is_err());
        assert!(verify_token("not.a.token", &config("s3cret")).is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let cfg = config("s3cret");
        let past = chrono::Utc::now().timestamp() - 2 * SESSION_TTL_HOURS * 3600;
        let claims = SessionClaims {
            sub: ADMIN_SUBJECT.to_string(),
            iat: past,
            exp: past + SESSION_TTL_HOURS * 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(cfg.secret.as_bytes()),
        )
        .unwrap();
        assert!(verify_token(&token, &cfg).is_err());
    }

    #[test]
    fn test_password_check() {
        let cfg = config("s3cret");
        assert!(cfg.password_matches("hunter2"));
        assert!(!cfg.password_matches("hunter3"));
        assert!(!cfg.password_matches(""));
        assert!(!cfg.password_matches("hunter22"));
        assert!(!cfg.password_matches("HUNTER2"));

        let blank = SessionConfig {
            secret: "s3cret".to_string(),
            admin_password: String::new(),
        };
        assert!(!blank.password_matches(""));
    }

    #[test]
    fn test_session_cookie_is_http_only() {
        let cookie = session_cookie("abc".to_string());
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
    }
}
