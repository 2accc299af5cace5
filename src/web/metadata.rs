//! Attribution metadata captured from the incoming request.
//!
//! Everything here is best-effort: a header that is missing or unreadable simply
//! leaves the field empty, and extraction itself never rejects a request.

use crate::core::order::RequestMetadata;
use axum::extract::{ConnectInfo, FromRequestParts, Query};
use axum::http::{HeaderMap, request::Parts};
use axum_extra::extract::cookie::CookieJar;
use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// First `X-Forwarded-For` entry, else `X-Real-IP`, else the socket peer.
#[must_use]
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    header_str(headers, "x-forwarded-for")
        .and_then(|list| list.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .or_else(|| header_str(headers, "x-real-ip"))
        .map(ToString::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
}

/// Extractor wrapper around [`RequestMetadata`].
#[derive(Debug, Clone, Default)]
pub struct ClientMetadata(pub RequestMetadata);

impl<S> FromRequestParts<S> for ClientMetadata
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        let jar = CookieJar::from_headers(&parts.headers);
        let cookie = |name: &str| {
            jar.get(name)
                .map(|c| c.value().trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let fbclid = Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|Query(mut q)| q.remove("fbclid"))
            .filter(|v| !v.trim().is_empty());

        Ok(Self(RequestMetadata {
            client_ip: client_ip(&parts.headers, peer),
            user_agent: header_str(&parts.headers, "user-agent").map(ToString::to_string),
            fbclid,
            fbc: cookie("_fbc"),
            fbp: cookie("_fbp"),
        }))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> RequestMetadata {
        let (mut parts, ()) = request.into_parts();
        let ClientMetadata(meta) = ClientMetadata::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        meta
    }

    #[tokio::test]
    async fn test_forwarded_for_wins_over_real_ip() {
        let meta = extract(
            Request::post("/api/checkout?fbclid=abc123")
                .header("x-forwarded-for", "198.51.100.4, 10.0.0.1")
                .header("x-real-ip", "10.0.0.2")
                .header("user-agent", "Mozilla/5.0")
                .header("cookie", "_fbp=fb.1.2.3; _fbc=fb.1.2.abc123; other=x")
                .body(())
                .unwrap(),
        )
        .await;

        assert_eq!(meta.client_ip.as_deref(), Some("198.51.100.4"));
        assert_eq!(meta.user_agent.as_deref(), Some("Mozilla/5.0"));
        assert_eq!(meta.fbclid.as_deref(), Some("abc123"));
        assert_eq!(meta.fbp.as_deref(), Some("fb.1.2.3"));
        assert_eq!(meta.fbc.as_deref(), Some("fb.1.2.abc123"));
    }

    #[tokio::test]
    async fn test_falls_back_to_real_ip_then_peer() {
        let meta = extract(
            Request::post("/api/checkout")
                .header("x-real-ip", "10.0.0.2")
                .body(())
                .unwrap(),
        )
        .await;
        assert_eq!(meta.client_ip.as_deref(), Some("10.0.0.2"));

        let mut request = Request::post("/api/checkout").body(()).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 9], 4000))));
        assert_eq!(extract(request).await.client_ip.as_deref(), Some("192.0.2.9"));
    }

    #[tokio::test]
    async fn test_bare_request_yields_empty_metadata() {
        let meta = extract(Request::post("/api/checkout").body(()).unwrap()).await;
        assert_eq!(meta, RequestMetadata::default());
    }
}
