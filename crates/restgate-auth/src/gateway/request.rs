//! Request metadata seen by the gateway.

use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::header::USER_AGENT;
use axum::http::request::Parts;
use axum::http::{HeaderMap, Method, Uri};

/// Header naming the application a request authenticates against.
pub const APPLICATION_HEADER: &str = "auth-method";

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Borrowed view of an inbound request.
#[derive(Debug, Clone)]
pub struct RequestInfo<'a> {
    pub method: &'a Method,
    pub uri: &'a Uri,
    pub headers: &'a HeaderMap,
    pub client_ip: Option<String>,
}

impl<'a> RequestInfo<'a> {
    /// Builds the view from request parts. The client address comes from
    /// `ConnectInfo` when the server provides it, else from the first
    /// `X-Forwarded-For` hop.
    #[must_use]
    pub fn from_parts(parts: &'a Parts) -> Self {
        let client_ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .or_else(|| forwarded_for(&parts.headers));

        Self {
            method: &parts.method,
            uri: &parts.uri,
            headers: &parts.headers,
            client_ip,
        }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Path plus query string, as recorded in the audit log.
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        self.uri
            .path_and_query()
            .map_or_else(|| self.uri.path().to_string(), |pq| pq.as_str().to_string())
    }

    /// Returns `true` if the query string carries `name` as a key.
    #[must_use]
    pub fn has_query_param(&self, name: &str) -> bool {
        self.uri.query().is_some_and(|query| {
            query
                .split('&')
                .any(|pair| pair.split('=').next() == Some(name))
        })
    }

    /// Trimmed `auth-method` header. Present-but-blank yields `Some("")`.
    #[must_use]
    pub fn application_selector(&self) -> Option<&str> {
        self.headers
            .get(APPLICATION_HEADER)
            .map(|v| v.to_str().unwrap_or_default().trim())
    }

    #[must_use]
    pub fn user_agent(&self) -> Option<&str> {
        self.headers.get(USER_AGENT).and_then(|v| v.to_str().ok())
    }
}

fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    headers
        .get(FORWARDED_FOR)?
        .to_str()
        .ok()?
        .split(',')
        .next()
        .map(str::trim)
        .filter(|hop| !hop.is_empty())
        .map(str::to_string)
}
