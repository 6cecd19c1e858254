//! CORS response headers.
//!
//! The policy is built once at startup and shared read-only by every request.

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::Response,
};

use crate::config::{CorsConfig, ValidationError};

/// Header every response must expose so MCP clients can read their session.
pub const MCP_SESSION_ID: &str = "Mcp-Session-Id";

pub const PREFLIGHT_ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS, PATCH, HEAD";
pub const PREFLIGHT_ALLOW_HEADERS: &str = "Content-Type, Authorization, X-Requested-With, Accept, Origin, Access-Control-Request-Method, Access-Control-Request-Headers, Mcp-Session-Id";
pub const PREFLIGHT_MAX_AGE: &str = "86400";

/// The `Access-Control-Allow-*` values stamped onto responses.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allow_origin: HeaderValue,
    allow_credentials: HeaderValue,
}

impl CorsPolicy {
    /// Build a policy, rejecting values that could never be sent.
    pub fn new(allow_origin: &str, allow_credentials: &str) -> Result<Self, ValidationError> {
        let allow_credentials = parse_credentials(allow_credentials)?;
        let allow_origin = parse_allow_origin(allow_origin)?;
        Ok(Self {
            allow_origin,
            allow_credentials,
        })
    }

    pub fn from_config(config: &CorsConfig) -> Result<Self, ValidationError> {
        Self::new(&config.allow_origin, &config.allow_credentials)
    }

    pub fn allow_origin(&self) -> &HeaderValue {
        &self.allow_origin
    }

    pub fn allow_credentials(&self) -> &HeaderValue {
        &self.allow_credentials
    }

    /// Answer a preflight request without touching any target.
    pub fn preflight_response(&self) -> Response {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::OK;

        let headers = response.headers_mut();
        self.stamp(headers);
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(PREFLIGHT_ALLOW_METHODS),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(PREFLIGHT_ALLOW_HEADERS),
        );
        headers.insert(
            header::ACCESS_CONTROL_MAX_AGE,
            HeaderValue::from_static(PREFLIGHT_MAX_AGE),
        );
        response
    }

    /// Overwrite Allow-Origin and Allow-Credentials, whatever was there.
    pub fn stamp(&self, headers: &mut HeaderMap) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, self.allow_origin.clone());
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
            self.allow_credentials.clone(),
        );
    }

    /// Rewrite the headers of a relayed upstream response.
    pub fn apply(&self, headers: &mut HeaderMap) {
        self.stamp(headers);

        let existing = headers
            .get(header::ACCESS_CONTROL_EXPOSE_HEADERS)
            .map(HeaderValue::as_bytes);

        if let Some(merged) = merge_expose_headers(existing) {
            headers.insert(header::ACCESS_CONTROL_EXPOSE_HEADERS, merged);
        }
    }
}

impl Default for CorsPolicy {
    /// Any origin, with credentials.
    fn default() -> Self {
        Self {
            allow_origin: HeaderValue::from_static("*"),
            allow_credentials: HeaderValue::from_static("true"),
        }
    }
}

/// Only the exact strings "true" and "false" are accepted.
pub fn parse_credentials(value: &str) -> Result<HeaderValue, ValidationError> {
    match value {
        "true" => Ok(HeaderValue::from_static("true")),
        "false" => Ok(HeaderValue::from_static("false")),
        other => Err(ValidationError::InvalidCredentials(other.to_string())),
    }
}

pub fn parse_allow_origin(value: &str) -> Result<HeaderValue, ValidationError> {
    HeaderValue::from_str(value).map_err(|_| ValidationError::InvalidAllowOrigin(value.to_string()))
}

/// Compute the new `Access-Control-Expose-Headers` value.
///
/// Works on the raw header bytes, so upstream values that are not UTF-8 are
/// kept as sent. Returns `None` when `Mcp-Session-Id` is already listed.
/// Entries are compared exactly after trimming, so `mcp-session-id` does not
/// count.
pub fn merge_expose_headers(existing: Option<&[u8]>) -> Option<HeaderValue> {
    let list = match existing {
        None | Some(b"") => return Some(HeaderValue::from_static(MCP_SESSION_ID)),
        Some(list) => list,
    };

    if list
        .split(|b| *b == b',')
        .any(|entry| entry.trim_ascii() == MCP_SESSION_ID.as_bytes())
    {
        return None;
    }

    let mut merged = Vec::with_capacity(list.len() + MCP_SESSION_ID.len() + 2);
    merged.extend_from_slice(list);
    merged.extend_from_slice(b", ");
    merged.extend_from_slice(MCP_SESSION_ID.as_bytes());

    // Appending visible ASCII to a valid value cannot fail.
    Some(HeaderValue::from_bytes(&merged).unwrap_or_else(|_| HeaderValue::from_static(MCP_SESSION_ID)))
}
