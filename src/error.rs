//! Per-request error taxonomy.
//!
//! Every failure that can happen while handling a single request is a
//! [`ProxyError`]. They never escape the request's own task: the handler turns
//! them into a plain-text response (see `http::response`).

use axum::http::StatusCode;
use thiserror::Error;

/// Coarse classification of a [`ProxyError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller sent something we refuse to forward.
    BadRequest,
    /// The target could not be reached (DNS, connect, TLS, timeout).
    UpstreamUnreachable,
}

/// Errors raised while validating or forwarding one request.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Missing User-Agent header")]
    MissingUserAgent,

    #[error("Invalid URL")]
    InvalidUrl(#[source] url::ParseError),

    #[error("The URL scheme is neither HTTP nor HTTPS")]
    UnsupportedScheme(String),

    #[error("Invalid Referer")]
    InvalidReferer,

    #[error("Request body too large")]
    BodyTooLarge,

    #[error("Failed to read request body")]
    BodyRead(#[source] axum::Error),

    #[error("Upstream request failed")]
    UpstreamUnreachable(#[source] reqwest::Error),
}

impl ProxyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProxyError::UpstreamUnreachable(_) => ErrorKind::UpstreamUnreachable,
            _ => ErrorKind::BadRequest,
        }
    }

    /// HTTP status returned to the caller.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::BodyTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::UpstreamUnreachable(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Short label used for metrics and logs.
    pub fn reason(&self) -> &'static str {
        match self {
            ProxyError::MissingUserAgent => "missing_user_agent",
            ProxyError::InvalidUrl(_) => "invalid_url",
            ProxyError::UnsupportedScheme(_) => "unsupported_scheme",
            ProxyError::InvalidReferer => "invalid_referer",
            ProxyError::BodyTooLarge => "body_too_large",
            ProxyError::BodyRead(_) => "body_read_failed",
            ProxyError::UpstreamUnreachable(_) => "upstream_unreachable",
        }
    }
}
