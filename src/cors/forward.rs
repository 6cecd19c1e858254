//! Forwarding a validated request to its target.
//!
//! # Data Flow
//! ```text
//! inbound parts + body
//!     → outbound_headers (strip hop-by-hop, Origin → target, Referer, XFF)
//!     → reqwest client (single attempt, redirects relayed, not followed)
//!     → relay (strip hop-by-hop, CorsPolicy::apply, stream body back)
//! ```

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, Request},
    response::Response,
};
use http_body_util::LengthLimitError;
use std::error::Error as _;
use std::net::IpAddr;
use std::time::Duration;

use crate::config::UpstreamConfig;
use crate::config::ConfigError;
use crate::cors::policy::CorsPolicy;
use crate::cors::validator::TargetDescriptor;
use crate::error::ProxyError;
use crate::security::headers::{append_forwarded_for, strip_hop_by_hop};

/// Build the outbound client.
pub fn build_client(config: &UpstreamConfig) -> Result<reqwest::Client, ConfigError> {
    let mut builder = reqwest::Client::builder().redirect(reqwest::redirect::Policy::none());

    if let Some(secs) = config.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    if let Some(secs) = config.connect_timeout_secs {
        builder = builder.connect_timeout(Duration::from_secs(secs));
    }
    if !config.system_proxy {
        builder = builder.no_proxy();
    }

    builder.build().map_err(ConfigError::HttpClient)
}

/// Forward `request` to `target` and relay the rewritten response.
///
/// The request body is buffered up to `max_body_size` bytes. Makes exactly
/// one attempt; any transport failure is returned as
/// [`ProxyError::UpstreamUnreachable`].
pub async fn forward(
    client: &reqwest::Client,
    policy: &CorsPolicy,
    target: &TargetDescriptor,
    request: Request<Body>,
    client_ip: Option<IpAddr>,
    max_body_size: usize,
) -> Result<Response, ProxyError> {
    let (parts, body) = request.into_parts();

    let body = axum::body::to_bytes(body, max_body_size)
        .await
        .map_err(body_error)?;

    let headers = outbound_headers(&parts.headers, target, client_ip);

    let mut outbound = client
        .request(parts.method, target.url().clone())
        .headers(headers);
    if !body.is_empty() {
        outbound = outbound.body(body);
    }

    let upstream = outbound
        .send()
        .await
        .map_err(ProxyError::UpstreamUnreachable)?;

    Ok(relay(upstream, policy))
}

/// Only the length limit is a 413; anything else is a broken upload.
fn body_error(err: axum::Error) -> ProxyError {
    let mut source = err.source();
    while let Some(cause) = source {
        if cause.is::<LengthLimitError>() {
            return ProxyError::BodyTooLarge;
        }
        source = cause.source();
    }
    ProxyError::BodyRead(err)
}

/// Derive the headers sent to the target from the inbound ones.
pub fn outbound_headers(
    inbound: &HeaderMap,
    target: &TargetDescriptor,
    client_ip: Option<IpAddr>,
) -> HeaderMap {
    let mut headers = inbound.clone();
    strip_hop_by_hop(&mut headers);

    // The client derives both from the target URL and the body.
    headers.remove(header::HOST);
    headers.remove(header::CONTENT_LENGTH);

    if let Ok(origin) = HeaderValue::from_str(&target.origin()) {
        headers.insert(header::ORIGIN, origin);
    }

    if let Some(referer) = target.referer() {
        headers.append(header::REFERER, referer.clone());
    }

    if let Some(ip) = client_ip {
        append_forwarded_for(&mut headers, ip);
    }

    headers
}

/// Turn the upstream response into the caller's response.
fn relay(upstream: reqwest::Response, policy: &CorsPolicy) -> Response {
    let status = upstream.status();
    let mut headers = upstream.headers().clone();
    strip_hop_by_hop(&mut headers);
    policy.apply(&mut headers);

    tracing::debug!(status = %status, "Relaying upstream response");

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
