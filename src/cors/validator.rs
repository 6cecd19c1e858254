//! Inbound request validation.
//!
//! Runs before any network call. A request is either a preflight, answered
//! locally, or a forward to a validated [`TargetDescriptor`].

use axum::http::{header, HeaderMap, HeaderValue, Method, Uri};
use url::{form_urlencoded, Url};

use crate::error::ProxyError;

/// Query parameter carrying the target URL.
pub const URL_PARAM: &str = "url";
/// Query parameter overriding the outbound `Referer`.
pub const REFERER_PARAM: &str = "referer";

/// What to do with an inbound request.
#[derive(Debug, Clone)]
pub enum Inbound {
    Preflight,
    Forward(TargetDescriptor),
}

/// A validated http(s) target plus the optional referer override.
#[derive(Debug, Clone)]
pub struct TargetDescriptor {
    url: Url,
    referer: Option<HeaderValue>,
}

impl TargetDescriptor {
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Always "http" or "https".
    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// `scheme://hostname`, without the port.
    pub fn origin(&self) -> String {
        format!("{}://{}", self.scheme(), self.host())
    }

    pub fn referer(&self) -> Option<&HeaderValue> {
        self.referer.as_ref()
    }
}

/// Classify and validate an inbound request.
pub fn classify(method: &Method, uri: &Uri, headers: &HeaderMap) -> Result<Inbound, ProxyError> {
    if *method == Method::OPTIONS {
        return Ok(Inbound::Preflight);
    }

    let user_agent = headers
        .get(header::USER_AGENT)
        .map(|v| v.as_bytes())
        .unwrap_or_default();
    if user_agent.is_empty() {
        return Err(ProxyError::MissingUserAgent);
    }

    let query = uri.query().unwrap_or_default();

    let referer = match query_param(query, REFERER_PARAM) {
        Some(value) => Some(HeaderValue::from_str(&value).map_err(|_| ProxyError::InvalidReferer)?),
        None => headers
            .get(header::REFERER)
            .filter(|v| !v.is_empty())
            .cloned(),
    };

    let url = parse_target(query_param(query, URL_PARAM).as_deref())?;

    Ok(Inbound::Forward(TargetDescriptor { url, referer }))
}

fn parse_target(raw: Option<&str>) -> Result<Url, ProxyError> {
    // An absent `url` has no scheme at all.
    let raw = match raw {
        Some(raw) => raw,
        None => return Err(ProxyError::UnsupportedScheme(String::new())),
    };

    let url = Url::parse(raw).map_err(ProxyError::InvalidUrl)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ProxyError::UnsupportedScheme(other.to_string())),
    }
}

/// Value of the first occurrence of `name` in a raw query string, or `None`
/// when that occurrence is empty.
fn query_param(query: &str, name: &str) -> Option<String> {
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}
