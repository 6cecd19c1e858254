//! Configuration validation.
//!
//! Serde handles the syntax; this module checks the values. Validation is a
//! pure function that reports every problem at once, and it runs before the
//! proxy binds its listener.

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::cors::policy;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Access-Control-Allow-Credentials can only be 'true' or 'false' (got '{0}')")]
    InvalidCredentials(String),

    #[error("allow_origin '{0}' is not a valid header value")]
    InvalidAllowOrigin(String),

    #[error("invalid bind address '{0}'")]
    InvalidBindAddress(String),

    #[error("invalid metrics address '{0}'")]
    InvalidMetricsAddress(String),

    #[error("max_body_size must be greater than zero")]
    ZeroBodyLimit,
}

/// Validate a loaded configuration, collecting all errors.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = policy::parse_credentials(&config.cors.allow_credentials) {
        errors.push(e);
    }
    if let Err(e) = policy::parse_allow_origin(&config.cors.allow_origin) {
        errors.push(e);
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
