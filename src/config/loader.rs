//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable holding `Access-Control-Allow-Origin`.
pub const ENV_ALLOW_ORIGIN: &str = "ALLOW_ORIGIN";
/// Environment variable holding `Access-Control-Allow-Credentials`.
pub const ENV_ALLOW_CREDENTIALS: &str = "ALLOW_CREDENTIALS";
/// Environment variable holding the listen port.
pub const ENV_PORT: &str = "PORT";

/// Fatal configuration error. The proxy must not start serving when one occurs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("Failed to build upstream client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let config = read_config(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Parse a TOML file without validating it.
///
/// Use this when overrides are applied before validation.
pub fn read_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Override CORS settings from the environment.
///
/// A variable that is set wins even when it is empty.
pub fn apply_env_overrides<F>(config: &mut ProxyConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(origin) = lookup(ENV_ALLOW_ORIGIN) {
        config.cors.allow_origin = origin;
    }
    if let Some(credentials) = lookup(ENV_ALLOW_CREDENTIALS) {
        config.cors.allow_credentials = credentials;
    }
}

/// Resolve the listen port: `--port` flag first, then `PORT`.
///
/// When neither is set the configured address is left alone.
pub fn apply_port_override(
    config: &mut ProxyConfig,
    port_flag: Option<&str>,
    env_port: Option<&str>,
) {
    let port = port_flag
        .filter(|p| !p.is_empty())
        .or_else(|| env_port.filter(|p| !p.is_empty()));

    if let Some(port) = port {
        config.listener.bind_address = with_port(&config.listener.bind_address, port);
    }
}

/// Replace the port of `bind_address`, keeping its host part.
fn with_port(bind_address: &str, port: &str) -> String {
    let port = port.strip_prefix(':').unwrap_or(port);
    let host = bind_address
        .rsplit_once(':')
        .map(|(host, _)| host)
        .filter(|host| !host.is_empty())
        .unwrap_or("0.0.0.0");
    format!("{}:{}", host, port)
}
