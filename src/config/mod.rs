//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (ALLOW_ORIGIN / ALLOW_CREDENTIALS / PORT / --port overrides)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//! ```
//!
//! Config is read once at startup. An invalid value stops the process before
//! the listener is bound.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{ConfigError, load_config, read_config};
pub use schema::{
    CorsConfig, ListenerConfig, LogFormat, ObservabilityConfig, ProxyConfig, SecurityConfig,
    UpstreamConfig,
};
pub use validation::{ValidationError, validate_config};
