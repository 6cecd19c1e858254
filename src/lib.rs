//! PanCORS: a reverse proxy that adds CORS headers to any response.
//!
//! `GET /?url=https://api.example/data` fetches the target on the caller's
//! behalf and relays the response with `Access-Control-Allow-*` headers, so
//! browser code can read resources from hosts that do not send CORS headers.

pub mod config;
pub mod cors;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::schema::ProxyConfig;
pub use cors::CorsPolicy;
pub use error::{ErrorKind, ProxyError};
pub use http::{cors_proxy_router, HttpServer};
pub use lifecycle::Shutdown;
