//! CORS proxy core.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → validator.rs (preflight? User-Agent, url, referer)
//!         ├─ Preflight → policy.rs answers 200 directly
//!         ├─ Err(ProxyError) → 400 with plain-text body
//!         └─ Forward(target)
//!             → forward.rs (outbound fetch)
//!             → policy.rs (rewrite Allow-* and Expose-Headers)
//!             → relay to caller
//! ```
//!
//! No request state is shared between requests; only the `CorsPolicy` and the
//! outbound client are, and both are read-only.

pub mod forward;
pub mod policy;
pub mod validator;

pub use policy::CorsPolicy;
pub use validator::{classify, Inbound, TargetDescriptor};
