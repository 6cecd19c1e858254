//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → cors::validator (User-Agent, url scheme, referer)
//!     → cors::forward body limit (reject oversized bodies with 413)
//!     → headers.rs (strip hop-by-hop, add X-Forwarded-For)
//!     → Forward to target
//! ```
//!
//! Fail closed: nothing is sent upstream until validation passes.

pub mod headers;
