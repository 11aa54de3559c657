//! Observability for the subscription service.
//!
//! # Features
//! - Tracing subscriber setup with JSON or pretty output
//! - HTTP middleware that logs every request/response pair with a request id

pub mod init;
pub mod middleware;

pub use init::*;
pub use middleware::*;

// Re-export tracing for convenience
pub use tracing::{debug, error, info, warn, Span};
