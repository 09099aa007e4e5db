//! HTTP middleware components.
//!
//! Middleware are functions that run around route handlers.
//! They can:
//! - Log requests
//! - Modify request/response
//! - Short-circuit requests

/// Request/response access log
pub mod request_log;
