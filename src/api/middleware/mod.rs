//! HTTP middleware for request processing and protection.
//!
//! Provides session authentication, CORS, rate limiting, and observability middleware.

pub mod auth;
pub mod cors;
pub mod rate_limit;
pub mod tracing;
