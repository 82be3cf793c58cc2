//! Utility functions for slug handling and request parsing.
//!
//! - [`slug`] - Short ID generation and reserved slug checks
//! - [`session_cookie`] - Session token extraction from the `Cookie` header

pub mod session_cookie;
pub mod slug;
