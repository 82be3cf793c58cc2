//! Core domain entities representing the business data model.
//!
//! # Entity Types
//!
//! - [`Link`] - A shortened URL mapping with its access status
//! - [`SessionRecord`] - An active session read from the identity provider's store
//!
//! Creation input is kept separate from the persisted entity (`NewLink`), the
//! same way the store separates what callers supply from what it assigns.

pub mod link;
pub mod session;

pub use link::{Link, LinkStatus, NewLink, UnknownLinkStatus};
pub use session::{SessionRecord, session_id};
