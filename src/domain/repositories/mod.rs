//! Repository trait definitions for the domain layer.
//!
//! These traits are the storage ports consumed by the application services.
//! Concrete implementations live in `crate::infrastructure::persistence`;
//! mock implementations are generated via `mockall` for unit tests.
//!
//! # Available Repositories
//!
//! - [`LinkRepository`] - Link persistence, lookup and click counting
//! - [`SessionRepository`] - Read-only session validation

pub mod link_repository;
pub mod session_repository;

pub use link_repository::LinkRepository;
pub use session_repository::SessionRepository;

#[cfg(test)]
pub use link_repository::MockLinkRepository;
#[cfg(test)]
pub use session_repository::MockSessionRepository;
