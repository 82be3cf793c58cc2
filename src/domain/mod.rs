//! Domain layer containing business entities and storage ports.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Storage port trait definitions
//! - [`cache_entry`] - Cache key layout and cached payload formats
//!
//! The domain layer has no dependencies on infrastructure or presentation
//! layers. Business logic lives in [`crate::application::services`].

pub mod cache_entry;
pub mod entities;
pub mod repositories;
