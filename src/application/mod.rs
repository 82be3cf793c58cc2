//! Application layer services implementing business logic.
//!
//! Services consume the repository and cache ports and hand their detached
//! side effects to [`background::BackgroundTasks`].
//!
//! # Available Services
//!
//! - [`services::link_service::LinkService`] - Short link creation and cache-aside resolution
//! - [`services::session_validator::SessionValidator`] - Layered session token validation

pub mod background;
pub mod services;
