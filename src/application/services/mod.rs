//! Business logic services for the application layer.

pub mod link_service;
pub mod session_validator;

pub use link_service::LinkService;
pub use session_validator::SessionValidator;
