//! DTOs for the public resolve endpoint.

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub target_url: String,
}
