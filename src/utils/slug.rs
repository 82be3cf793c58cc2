//! Short ID generation and reserved slug checks.

use uuid::Uuid;

/// Length of a generated short ID.
pub const GENERATED_SHORT_ID_LEN: usize = 6;

/// Slugs that collide with service routes and can never be claimed.
const RESERVED_SLUGS: &[&str] = &[
    "api",
    "swagger",
    "shorten",
    "admin",
    "health",
    "metrics",
    "docs",
    "static",
    "assets",
    "favicon.ico",
];

/// Generates a fresh link identifier and the public short ID derived from it.
///
/// The short ID is the first [`GENERATED_SHORT_ID_LEN`] characters of a random
/// UUID. Collisions are possible and are caught by the store's uniqueness
/// constraint, not checked here.
pub fn generate_link_id() -> (String, String) {
    let id = Uuid::new_v4().to_string();
    let short_id = id[..GENERATED_SHORT_ID_LEN].to_string();
    (id, short_id)
}

/// Generates a primary key for a link whose slug is supplied by the caller.
pub fn generate_row_id() -> String {
    Uuid::new_v4().to_string()
}

/// Returns true if `slug` is reserved, ignoring ASCII case.
pub fn is_reserved_slug(slug: &str) -> bool {
    RESERVED_SLUGS
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(slug))
}
