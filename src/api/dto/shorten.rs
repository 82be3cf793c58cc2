//! DTOs for the link shortening endpoint.

use crate::domain::entities::Link;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::sync::LazyLock;
use url::Url;
use validator::{Validate, ValidationError};

/// Compiled regex for custom slug validation.
static SLUG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,64}$").unwrap());

/// Request to shorten a single URL.
#[derive(Debug, Deserialize, Validate)]
pub struct ShortenRequest {
    /// Absolute http(s) URL to redirect to.
    #[validate(length(max = 2048), custom(function = validate_http_url))]
    pub target_url: String,

    /// Optional custom slug. Empty means "generate one".
    #[serde(default)]
    #[validate(custom(function = validate_custom_slug))]
    pub custom_slug: Option<String>,
}

impl ShortenRequest {
    /// The custom slug, or `""` when one should be generated.
    pub fn slug(&self) -> &str {
        self.custom_slug.as_deref().unwrap_or_default()
    }
}

/// Response for a created link.
#[derive(Debug, Serialize)]
pub struct ShortenResponse {
    pub short_url: String,
    pub details: Link,
}

/// The URL parser drops tabs and newlines, so the raw string is checked as
/// well: it is stored and later sent verbatim as a `Location` header.
fn validate_http_url(value: &str) -> Result<(), ValidationError> {
    let valid = !value.chars().any(char::is_control)
        && Url::parse(value)
            .map(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
            .unwrap_or(false);

    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("url")
            .with_message(Cow::Borrowed("target_url must be an absolute http(s) URL")))
    }
}

fn validate_custom_slug(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || SLUG_REGEX.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::new("slug").with_message(Cow::Borrowed(
            "custom_slug may only contain letters, digits, '-' and '_' (max 64)",
        )))
    }
}
