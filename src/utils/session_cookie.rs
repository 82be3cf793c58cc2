//! Session token extraction from a raw `Cookie` header.

/// Cookie set by the identity provider over HTTPS.
pub const SECURE_SESSION_COOKIE: &str = "__Secure-better-auth.session_token";

/// Cookie set by the identity provider over plain HTTP.
pub const SESSION_COOKIE: &str = "better-auth.session_token";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionCookieError {
    #[error("no cookie header")]
    MissingHeader,
    #[error("session cookie not found")]
    MissingCookie,
}

/// Extracts the session token from a `Cookie` header.
///
/// The secure-prefixed cookie wins over the plain one. The value runs up to the
/// next `;` and is percent-decoded; if decoding fails the raw value is returned.
///
/// # Errors
///
/// - [`SessionCookieError::MissingHeader`] if the header is absent or empty
/// - [`SessionCookieError::MissingCookie`] if neither cookie is present
///
/// # Examples
///
/// ```
/// use zipway::utils::session_cookie::extract_session_token;
///
/// let header = "other=1; __Secure-better-auth.session_token=abc%2Edef; x=2";
/// assert_eq!(extract_session_token(Some(header)).unwrap(), "abc.def");
/// ```
pub fn extract_session_token(cookie_header: Option<&str>) -> Result<String, SessionCookieError> {
    let header = match cookie_header {
        Some(h) if !h.is_empty() => h,
        _ => return Err(SessionCookieError::MissingHeader),
    };

    let raw = cookie_value(header, SECURE_SESSION_COOKIE)
        .or_else(|| cookie_value(header, SESSION_COOKIE))
        .ok_or(SessionCookieError::MissingCookie)?;

    Ok(urlencoding::decode(raw)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| raw.to_string()))
}

/// Finds `name=` at a cookie boundary and returns the value up to the next `;`.
fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    let mut search_from = 0;

    while let Some(offset) = header[search_from..].find(name) {
        let start = search_from + offset;
        let after_name = start + name.len();
        let at_boundary = header[..start]
            .chars()
            .next_back()
            .is_none_or(|c| c == ';' || c == ' ');

        if at_boundary && header[after_name..].starts_with('=') {
            let value_start = after_name + 1;
            let value_end = header[value_start..]
                .find(';')
                .map_or(header.len(), |end| value_start + end);
            return Some(&header[value_start..value_end]);
        }

        search_from = after_name;
    }

    None
}
