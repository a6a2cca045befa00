//! Bearer-token extraction.
//!
//! Transports hand the gateway whatever credential string they carry; this
//! helper peels the conventional `Bearer <token>` framing off an
//! `Authorization` header value. A missing header is simply `None` — the
//! gateway turns that into `Unauthenticated` at its checkpoint, keeping the
//! "no credential" / "bad credential" distinction in one place.

/// Extract the token from an `Authorization: Bearer <token>` header value.
///
/// Returns `None` for a missing header, a non-bearer scheme, or an empty
/// token.
pub fn bearer_from_header(header: Option<&str>) -> Option<&str> {
    let value = header?.trim();
    let rest = value.strip_prefix("Bearer ").or_else(|| value.strip_prefix("bearer "))?;
    let token = rest.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_token() {
        assert_eq!(bearer_from_header(Some("Bearer abc-123")), Some("abc-123"));
    }

    #[test]
    fn missing_header_is_none() {
        assert_eq!(bearer_from_header(None), None);
    }

    #[test]
    fn wrong_scheme_is_none() {
        assert_eq!(bearer_from_header(Some("Basic dXNlcjpwdw==")), None);
    }

    #[test]
    fn empty_token_is_none() {
        assert_eq!(bearer_from_header(Some("Bearer   ")), None);
    }
}
