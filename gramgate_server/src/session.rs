//! Cookie plumbing for the session context.
//!
//! The cookie carries only an opaque session id; credentials stay server-side
//! in the session store. Cookie attributes are part of the external contract:
//! http-only, secure, cross-site-sendable, 30-day max age, root path.

use axum::http::header::COOKIE;
use axum::http::HeaderMap;

pub const SESSION_COOKIE_NAME: &str = "gramgate_session";
pub const SESSION_MAX_AGE_SECS: u64 = 30 * 24 * 60 * 60;

pub fn session_cookie(session_id: &str) -> String {
    format!(
        "{SESSION_COOKIE_NAME}={session_id}; Path=/; HttpOnly; Secure; SameSite=None; Max-Age={SESSION_MAX_AGE_SECS}"
    )
}

pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; Secure; SameSite=None; Max-Age=0")
}

pub fn session_id(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(COOKIE)?.to_str().ok()?;
    for part in raw.split(';') {
        let mut pieces = part.trim().splitn(2, '=');
        let key = pieces.next()?.trim();
        let value = pieces.next()?.trim();
        if key == SESSION_COOKIE_NAME && !value.is_empty() {
            return Some(value.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn cookie_carries_the_contract_attributes() {
        let cookie = session_cookie("abc");
        assert!(cookie.starts_with("gramgate_session=abc;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=None"));
        assert!(cookie.contains("Max-Age=2592000"));
        assert!(cookie.contains("Path=/"));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        assert!(clear_session_cookie().contains("Max-Age=0"));
    }

    #[test]
    fn parses_session_id_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; gramgate_session=s-123; lang=en"),
        );
        assert_eq!(session_id(&headers), Some("s-123".to_string()));
    }

    #[test]
    fn missing_or_empty_cookie_yields_none() {
        assert_eq!(session_id(&HeaderMap::new()), None);

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("gramgate_session="));
        assert_eq!(session_id(&headers), None);
    }
}
