//! Session cookie helpers

use axum::http::{
    header::{InvalidHeaderValue, COOKIE},
    HeaderMap, HeaderValue,
};

/// Finds a cookie by name across every `Cookie` header on the request.
///
/// Empty values are treated as absent.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

/// Build an `HttpOnly` cookie carrying a session token.
pub fn session_cookie(
    name: &str,
    token: &str,
    max_age_seconds: i64,
    secure: bool,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie =
        format!("{name}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_seconds}");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Build the expired counterpart of [`session_cookie`] used on logout.
pub fn clear_cookie(name: &str, secure: bool) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{name}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_cookie_finds_named_value() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, "theme=dark; seller_access=abc.def.ghi".parse().unwrap());
        assert_eq!(
            read_cookie(&headers, "seller_access"),
            Some("abc.def.ghi".to_string())
        );
        assert_eq!(read_cookie(&headers, "admin_access"), None);
    }

    #[test]
    fn read_cookie_scans_multiple_headers() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, "a=1".parse().unwrap());
        headers.append(COOKIE, "admin_access=tok".parse().unwrap());
        assert_eq!(read_cookie(&headers, "admin_access"), Some("tok".to_string()));
    }

    #[test]
    fn read_cookie_ignores_empty_and_prefix_matches() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, "seller_access=; seller_access_old=x".parse().unwrap());
        assert_eq!(read_cookie(&headers, "seller_access"), None);
    }

    #[test]
    fn session_cookie_flags() {
        let cookie = session_cookie("seller_access", "tok", 3600, true).unwrap();
        let cookie = cookie.to_str().unwrap();
        assert!(cookie.starts_with("seller_access=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=3600"));
        assert!(cookie.ends_with("; Secure"));

        let cleared = clear_cookie("seller_access", false).unwrap();
        assert_eq!(
            cleared.to_str().unwrap(),
            "seller_access=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"
        );
    }
}
