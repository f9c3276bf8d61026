//! Request handlers.

pub mod account;
pub mod favorites;
pub mod home;
pub mod inventory;

use axum::http::HeaderMap;
use axum::http::header::{HOST, REFERER};

/// `raw` if it is a same-site absolute path (`/x`, never `//x` or `/\x`).
pub fn local_path(raw: &str) -> Option<&str> {
    let raw = raw.trim();
    let ok = raw.starts_with('/')
        && !raw.starts_with("//")
        && !raw.starts_with("/\\")
        && !raw.chars().any(char::is_control);
    ok.then_some(raw)
}

/// The `Referer` as a local path when it points back at this host,
/// otherwise `fallback`.
pub fn back_or(headers: &HeaderMap, fallback: &str) -> String {
    let Some(referer) = headers.get(REFERER).and_then(|v| v.to_str().ok()) else {
        return fallback.to_string();
    };
    if let Some(path) = local_path(referer) {
        return path.to_string();
    }

    let host = headers.get(HOST).and_then(|v| v.to_str().ok());
    let same_host_path = host.and_then(|host| {
        ["https://", "http://"].into_iter().find_map(|scheme| {
            let rest = referer.strip_prefix(scheme)?.strip_prefix(host)?;
            if rest.is_empty() {
                Some("/")
            } else {
                local_path(rest)
            }
        })
    });
    same_host_path.unwrap_or(fallback).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(referer: &str, host: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(REFERER, HeaderValue::from_str(referer).unwrap());
        h.insert(HOST, HeaderValue::from_str(host).unwrap());
        h
    }

    #[test]
    fn local_paths_only() {
        assert_eq!(local_path("/inv/detail/3?x=1"), Some("/inv/detail/3?x=1"));
        assert_eq!(local_path("//evil.example/"), None);
        assert_eq!(local_path("/\\evil.example"), None);
        assert_eq!(local_path("https://evil.example/"), None);
        assert_eq!(local_path("account"), None);
    }

    #[test]
    fn referer_on_same_host_is_followed() {
        let h = headers("http://localhost:5500/inv/detail/3", "localhost:5500");
        assert_eq!(back_or(&h, "/"), "/inv/detail/3");
        let h = headers("https://localhost:5500", "localhost:5500");
        assert_eq!(back_or(&h, "/x"), "/");
    }

    #[test]
    fn foreign_referer_falls_back() {
        let h = headers("https://evil.example/inv/", "localhost:5500");
        assert_eq!(back_or(&h, "/account/favorites"), "/account/favorites");
        let h = headers("http://localhost:5500.evil.example/", "localhost:5500");
        assert_eq!(back_or(&h, "/"), "/");
        assert_eq!(back_or(&HeaderMap::new(), "/fallback"), "/fallback");
    }
}
