//! Response-format negotiation.
//!
//! Decides per request whether the caller wants an HTML page or JSON, and
//! re-renders `AppError` responses as pages for browsers.

use std::convert::Infallible;

use axum::extract::{FromRequestParts, Request};
use axum::http::HeaderMap;
use axum::http::header::ACCEPT;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;

use crate::error::ErrorInfo;
use crate::views::Page;

/// What the client asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    #[default]
    Html,
    Json,
}

impl ResponseFormat {
    /// `X-Requested-With: XMLHttpRequest` selects JSON; otherwise the
    /// `Accept` header decides, with ties going to HTML.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let xhr = headers
            .get("x-requested-with")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("xmlhttprequest"));
        if xhr {
            return ResponseFormat::Json;
        }

        let accept = headers
            .get_all(ACCEPT)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect::<Vec<_>>()
            .join(",");
        if accept.trim().is_empty() {
            return ResponseFormat::Html;
        }

        let ranges = parse_accept(&accept);
        let html = quality(&ranges, "text", "html");
        let json = quality(&ranges, "application", "json");
        // Equal quality stays HTML whatever the header order; browsers list
        // both and must keep getting pages.
        if json > html {
            ResponseFormat::Json
        } else {
            ResponseFormat::Html
        }
    }

    pub fn is_json(self) -> bool {
        self == ResponseFormat::Json
    }
}

#[derive(Debug, PartialEq)]
struct MediaRange {
    kind: String,
    subtype: String,
    q: f32,
}

fn parse_accept(accept: &str) -> Vec<MediaRange> {
    accept
        .split(',')
        .filter_map(|entry| {
            let mut parts = entry.split(';');
            let media = parts.next()?.trim().to_ascii_lowercase();
            let (kind, subtype) = media.split_once('/')?;
            let q = parts
                .filter_map(|p| p.split_once('='))
                .find(|(k, _)| k.trim().eq_ignore_ascii_case("q"))
                .and_then(|(_, v)| v.trim().parse::<f32>().ok())
                .unwrap_or(1.0)
                .clamp(0.0, 1.0);
            Some(MediaRange {
                kind: kind.trim().to_string(),
                subtype: subtype.trim().to_string(),
                q,
            })
        })
        .collect()
}

/// Quality of `kind/subtype`, taken from the most specific matching range.
fn quality(ranges: &[MediaRange], kind: &str, subtype: &str) -> f32 {
    ranges
        .iter()
        .filter_map(|r| {
            let specificity = match (r.kind.as_str(), r.subtype.as_str()) {
                (k, s) if k == kind && s == subtype => 2,
                (k, "*") if k == kind => 1,
                ("*", "*") => 0,
                _ => return None,
            };
            Some((specificity, r.q))
        })
        .max_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)))
        .map(|(_, q)| q)
        .unwrap_or(0.0)
}

impl<S> FromRequestParts<S> for ResponseFormat
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<ResponseFormat>()
            .copied()
            .unwrap_or_else(|| ResponseFormat::from_headers(&parts.headers)))
    }
}

/// Axum middleware: records the negotiated format in request extensions and
/// turns error responses into pages for HTML clients.
pub async fn negotiate(mut request: Request, next: Next) -> Response {
    let format = ResponseFormat::from_headers(request.headers());
    request.extensions_mut().insert(format);

    let response = next.run(request).await;
    if format.is_json() {
        return response;
    }
    match response.extensions().get::<ErrorInfo>() {
        Some(info) => error_page(info),
        None => response,
    }
}

fn error_page(info: &ErrorInfo) -> Response {
    let title = match info.status.as_u16() {
        404 => "Page Not Found".to_string(),
        s if s >= 500 => "Server Error".to_string(),
        s => format!("Error {s}"),
    };
    Page::new(title)
        .status(info.status)
        .notice(info.message.clone())
        .render(ResponseFormat::Html)
}
