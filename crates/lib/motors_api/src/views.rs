//! Negotiated page output.
//!
//! Every page is a title, flash notices, field errors and a JSON view model.
//! JSON clients receive that model directly; browsers get a minimal HTML
//! shell with the model embedded (markup and styling live in the front end).

use axum::Json;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use serde::Serialize;
use serde_json::Value;

use crate::middleware::negotiate::ResponseFormat;

const SITE_NAME: &str = "CSE Motors";

/// Escape text for inclusion in HTML content or attribute values.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[derive(Debug, Serialize)]
struct PageJson<'a> {
    ok: bool,
    /// First error, else first notice.
    message: Option<&'a str>,
    title: &'a str,
    notices: &'a [String],
    errors: &'a [String],
    data: &'a Value,
}

/// A rendered page.
#[derive(Debug, Clone)]
pub struct Page {
    status: StatusCode,
    title: String,
    notices: Vec<String>,
    errors: Vec<String>,
    data: Value,
}

impl Page {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            title: title.into(),
            notices: Vec::new(),
            errors: Vec::new(),
            data: Value::Null,
        }
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn notices(mut self, notices: Vec<String>) -> Self {
        self.notices.extend(notices);
        self
    }

    pub fn notice(mut self, notice: impl Into<String>) -> Self {
        self.notices.push(notice.into());
        self
    }

    pub fn errors(mut self, errors: Vec<String>) -> Self {
        self.errors.extend(errors);
        self
    }

    /// Attach the view model. Serialization failures leave it null.
    pub fn data(mut self, data: impl Serialize) -> Self {
        self.data = match serde_json::to_value(data) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, title = %self.title, "view model did not serialize");
                Value::Null
            }
        };
        self
    }

    pub fn render(self, format: ResponseFormat) -> Response {
        match format {
            ResponseFormat::Json => self.render_json(),
            ResponseFormat::Html => self.render_html(),
        }
    }

    fn render_json(self) -> Response {
        let body = PageJson {
            ok: self.status.is_success(),
            message: self
                .errors
                .first()
                .or(self.notices.first())
                .map(String::as_str),
            title: &self.title,
            notices: &self.notices,
            errors: &self.errors,
            data: &self.data,
        };
        let json = serde_json::to_value(&body).unwrap_or(Value::Null);
        (self.status, Json(json)).into_response()
    }

    fn render_html(self) -> Response {
        let list = |class: &str, items: &[String]| {
            if items.is_empty() {
                return String::new();
            }
            let lis: String = items
                .iter()
                .map(|m| format!("<li>{}</li>", escape_html(m)))
                .collect();
            format!("<ul class=\"{class}\">{lis}</ul>")
        };
        let model = if self.data.is_null() {
            String::new()
        } else {
            let pretty = serde_json::to_string_pretty(&self.data).unwrap_or_default();
            format!("<pre class=\"view-model\">{}</pre>", escape_html(&pretty))
        };
        let title = escape_html(&self.title);
        let html = format!(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
             <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
             <title>{title} | {SITE_NAME}</title>\n</head>\n<body>\n<main>\n<h1>{title}</h1>\n\
             {notices}{errors}{model}\n</main>\n</body>\n</html>\n",
            notices = list("notice", &self.notices),
            errors = list("errors", &self.errors),
        );
        (self.status, Html(html)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[tokio::test]
    async fn html_escapes_user_text() {
        let response = Page::new("Hi <b>")
            .notice("<script>alert(1)</script>")
            .render(ResponseFormat::Html);
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("<title>Hi &lt;b&gt; | CSE Motors</title>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[tokio::test]
    async fn json_carries_model_and_status() {
        let response = Page::new("Login")
            .status(StatusCode::BAD_REQUEST)
            .errors(vec!["Email is required.".into()])
            .data(serde_json::json!({"account_email": "a@b.co"}))
            .render(ResponseFormat::Json);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["ok"], false);
        assert_eq!(json["message"], "Email is required.");
        assert_eq!(json["errors"][0], "Email is required.");
        assert_eq!(json["data"]["account_email"], "a@b.co");
    }
}
