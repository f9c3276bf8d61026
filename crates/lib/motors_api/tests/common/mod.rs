//! Shared helpers: an in-memory app and request builders.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{Request, Response};
use motors_api::config::{ApiConfig, AuthConfig};
use motors_api::services::auth;
use motors_api::{AppState, router};
use motors_core::models::{Account, Role};
use motors_core::store::MemoryStore;
use motors_core::validation::Registration;
use tower::ServiceExt;

pub const SECRET: &str = "integration-test-secret";
pub const PASSWORD: &str = "I@mABas1cCl!3nt";

pub struct TestApp {
    pub app: Router,
    pub store: Arc<MemoryStore>,
    pub state: AppState,
}

pub fn test_app() -> TestApp {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let store = Arc::new(MemoryStore::seeded());
    let config = ApiConfig {
        auth: AuthConfig::with_secret(SECRET),
        ..ApiConfig::default()
    };
    let state = AppState::new(Arc::clone(&store), config);
    TestApp {
        app: router(state.clone()),
        store,
        state,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.expect("request")
    }

    /// Registers an account with `role` and returns it with a signed token.
    pub async fn account(&self, email: &str, role: Role) -> (Account, String) {
        let mut account = auth::register(
            self.store.as_ref(),
            &Registration {
                firstname: "Test".into(),
                lastname: "User".into(),
                email: email.into(),
                password: PASSWORD.into(),
            },
        )
        .await
        .expect("register");
        assert!(self.store.set_role(account.account_id, role).await);
        account.role = role;

        let token = self
            .state
            .codec
            .sign(&account.identity(), chrono::Duration::hours(1))
            .expect("sign");
        (account, token)
    }
}

pub fn json_get(path: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(path).header(ACCEPT, "application/json");
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn json_post(path: &str, body: serde_json::Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header(ACCEPT, "application/json")
        .header(CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn browser_get(path: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .uri(path)
        .header(ACCEPT, "text/html,application/xhtml+xml,*/*;q=0.8");
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn form_post(path: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header(ACCEPT, "text/html,application/xhtml+xml,*/*;q=0.8")
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// `name=value` of the first `Set-Cookie` for `name`.
pub fn set_cookie(response: &Response<Body>, name: &str) -> Option<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&format!("{name}=")))
        .map(|v| v.to_string())
}

/// Just the `name=value` pair, ready for a `Cookie` header.
pub fn cookie_pair(response: &Response<Body>, name: &str) -> Option<String> {
    set_cookie(response, name).and_then(|v| v.split(';').next().map(str::to_string))
}

pub fn location(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse JSON")
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}
