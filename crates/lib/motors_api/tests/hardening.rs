//! Integration tests: production transport hardening.

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use motors_api::config::{ApiConfig, AuthConfig};
use motors_api::{AppState, router};
use motors_core::store::MemoryStore;
use tower::ServiceExt;

use common::{SECRET, location};

fn production_app() -> axum::Router {
    let config = ApiConfig {
        production: true,
        auth: AuthConfig {
            secure_cookies: true,
            ..AuthConfig::with_secret(SECRET)
        },
        ..ApiConfig::default()
    };
    router(AppState::new(Arc::new(MemoryStore::seeded()), config))
}

fn request(uri: &str, proto: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri).header("host", "motors.example");
    if let Some(proto) = proto {
        builder = builder.header("x-forwarded-proto", proto);
    }
    builder.body(Body::empty()).expect("request")
}

#[tokio::test]
async fn plain_http_is_redirected_with_path_and_query() {
    let resp = production_app()
        .oneshot(request("/inv/type/1?page=2", Some("http")))
        .await
        .expect("response");
    assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(
        location(&resp).as_deref(),
        Some("https://motors.example/inv/type/1?page=2")
    );
}

#[tokio::test]
async fn forwarded_https_is_served_with_hsts() {
    let resp = production_app()
        .oneshot(request("/", Some("https")))
        .await
        .expect("response");
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("strict-transport-security"));
}

#[tokio::test]
async fn development_does_not_redirect() {
    let t = common::test_app();
    let resp = t.send(request("/", None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
}
