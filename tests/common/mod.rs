#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use notes_server::{config::Config, create_app, db, AppState};
use serde_json::Value;
use sqlx::SqlitePool;
use tower::ServiceExt;

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_owned(),
        database_max_connections: 1,
        jwt_secret: "integration-test-secret".to_owned(),
        jwt_expires_in: 60,
        jwt_refresh_expires_in: 120,
        port: 0,
        cors_origins: Vec::new(),
    }
}

pub async fn test_pool() -> SqlitePool {
    let pool = db::connect("sqlite::memory:", 1)
        .await
        .expect("in-memory database");
    db::migrate(&pool).await.expect("migrations");
    pool
}

pub async fn test_app() -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState {
        db: test_pool().await,
        config: test_config(),
    });
    (create_app(state.clone()), state)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };

    TestResponse {
        status,
        headers,
        body,
    }
}

/// Registers a user and returns its access token.
pub async fn register(app: &Router, email: &str, password: &str) -> String {
    let response = send(
        app,
        Method::POST,
        "/auth/register",
        None,
        Some(serde_json::json!({
            "email": email,
            "password": password,
            "fullName": "Test User",
        })),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    response.body["token"].as_str().unwrap().to_owned()
}

/// Creates a note and returns its id.
pub async fn create_note(app: &Router, token: &str, title: &str, content: &str, tags: &[&str]) -> i64 {
    let response = send(
        app,
        Method::POST,
        "/notes",
        Some(token),
        Some(serde_json::json!({
            "title": title,
            "content": content,
            "tags": tags,
        })),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    response.body["id"].as_i64().unwrap()
}
