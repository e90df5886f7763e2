#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use kalita_api::auth::AppStateInner;
use kalita_db::Database;

pub const API_KEY: &str = "test-public-key";
pub const JWT_SECRET: &str = "test-jwt-secret-with-enough-entropy";
pub const ADMIN_EMAIL: &str = "pengurus@kalita.id";

pub fn app() -> Router {
    app_with_session_ttl(chrono::Duration::days(30))
}

pub fn app_with_session_ttl(session_ttl: chrono::Duration) -> Router {
    let state = Arc::new(AppStateInner {
        db: Database::open_in_memory().unwrap(),
        jwt_secret: JWT_SECRET.into(),
        api_key: API_KEY.into(),
        session_ttl,
        admin_emails: vec![ADMIN_EMAIL.into()],
    });
    kalita_api::router(state)
}

pub struct Reply {
    pub status: StatusCode,
    pub body: Value,
}

impl Reply {
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    pub fn error(&self) -> Option<&str> {
        self.body["error"].as_str()
    }
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Reply {
    let mut builder = Request::builder().method(method).uri(uri).header("apikey", API_KEY);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
    };
    Reply { status, body }
}

pub async fn get(app: &Router, uri: &str, token: Option<&str>) -> Reply {
    send(app, Method::GET, uri, token, None).await
}

pub async fn post(app: &Router, uri: &str, token: Option<&str>, body: Value) -> Reply {
    send(app, Method::POST, uri, token, Some(body)).await
}

/// Register an account and return its bearer token.
pub async fn sign_up(app: &Router, email: &str, name: &str) -> String {
    let reply = post(
        app,
        "/auth/signup",
        None,
        json!({ "email": email, "password": "rahasia-123", "full_name": name }),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED, "{:?}", reply.body);
    reply.data()["token"].as_str().unwrap().to_string()
}

pub async fn admin(app: &Router) -> String {
    sign_up(app, ADMIN_EMAIL, "Pengurus RT").await
}

pub async fn create_news(app: &Router, token: &str, body: Value) -> Value {
    let reply = post(app, "/news", Some(token), body).await;
    assert_eq!(reply.status, StatusCode::CREATED, "{:?}", reply.body);
    reply.data().clone()
}
