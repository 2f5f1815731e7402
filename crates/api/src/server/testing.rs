//! In-process harness for handler tests: a router over a fresh [`MemoryStore`]
//! and a temporary upload directory.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

use crate::auth::password;
use crate::config::test_config;
use crate::mail::{LogMailer, Mailer};
use crate::store::{DocumentStore, MemoryStore, UserRecord};

use super::{router, state::AppState};

const BOUNDARY: &str = "social-svc-test-boundary";

pub(crate) struct Harness {
    pub app: Router,
    pub state: AppState,
    pub store: MemoryStore,
    _dir: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_mailer(Arc::new(LogMailer))
    }

    pub fn with_mailer(mailer: Arc<dyn Mailer>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let cfg = test_config(dir.path().to_str().unwrap());
        let store = MemoryStore::new();
        let state = AppState::from_config(&cfg, Arc::new(store.clone()), mailer).unwrap();
        Self {
            app: router::build(state.clone()),
            state,
            store,
            _dir: dir,
        }
    }

    /// Send `req` and decode the body as JSON (`Value::Null` if it is not JSON).
    pub async fn call(&self, req: Request<Body>) -> (StatusCode, Value) {
        let resp = self.app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    /// Insert a user named `username` (email `{username}@example.com`) and return
    /// its id with a valid access token.
    pub async fn seed_user(&self, username: &str, password: &str) -> (Uuid, String) {
        let user = UserRecord {
            id: Uuid::new_v4(),
            username: username.to_owned(),
            email: format!("{username}@example.com"),
            password_hash: password::hash_secret(password).unwrap(),
            created_at: Utc::now(),
        };
        self.store.insert_user(user.clone()).await.unwrap();
        let token = self
            .state
            .tokens
            .issue(user.id, &user.username, &user.email)
            .unwrap();
        (user.id, token)
    }
}

fn with_auth(builder: axum::http::request::Builder, token: Option<&str>) -> axum::http::request::Builder {
    match token {
        Some(t) => builder.header(header::AUTHORIZATION, format!("Bearer {t}")),
        None => builder,
    }
}

pub(crate) fn json_req(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    with_auth(Request::builder().method(method).uri(uri), token)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub(crate) fn empty_req(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
    with_auth(Request::builder().method(method).uri(uri), token)
        .body(Body::empty())
        .unwrap()
}

/// Build a `multipart/form-data` request with an optional `content` part and
/// one `images` part per `(file name, bytes)`.
pub(crate) fn multipart_req(
    method: Method,
    uri: &str,
    token: &str,
    content: Option<&str>,
    images: &[(&str, &[u8])],
) -> Request<Body> {
    let mut body = Vec::new();
    if let Some(text) = content {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"content\"\r\n\r\n{text}\r\n"
            )
            .as_bytes(),
        );
    }
    for (name, bytes) in images {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"images\"; filename=\"{name}\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    with_auth(Request::builder().method(method).uri(uri), Some(token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}
