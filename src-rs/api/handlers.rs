use std::sync::Arc;

use axum::body::Body;
use axum::extract::{FromRequest, State};
use axum::http::{header, Request, StatusCode};
use axum::{Form, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};

use crate::dispatch::Dispatcher;

pub const FEATURES: [&str; 5] = ["tasks", "shell", "nlp", "system_monitoring", "glm_chat"];

/// Chat platform webhook body. Only `text` is used; the rest is accepted so
/// either encoding of the platform's payload decodes.
#[derive(Debug, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user_id: Option<Value>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub post_id: Option<Value>,
    #[serde(default)]
    pub timestamp: Option<Value>,
}

pub async fn handle_health() -> Json<Value> {
    Json(json!({"status": "healthy", "features": FEATURES}))
}

pub async fn handle_webhook(
    State(dispatcher): State<Arc<Dispatcher>>,
    request: Request<Body>,
) -> (StatusCode, Json<Value>) {
    let text = match decode_payload(request).await.and_then(|payload| payload.text) {
        Some(text) if !text.trim().is_empty() => text,
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "No data received"})),
            )
        }
    };
    info!(message = %preview(&text), "message received");

    let result = tokio::task::spawn_blocking(move || dispatcher.handle(&text)).await;
    match result {
        Ok(reply) => (StatusCode::OK, Json(json!({"text": reply}))),
        Err(err) => {
            error!(error = %err, "dispatch failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": err.to_string()})),
            )
        }
    }
}

/// JSON when the content type says so, form-encoded otherwise.
pub async fn decode_payload(request: Request<Body>) -> Option<WebhookPayload> {
    let is_json = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.contains("application/json"))
        .unwrap_or(false);
    if is_json {
        Json::<WebhookPayload>::from_request(request, &())
            .await
            .ok()
            .map(|Json(payload)| payload)
    } else {
        Form::<WebhookPayload>::from_request(request, &())
            .await
            .ok()
            .map(|Form(payload)| payload)
    }
}

fn preview(text: &str) -> String {
    text.chars().take(50).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::DispatchOptions;
    use crate::shell::ShellGateway;
    use crate::task::TaskStore;
    use crate::telemetry::SysinfoProbe;
    use std::time::Duration;

    fn json_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/webhook")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn form_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/webhook")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn dispatcher(dir: &std::path::Path) -> Arc<Dispatcher> {
        let store = TaskStore::open(dir.join("tasks"), false).unwrap();
        let shell = ShellGateway::new(dir, Duration::from_secs(5));
        Arc::new(Dispatcher::from_parts(
            store,
            shell,
            Arc::new(SysinfoProbe::new()),
            None,
            dir.to_path_buf(),
            DispatchOptions::default(),
        ))
    }

    #[tokio::test]
    async fn decodes_json_and_form_bodies() {
        let payload = decode_payload(json_request(r#"{"text": "/tasks", "user_id": 7}"#))
            .await
            .unwrap();
        assert_eq!(payload.text.as_deref(), Some("/tasks"));

        let payload = decode_payload(form_request("token=abc&text=%24sys&username=ops"))
            .await
            .unwrap();
        assert_eq!(payload.text.as_deref(), Some("$sys"));
        assert_eq!(payload.username.as_deref(), Some("ops"));

        assert!(decode_payload(json_request("not json")).await.is_none());
    }

    #[tokio::test]
    async fn webhook_replies_with_text() {
        let dir = tempfile::tempdir().unwrap();
        let (status, Json(body)) =
            handle_webhook(State(dispatcher(dir.path())), json_request(r#"{"text": "help"}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["text"].as_str().unwrap().contains("/task <description>"));
    }

    #[tokio::test]
    async fn webhook_rejects_missing_text() {
        let dir = tempfile::tempdir().unwrap();
        let (status, Json(body)) =
            handle_webhook(State(dispatcher(dir.path())), json_request(r#"{"token": "abc"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No data received");

        let (status, _) =
            handle_webhook(State(dispatcher(dir.path())), form_request("text=%20%20")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn health_lists_features() {
        let Json(body) = handle_health().await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["features"].as_array().unwrap().len(), FEATURES.len());
    }
}
