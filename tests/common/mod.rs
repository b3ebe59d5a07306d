//! A local stand-in for the Gemini REST API.
//!
//! `generateContent` replies `"You said: <last user text>"`; the streaming
//! endpoint sends the same text as three SSE fragments. A wrong API key
//! yields a Gemini-style 400.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;

use axum::extract::{Path, Query};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use gemini_bridge::config::ProviderConfig;

pub const API_KEY: &str = "test-key";

fn last_user_text(body: &Value) -> String {
    body["contents"]
        .as_array()
        .and_then(|c| c.last())
        .and_then(|c| c["parts"][0]["text"].as_str())
        .unwrap_or_default()
        .to_string()
}

fn candidate(text: &str) -> Value {
    json!({ "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }] })
}

async fn gemini(
    Path(call): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Response {
    if query.get("key").map(String::as_str) != Some(API_KEY) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": { "code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT" } })),
        )
            .into_response();
    }

    let said = last_user_text(&body);
    if call.ends_with(":streamGenerateContent") && query.get("alt").map(String::as_str) == Some("sse") {
        let mut events = String::new();
        for fragment in ["You ", "said: ", said.as_str()] {
            events.push_str(&format!("data: {}\r\n\r\n", candidate(fragment)));
        }
        return ([(header::CONTENT_TYPE, "text/event-stream")], events).into_response();
    }
    if call.ends_with(":generateContent") {
        return Json(candidate(&format!("You said: {said}"))).into_response();
    }
    StatusCode::NOT_FOUND.into_response()
}

/// Start the stand-in and return its base URL.
pub async fn spawn_fake_gemini() -> String {
    let app = Router::new().route("/v1beta/models/{call}", post(gemini));
    let addr = serve(app).await;
    format!("http://{addr}")
}

/// Serve `app` on an ephemeral local port.
pub async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Provider settings pointing at the stand-in.
pub fn provider_config(base_url: &str, api_key: &str) -> ProviderConfig {
    ProviderConfig {
        api_key: Some(api_key.to_string()),
        base_url: base_url.to_string(),
        ..ProviderConfig::default()
    }
}
