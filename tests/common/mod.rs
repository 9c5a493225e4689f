#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub action: String,
    pub key: Option<String>,
    pub body: Value,
}

#[derive(Clone)]
struct MockState {
    status: StatusCode,
    reply: Value,
    delay: Duration,
    seen: Arc<Mutex<Vec<CapturedRequest>>>,
}

async fn generate_content(
    State(state): State<MockState>,
    Path(action): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.seen.lock().unwrap().push(CapturedRequest {
        action,
        key: params.get("key").cloned(),
        body,
    });
    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }
    (state.status, Json(state.reply.clone()))
}

pub struct MockGemini {
    pub endpoint: String,
    seen: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl MockGemini {
    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.seen.lock().unwrap().clone()
    }
}

pub async fn spawn_gemini(status: StatusCode, reply: Value, delay: Duration) -> Result<MockGemini> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let seen = Arc::new(Mutex::new(Vec::new()));
    let state = MockState {
        status,
        reply,
        delay,
        seen: Arc::clone(&seen),
    };
    let app = Router::new()
        .route("/v1beta/models/:action", post(generate_content))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(MockGemini {
        endpoint: format!("http://{addr}/v1beta/models"),
        seen,
    })
}

pub fn text_reply(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}
