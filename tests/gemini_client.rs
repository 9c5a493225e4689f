mod common;

use std::time::Duration;

use common::{spawn_gemini, text_reply};
use reelscopy_rs::config::GeminiConfig;
use reelscopy_rs::generation::{EMPTY_RESULT_FALLBACK, FAILURE_MESSAGE};
use reelscopy_rs::{CaptionGenerator, CopyInputs, GeminiClient, GenerationError};
use reqwest::StatusCode;
use serde_json::json;
use tokio::net::TcpListener;

const SECRET_KEY: &str = "SECRET-KEY-123";

fn client_for(endpoint: &str, timeout: Duration) -> GeminiClient {
    client_with_key("test-key", endpoint, timeout)
}

fn client_with_key(api_key: &str, endpoint: &str, timeout: Duration) -> GeminiClient {
    let config = GeminiConfig {
        endpoint: endpoint.to_string(),
        ..GeminiConfig::default()
    };
    GeminiClient::new(api_key.into(), &config, timeout).expect("client")
}

fn sales_inputs() -> CopyInputs {
    CopyInputs::new("vender mais", "Você trava nas vendas?", "VENDAS")
}

#[tokio::test]
async fn posts_prompt_and_sampling_parameters() {
    let caption = "🤔 Você trava nas vendas?\n\n👇 Se fez sentido para você, escreva [ VENDAS ] aqui embaixo.🔥\n\n#danielmuller\n#vendas";
    let server = spawn_gemini(StatusCode::OK, text_reply(caption), Duration::ZERO)
        .await
        .expect("spawn server");
    let client = client_for(&server.endpoint, Duration::from_secs(5));

    let text = client
        .generate_caption(&sales_inputs())
        .await
        .expect("caption");
    assert_eq!(text, caption);

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.action, "gemini-3-flash-preview:generateContent");
    assert_eq!(request.key.as_deref(), Some("test-key"));

    let prompt = request.body["contents"][0]["parts"][0]["text"]
        .as_str()
        .expect("prompt text");
    assert!(prompt.contains("vender mais"));
    assert!(prompt.contains("Você trava nas vendas?"));
    assert!(prompt.contains("[ VENDAS ]"));
    assert_eq!(request.body["contents"][0]["role"], "user");

    let sampling = &request.body["generationConfig"];
    assert!((sampling["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    assert!((sampling["topP"].as_f64().unwrap() - 0.95).abs() < 1e-6);
    assert_eq!(sampling["topK"], 40);
}

#[tokio::test]
async fn empty_candidate_text_returns_fallback() {
    let server = spawn_gemini(StatusCode::OK, text_reply(""), Duration::ZERO)
        .await
        .expect("spawn server");
    let client = client_for(&server.endpoint, Duration::from_secs(5));

    let text = client
        .generate_caption(&sales_inputs())
        .await
        .expect("caption");
    assert_eq!(text, EMPTY_RESULT_FALLBACK);
}

#[tokio::test]
async fn response_without_candidates_returns_fallback() {
    let server = spawn_gemini(
        StatusCode::OK,
        json!({ "promptFeedback": { "blockReason": "SAFETY" } }),
        Duration::ZERO,
    )
    .await
    .expect("spawn server");
    let client = client_for(&server.endpoint, Duration::from_secs(5));

    let text = client
        .generate_caption(&sales_inputs())
        .await
        .expect("caption");
    assert_eq!(text, EMPTY_RESULT_FALLBACK);
}

#[tokio::test]
async fn error_status_keeps_backend_message_out_of_user_text() {
    let server = spawn_gemini(
        StatusCode::FORBIDDEN,
        json!({ "error": { "code": 403, "message": "API key not valid", "status": "PERMISSION_DENIED" } }),
        Duration::ZERO,
    )
    .await
    .expect("spawn server");
    let client = client_for(&server.endpoint, Duration::from_secs(5));

    let err = client
        .generate_caption(&sales_inputs())
        .await
        .expect_err("forbidden");
    match &err {
        GenerationError::HttpStatus {
            status, message, ..
        } => {
            assert_eq!(*status, StatusCode::FORBIDDEN);
            assert_eq!(message, "API key not valid");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.user_message(), FAILURE_MESSAGE);
}

#[tokio::test]
async fn slow_backend_hits_request_timeout() {
    let server = spawn_gemini(
        StatusCode::OK,
        text_reply("tarde demais"),
        Duration::from_secs(3),
    )
    .await
    .expect("spawn server");
    let client = client_for(&server.endpoint, Duration::from_millis(200));

    let err = client
        .generate_caption(&sales_inputs())
        .await
        .expect_err("timeout");
    assert!(err.is_timeout(), "expected timeout, got {err:?}");
    assert_eq!(err.user_message(), FAILURE_MESSAGE);
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let client = client_for(&format!("http://{addr}/v1beta/models"), Duration::from_secs(5));
    let err = client
        .generate_caption(&sales_inputs())
        .await
        .expect_err("connection refused");
    assert!(matches!(err, GenerationError::Http { .. }), "got {err:?}");
}

#[tokio::test]
async fn transport_errors_do_not_carry_the_api_key() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let client = client_with_key(
        SECRET_KEY,
        &format!("http://{addr}/v1beta/models"),
        Duration::from_secs(5),
    );
    let err = client
        .generate_caption(&sales_inputs())
        .await
        .expect_err("connection refused");

    assert!(!err.to_string().contains(SECRET_KEY), "leaked: {err}");
    assert!(!format!("{err:?}").contains(SECRET_KEY), "leaked: {err:?}");
}

#[tokio::test]
async fn undecodable_body_does_not_carry_the_api_key() {
    let server = spawn_gemini(
        StatusCode::OK,
        json!({ "candidates": "not-a-list" }),
        Duration::ZERO,
    )
    .await
    .expect("spawn server");
    let client = client_with_key(SECRET_KEY, &server.endpoint, Duration::from_secs(5));

    let err = client
        .generate_caption(&sales_inputs())
        .await
        .expect_err("bad body");
    assert!(matches!(err, GenerationError::ResponseParse { .. }), "got {err:?}");
    assert!(!err.to_string().contains(SECRET_KEY), "leaked: {err}");
    assert_eq!(server.requests()[0].key.as_deref(), Some(SECRET_KEY));
}
