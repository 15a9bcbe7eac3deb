use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    response::IntoResponse,
};
use email_mentor::clients::{GeminiClient, GenerateRequest, LanguageModel, ModelError};
use email_mentor::sessions::ChatTurn;
use serde_json::{Value, json};

#[derive(Clone, Default)]
struct Seen {
    calls: Arc<Mutex<Vec<(String, Option<String>, Value)>>>,
}

#[derive(Clone)]
struct Stub {
    seen: Seen,
    status: StatusCode,
    reply: Value,
    delay: Duration,
}

async fn stub_handler(
    State(stub): State<Stub>,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let key = headers
        .get("x-goog-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    stub.seen
        .calls
        .lock()
        .unwrap()
        .push((uri.path().to_string(), key, body));
    if !stub.delay.is_zero() {
        tokio::time::sleep(stub.delay).await;
    }
    (stub.status, Json(stub.reply))
}

async fn spawn_stub(status: StatusCode, reply: Value, delay: Duration) -> (SocketAddr, Seen) {
    let seen = Seen::default();
    let app = Router::new().fallback(stub_handler).with_state(Stub {
        seen: seen.clone(),
        status,
        reply,
        delay,
    });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, seen)
}

fn text_reply(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    })
}

#[tokio::test]
async fn posts_generate_content_and_returns_text() {
    let (addr, seen) = spawn_stub(StatusCode::OK, text_reply("Hej træner"), Duration::ZERO).await;
    let client = GeminiClient::new("gemini-test", format!("http://{addr}/v1beta"), 5_000)
        .unwrap()
        .with_api_key("test-key");

    let request = GenerateRequest {
        contents: vec![ChatTurn::assistant("seed"), ChatTurn::user("hej")],
        ..Default::default()
    }
    .with_system_instruction("vær venlig");
    let text = client.generate(request).await.unwrap();
    assert_eq!(text, "Hej træner");

    let calls = seen.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    let (path, key, body) = &calls[0];
    assert_eq!(path, "/v1beta/models/gemini-test:generateContent");
    assert_eq!(key.as_deref(), Some("test-key"));
    assert_eq!(body["contents"][0]["role"], "model");
    assert_eq!(body["contents"][1]["parts"][0]["text"], "hej");
    assert_eq!(body["systemInstruction"]["parts"][0]["text"], "vær venlig");
}

#[tokio::test]
async fn error_status_maps_to_provider_error() {
    let (addr, _seen) = spawn_stub(
        StatusCode::BAD_REQUEST,
        json!({"error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}}),
        Duration::ZERO,
    )
    .await;
    let client = GeminiClient::new("gemini-test", format!("http://{addr}"), 5_000).unwrap();

    let err = client.generate(GenerateRequest::prompt("hej")).await.unwrap_err();
    match err {
        ModelError::Provider { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "API key not valid");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn slow_provider_times_out_without_retry() {
    let (addr, seen) = spawn_stub(
        StatusCode::OK,
        text_reply("for sent"),
        Duration::from_millis(500),
    )
    .await;
    let client = GeminiClient::new("gemini-test", format!("http://{addr}"), 50).unwrap();

    let err = client.generate(GenerateRequest::prompt("hej")).await.unwrap_err();
    assert!(matches!(err, ModelError::Timeout { timeout_ms: 50 }), "{err:?}");
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(seen.calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn refused_connection_is_transport_error() {
    // Bind then drop to get a port with nothing listening
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = GeminiClient::new("gemini-test", format!("http://{addr}"), 2_000).unwrap();
    let err = client.generate(GenerateRequest::prompt("hej")).await.unwrap_err();
    assert!(matches!(err, ModelError::Transport(_)), "{err:?}");
}

#[tokio::test]
async fn empty_candidates_is_empty_response() {
    let (addr, _seen) = spawn_stub(StatusCode::OK, json!({"candidates": []}), Duration::ZERO).await;
    let client = GeminiClient::new("gemini-test", format!("http://{addr}"), 5_000).unwrap();

    let err = client.generate(GenerateRequest::prompt("hej")).await.unwrap_err();
    assert!(matches!(err, ModelError::EmptyResponse));
}
