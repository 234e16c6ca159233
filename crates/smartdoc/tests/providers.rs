//! LLM backends against a local fake API server

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use smartdoc::{
    config::{AppConfig, LlmBackend, LlmConfig},
    create_generator, DocumentQa, Error,
};

/// Counts calls and fails the first `failures` of them with a 503
#[derive(Clone, Default)]
struct FakeApi {
    calls: Arc<AtomicU32>,
    failures: u32,
    /// Answer with blank text instead of a real completion
    blank: bool,
    last_prompt: Arc<parking_lot::Mutex<String>>,
}

impl FakeApi {
    fn failing(failures: u32) -> Self {
        Self {
            failures,
            ..Default::default()
        }
    }

    fn blank() -> Self {
        Self {
            blank: true,
            ..Default::default()
        }
    }

    /// Returns true when this call should fail
    fn record(&self, prompt: &str) -> bool {
        *self.last_prompt.lock() = prompt.to_string();
        self.calls.fetch_add(1, Ordering::SeqCst) < self.failures
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

fn unavailable() -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, "overloaded").into_response()
}

async fn gemini_generate(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()) != Some("test-key") {
        return (StatusCode::UNAUTHORIZED, "API key not valid").into_response();
    }
    let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap_or_default();
    if api.record(prompt) {
        return unavailable();
    }
    assert_eq!(body["generationConfig"]["maxOutputTokens"], 2048);

    Json(json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": "From Gemini." }] },
            "finishReason": "STOP"
        }]
    }))
    .into_response()
}

async fn ollama_generate(State(api): State<FakeApi>, Json(body): Json<Value>) -> Response {
    let prompt = body["prompt"].as_str().unwrap_or_default();
    if api.record(prompt) {
        return unavailable();
    }
    assert_eq!(body["stream"], false);
    let text = if api.blank { " \n" } else { "From Ollama." };
    Json(json!({ "model": body["model"], "response": text, "done": true })).into_response()
}

async fn openai_chat(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer test-key") {
        return (StatusCode::UNAUTHORIZED, "invalid api key").into_response();
    }
    let prompt = body["messages"][0]["content"].as_str().unwrap_or_default();
    if api.record(prompt) {
        return unavailable();
    }
    Json(json!({
        "choices": [{ "index": 0, "message": { "role": "assistant", "content": "From OpenAI." } }]
    }))
    .into_response()
}

/// Serve the fake API on an ephemeral port and return its base URL
async fn serve(api: FakeApi) -> String {
    let app = Router::new()
        .route("/v1beta/models/*rest", post(gemini_generate))
        .route("/api/generate", post(ollama_generate))
        .route("/api/tags", get(|| async { Json(json!({ "models": [] })) }))
        .route("/v1/chat/completions", post(openai_chat))
        .with_state(api);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    format!("http://{}", addr)
}

fn config(backend: LlmBackend, base_url: &str, max_retries: u32) -> LlmConfig {
    LlmConfig {
        backend,
        model: Some("test-model".to_string()),
        base_url: Some(format!("{}/", base_url)),
        api_key: Some("test-key".to_string()),
        timeout_secs: 5,
        max_retries,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_gemini_answer() {
    let api = FakeApi::default();
    let url = serve(api.clone()).await;
    let generator = create_generator(&config(LlmBackend::Gemini, &url, 0)).unwrap();

    let answer = generator
        .generate_answer("The lease runs for two years.", "How long is the lease?")
        .await
        .unwrap();

    assert_eq!(answer, "From Gemini.");
    assert_eq!(api.calls(), 1);
    let prompt = api.last_prompt.lock().clone();
    assert!(prompt.contains("The lease runs for two years."));
    assert!(prompt.contains("Question: How long is the lease?"));
}

#[tokio::test]
async fn test_gemini_bad_key_is_not_retried() {
    let api = FakeApi::default();
    let url = serve(api.clone()).await;
    let mut llm = config(LlmBackend::Gemini, &url, 3);
    llm.api_key = Some("wrong".to_string());
    let generator = create_generator(&llm).unwrap();

    let result = generator.generate_answer("context", "question").await;
    assert!(matches!(result, Err(Error::LlmAuth(_))));
    assert_eq!(api.calls(), 0);
}

#[tokio::test]
async fn test_ollama_answer_and_health() {
    let api = FakeApi::default();
    let url = serve(api.clone()).await;
    let generator = create_generator(&config(LlmBackend::Ollama, &url, 0)).unwrap();

    assert!(generator.health_check().await.unwrap());
    let answer = generator.generate_answer("context", "question").await.unwrap();
    assert_eq!(answer, "From Ollama.");
    assert_eq!(generator.model(), "test-model");
}

#[tokio::test]
async fn test_ollama_blank_response_is_an_error() {
    let api = FakeApi::blank();
    let url = serve(api.clone()).await;
    let generator = create_generator(&config(LlmBackend::Ollama, &url, 2)).unwrap();

    let result = generator.generate_answer("context", "question").await;
    assert!(matches!(result, Err(Error::Llm(_))));
    // Not transient, so no retries
    assert_eq!(api.calls(), 1);
}

#[tokio::test]
async fn test_blank_answer_is_not_recorded() {
    let api = FakeApi::blank();
    let url = serve(api.clone()).await;
    let app_config = AppConfig {
        llm: config(LlmBackend::Ollama, &url, 0),
        ..Default::default()
    };
    let qa = DocumentQa::from_config(app_config).unwrap();
    let session = qa.create_session();
    qa.load_document(&session, "notes.txt", "The lease runs for two years.".into())
        .await
        .unwrap();

    let result = qa.ask(&session, "How long is the lease?").await;
    assert!(matches!(result, Err(Error::Llm(_))));
    assert!(qa.session_view(&session).unwrap().transcript.is_empty());
}

#[tokio::test]
async fn test_openai_answer() {
    let api = FakeApi::default();
    let url = serve(api.clone()).await;
    let generator = create_generator(&config(LlmBackend::OpenAi, &url, 0)).unwrap();

    let answer = generator.generate_answer("context", "question").await.unwrap();
    assert_eq!(answer, "From OpenAI.");
    assert_eq!(generator.name(), "openai");
}

#[tokio::test]
async fn test_transient_failure_is_retried() {
    let api = FakeApi::failing(1);
    let url = serve(api.clone()).await;
    let generator = create_generator(&config(LlmBackend::OpenAi, &url, 1)).unwrap();

    let answer = generator.generate_answer("context", "question").await.unwrap();
    assert_eq!(answer, "From OpenAI.");
    assert_eq!(api.calls(), 2);
}

#[tokio::test]
async fn test_persistent_outage_surfaces_as_unavailable() {
    let api = FakeApi::failing(u32::MAX);
    let url = serve(api.clone()).await;
    let generator = create_generator(&config(LlmBackend::Ollama, &url, 1)).unwrap();

    let result = generator.generate_answer("context", "question").await;
    assert!(matches!(result, Err(Error::LlmUnavailable(_))));
    assert_eq!(api.calls(), 2);
}

#[tokio::test]
async fn test_unreachable_backend() {
    // Bind then drop to get a port nobody listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let generator = create_generator(&config(LlmBackend::Ollama, &url, 0)).unwrap();
    assert!(!generator.health_check().await.unwrap());
    assert!(matches!(
        generator.generate_answer("context", "question").await,
        Err(Error::LlmUnavailable(_))
    ));
}
