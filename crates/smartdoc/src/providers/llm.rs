//! Answer generator trait and shared HTTP plumbing for LLM backends

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::retry_backoff;
use crate::error::{Error, Result};

/// Trait for LLM-based answer generation
///
/// Implementations:
/// - `GeminiClient`: Google Generative Language API
/// - `OllamaClient`: Local Ollama server (phi3, llama3, etc.)
/// - `OpenAiClient`: OpenAI-compatible chat completions (OpenAI, Groq)
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Answer `question` from `context`
    async fn generate_answer(&self, context: &str, question: &str) -> Result<String>;

    /// Check if the provider is reachable
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}

/// Build the HTTP client shared by a provider's requests
pub(crate) fn http_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .pool_max_idle_per_host(5)
        .build()
        .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))
}

/// Map a non-success HTTP status to the matching error kind
pub(crate) fn status_error(provider: &str, status: StatusCode, body: &str) -> Error {
    let message = format!("{} returned HTTP {}: {}", provider, status, body.trim());
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::LlmAuth(message),
        StatusCode::TOO_MANY_REQUESTS | StatusCode::REQUEST_TIMEOUT => Error::LlmUnavailable(message),
        s if s.is_server_error() => Error::LlmUnavailable(message),
        _ => Error::Llm(message),
    }
}

/// Map a transport failure to the matching error kind
pub(crate) fn send_error(provider: &str, err: reqwest::Error, timeout_secs: u64) -> Error {
    if err.is_timeout() {
        Error::LlmTimeout(timeout_secs)
    } else if err.is_connect() || err.is_request() {
        Error::LlmUnavailable(format!("{} request failed: {}", provider, err))
    } else {
        Error::Llm(format!("{} request failed: {}", provider, err))
    }
}

/// Retry transient failures with exponential backoff
///
/// Authentication and malformed-response errors are returned immediately.
pub(crate) async fn retry_transient<F, Fut, T>(provider: &str, max_retries: u32, operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_transient() && attempt < max_retries => {
                let delay = retry_backoff(attempt);
                tracing::warn!(
                    "{} request failed (attempt {}/{}): {}, retrying in {:?}",
                    provider,
                    attempt + 1,
                    max_retries + 1,
                    e,
                    delay
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            status_error("gemini", StatusCode::UNAUTHORIZED, "bad key"),
            Error::LlmAuth(_)
        ));
        assert!(matches!(
            status_error("gemini", StatusCode::TOO_MANY_REQUESTS, ""),
            Error::LlmUnavailable(_)
        ));
        assert!(matches!(
            status_error("ollama", StatusCode::BAD_GATEWAY, ""),
            Error::LlmUnavailable(_)
        ));
        assert!(matches!(
            status_error("openai", StatusCode::BAD_REQUEST, "model not found"),
            Error::Llm(_)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_transient_then_succeed() {
        let calls = AtomicU32::new(0);
        let result = retry_transient("test", 2, || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(Error::LlmUnavailable("busy".into()))
            } else {
                Ok("answer")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "answer");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = retry_transient("test", 1, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::LlmTimeout(1))
        })
        .await;

        assert!(matches!(result, Err(Error::LlmTimeout(1))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_auth_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = retry_transient("test", 5, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::LlmAuth("denied".into()))
        })
        .await;

        assert!(matches!(result, Err(Error::LlmAuth(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
