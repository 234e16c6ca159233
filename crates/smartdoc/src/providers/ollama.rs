//! Ollama client for local answer generation with retry logic

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::error::{Error, Result};
use crate::generation::PromptTemplate;

use super::llm::{http_client, retry_transient, send_error, status_error, AnswerGenerator};

/// Ollama API client with automatic retry
pub struct OllamaClient {
    /// HTTP client
    client: Client,
    base_url: String,
    model: String,
    template: PromptTemplate,
    temperature: f32,
    max_output_tokens: u32,
    timeout_secs: u64,
    max_retries: u32,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaClient {
    /// Create a new Ollama client
    pub fn new(config: &LlmConfig, template: PromptTemplate) -> Result<Self> {
        Ok(Self {
            client: http_client(config.timeout_secs)?,
            base_url: config.base_url(),
            model: config.model_name(),
            template,
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
            timeout_secs: config.timeout_secs,
            max_retries: config.max_retries,
        })
    }

    async fn send(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
                num_predict: self.max_output_tokens,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| send_error("Ollama", e, self.timeout_secs))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(status_error("Ollama", status, &body));
        }

        let generate_response: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::Llm(format!("Failed to parse generation response: {}", e)))?;

        if generate_response.response.trim().is_empty() {
            return Err(Error::Llm("Ollama returned an empty response".to_string()));
        }
        Ok(generate_response.response)
    }
}

#[async_trait]
impl AnswerGenerator for OllamaClient {
    async fn generate_answer(&self, context: &str, question: &str) -> Result<String> {
        let prompt = self.template.render(context, question)?;

        tracing::info!("Generating answer with model: {}", self.model);
        retry_transient("Ollama", self.max_retries, || self.send(&prompt)).await
    }

    /// Check if Ollama is available
    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
