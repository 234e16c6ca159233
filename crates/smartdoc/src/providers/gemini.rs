//! Gemini client for answer generation via the Generative Language API

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::error::{Error, Result};
use crate::generation::PromptTemplate;

use super::llm::{http_client, retry_transient, send_error, status_error, AnswerGenerator};

/// Gemini client authenticated with an API key
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    template: PromptTemplate,
    temperature: f32,
    max_output_tokens: u32,
    timeout_secs: u64,
    max_retries: u32,
}

impl GeminiClient {
    /// Create a new Gemini client
    pub fn new(config: &LlmConfig, api_key: String, template: PromptTemplate) -> Result<Self> {
        Ok(Self {
            client: http_client(config.timeout_secs)?,
            base_url: config.base_url(),
            api_key,
            model: config.model_name(),
            template,
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
            timeout_secs: config.timeout_secs,
            max_retries: config.max_retries,
        })
    }

    /// Get the API endpoint URL
    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    async fn send(&self, request: &GenerateRequest) -> Result<String> {
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| send_error("Gemini", e, self.timeout_secs))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(status_error("Gemini", status, &body));
        }

        let gen_response: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::Llm(format!("Failed to parse Gemini response: {}", e)))?;

        gen_response.into_text()
    }
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<Part>,
}

impl GenerateResponse {
    /// Concatenate the text parts of the first candidate
    fn into_text(self) -> Result<String> {
        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| Error::Llm("No candidates in Gemini response".to_string()))?;

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(Error::Llm(format!(
                "Gemini returned no text (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        Ok(text)
    }
}

#[async_trait]
impl AnswerGenerator for GeminiClient {
    async fn generate_answer(&self, context: &str, question: &str) -> Result<String> {
        let prompt = self.template.render(context, question)?;

        let request = GenerateRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            },
        };

        tracing::info!("Generating answer with Gemini model: {}", self.model);
        retry_transient("Gemini", self.max_retries, || self.send(&request)).await
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/v1beta/models/{}", self.base_url, self.model);

        match self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
        {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
