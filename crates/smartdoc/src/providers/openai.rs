//! OpenAI-compatible chat completions client (OpenAI, Groq, ...)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::error::{Error, Result};
use crate::generation::PromptTemplate;

use super::llm::{http_client, retry_transient, send_error, status_error, AnswerGenerator};

pub struct OpenAiClient {
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

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl OpenAiClient {
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

    async fn send(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            max_tokens: self.max_output_tokens,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| send_error("OpenAI", e, self.timeout_secs))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(status_error("OpenAI", status, &body));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Llm(format!("Failed to parse chat response: {}", e)))?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| Error::Llm("No text in chat completion".to_string()))
    }
}

#[async_trait]
impl AnswerGenerator for OpenAiClient {
    async fn generate_answer(&self, context: &str, question: &str) -> Result<String> {
        let prompt = self.template.render(context, question)?;

        tracing::info!("Generating answer with chat model: {}", self.model);
        retry_transient("OpenAI", self.max_retries, || self.send(&prompt)).await
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/v1/models", self.base_url);

        match self.client.get(&url).bearer_auth(&self.api_key).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
