//! Answer generation backends
//!
//! Every backend implements [`AnswerGenerator`]; [`create_generator`] picks
//! one from configuration.

pub mod gemini;
pub mod llm;
pub mod ollama;
pub mod openai;

use std::sync::Arc;

use crate::config::{LlmBackend, LlmConfig};
use crate::error::{Error, Result};
use crate::generation::PromptTemplate;

pub use gemini::GeminiClient;
pub use llm::AnswerGenerator;
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;

/// Build the configured answer generator
pub fn create_generator(config: &LlmConfig) -> Result<Arc<dyn AnswerGenerator>> {
    let template = match &config.prompt_template {
        Some(template) => PromptTemplate::new(template)?,
        None => PromptTemplate::default(),
    };

    let generator: Arc<dyn AnswerGenerator> = match config.backend {
        LlmBackend::Gemini => {
            let api_key = require_key(config, "GOOGLE_API_KEY")?;
            Arc::new(GeminiClient::new(config, api_key, template)?)
        }
        LlmBackend::OpenAi => {
            let api_key = require_key(config, "OPENAI_API_KEY")?;
            Arc::new(OpenAiClient::new(config, api_key, template)?)
        }
        LlmBackend::Ollama => Arc::new(OllamaClient::new(config, template)?),
    };

    tracing::info!(
        "Answer generator initialized ({} / {})",
        generator.name(),
        generator.model()
    );

    Ok(generator)
}

fn require_key(config: &LlmConfig, env_name: &str) -> Result<String> {
    config
        .api_key
        .clone()
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| Error::Config(format!("{} not found in environment or config", env_name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hosted_backends_require_key() {
        let config = LlmConfig::default();
        assert!(matches!(create_generator(&config), Err(Error::Config(_))));

        let config = LlmConfig {
            backend: LlmBackend::OpenAi,
            api_key: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(matches!(create_generator(&config), Err(Error::Config(_))));
    }

    #[test]
    fn test_backend_selection() {
        let config = LlmConfig {
            api_key: Some("key".to_string()),
            ..Default::default()
        };
        let generator = create_generator(&config).unwrap();
        assert_eq!(generator.name(), "gemini");
        assert_eq!(generator.model(), "gemini-1.5-flash");

        let config = LlmConfig {
            backend: LlmBackend::Ollama,
            model: Some("llama3.2:3b".to_string()),
            ..Default::default()
        };
        let generator = create_generator(&config).unwrap();
        assert_eq!(generator.name(), "ollama");
        assert_eq!(generator.model(), "llama3.2:3b");
    }

    #[test]
    fn test_custom_template_is_validated() {
        let config = LlmConfig {
            backend: LlmBackend::Ollama,
            prompt_template: Some("no placeholders".to_string()),
            ..Default::default()
        };
        assert!(matches!(create_generator(&config), Err(Error::Config(_))));
    }
}
