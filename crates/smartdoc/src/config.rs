//! Configuration for the document Q&A system
//!
//! Values come from three layers, later ones winning: built-in defaults, an
//! optional TOML file, and environment variables (a `.env` file is honoured).

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Highest accepted `llm.max_retries`
pub const MAX_LLM_RETRIES: u32 = 10;

/// Wait before retry number `attempt` (0-based): 500ms, doubling each time
pub fn retry_backoff(attempt: u32) -> Duration {
    Duration::from_millis(500u64.saturating_mul(2u64.saturating_pow(attempt)))
}

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Context assembly configuration
    pub context: ContextConfig,
    /// Answer generation configuration
    pub llm: LlmConfig,
    /// Document extraction configuration
    pub extraction: ExtractionConfig,
    /// Session registry configuration
    pub session: SessionConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 100MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
            max_upload_size: 100 * 1024 * 1024, // 100MB
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: usize,
    /// Prefer paragraph/sentence breaks near the cut point
    pub respect_boundaries: bool,
    /// How far back from the target cut to look for a break (characters)
    pub boundary_window: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 10_000,
            chunk_overlap: 1_000,
            respect_boundaries: true,
            boundary_window: 200,
        }
    }
}

/// Context assembly configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Number of leading chunks handed to the LLM
    pub max_chunks: usize,
    /// Characters kept from each chunk
    pub max_chars_per_chunk: usize,
    /// Chunks shown in the document preview
    pub preview_chunks: usize,
    /// Characters shown in the document preview
    pub preview_chars: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_chunks: 4,
            max_chars_per_chunk: 2_500,
            preview_chunks: 2,
            preview_chars: 1_000,
        }
    }
}

/// Answer generation backend
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmBackend {
    /// Google Gemini via the Generative Language API
    #[default]
    Gemini,
    /// Local Ollama server
    Ollama,
    /// OpenAI-compatible chat completions (OpenAI, Groq, ...)
    OpenAi,
}

impl LlmBackend {
    /// Model used when none is configured
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini-1.5-flash",
            Self::Ollama => "phi3",
            Self::OpenAi => "gpt-4o-mini",
        }
    }

    /// Base URL used when none is configured
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::Gemini => "https://generativelanguage.googleapis.com",
            Self::Ollama => "http://localhost:11434",
            Self::OpenAi => "https://api.openai.com",
        }
    }
}

impl std::str::FromStr for LlmBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "ollama" | "local" => Ok(Self::Ollama),
            "openai" | "groq" => Ok(Self::OpenAi),
            other => Err(Error::Config(format!(
                "Unknown LLM backend '{}'. Use: gemini, ollama, openai",
                other
            ))),
        }
    }
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Which backend answers questions
    pub backend: LlmBackend,
    /// Model name (backend default when unset)
    pub model: Option<String>,
    /// API base URL (backend default when unset)
    pub base_url: Option<String>,
    /// API key; only ever read from the environment or the config file
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Temperature for generation
    pub temperature: f32,
    /// Upper bound on generated tokens
    pub max_output_tokens: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for transient failures
    pub max_retries: u32,
    /// Instruction template with `{context}` and `{question}` placeholders
    pub prompt_template: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: LlmBackend::default(),
            model: None,
            base_url: None,
            api_key: None,
            temperature: 0.3,
            max_output_tokens: 2048,
            timeout_secs: 120,
            max_retries: 2,
            prompt_template: None,
        }
    }
}

impl LlmConfig {
    /// Effective model name
    pub fn model_name(&self) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| self.backend.default_model().to_string())
    }

    /// Effective base URL without a trailing slash
    pub fn base_url(&self) -> String {
        self.base_url
            .as_deref()
            .unwrap_or(self.backend.default_base_url())
            .trim_end_matches('/')
            .to_string()
    }

    /// Upper bound on one question, covering every retry and its backoff
    pub fn interaction_timeout(&self) -> Duration {
        let attempts = u64::from(self.max_retries) + 1;
        let backoff = (0..self.max_retries)
            .map(retry_backoff)
            .fold(Duration::ZERO, Duration::saturating_add);
        Duration::from_secs(self.timeout_secs.saturating_mul(attempts)).saturating_add(backoff)
    }
}

/// Document extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Give up on a single PDF after this many seconds
    pub timeout_secs: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self { timeout_secs: 60 }
    }
}

/// Session registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Maximum live sessions before the least recently used is evicted
    pub max_sessions: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { max_sessions: 1000 }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist. Otherwise `SMARTDOC_CONFIG` and then
    /// `<config dir>/smartdoc/config.toml` are tried, falling back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match env_opt("SMARTDOC_CONFIG")
                .map(PathBuf::from)
                .or_else(default_config_path)
            {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        config.apply_overrides(env_opt)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        tracing::info!("Loaded configuration from {}", path.display());
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config: {}", e)))
    }

    /// Apply overrides from a key lookup (the process environment in production)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("SMARTDOC_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("SMARTDOC_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| Error::Config(format!("SMARTDOC_PORT is not a port: {}", port)))?;
        }
        if let Some(backend) = lookup("SMARTDOC_LLM_BACKEND") {
            self.llm.backend = backend.parse()?;
        }
        if let Some(model) = lookup("SMARTDOC_MODEL") {
            self.llm.model = Some(model);
        }

        // Backend specific endpoints and credentials
        match self.llm.backend {
            LlmBackend::Gemini => {
                if let Some(key) = lookup("GOOGLE_API_KEY") {
                    self.llm.api_key = Some(key);
                }
            }
            LlmBackend::OpenAi => {
                if let Some(key) = lookup("OPENAI_API_KEY") {
                    self.llm.api_key = Some(key);
                }
                if let Some(url) = lookup("OPENAI_BASE_URL") {
                    self.llm.base_url = Some(url);
                }
            }
            LlmBackend::Ollama => {
                if let Some(url) = lookup("OLLAMA_BASE_URL") {
                    self.llm.base_url = Some(url);
                }
            }
        }

        Ok(())
    }

    /// Reject parameter combinations the chunker and assembler cannot honour
    pub fn validate(&self) -> Result<()> {
        let chunking = &self.chunking;
        if chunking.chunk_size == 0 {
            return Err(Error::Config("chunk_size must be greater than 0".to_string()));
        }
        if chunking.chunk_overlap >= chunking.chunk_size {
            return Err(Error::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunking.chunk_overlap, chunking.chunk_size
            )));
        }
        if self.context.max_chunks == 0 || self.context.max_chars_per_chunk == 0 {
            return Err(Error::Config(
                "context.max_chunks and context.max_chars_per_chunk must be positive".to_string(),
            ));
        }
        if self.llm.timeout_secs == 0 {
            return Err(Error::Config("llm.timeout_secs must be positive".to_string()));
        }
        if self.llm.max_retries > MAX_LLM_RETRIES {
            return Err(Error::Config(format!(
                "llm.max_retries ({}) must be at most {}",
                self.llm.max_retries, MAX_LLM_RETRIES
            )));
        }
        if self.extraction.timeout_secs == 0 {
            return Err(Error::Config(
                "extraction.timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Server bind address
    pub fn address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("smartdoc").join("config.toml"))
}
