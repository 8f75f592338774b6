pub mod providers;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// LLM provider types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LLMProvider {
    #[serde(rename = "vertex_ai")]
    VertexAI,
    #[serde(rename = "gemini")]
    Gemini,
    #[serde(rename = "openai_compatible")]
    OpenAICompatible,
}

/// LLM configuration
///
/// Model, project and location pass through to the provider unchanged;
/// nothing here is read from ambient process state after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LLMConfig {
    pub provider: LLMProvider,
    pub model: String,
    /// Cloud project id (Vertex AI)
    pub project: Option<String>,
    /// Cloud region (Vertex AI)
    pub location: Option<String>,
    /// API key, or an OAuth access token for Vertex AI
    pub api_key: Option<String>,
    /// Chat-completions endpoint for OpenAI-compatible servers
    pub endpoint: Option<String>,
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub timeout_seconds: u64,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::VertexAI,
            model: "gemini-pro".to_string(),
            project: None,
            location: Some("us-central1".to_string()),
            api_key: None,
            endpoint: None,
            max_output_tokens: 4096,
            temperature: 0.1,
            timeout_seconds: 60,
        }
    }
}

/// One completion round-trip's result
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: String,
    pub tokens_used: Option<u32>,
}

/// Trait for LLM providers
#[async_trait]
pub trait LLM: Send + Sync {
    /// Single stateless text completion; no conversation memory
    async fn complete(&self, prompt: &str) -> Result<CompletionResponse>;
    async fn is_available(&self) -> bool;
    fn provider_type(&self) -> LLMProvider;
}

/// Create LLM instance based on configuration
pub fn create_llm(config: &LLMConfig) -> Result<Box<dyn LLM>> {
    match config.provider {
        LLMProvider::VertexAI => Ok(Box::new(providers::VertexAIProvider::new(config.clone())?)),
        LLMProvider::Gemini => Ok(Box::new(providers::GeminiProvider::new(config.clone())?)),
        LLMProvider::OpenAICompatible => Ok(Box::new(providers::OpenAICompatibleProvider::new(
            config.clone(),
        )?)),
    }
}
