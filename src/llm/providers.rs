use super::{CompletionResponse, LLM, LLMConfig, LLMProvider};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

// Request/response shapes for the generateContent API, shared by the
// Vertex AI and Gemini providers (same wire format, different host + auth).

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Vec<GeminiCandidate>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<GeminiUsage>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[derive(Debug, Deserialize)]
struct GeminiUsage {
    #[serde(rename = "totalTokenCount")]
    total_token_count: u32,
}

fn generate_content_request(prompt: &str, config: &LLMConfig) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![GeminiContent {
            parts: vec![GeminiPart {
                text: prompt.to_string(),
            }],
        }],
        generation_config: GeminiGenerationConfig {
            max_output_tokens: config.max_output_tokens,
            temperature: config.temperature,
        },
    }
}

fn parse_generate_content(response: GenerateContentResponse, provider: &str) -> Result<CompletionResponse> {
    let content = response
        .candidates
        .first()
        .and_then(|c| c.content.parts.first())
        .map(|p| p.text.clone())
        .ok_or_else(|| anyhow!("No response from {}", provider))?;

    let tokens_used = response.usage_metadata.map(|u| u.total_token_count);

    Ok(CompletionResponse {
        content,
        tokens_used,
    })
}

/// Vertex AI provider implementation
///
/// Speaks the generateContent API on the regional aiplatform endpoint,
/// authenticated with an OAuth access token.
pub struct VertexAIProvider {
    config: LLMConfig,
    client: reqwest::Client,
    project: String,
    location: String,
}

impl VertexAIProvider {
    pub fn new(config: LLMConfig) -> Result<Self> {
        let project = config
            .project
            .clone()
            .ok_or_else(|| anyhow!("Vertex AI project required"))?;
        let location = config
            .location
            .clone()
            .ok_or_else(|| anyhow!("Vertex AI location required"))?;
        if config.api_key.is_none() {
            return Err(anyhow!("Vertex AI access token required"));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            config,
            client,
            project,
            location,
        })
    }

    fn model_url(&self) -> String {
        format!(
            "https://{}-aiplatform.googleapis.com/v1/projects/{}/locations/{}/publishers/google/models/{}",
            self.location, self.project, self.location, self.config.model
        )
    }
}

#[async_trait]
impl LLM for VertexAIProvider {
    async fn complete(&self, prompt: &str) -> Result<CompletionResponse> {
        let access_token = self
            .config
            .api_key
            .as_ref()
            .ok_or_else(|| anyhow!("Vertex AI access token not configured"))?;

        let request = generate_content_request(prompt, &self.config);
        let url = format!("{}:generateContent", self.model_url());

        debug!("Sending request to Vertex AI ({})", self.config.model);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", access_token))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Vertex AI API error {}: {}", status, text));
        }

        parse_generate_content(response.json().await?, "Vertex AI")
    }

    async fn is_available(&self) -> bool {
        let access_token = match &self.config.api_key {
            Some(token) => token,
            None => return false,
        };

        // Fetching the model's metadata is the cheapest authenticated probe
        match self
            .client
            .get(self.model_url())
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    fn provider_type(&self) -> LLMProvider {
        LLMProvider::VertexAI
    }
}

/// Gemini provider implementation
pub struct GeminiProvider {
    config: LLMConfig,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(config: LLMConfig) -> Result<Self> {
        if config.api_key.is_none() {
            return Err(anyhow!("Gemini API key required"));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl LLM for GeminiProvider {
    async fn complete(&self, prompt: &str) -> Result<CompletionResponse> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or_else(|| anyhow!("Gemini API key not configured"))?;

        let request = generate_content_request(prompt, &self.config);
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.config.model, api_key
        );

        debug!("Sending request to Gemini API ({})", self.config.model);

        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Gemini API error {}: {}", status, text));
        }

        parse_generate_content(response.json().await?, "Gemini")
    }

    async fn is_available(&self) -> bool {
        // Simple check by trying to list models
        if let Some(api_key) = &self.config.api_key {
            let url = format!(
                "https://generativelanguage.googleapis.com/v1beta/models?key={}",
                api_key
            );

            match self.client.get(&url).send().await {
                Ok(response) => response.status().is_success(),
                Err(_) => false,
            }
        } else {
            false
        }
    }

    fn provider_type(&self) -> LLMProvider {
        LLMProvider::Gemini
    }
}

/// OpenAI-compatible provider implementation
///
/// Works against any chat-completions endpoint: hosted OpenAI, LM Studio,
/// Ollama and the like. The API key is optional since local servers
/// usually run without one.
pub struct OpenAICompatibleProvider {
    config: LLMConfig,
    client: reqwest::Client,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    total_tokens: u32,
}

impl OpenAICompatibleProvider {
    pub fn new(config: LLMConfig) -> Result<Self> {
        if config.endpoint.is_none() {
            return Err(anyhow!("OpenAI-compatible endpoint required"));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl LLM for OpenAICompatibleProvider {
    async fn complete(&self, prompt: &str) -> Result<CompletionResponse> {
        let endpoint = self
            .config
            .endpoint
            .as_ref()
            .ok_or_else(|| anyhow!("OpenAI-compatible endpoint not configured"))?;

        let request = OpenAIRequest {
            model: self.config.model.clone(),
            messages: vec![OpenAIMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: self.config.max_output_tokens,
            temperature: self.config.temperature,
        };

        debug!("Sending request to OpenAI-compatible endpoint {}", endpoint);

        let mut builder = self.client.post(endpoint).json(&request);
        if let Some(api_key) = &self.config.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("OpenAI-compatible API error {}: {}", status, text));
        }

        let openai_response: OpenAIResponse = response.json().await?;

        let content = openai_response
            .choices
            .first()
            .ok_or_else(|| anyhow!("No response from OpenAI-compatible endpoint"))?
            .message
            .content
            .clone();

        let tokens_used = openai_response.usage.map(|u| u.total_tokens);

        Ok(CompletionResponse {
            content,
            tokens_used,
        })
    }

    async fn is_available(&self) -> bool {
        let endpoint = match &self.config.endpoint {
            Some(ep) => ep,
            None => return false,
        };

        // Try the sibling models endpoint
        let models_endpoint = endpoint.replace("/chat/completions", "/models");

        let mut builder = self.client.get(&models_endpoint);
        if let Some(api_key) = &self.config.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", api_key));
        }

        match builder.send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    fn provider_type(&self) -> LLMProvider {
        LLMProvider::OpenAICompatible
    }
}
