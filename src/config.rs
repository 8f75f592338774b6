use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::llm::{LLMConfig, LLMProvider};

/// Configuration for the concept extraction service
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Transcript fetching settings
    pub transcript: TranscriptConfig,

    /// Transcript chunking settings
    pub chunking: ChunkingConfig,

    /// Batching and extraction settings
    pub extraction: ExtractionConfig,

    /// LLM provider settings
    pub llm: LLMConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,

    /// Bind port
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptConfig {
    /// Preferred caption language
    pub language: String,

    /// HTTP request timeout in seconds
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk length in characters
    pub max_chunk_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Target batch count (0 = auto: one batch per five chunks)
    pub sample_count: usize,

    /// Chunks per batch at which extraction is refused
    pub quality_threshold: usize,

    /// Chunks per batch above which a degradation warning is logged
    pub warn_threshold: usize,

    /// Concurrent LLM requests per extraction
    pub max_concurrent_requests: usize,

    /// Also produce a document summary alongside the concepts
    pub enable_summary: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: 1000,
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            sample_count: 0, // auto
            quality_threshold: 10,
            warn_threshold: 5,
            max_concurrent_requests: num_cpus::get().min(4),
            enable_summary: false,
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        // Try to load from various locations
        let config_paths = [
            "dynamocards.toml",
            "config/dynamocards.toml",
            "~/.config/dynamocards/config.toml",
            "/etc/dynamocards/config.toml",
        ];

        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str(&config_str) {
                    Ok(config) => {
                        tracing::info!("📄 Loaded configuration from: {}", path);
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path, e);
                    }
                }
            }
        }

        // Fall back to defaults with environment overrides
        Self::from_env()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("DYNAMOCARDS_HOST") {
            config.server.host = host;
        }

        if let Ok(port) = std::env::var("DYNAMOCARDS_PORT") {
            config.server.port = port.parse().unwrap_or(8000);
        }

        if let Ok(provider) = std::env::var("DYNAMOCARDS_LLM_PROVIDER") {
            config.llm.provider = match provider.as_str() {
                "vertex_ai" => LLMProvider::VertexAI,
                "gemini" => LLMProvider::Gemini,
                "openai_compatible" => LLMProvider::OpenAICompatible,
                other => {
                    return Err(anyhow!("Unknown LLM provider: {}", other));
                }
            };
        }

        if let Ok(model) = std::env::var("DYNAMOCARDS_LLM_MODEL") {
            config.llm.model = model;
        }

        if let Ok(project) = std::env::var("DYNAMOCARDS_LLM_PROJECT") {
            config.llm.project = Some(project);
        }

        if let Ok(location) = std::env::var("DYNAMOCARDS_LLM_LOCATION") {
            config.llm.location = Some(location);
        }

        if let Ok(api_key) = std::env::var("DYNAMOCARDS_LLM_API_KEY") {
            config.llm.api_key = Some(api_key);
        }

        if let Ok(endpoint) = std::env::var("DYNAMOCARDS_LLM_ENDPOINT") {
            config.llm.endpoint = Some(endpoint);
        }

        if let Ok(sample_count) = std::env::var("DYNAMOCARDS_SAMPLE_COUNT") {
            config.extraction.sample_count = sample_count.parse().unwrap_or(0);
        }

        if let Ok(concurrent) = std::env::var("DYNAMOCARDS_MAX_CONCURRENT") {
            config.extraction.max_concurrent_requests = concurrent.parse().unwrap_or(4);
        }

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &str) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path);
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.chunking.max_chunk_size == 0 {
            return Err(anyhow!("max_chunk_size must be greater than 0"));
        }

        if self.extraction.quality_threshold == 0 {
            return Err(anyhow!("quality_threshold must be greater than 0"));
        }

        if self.extraction.max_concurrent_requests == 0 {
            return Err(anyhow!("max_concurrent_requests must be greater than 0"));
        }

        if self.transcript.timeout_seconds == 0 {
            return Err(anyhow!("transcript timeout_seconds must be greater than 0"));
        }

        // Provider-specific requirements
        match self.llm.provider {
            LLMProvider::VertexAI => {
                if self.llm.project.is_none() {
                    return Err(anyhow!("Vertex AI provider requires llm.project"));
                }
                if self.llm.location.is_none() {
                    return Err(anyhow!("Vertex AI provider requires llm.location"));
                }
                if self.llm.api_key.is_none() {
                    return Err(anyhow!(
                        "Vertex AI provider requires llm.api_key (an OAuth access token)"
                    ));
                }
            }
            LLMProvider::Gemini => {
                if self.llm.api_key.is_none() {
                    return Err(anyhow!("Gemini provider requires llm.api_key"));
                }
            }
            LLMProvider::OpenAICompatible => {
                if self.llm.endpoint.is_none() {
                    return Err(anyhow!("OpenAI-compatible provider requires llm.endpoint"));
                }
            }
        }

        tracing::info!("✅ Configuration validation passed");
        Ok(())
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "DynamoCards Configuration:\n\
            - Server: {}:{}\n\
            - LLM Provider: {:?}\n\
            - Model: {}\n\
            - Max Chunk Size: {} chars\n\
            - Sample Count: {}\n\
            - Concurrent Requests: {}\n\
            - Summary Enabled: {}",
            self.server.host,
            self.server.port,
            self.llm.provider,
            self.llm.model,
            self.chunking.max_chunk_size,
            if self.extraction.sample_count == 0 {
                "auto".to_string()
            } else {
                self.extraction.sample_count.to_string()
            },
            self.extraction.max_concurrent_requests,
            self.extraction.enable_summary
        )
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn with_provider(mut self, provider: LLMProvider) -> Self {
        self.config.llm.provider = provider;
        self
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.config.llm.model = model;
        self
    }

    pub fn with_project(mut self, project: String) -> Self {
        self.config.llm.project = Some(project);
        self
    }

    pub fn with_api_key(mut self, api_key: String) -> Self {
        self.config.llm.api_key = Some(api_key);
        self
    }

    pub fn with_endpoint(mut self, endpoint: String) -> Self {
        self.config.llm.endpoint = Some(endpoint);
        self
    }

    pub fn with_sample_count(mut self, sample_count: usize) -> Self {
        self.config.extraction.sample_count = sample_count;
        self
    }

    pub fn with_max_chunk_size(mut self, max_chunk_size: usize) -> Self {
        self.config.chunking.max_chunk_size = max_chunk_size;
        self
    }

    pub fn enable_summary(mut self, enable: bool) -> Self {
        self.config.extraction.enable_summary = enable;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.chunking.max_chunk_size, 1000);
        assert_eq!(config.extraction.quality_threshold, 10);
        assert_eq!(config.extraction.sample_count, 0);
        assert!(!config.extraction.enable_summary);
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .with_port(9000)
            .with_sample_count(8)
            .enable_summary(true)
            .build();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.extraction.sample_count, 8);
        assert!(config.extraction.enable_summary);
    }

    #[test]
    fn test_default_config_needs_credentials() {
        // The default Vertex AI provider cannot run without project/token
        let config = Config::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_passes_with_credentials() {
        let config = ConfigBuilder::new()
            .with_project("demo-project".to_string())
            .with_api_key("token".to_string())
            .build();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_local_endpoint_validates_without_key() {
        let config = ConfigBuilder::new()
            .with_provider(LLMProvider::OpenAICompatible)
            .with_endpoint("http://localhost:1234/v1/chat/completions".to_string())
            .build();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_chunk_size_is_rejected() {
        let config = ConfigBuilder::new().with_max_chunk_size(0).build();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_reparse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dynamocards.toml");

        let config = ConfigBuilder::new().with_port(9100).with_sample_count(7).build();
        config.save(path.to_str().unwrap()).unwrap();

        let reparsed: Config =
            toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(reparsed.server.port, 9100);
        assert_eq!(reparsed.extraction.sample_count, 7);
    }

    #[test]
    fn test_partial_file_round_trip() {
        let parsed: Config = toml::from_str(
            r#"
            [extraction]
            sample_count = 6

            [llm]
            provider = "gemini"
            api_key = "k"
        "#,
        )
        .unwrap();

        assert_eq!(parsed.extraction.sample_count, 6);
        assert_eq!(parsed.llm.provider, LLMProvider::Gemini);
        // Untouched sections keep their defaults
        assert_eq!(parsed.chunking.max_chunk_size, 1000);
        assert_eq!(parsed.server.port, 8000);
    }

    #[test]
    fn test_summary_reports_core_settings() {
        let config = ConfigBuilder::new()
            .with_port(9200)
            .with_model("gemini-1.5-flash".to_string())
            .build();

        let summary = config.summary();
        assert!(summary.contains("0.0.0.0:9200"));
        assert!(summary.contains("gemini-1.5-flash"));
        assert!(summary.contains("Sample Count: auto"));
    }
}
