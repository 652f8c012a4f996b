//! TOML-based configuration for the research pipeline
//!
//! Everything the binary needs to wire a [`PipelineOrchestrator`] comes from
//! a `research.toml` file: pipeline limits, the language model provider,
//! collector endpoints, synthesis weights, logging and optional persistence.
//! Every field has a default, so an empty file is a valid configuration.
//!
//! Secrets are never stored in the file. Fields ending in `_env` name an
//! environment variable that holds the value.
//!
//! [`PipelineOrchestrator`]: crate::pipeline::PipelineOrchestrator

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::llm::Provider;
use crate::pipeline::{OrchestratorSettings, PipelineRequest};
use crate::synthesis::{ConfidenceWeights, KnowledgeSynthesizer};
use crate::types::{PipelineError, ResearchScope, SynthesisMode};

/// Root configuration structure loaded from research.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResearchConfig {
    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub collectors: CollectorsConfig,

    #[serde(default)]
    pub synthesis: SynthesisConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Results are only saved when this section is present
    #[serde(default)]
    pub persistence: Option<PersistenceConfig>,
}

// ============= Pipeline Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Per-step timeout in seconds
    #[serde(default = "default_step_timeout_secs")]
    pub step_timeout_secs: u64,

    /// Expert questions asked during collaboration
    #[serde(default = "default_expert_questions")]
    pub expert_questions: usize,

    #[serde(default)]
    pub default_scope: ResearchScope,

    #[serde(default = "default_max_sources")]
    pub default_max_sources: usize,

    #[serde(default = "default_true")]
    pub enable_agent_conversations: bool,

    #[serde(default)]
    pub default_synthesis_mode: SynthesisMode,
}

fn default_step_timeout_secs() -> u64 {
    60
}

fn default_expert_questions() -> usize {
    3
}

fn default_max_sources() -> usize {
    10
}

fn default_true() -> bool {
    true
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            step_timeout_secs: default_step_timeout_secs(),
            expert_questions: default_expert_questions(),
            default_scope: ResearchScope::default(),
            default_max_sources: default_max_sources(),
            enable_agent_conversations: true,
            default_synthesis_mode: SynthesisMode::default(),
        }
    }
}

impl PipelineConfig {
    pub fn settings(&self) -> OrchestratorSettings {
        OrchestratorSettings {
            step_timeout: Duration::from_secs(self.step_timeout_secs),
            expert_questions: self.expert_questions,
        }
    }

    /// Request for `topic` with the configured defaults.
    pub fn request(&self, topic: impl Into<String>) -> PipelineRequest {
        PipelineRequest {
            research_topic: topic.into(),
            research_scope: self.default_scope,
            max_sources: self.default_max_sources,
            enable_agent_conversations: self.enable_agent_conversations,
            synthesis_mode: self.default_synthesis_mode,
        }
    }
}

// ============= LLM Configuration =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Ollama,
    OpenAI,
    Scripted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: ProviderKind,

    #[serde(default = "default_model")]
    pub model: String,

    /// Ollama server URL or OpenAI-compatible API base
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    /// Environment variable holding the API key (OpenAI-compatible only)
    pub api_key_env: Option<String>,

    /// Answer used for every prompt by the scripted provider
    #[serde(default)]
    pub scripted_response: String,

    /// Ask the model for an executive summary of the knowledge base
    #[serde(default = "default_true")]
    pub executive_summary: bool,
}

fn default_model() -> String {
    "ministral-3:3b".to_string()
}

fn default_llm_base_url() -> String {
    "http://localhost:11434".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            model: default_model(),
            base_url: default_llm_base_url(),
            api_key_env: None,
            scripted_response: String::new(),
            executive_summary: true,
        }
    }
}

impl LlmConfig {
    /// Resolve the configured provider, reading secrets from the environment.
    pub fn provider(&self) -> Result<Provider, PipelineError> {
        Ok(match self.provider {
            ProviderKind::Ollama => Provider::Ollama {
                base_url: self.base_url.clone(),
                model: self.model.clone(),
            },
            ProviderKind::OpenAI => {
                let api_key = match &self.api_key_env {
                    Some(env) => std::env::var(env).map_err(|_| {
                        let missing = ConfigError::MissingEnvVar(env.clone());
                        PipelineError::Configuration(missing.to_string())
                    })?,
                    None => String::new(),
                };
                Provider::OpenAI {
                    api_key,
                    api_base: self.base_url.clone(),
                    model: self.model.clone(),
                }
            }
            ProviderKind::Scripted => Provider::Scripted {
                default_response: self.scripted_response.clone(),
            },
        })
    }
}

// ============= Collector Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorsConfig {
    #[serde(default = "default_wikipedia_api_url")]
    pub wikipedia_api_url: String,

    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Add DuckDuckGo web search to secondary discovery
    #[serde(default = "default_true")]
    pub web_search: bool,

    #[serde(default = "default_web_results")]
    pub web_results: usize,
}

fn default_wikipedia_api_url() -> String {
    crate::collectors::wikipedia::DEFAULT_API_URL.to_string()
}

fn default_http_timeout_secs() -> u64 {
    20
}

fn default_web_results() -> usize {
    10
}

impl Default for CollectorsConfig {
    fn default() -> Self {
        Self {
            wikipedia_api_url: default_wikipedia_api_url(),
            http_timeout_secs: default_http_timeout_secs(),
            web_search: true,
            web_results: default_web_results(),
        }
    }
}

// ============= Synthesis Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    #[serde(default)]
    pub weights: ConfidenceWeights,

    /// Confidence assigned to a fallback knowledge base
    #[serde(default = "default_fallback_confidence")]
    pub fallback_confidence: f64,

    /// Elements kept in `summary` mode
    #[serde(default = "default_summary_limit")]
    pub summary_limit: usize,
}

fn default_fallback_confidence() -> f64 {
    0.6
}

fn default_summary_limit() -> usize {
    10
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            weights: ConfidenceWeights::default(),
            fallback_confidence: default_fallback_confidence(),
            summary_limit: default_summary_limit(),
        }
    }
}

impl SynthesisConfig {
    pub fn synthesizer(&self) -> KnowledgeSynthesizer {
        KnowledgeSynthesizer::new(self.weights, self.fallback_confidence, self.summary_limit)
    }
}

// ============= Logging & Persistence =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    #[serde(default = "default_results_dir")]
    pub dir: PathBuf,
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("results")
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            dir: default_results_dir(),
        }
    }
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),
}

impl From<ConfigError> for PipelineError {
    fn from(err: ConfigError) -> Self {
        PipelineError::Configuration(err.to_string())
    }
}

impl ResearchConfig {
    /// Load and validate configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse without validating
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Check value ranges and that referenced env vars are set
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.step_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.step_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.pipeline.default_max_sources == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.default_max_sources must be at least 1".to_string(),
            ));
        }
        if self.collectors.http_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "collectors.http_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if !self.synthesis.weights.is_valid() {
            return Err(ConfigError::ValidationError(
                "synthesis.weights must be non-negative with a positive sum".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.synthesis.fallback_confidence) {
            return Err(ConfigError::ValidationError(format!(
                "synthesis.fallback_confidence must be within [0, 1], got {}",
                self.synthesis.fallback_confidence
            )));
        }
        if self.llm.provider != ProviderKind::Scripted && self.llm.model.trim().is_empty() {
            return Err(ConfigError::ValidationError("llm.model must not be empty".to_string()));
        }
        if let Some(ref env) = self.llm.api_key_env {
            self.validate_env_var(env)?;
        }
        Ok(())
    }

    fn validate_env_var(&self, name: &str) -> Result<(), ConfigError> {
        std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))?;
        Ok(())
    }
}

// ============= Configuration Manager =============

/// Thread-safe holder for the current configuration
pub struct ResearchConfigManager {
    config: Arc<ArcSwap<ResearchConfig>>,
    config_path: Option<PathBuf>,
}

impl ResearchConfigManager {
    /// Load the configuration at `path`, reading `.env` first
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let path = path.as_ref();
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(ConfigError::ReadError)?
                .join(path)
        };

        let config = ResearchConfig::load(&path)?;

        Ok(Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            config_path: Some(path),
        })
    }

    /// Manager over an in-memory config; `reload` is a no-op
    pub fn from_config(config: ResearchConfig) -> Self {
        Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            config_path: None,
        }
    }

    /// Get the current configuration (lockless read)
    pub fn config(&self) -> Arc<ResearchConfig> {
        self.config.load_full()
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Reload from disk. On error the previous configuration stays active.
    pub fn reload(&self) -> Result<(), ConfigError> {
        let Some(path) = &self.config_path else {
            return Ok(());
        };
        info!("Reloading configuration from {:?}", path);

        let new_config = ResearchConfig::load(path)?;
        self.config.store(Arc::new(new_config));

        info!("Configuration reloaded successfully");
        Ok(())
    }
}

impl Clone for ResearchConfigManager {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            config_path: self.config_path.clone(),
        }
    }
}
