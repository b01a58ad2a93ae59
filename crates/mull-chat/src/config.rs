//! Chat configuration.

use std::str::FromStr;
use std::time::Duration;

use mull_client::{GenerationClient, TokenField, DEFAULT_ENDPOINT, DEFAULT_MODEL_NAME};
use mull_segments::ParseMode;
use thiserror::Error;
use tracing::warn;

/// System prompt sent when none is configured.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a careful reasoning assistant. \
Structure every reply in three labeled sections, in this order: \
'Thought:' with your first impressions, \
'Reasoning:' with the step-by-step work, \
and 'Final Answer:' with one short paragraph for the user. \
Always finish with the 'Final Answer:' section.";

/// Errors from invalid configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("endpoint must not be empty")]
    MissingEndpoint,

    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
}

/// How a turn without a final answer is recovered.
#[derive(Debug, Clone, PartialEq)]
pub struct RecoveryPolicy {
    /// Ask the backend to finish a cut-off reply
    pub auto_retry: bool,
    /// Number of finish attempts
    pub max_retries: u32,
    /// Token budget of the first finish attempt
    pub finish_tokens_initial: u32,
    /// Budget added after each failed attempt
    pub finish_tokens_increment: u32,
    /// Condense the thinking text when finishing fails
    pub summarize: bool,
    /// Token budget of the summarizer request
    pub summarize_tokens: u32,
    /// Timeout of each recovery request
    pub timeout: Duration,
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        Self {
            auto_retry: true,
            max_retries: 2,
            finish_tokens_initial: 256,
            finish_tokens_increment: 128,
            summarize: true,
            summarize_tokens: 180,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Configuration for the chat engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// Generation service endpoint
    pub endpoint: String,
    /// Model name sent with each request
    pub model: Option<String>,
    /// Request key carrying the token budget
    pub token_field: TokenField,
    /// Token budget of the main request
    pub max_tokens: u32,
    /// Stream the main request
    pub stream: bool,
    pub temperature: f32,
    pub top_p: f32,
    pub seed: Option<u64>,
    /// System prompt for new transcripts
    pub system_prompt: String,
    /// How thinking and answer are told apart
    pub parse_mode: ParseMode,
    /// Minimum delay between display updates
    pub update_interval: Duration,
    /// Timeout of the main request
    pub stream_timeout: Duration,
    pub recovery: RecoveryPolicy,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: Some(DEFAULT_MODEL_NAME.to_string()),
            token_field: TokenField::default(),
            max_tokens: 1024,
            stream: true,
            temperature: 0.7,
            top_p: 0.95,
            seed: None,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            parse_mode: ParseMode::default(),
            update_interval: Duration::from_millis(50),
            stream_timeout: Duration::from_secs(120),
            recovery: RecoveryPolicy::default(),
        }
    }
}

impl ChatConfig {
    /// Create config from `MULL_*` environment variables.
    ///
    /// Unset variables keep their defaults. Unparseable values are logged
    /// and ignored.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let recovery = RecoveryPolicy {
            auto_retry: env_flag("MULL_AUTO_RETRY").unwrap_or(defaults.recovery.auto_retry),
            max_retries: env_parse("MULL_MAX_RETRIES").unwrap_or(defaults.recovery.max_retries),
            summarize: env_flag("MULL_SUMMARIZE").unwrap_or(defaults.recovery.summarize),
            ..defaults.recovery.clone()
        };

        let model = match std::env::var("MULL_MODEL") {
            Ok(name) if name.trim().is_empty() => None,
            Ok(name) => Some(name),
            Err(_) => defaults.model.clone(),
        };

        Self {
            endpoint: std::env::var("MULL_ENDPOINT").unwrap_or(defaults.endpoint),
            model,
            token_field: env_parse("MULL_TOKEN_FIELD").unwrap_or(defaults.token_field),
            max_tokens: env_parse("MULL_MAX_TOKENS").unwrap_or(defaults.max_tokens),
            stream: env_flag("MULL_STREAM").unwrap_or(defaults.stream),
            seed: env_parse("MULL_SEED"),
            system_prompt: std::env::var("MULL_SYSTEM_PROMPT").unwrap_or(defaults.system_prompt),
            parse_mode: env_parse("MULL_PARSE_MODE").unwrap_or(defaults.parse_mode),
            stream_timeout: env_parse("MULL_STREAM_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.stream_timeout),
            recovery,
            ..defaults
        }
    }

    /// Create a builder for configuration.
    pub fn builder() -> ChatConfigBuilder {
        ChatConfigBuilder::default()
    }

    /// Check endpoint and sampling values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::MissingEndpoint);
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::InvalidValue {
                field: "temperature",
                value: self.temperature.to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.top_p) || self.top_p == 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "top_p",
                value: self.top_p.to_string(),
            });
        }
        if self.max_tokens == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_tokens",
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    /// HTTP client for the configured endpoint.
    pub fn client(&self) -> GenerationClient {
        GenerationClient::with_endpoint(&self.endpoint)
            .with_model(self.model.clone())
            .with_token_field(self.token_field)
    }
}

fn env_flag(key: &str) -> Option<bool> {
    let value = std::env::var(key).ok()?;
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            warn!("Ignoring {}={:?}: expected a boolean", key, value);
            None
        }
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    let value = std::env::var(key).ok()?;
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!("Ignoring {}={:?}: could not parse", key, value);
            None
        }
    }
}

/// Builder for chat configuration.
#[derive(Debug, Default)]
pub struct ChatConfigBuilder {
    config: ChatConfig,
}

impl ChatConfigBuilder {
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    pub fn model(mut self, model: Option<String>) -> Self {
        self.config.model = model;
        self
    }

    pub fn token_field(mut self, field: TokenField) -> Self {
        self.config.token_field = field;
        self
    }

    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.config.max_tokens = tokens;
        self
    }

    pub fn stream(mut self, stream: bool) -> Self {
        self.config.stream = stream;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = temperature;
        self
    }

    pub fn top_p(mut self, top_p: f32) -> Self {
        self.config.top_p = top_p;
        self
    }

    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    pub fn parse_mode(mut self, mode: ParseMode) -> Self {
        self.config.parse_mode = mode;
        self
    }

    pub fn update_interval(mut self, interval: Duration) -> Self {
        self.config.update_interval = interval;
        self
    }

    pub fn stream_timeout(mut self, timeout: Duration) -> Self {
        self.config.stream_timeout = timeout;
        self
    }

    pub fn auto_retry(mut self, enabled: bool) -> Self {
        self.config.recovery.auto_retry = enabled;
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.recovery.max_retries = retries;
        self
    }

    pub fn summarize(mut self, enabled: bool) -> Self {
        self.config.recovery.summarize = enabled;
        self
    }

    pub fn recovery(mut self, policy: RecoveryPolicy) -> Self {
        self.config.recovery = policy;
        self
    }

    pub fn build(self) -> ChatConfig {
        self.config
    }
}
