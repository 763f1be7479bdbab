//! Configuration management for Bella
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::chat_mode::ChatMode;
use crate::error::{BellaError, Result};
use crate::providers::{SamplingParams, BUILTIN_PROVIDERS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

/// Main configuration structure for Bella
///
/// Every section has defaults, so an empty or missing file yields a
/// working configuration that only lacks API keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Provider selection, sampling and per-provider overrides
    #[serde(default)]
    pub api: ApiConfig,
    /// Conversation behavior
    #[serde(default)]
    pub chat: ChatConfig,
    /// Speech synthesis defaults
    #[serde(default)]
    pub voice: VoiceConfig,
    /// Desktop notifications
    #[serde(default)]
    pub notifications: NotificationConfig,
    /// Proactive re-engagement timer
    #[serde(default)]
    pub proactive: ProactiveConfig,
}

/// Remote API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Identifier of the provider used when none is chosen explicitly
    #[serde(default = "default_provider")]
    pub provider: String,

    /// HTTP timeout applied to each provider call
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Sampling parameters sent with every request
    #[serde(default)]
    pub sampling: SamplingParams,

    /// Per-provider endpoint, model and key overrides keyed by identifier
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderSettings>,
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_timeout() -> u64 {
    60
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            timeout_seconds: default_timeout(),
            sampling: SamplingParams::default(),
            providers: BTreeMap::new(),
        }
    }
}

/// Overrides for a single provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Replacement endpoint URL
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Replacement model identifier
    #[serde(default)]
    pub model: Option<String>,
    /// API key or access token
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Conversation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Maximum number of messages kept in the history
    #[serde(default = "default_max_history_length")]
    pub max_history_length: usize,

    /// Mode used when none is stored or given on the command line
    #[serde(default = "default_chat_mode")]
    pub default_mode: String,

    /// Name the companion uses for herself
    #[serde(default = "default_persona_name")]
    pub persona_name: String,

    /// Language the companion answers in
    #[serde(default = "default_language")]
    pub language: String,

    /// Lines shown when a provider call fails
    #[serde(default = "default_fallback_responses")]
    pub fallback_responses: Vec<String>,
}

fn default_max_history_length() -> usize {
    15
}

fn default_chat_mode() -> String {
    "casual".to_string()
}

fn default_persona_name() -> String {
    "Bella".to_string()
}

fn default_language() -> String {
    "English".to_string()
}

fn default_fallback_responses() -> Vec<String> {
    [
        "Sorry, I'm a little confused right now, let me collect my thoughts...",
        "Hmm... I need to think about that a bit more, give me a moment.",
        "My thoughts are a bit tangled, give me some time to sort them out.",
        "Let me find the right words, just a moment.",
        "Oops, I was daydreaming. Could you say that again?",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_history_length: default_max_history_length(),
            default_mode: default_chat_mode(),
            persona_name: default_persona_name(),
            language: default_language(),
            fallback_responses: default_fallback_responses(),
        }
    }
}

/// Speech synthesis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceConfig {
    /// Speak replies aloud when a synthesizer is available
    #[serde(default)]
    pub enabled: bool,

    /// BCP-47 language tag used to pick a voice
    #[serde(default = "default_voice_language")]
    pub language: String,

    /// Speaking rate
    #[serde(default = "default_voice_rate")]
    pub rate: f32,

    /// Voice pitch
    #[serde(default = "default_voice_pitch")]
    pub pitch: f32,

    /// Output volume between 0 and 1
    #[serde(default = "default_voice_volume")]
    pub volume: f32,
}

fn default_voice_language() -> String {
    "en-US".to_string()
}

fn default_voice_rate() -> f32 {
    0.9
}

fn default_voice_pitch() -> f32 {
    1.1
}

fn default_voice_volume() -> f32 {
    0.8
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            language: default_voice_language(),
            rate: default_voice_rate(),
            pitch: default_voice_pitch(),
            volume: default_voice_volume(),
        }
    }
}

/// Notification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Allow notifications at all
    #[serde(default = "default_notifications_enabled")]
    pub enabled: bool,
}

fn default_notifications_enabled() -> bool {
    true
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: default_notifications_enabled(),
        }
    }
}

/// Proactive re-engagement configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProactiveConfig {
    /// Start the timer with the chat session
    #[serde(default)]
    pub enabled: bool,

    /// Seconds between idle checks
    #[serde(default = "default_check_interval")]
    pub check_interval_seconds: u64,

    /// Idle time after which a message is sent
    #[serde(default = "default_idle_threshold")]
    pub idle_threshold_seconds: u64,
}

fn default_check_interval() -> u64 {
    60
}

fn default_idle_threshold() -> u64 {
    300
}

impl Default for ProactiveConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            check_interval_seconds: default_check_interval(),
            idle_threshold_seconds: default_idle_threshold(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| BellaError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| BellaError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(provider) = std::env::var("BELLA_PROVIDER") {
            self.api.provider = provider;
        }

        if let Ok(timeout) = std::env::var("BELLA_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.api.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid BELLA_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        // BELLA_<ID>_API_KEY, BELLA_<ID>_MODEL, BELLA_<ID>_ENDPOINT
        for (id, ..) in BUILTIN_PROVIDERS {
            let prefix = format!("BELLA_{}", id.to_uppercase());
            let key = std::env::var(format!("{}_API_KEY", prefix)).ok();
            let model = std::env::var(format!("{}_MODEL", prefix)).ok();
            let endpoint = std::env::var(format!("{}_ENDPOINT", prefix)).ok();
            if key.is_none() && model.is_none() && endpoint.is_none() {
                continue;
            }
            let settings = self.api.providers.entry(id.to_string()).or_default();
            if key.is_some() {
                settings.api_key = key;
            }
            if model.is_some() {
                settings.model = model;
            }
            if endpoint.is_some() {
                settings.endpoint = endpoint;
            }
            tracing::debug!("Applied {}_* environment overrides", prefix);
        }

        if let Ok(max_history) = std::env::var("BELLA_MAX_HISTORY") {
            if let Ok(value) = max_history.parse() {
                self.chat.max_history_length = value;
            } else {
                tracing::warn!("Invalid BELLA_MAX_HISTORY: {}", max_history);
            }
        }

        if let Ok(mode) = std::env::var("BELLA_CHAT_MODE") {
            self.chat.default_mode = mode;
        }

        if let Ok(enabled) = std::env::var("BELLA_PROACTIVE") {
            match enabled.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.proactive.enabled = true,
                "0" | "false" | "no" | "off" => self.proactive.enabled = false,
                other => tracing::warn!("Invalid BELLA_PROACTIVE: {}", other),
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }

        use crate::cli::Commands;
        let (provider, mode) = match &cli.command {
            Commands::Chat { provider, mode } | Commands::Ask { provider, mode, .. } => {
                (provider.as_ref(), mode.as_ref())
            }
            _ => (None, None),
        };
        if let Some(provider) = provider {
            tracing::debug!("Using provider override: {}", provider);
            self.api.provider = provider.clone();
        }
        if let Some(mode) = mode {
            tracing::debug!("Using mode override: {}", mode);
            self.chat.default_mode = mode.clone();
        }
    }

    /// Validate the configuration
    ///
    /// Ensures all configuration values are within acceptable ranges
    /// and that required fields are properly set.
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        let known: Vec<&str> = BUILTIN_PROVIDERS.iter().map(|(id, ..)| *id).collect();

        if self.api.provider.is_empty() {
            return Err(BellaError::Config("Provider cannot be empty".to_string()).into());
        }

        if !known.contains(&self.api.provider.as_str()) {
            return Err(BellaError::Config(format!(
                "Invalid provider: {}. Must be one of: {}",
                self.api.provider,
                known.join(", ")
            ))
            .into());
        }

        for (id, settings) in &self.api.providers {
            if !known.contains(&id.as_str()) {
                return Err(BellaError::Config(format!(
                    "Unknown provider in api.providers: {}",
                    id
                ))
                .into());
            }
            if let Some(endpoint) = &settings.endpoint {
                let parsed = url::Url::parse(endpoint).map_err(|e| {
                    BellaError::Config(format!("Invalid endpoint for {}: {}", id, e))
                })?;
                if !matches!(parsed.scheme(), "http" | "https") {
                    return Err(BellaError::Config(format!(
                        "Endpoint for {} must use http or https",
                        id
                    ))
                    .into());
                }
            }
        }

        if self.api.timeout_seconds == 0 {
            return Err(
                BellaError::Config("timeout_seconds must be greater than 0".to_string()).into(),
            );
        }

        let sampling = &self.api.sampling;
        if !(0.0..=2.0).contains(&sampling.temperature) {
            return Err(BellaError::Config(
                "sampling.temperature must be between 0.0 and 2.0".to_string(),
            )
            .into());
        }
        if sampling.top_p <= 0.0 || sampling.top_p > 1.0 {
            return Err(BellaError::Config(
                "sampling.top_p must be between 0.0 and 1.0".to_string(),
            )
            .into());
        }
        if sampling.max_tokens == 0 {
            return Err(BellaError::Config(
                "sampling.max_tokens must be greater than 0".to_string(),
            )
            .into());
        }

        if self.chat.max_history_length == 0 {
            return Err(BellaError::Config(
                "chat.max_history_length must be greater than 0".to_string(),
            )
            .into());
        }

        ChatMode::from_str(&self.chat.default_mode)
            .map_err(|e| BellaError::Config(format!("chat.default_mode: {}", e)))?;

        if self.chat.fallback_responses.is_empty() {
            return Err(BellaError::Config(
                "chat.fallback_responses must not be empty".to_string(),
            )
            .into());
        }

        if !(0.0..=1.0).contains(&self.voice.volume) {
            return Err(
                BellaError::Config("voice.volume must be between 0.0 and 1.0".to_string()).into(),
            );
        }
        if self.voice.rate <= 0.0 || self.voice.pitch < 0.0 {
            return Err(BellaError::Config(
                "voice.rate must be positive and voice.pitch non-negative".to_string(),
            )
            .into());
        }

        if self.proactive.check_interval_seconds == 0 {
            return Err(BellaError::Config(
                "proactive.check_interval_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }
}
