//! Provider module for Bella
//!
//! This module contains the provider abstraction, one implementation per
//! API family, and the registry that maps provider identifiers to their
//! settings and request builders.

pub mod anthropic;
pub mod base;
pub mod ernie;
pub mod gemini;
pub mod openai;
pub mod qwen;

pub use anthropic::AnthropicProvider;
pub use base::{
    is_placeholder, AuthPlacement, ChatRequest, Message, Provider, ProviderConfig, Role,
    SamplingParams,
};
pub use ernie::ErnieProvider;
pub use gemini::GeminiProvider;
pub use openai::OpenAiCompatible;
pub use qwen::QwenProvider;

use crate::config::ApiConfig;
use crate::error::{BellaError, Result};
use serde::Serialize;
use std::collections::BTreeMap;

/// Built-in providers: identifier, display name, endpoint, default model
pub const BUILTIN_PROVIDERS: &[(&str, &str, &str, &str)] = &[
    (
        "openai",
        "OpenAI",
        "https://api.openai.com/v1/chat/completions",
        "gpt-3.5-turbo",
    ),
    (
        "claude",
        "Anthropic Claude",
        "https://api.anthropic.com/v1/messages",
        "claude-3-haiku-20240307",
    ),
    (
        "gemini",
        "Google Gemini",
        "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash-latest:generateContent",
        "gemini-1.5-flash-latest",
    ),
    (
        "perplexity",
        "Perplexity",
        "https://api.perplexity.ai/chat/completions",
        "llama-3.1-8b-instant",
    ),
    (
        "groq",
        "Groq",
        "https://api.groq.com/openai/v1/chat/completions",
        "llama-3.1-8b-instant",
    ),
    (
        "qwen",
        "Alibaba Qwen",
        "https://dashscope.aliyuncs.com/api/v1/services/aigc/text-generation/generation",
        "qwen-turbo",
    ),
    (
        "ernie",
        "Baidu ERNIE",
        "https://aip.baidubce.com/rpc/2.0/ai_custom/v1/wenxinworkshop/chat/completions",
        "ernie-bot",
    ),
    (
        "glm",
        "Zhipu GLM",
        "https://open.bigmodel.cn/api/paas/v4/chat/completions",
        "glm-4-flash",
    ),
];

/// Create a provider instance for a built-in identifier
///
/// # Arguments
///
/// * `config` - Provider settings; `config.id` selects the implementation
///
/// # Returns
///
/// Returns a boxed provider instance
///
/// # Errors
///
/// Returns `BellaError::UnknownProvider` if the identifier is not built in
pub fn create_provider(config: ProviderConfig) -> Result<Box<dyn Provider>> {
    match config.id.as_str() {
        "openai" | "perplexity" | "groq" | "glm" => Ok(Box::new(OpenAiCompatible::new(config))),
        "claude" => Ok(Box::new(AnthropicProvider::new(config))),
        "gemini" => Ok(Box::new(GeminiProvider::new(config))),
        "qwen" => Ok(Box::new(QwenProvider::new(config))),
        "ernie" => Ok(Box::new(ErnieProvider::new(config))),
        other => Err(BellaError::UnknownProvider(other.to_string()).into()),
    }
}

/// Default settings for a built-in provider
pub fn builtin_config(id: &str) -> Option<ProviderConfig> {
    BUILTIN_PROVIDERS
        .iter()
        .find(|(builtin, ..)| *builtin == id)
        .map(|(id, _, endpoint, model)| ProviderConfig::new(*id, *endpoint, *model))
}

/// Row returned by [`ProviderRegistry::available`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderSummary {
    /// Registry identifier
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Model identifier
    pub model: String,
    /// Whether a usable credential is installed
    pub configured: bool,
}

/// Lookup table from provider identifier to implementation
///
/// # Examples
///
/// ```
/// use bella::providers::ProviderRegistry;
///
/// let mut registry = ProviderRegistry::with_defaults();
/// assert!(!registry.is_configured("openai"));
/// registry.set_credential("openai", "sk-test").unwrap();
/// assert!(registry.is_configured("openai"));
/// assert!(registry.set_credential("nope", "x").is_err());
/// ```
pub struct ProviderRegistry {
    entries: BTreeMap<String, Box<dyn Provider>>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ProviderRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Creates a registry holding every built-in provider with default settings
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for (id, ..) in BUILTIN_PROVIDERS {
            if let Some(config) = builtin_config(id) {
                // Built-in identifiers always have an implementation
                if let Ok(provider) = create_provider(config) {
                    registry.register(provider);
                }
            }
        }
        registry
    }

    /// Creates the built-in registry and applies endpoint, model and key overrides
    ///
    /// # Errors
    ///
    /// Returns `BellaError::UnknownProvider` if an override names a provider
    /// that is not built in.
    pub fn from_config(api: &ApiConfig) -> Result<Self> {
        let mut registry = Self::with_defaults();
        for (id, settings) in &api.providers {
            let provider = registry
                .entries
                .get_mut(id)
                .ok_or_else(|| BellaError::UnknownProvider(id.clone()))?;
            let config = provider.config_mut();
            if let Some(endpoint) = &settings.endpoint {
                config.endpoint = endpoint.clone();
            }
            if let Some(model) = &settings.model {
                config.model = model.clone();
            }
            if let Some(key) = &settings.api_key {
                config.credential = Some(key.clone());
            }
        }
        tracing::debug!("Provider registry initialized: {:?}", registry);
        Ok(registry)
    }

    /// Adds or replaces a provider
    pub fn register(&mut self, provider: Box<dyn Provider>) {
        self.entries.insert(provider.id().to_string(), provider);
    }

    /// Returns the provider for an identifier
    pub fn get(&self, id: &str) -> Option<&dyn Provider> {
        self.entries.get(id).map(|p| p.as_ref())
    }

    /// Returns the settings for an identifier, `None` when unknown
    pub fn get_config(&self, id: &str) -> Option<&ProviderConfig> {
        self.entries.get(id).map(|p| p.config())
    }

    /// Installs a credential
    ///
    /// # Errors
    ///
    /// Returns `BellaError::UnknownProvider` if the identifier is not registered
    pub fn set_credential(&mut self, id: &str, secret: impl Into<String>) -> Result<()> {
        let provider = self
            .entries
            .get_mut(id)
            .ok_or_else(|| BellaError::UnknownProvider(id.to_string()))?;
        provider.config_mut().credential = Some(secret.into());
        tracing::info!("Credential updated for provider {}", id);
        Ok(())
    }

    /// Returns true when the provider exists and holds a usable credential
    pub fn is_configured(&self, id: &str) -> bool {
        self.get_config(id)
            .and_then(|c| c.usable_credential())
            .is_some()
    }

    /// Returns true when the identifier is registered
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Registered identifiers in sorted order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Lists every provider with its model and configuration status
    pub fn available(&self) -> Vec<ProviderSummary> {
        self.entries
            .values()
            .map(|provider| {
                let name = BUILTIN_PROVIDERS
                    .iter()
                    .find(|(id, ..)| *id == provider.id())
                    .map(|(_, name, ..)| name.to_string())
                    .unwrap_or_else(|| provider.id().to_string());
                ProviderSummary {
                    id: provider.id().to_string(),
                    name,
                    model: provider.model().to_string(),
                    configured: provider.config().usable_credential().is_some(),
                }
            })
            .collect()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
