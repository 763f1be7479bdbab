//! OpenAI-compatible chat completions
//!
//! OpenAI, Perplexity, Groq and Zhipu GLM all accept the same
//! `{model, messages, max_tokens, temperature, top_p}` envelope and answer
//! with `choices[0].message.content`, so one implementation serves all four.

use crate::error::Result;
use crate::providers::base::{missing_field, parse_envelope};
use crate::providers::{ChatRequest, Provider, ProviderConfig};

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Provider for any service speaking the OpenAI chat completions dialect
///
/// # Examples
///
/// ```
/// use bella::providers::{OpenAiCompatible, Provider, ProviderConfig};
///
/// let provider = OpenAiCompatible::new(ProviderConfig::new(
///     "groq",
///     "https://api.groq.com/openai/v1/chat/completions",
///     "llama-3.1-8b-instant",
/// ));
/// assert_eq!(provider.id(), "groq");
/// ```
#[derive(Debug, Clone)]
pub struct OpenAiCompatible {
    config: ProviderConfig,
}

impl OpenAiCompatible {
    /// Creates a provider from its settings
    pub fn new(config: ProviderConfig) -> Self {
        Self { config }
    }
}

impl Provider for OpenAiCompatible {
    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn config_mut(&mut self) -> &mut ProviderConfig {
        &mut self.config
    }

    fn build_request(&self, request: &ChatRequest<'_>) -> Result<serde_json::Value> {
        let mut messages = Vec::with_capacity(request.history.len() + 1);
        messages.push(WireMessage {
            role: "system",
            content: request.system_prompt,
        });
        messages.extend(request.history.iter().map(|m| WireMessage {
            role: m.role.as_str(),
            content: &m.content,
        }));

        let body = CompletionRequest {
            model: request.model,
            messages,
            max_tokens: request.sampling.max_tokens,
            temperature: request.sampling.temperature,
            top_p: request.sampling.top_p,
        };
        Ok(serde_json::to_value(body)?)
    }

    fn extract_reply(&self, body: &serde_json::Value) -> Result<String> {
        let response: CompletionResponse = parse_envelope(self.id(), body)?;
        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| missing_field(self.id(), "choices[0].message.content"))
    }
}
