//! Anthropic messages API
//!
//! The system prompt travels as a top-level `system` field rather than as a
//! message, and the key goes in `x-api-key` with a pinned API version.

use crate::error::Result;
use crate::providers::base::{missing_field, parse_envelope, without_leading_replies};
use crate::providers::{AuthPlacement, ChatRequest, Provider, ProviderConfig, Role};

use serde::{Deserialize, Serialize};

/// Value sent in the `anthropic-version` header
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

/// Claude provider
#[derive(Debug, Clone)]
pub struct AnthropicProvider {
    config: ProviderConfig,
}

impl AnthropicProvider {
    /// Creates a provider from its settings
    pub fn new(config: ProviderConfig) -> Self {
        Self { config }
    }
}

impl Provider for AnthropicProvider {
    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn config_mut(&mut self) -> &mut ProviderConfig {
        &mut self.config
    }

    fn build_request(&self, request: &ChatRequest<'_>) -> Result<serde_json::Value> {
        // The API only knows user and assistant turns and must open with a user turn
        let messages = without_leading_replies(request.history)
            .iter()
            .map(|m| AnthropicMessage {
                role: match m.role {
                    Role::Assistant => "assistant",
                    _ => "user",
                },
                content: &m.content,
            })
            .collect();

        let body = MessagesRequest {
            model: request.model,
            max_tokens: request.sampling.max_tokens,
            temperature: request.sampling.temperature,
            system: request.system_prompt,
            messages,
        };
        Ok(serde_json::to_value(body)?)
    }

    fn extract_reply(&self, body: &serde_json::Value) -> Result<String> {
        let response: MessagesResponse = parse_envelope(self.id(), body)?;
        response
            .content
            .into_iter()
            .next()
            .and_then(|block| block.text)
            .ok_or_else(|| missing_field(self.id(), "content[0].text"))
    }

    fn auth(&self, credential: &str) -> AuthPlacement {
        AuthPlacement::header("x-api-key", credential)
            .with_header("anthropic-version", ANTHROPIC_VERSION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{Message, SamplingParams};
    use serde_json::json;

    fn provider() -> AnthropicProvider {
        AnthropicProvider::new(ProviderConfig::new(
            "claude",
            "https://api.anthropic.com/v1/messages",
            "claude-3-haiku-20240307",
        ))
    }

    #[test]
    fn test_system_prompt_is_top_level() {
        let history = vec![Message::user("ciao")];
        let request = ChatRequest {
            model: "claude-3-haiku-20240307",
            system_prompt: "You are Bella",
            history: &history,
            sampling: SamplingParams::default(),
        };
        let body = provider().build_request(&request).unwrap();
        assert_eq!(body["system"], "You are Bella");
        assert_eq!(body["messages"], json!([{"role": "user", "content": "ciao"}]));
        assert_eq!(body["max_tokens"], 200);
    }

    #[test]
    fn test_system_history_entries_become_user_turns() {
        let history = vec![Message::system("note"), Message::assistant("ok")];
        let request = ChatRequest {
            model: "m",
            system_prompt: "",
            history: &history,
            sampling: SamplingParams::default(),
        };
        let body = provider().build_request(&request).unwrap();
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][1]["role"], "assistant");
    }

    #[test]
    fn test_history_opens_with_user_turn() {
        let history = vec![
            Message::assistant("evicted partner"),
            Message::user("hi"),
            Message::assistant("hello"),
            Message::user("how are you?"),
        ];
        let request = ChatRequest {
            model: "m",
            system_prompt: "You are Bella",
            history: &history,
            sampling: SamplingParams::default(),
        };
        let body = provider().build_request(&request).unwrap();
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0], json!({"role": "user", "content": "hi"}));
    }

    #[test]
    fn test_extract_reply() {
        let body = json!({"content": [{"type": "text", "text": "Ciao!"}]});
        assert_eq!(provider().extract_reply(&body).unwrap(), "Ciao!");
    }

    #[test]
    fn test_extract_reply_missing_text() {
        let body = json!({"content": []});
        assert!(provider().extract_reply(&body).is_err());
    }

    #[test]
    fn test_auth_headers() {
        let auth = provider().auth("sk-ant");
        assert!(auth.headers.contains(&("x-api-key".to_string(), "sk-ant".to_string())));
        assert!(auth
            .headers
            .contains(&("anthropic-version".to_string(), "2023-06-01".to_string())));
        assert!(auth.query.is_empty());
    }
}
