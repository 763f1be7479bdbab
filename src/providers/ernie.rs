//! Baidu ERNIE Bot chat completions
//!
//! Authenticated with an `access_token` query parameter. The system prompt
//! goes in the dedicated `system` field.

use crate::error::Result;
use crate::providers::base::{missing_field, parse_envelope, without_leading_replies};
use crate::providers::{AuthPlacement, ChatRequest, Provider, ProviderConfig, Role};

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct ErnieRequest<'a> {
    messages: Vec<ErnieMessage<'a>>,
    system: &'a str,
    temperature: f32,
    top_p: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ErnieMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErnieResponse {
    #[serde(default)]
    result: Option<String>,
}

/// ERNIE provider
#[derive(Debug, Clone)]
pub struct ErnieProvider {
    config: ProviderConfig,
}

impl ErnieProvider {
    /// Creates a provider from its settings
    pub fn new(config: ProviderConfig) -> Self {
        Self { config }
    }
}

impl Provider for ErnieProvider {
    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn config_mut(&mut self) -> &mut ProviderConfig {
        &mut self.config
    }

    fn build_request(&self, request: &ChatRequest<'_>) -> Result<serde_json::Value> {
        let messages = without_leading_replies(request.history)
            .iter()
            .map(|m| ErnieMessage {
                role: match m.role {
                    Role::Assistant => "assistant",
                    _ => "user",
                },
                content: &m.content,
            })
            .collect();

        let body = ErnieRequest {
            messages,
            system: request.system_prompt,
            temperature: request.sampling.temperature,
            top_p: request.sampling.top_p,
            max_output_tokens: request.sampling.max_tokens,
        };
        Ok(serde_json::to_value(body)?)
    }

    fn extract_reply(&self, body: &serde_json::Value) -> Result<String> {
        let response: ErnieResponse = parse_envelope(self.id(), body)?;
        response
            .result
            .ok_or_else(|| missing_field(self.id(), "result"))
    }

    fn auth(&self, credential: &str) -> AuthPlacement {
        AuthPlacement::query("access_token", credential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{Message, SamplingParams};
    use serde_json::json;

    fn provider() -> ErnieProvider {
        ErnieProvider::new(ProviderConfig::new(
            "ernie",
            "https://aip.baidubce.com/rpc/2.0/ai_custom/v1/wenxinworkshop/chat/completions",
            "ernie-bot",
        ))
    }

    #[test]
    fn test_build_request() {
        let history = vec![Message::user("hi")];
        let request = ChatRequest {
            model: "ernie-bot",
            system_prompt: "You are Bella",
            history: &history,
            sampling: SamplingParams::default(),
        };
        let body = provider().build_request(&request).unwrap();
        assert_eq!(body["system"], "You are Bella");
        assert_eq!(body["max_output_tokens"], 200);
        assert_eq!(body["messages"], json!([{"role": "user", "content": "hi"}]));
    }

    #[test]
    fn test_leading_assistant_turn_dropped() {
        let history = vec![
            Message::assistant("evicted partner"),
            Message::user("hi"),
        ];
        let request = ChatRequest {
            model: "ernie-bot",
            system_prompt: "You are Bella",
            history: &history,
            sampling: SamplingParams::default(),
        };
        let body = provider().build_request(&request).unwrap();
        assert_eq!(body["messages"], json!([{"role": "user", "content": "hi"}]));
    }

    #[test]
    fn test_extract_reply() {
        let body = json!({"id": "as-1", "result": "你好"});
        assert_eq!(provider().extract_reply(&body).unwrap(), "你好");
    }

    #[test]
    fn test_error_envelope_is_malformed() {
        let body = json!({"error_code": 110, "error_msg": "Access token invalid"});
        assert!(provider().extract_reply(&body).is_err());
    }

    #[test]
    fn test_auth_is_access_token_query() {
        let auth = provider().auth("tok");
        assert_eq!(auth.query, vec![("access_token".to_string(), "tok".to_string())]);
    }
}
