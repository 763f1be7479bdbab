//! Alibaba DashScope text generation (Qwen)

use crate::error::Result;
use crate::providers::base::{missing_field, parse_envelope};
use crate::providers::{ChatRequest, Provider, ProviderConfig};

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    model: &'a str,
    input: Input<'a>,
    parameters: Parameters,
}

#[derive(Debug, Serialize)]
struct Input<'a> {
    messages: Vec<WireMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct Parameters {
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    #[serde(default)]
    output: Option<Output>,
}

#[derive(Debug, Deserialize)]
struct Output {
    #[serde(default)]
    text: Option<String>,
}

/// Qwen provider
#[derive(Debug, Clone)]
pub struct QwenProvider {
    config: ProviderConfig,
}

impl QwenProvider {
    /// Creates a provider from its settings
    pub fn new(config: ProviderConfig) -> Self {
        Self { config }
    }
}

impl Provider for QwenProvider {
    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn config_mut(&mut self) -> &mut ProviderConfig {
        &mut self.config
    }

    fn build_request(&self, request: &ChatRequest<'_>) -> Result<serde_json::Value> {
        let messages = std::iter::once(WireMessage {
            role: "system",
            content: request.system_prompt,
        })
        .chain(request.history.iter().map(|m| WireMessage {
            role: m.role.as_str(),
            content: &m.content,
        }))
        .collect();

        let body = GenerationRequest {
            model: request.model,
            input: Input { messages },
            parameters: Parameters {
                max_tokens: request.sampling.max_tokens,
                temperature: request.sampling.temperature,
                top_p: request.sampling.top_p,
            },
        };
        Ok(serde_json::to_value(body)?)
    }

    fn extract_reply(&self, body: &serde_json::Value) -> Result<String> {
        let response: GenerationResponse = parse_envelope(self.id(), body)?;
        response
            .output
            .and_then(|o| o.text)
            .ok_or_else(|| missing_field(self.id(), "output.text"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{Message, SamplingParams};
    use serde_json::json;

    fn provider() -> QwenProvider {
        QwenProvider::new(ProviderConfig::new(
            "qwen",
            "https://dashscope.aliyuncs.com/api/v1/services/aigc/text-generation/generation",
            "qwen-turbo",
        ))
    }

    #[test]
    fn test_build_request_nests_messages_under_input() {
        let history = vec![Message::user("你好")];
        let request = ChatRequest {
            model: "qwen-turbo",
            system_prompt: "You are Bella",
            history: &history,
            sampling: SamplingParams::default(),
        };
        let body = provider().build_request(&request).unwrap();
        assert_eq!(body["model"], "qwen-turbo");
        assert_eq!(body["input"]["messages"][0]["role"], "system");
        assert_eq!(body["input"]["messages"][1]["content"], "你好");
        assert_eq!(body["parameters"]["top_p"].as_f64().map(|v| (v * 10.0).round()), Some(9.0));
    }

    #[test]
    fn test_extract_reply() {
        let body = json!({"output": {"text": "你好呀", "finish_reason": "stop"}});
        assert_eq!(provider().extract_reply(&body).unwrap(), "你好呀");
    }

    #[test]
    fn test_extract_reply_missing_output() {
        let body = json!({"code": "InvalidParameter"});
        assert!(provider().extract_reply(&body).is_err());
    }
}
