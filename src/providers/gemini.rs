//! Google Gemini generateContent
//!
//! Gemini receives the whole transcript flattened into a single prompt,
//! and the key is passed as the `key` query parameter.

use crate::error::Result;
use crate::providers::base::{missing_field, parse_envelope};
use crate::providers::{AuthPlacement, ChatRequest, Provider, ProviderConfig, Role};

use serde::{Deserialize, Serialize};

/// Speaker label for assistant turns in the flattened transcript
const ASSISTANT_LABEL: &str = "Bella";

/// Top-k used for every Gemini request
const TOP_K: u32 = 40;

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

/// Gemini provider
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    config: ProviderConfig,
}

impl GeminiProvider {
    /// Creates a provider from its settings
    pub fn new(config: ProviderConfig) -> Self {
        Self { config }
    }

    /// Flattens the system prompt and transcript into one prompt
    ///
    /// Earlier turns are rendered as `User:` / `Bella:` lines; the final
    /// user turn closes the prompt followed by an open `Bella:` cue.
    pub fn flatten_prompt(request: &ChatRequest<'_>) -> String {
        let (last, earlier) = match request.history.split_last() {
            Some((last, earlier)) if last.role == Role::User => (Some(last), earlier),
            _ => (None, request.history),
        };

        let mut prompt = String::from(request.system_prompt);
        if !earlier.is_empty() {
            prompt.push_str("\n\nConversation history:\n");
            for message in earlier {
                let speaker = match message.role {
                    Role::Assistant => ASSISTANT_LABEL,
                    _ => "User",
                };
                prompt.push_str(&format!("{}: {}\n", speaker, message.content));
            }
        }
        if let Some(last) = last {
            prompt.push_str(&format!("\nUser: {}\n{}:", last.content, ASSISTANT_LABEL));
        }
        prompt
    }
}

impl Provider for GeminiProvider {
    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn config_mut(&mut self) -> &mut ProviderConfig {
        &mut self.config
    }

    fn build_request(&self, request: &ChatRequest<'_>) -> Result<serde_json::Value> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(Self::flatten_prompt(request)),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: request.sampling.temperature,
                top_k: TOP_K,
                top_p: request.sampling.top_p,
                max_output_tokens: request.sampling.max_tokens,
            },
        };
        Ok(serde_json::to_value(body)?)
    }

    fn extract_reply(&self, body: &serde_json::Value) -> Result<String> {
        let response: GenerateResponse = parse_envelope(self.id(), body)?;
        response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .and_then(|p| p.text)
            .ok_or_else(|| missing_field(self.id(), "candidates[0].content.parts[0].text"))
    }

    fn auth(&self, credential: &str) -> AuthPlacement {
        AuthPlacement::query("key", credential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{Message, SamplingParams};
    use serde_json::json;

    fn provider() -> GeminiProvider {
        GeminiProvider::new(ProviderConfig::new(
            "gemini",
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash-latest:generateContent",
            "gemini-1.5-flash-latest",
        ))
    }

    #[test]
    fn test_flatten_prompt() {
        let history = vec![
            Message::user("hi"),
            Message::assistant("hello!"),
            Message::user("what's up?"),
        ];
        let request = ChatRequest {
            model: "gemini-1.5-flash-latest",
            system_prompt: "You are Bella",
            history: &history,
            sampling: SamplingParams::default(),
        };
        let prompt = GeminiProvider::flatten_prompt(&request);
        assert!(prompt.starts_with("You are Bella"));
        assert!(prompt.contains("User: hi\nBella: hello!\n"));
        assert!(prompt.ends_with("User: what's up?\nBella:"));
    }

    #[test]
    fn test_build_request_generation_config() {
        let history = vec![Message::user("hi")];
        let request = ChatRequest {
            model: "gemini-1.5-flash-latest",
            system_prompt: "sys",
            history: &history,
            sampling: SamplingParams::default(),
        };
        let body = provider().build_request(&request).unwrap();
        assert_eq!(body["generationConfig"]["topK"], 40);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 200);
        assert!(body["contents"][0]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("User: hi"));
        assert!(body.get("model").is_none());
    }

    #[test]
    fn test_extract_reply() {
        let body = json!({"candidates": [{"content": {"parts": [{"text": "Ciao!"}], "role": "model"}}]});
        assert_eq!(provider().extract_reply(&body).unwrap(), "Ciao!");
    }

    #[test]
    fn test_extract_reply_no_candidates() {
        let body = json!({"promptFeedback": {"blockReason": "SAFETY"}});
        assert!(provider().extract_reply(&body).is_err());
    }

    #[test]
    fn test_auth_is_query_key() {
        let auth = provider().auth("g-key");
        assert_eq!(auth.query, vec![("key".to_string(), "g-key".to_string())]);
        assert!(auth.headers.is_empty());
    }
}
