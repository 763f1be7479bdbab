//! Base provider trait and common types for Bella
//!
//! This module defines the Provider trait every remote chat-completion
//! service implements, along with the message, request and credential
//! placement types shared by all of them. Providers are pure: they build a
//! request body and pull the reply out of a response body. The HTTP call
//! itself lives in the dispatcher.

use crate::error::{BellaError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Markers that identify a credential copied verbatim from a template
const PLACEHOLDER_MARKERS: &[&str] = &["INSERISCI_QUI", "YOUR_", "_API_KEY", "<api-key>"];

/// Role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The human side of the conversation
    User,
    /// The companion's replies
    Assistant,
    /// Instructions for the model
    System,
}

impl Role {
    /// Wire name used by OpenAI-style APIs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message structure for conversation
///
/// A message is immutable once created and owned by the history that
/// holds it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: Role,
    /// Content of the message
    pub content: String,
    /// Creation time
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Creates a message with the given role, stamped with the current time
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Creates a new user message
    ///
    /// # Examples
    ///
    /// ```
    /// use bella::providers::{Message, Role};
    ///
    /// let msg = Message::user("Hello, Bella!");
    /// assert_eq!(msg.role, Role::User);
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Creates a new assistant message
    ///
    /// # Examples
    ///
    /// ```
    /// use bella::providers::{Message, Role};
    ///
    /// let msg = Message::assistant("Hi there!");
    /// assert_eq!(msg.role, Role::Assistant);
    /// ```
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Creates a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }
}

/// Sampling parameters forwarded to every provider
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Nucleus sampling cutoff
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    /// Upper bound on generated tokens
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_temperature() -> f32 {
    0.8
}

fn default_top_p() -> f32 {
    0.9
}

fn default_max_tokens() -> u32 {
    200
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            top_p: default_top_p(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Everything a provider needs to build one request body
#[derive(Debug, Clone, Copy)]
pub struct ChatRequest<'a> {
    /// Model identifier to request
    pub model: &'a str,
    /// Persona instructions
    pub system_prompt: &'a str,
    /// Conversation so far, oldest first, ending with the new user message
    pub history: &'a [Message],
    /// Sampling parameters
    pub sampling: SamplingParams,
}

/// Where a credential goes on the outgoing request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthPlacement {
    /// Headers to set
    pub headers: Vec<(String, String)>,
    /// Query parameters to append to the endpoint
    pub query: Vec<(String, String)>,
}

impl AuthPlacement {
    /// `Authorization: Bearer <secret>`
    pub fn bearer(secret: &str) -> Self {
        Self {
            headers: vec![("Authorization".to_string(), format!("Bearer {}", secret))],
            query: Vec::new(),
        }
    }

    /// A single named header carrying the raw secret
    pub fn header(name: &str, secret: &str) -> Self {
        Self {
            headers: vec![(name.to_string(), secret.to_string())],
            query: Vec::new(),
        }
    }

    /// A single URL query parameter carrying the raw secret
    pub fn query(name: &str, secret: &str) -> Self {
        Self {
            headers: Vec::new(),
            query: vec![(name.to_string(), secret.to_string())],
        }
    }

    /// Adds a fixed header alongside the credential
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

/// Static and user-supplied settings for one provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Registry identifier
    pub id: String,
    /// Full endpoint URL, without the credential
    pub endpoint: String,
    /// Model identifier
    pub model: String,
    /// API key or access token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

impl ProviderConfig {
    /// Creates a config with no credential
    pub fn new(id: impl Into<String>, endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            endpoint: endpoint.into(),
            model: model.into(),
            credential: None,
        }
    }

    /// Returns the credential when one is present and not a template placeholder
    pub fn usable_credential(&self) -> Option<&str> {
        self.credential
            .as_deref()
            .map(str::trim)
            .filter(|secret| !is_placeholder(secret))
    }
}

/// Returns true when a credential is empty or still holds template text
///
/// # Examples
///
/// ```
/// use bella::providers::is_placeholder;
///
/// assert!(is_placeholder(""));
/// assert!(is_placeholder("YOUR_OPENAI_API_KEY"));
/// assert!(!is_placeholder("sk-live-123"));
/// ```
pub fn is_placeholder(secret: &str) -> bool {
    let secret = secret.trim();
    secret.is_empty() || PLACEHOLDER_MARKERS.iter().any(|m| secret.contains(m))
}

/// Provider trait for remote chat-completion services
///
/// Implementations translate between the shared conversation model and one
/// service's JSON envelope. Adding a service means one implementation of
/// this trait plus one entry in the registry table.
pub trait Provider: Send + Sync {
    /// Current settings
    fn config(&self) -> &ProviderConfig;

    /// Mutable settings, used to install credentials and overrides
    fn config_mut(&mut self) -> &mut ProviderConfig;

    /// Registry identifier
    fn id(&self) -> &str {
        &self.config().id
    }

    /// Endpoint URL
    fn endpoint(&self) -> &str {
        &self.config().endpoint
    }

    /// Model identifier
    fn model(&self) -> &str {
        &self.config().model
    }

    /// Builds the JSON request body for this service
    fn build_request(&self, request: &ChatRequest<'_>) -> Result<serde_json::Value>;

    /// Extracts the reply text from a successful response body
    ///
    /// # Errors
    ///
    /// Returns `BellaError::MalformedResponse` when the expected field is absent.
    fn extract_reply(&self, body: &serde_json::Value) -> Result<String>;

    /// Where the credential goes on the request
    fn auth(&self, credential: &str) -> AuthPlacement {
        AuthPlacement::bearer(credential)
    }
}

/// Drops assistant turns left at the front of the history by eviction
///
/// APIs that require the conversation to open with a user turn reject
/// anything else.
pub(crate) fn without_leading_replies(history: &[Message]) -> &[Message] {
    let start = history
        .iter()
        .position(|m| m.role != Role::Assistant)
        .unwrap_or(history.len());
    if start > 0 {
        tracing::debug!("Skipping {} leading assistant messages", start);
    }
    &history[start..]
}

/// Deserializes a typed response envelope, mapping failures to `MalformedResponse`
pub(crate) fn parse_envelope<'a, T: Deserialize<'a>>(
    provider: &str,
    body: &'a serde_json::Value,
) -> Result<T> {
    T::deserialize(body).map_err(|e| {
        tracing::error!("Failed to parse {} response: {}", provider, e);
        BellaError::MalformedResponse {
            provider: provider.to_string(),
            message: e.to_string(),
        }
        .into()
    })
}

/// Builds the error for a response that parsed but carried no reply text
pub(crate) fn missing_field(provider: &str, path: &str) -> anyhow::Error {
    BellaError::MalformedResponse {
        provider: provider.to_string(),
        message: format!("missing {}", path),
    }
    .into()
}
