//! Provider dispatch
//!
//! The dispatcher owns the conversation history and the HTTP client, picks
//! the active provider from the registry, and performs exactly one POST per
//! user message. There is no retry; failures are classified and returned.

use crate::chat::history::ConversationHistory;
use crate::config::Config;
use crate::error::{ApiErrorKind, BellaError, Result};
use crate::prompts::{build_system_prompt, PersonaContext, TimeOfDay};
use crate::providers::{ChatRequest, Provider, ProviderRegistry, Role, SamplingParams};

use reqwest::Client;
use std::time::{Duration, Instant};
use url::Url;

/// Longest error body kept in an `Api` error
const MAX_ERROR_BODY: usize = 500;

/// Sends user messages to the active provider and records the exchange
pub struct Dispatcher {
    client: Client,
    registry: ProviderRegistry,
    history: ConversationHistory,
    current: String,
    sampling: SamplingParams,
    persona: PersonaContext,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("current", &self.current)
            .field("history_len", &self.history.len())
            .field("registry", &self.registry)
            .finish()
    }
}

impl Dispatcher {
    /// Creates a dispatcher
    ///
    /// # Arguments
    ///
    /// * `registry` - Provider lookup table
    /// * `history` - Conversation history, usually empty
    /// * `provider` - Identifier of the initially active provider
    /// * `sampling` - Sampling parameters sent with every request
    /// * `timeout` - Per-request HTTP timeout
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(
        registry: ProviderRegistry,
        history: ConversationHistory,
        provider: impl Into<String>,
        sampling: SamplingParams,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("bella/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(BellaError::Http)?;

        Ok(Self {
            client,
            registry,
            history,
            current: provider.into(),
            sampling,
            persona: PersonaContext::default(),
        })
    }

    /// Creates a dispatcher from the loaded configuration
    ///
    /// # Errors
    ///
    /// Returns error if a provider override is unknown or the client
    /// cannot be built
    pub fn from_config(config: &Config) -> Result<Self> {
        let registry = ProviderRegistry::from_config(&config.api)?;
        let mut dispatcher = Self::new(
            registry,
            ConversationHistory::new(config.chat.max_history_length),
            config.api.provider.clone(),
            config.api.sampling,
            Duration::from_secs(config.api.timeout_seconds),
        )?;
        dispatcher.persona.persona_name = config.chat.persona_name.clone();
        dispatcher.persona.language = config.chat.language.clone();
        Ok(dispatcher)
    }

    /// Sends a user message and returns the provider's reply
    ///
    /// The user message is appended to the history before the request is
    /// made; the reply is appended only on success.
    ///
    /// # Errors
    ///
    /// - `UnknownProvider` if the active provider is not registered; nothing
    ///   is appended in this case
    /// - `MissingCredentials` if the provider has no usable key; no request
    ///   is made
    /// - `Api` for a non-success status, classified by [`ApiErrorKind`]
    /// - `Transport` if no response was received
    /// - `MalformedResponse` if the body lacks the reply field
    pub async fn chat(&mut self, user_text: &str) -> Result<String> {
        let provider = self
            .registry
            .get(&self.current)
            .ok_or_else(|| BellaError::UnknownProvider(self.current.clone()))?;

        self.history.append(Role::User, user_text);

        let credential = match provider.config().usable_credential() {
            Some(secret) => secret.to_string(),
            None => {
                tracing::warn!("No API key configured for {}", provider.id());
                return Err(BellaError::MissingCredentials(provider.id().to_string()).into());
            }
        };

        let system_prompt = build_system_prompt(&self.persona, TimeOfDay::now());
        let messages = self.history.to_vec();
        let request = ChatRequest {
            model: provider.model(),
            system_prompt: &system_prompt,
            history: &messages,
            sampling: self.sampling,
        };

        let reply = send(&self.client, provider, &request, &credential).await?;
        self.history.append(Role::Assistant, reply.clone());
        Ok(reply)
    }

    /// Switches the active provider
    ///
    /// # Errors
    ///
    /// Returns `UnknownProvider` if the identifier is not registered; the
    /// active provider is left unchanged
    pub fn set_provider(&mut self, id: &str) -> Result<()> {
        if !self.registry.contains(id) {
            return Err(BellaError::UnknownProvider(id.to_string()).into());
        }
        tracing::info!("Switched provider: {} -> {}", self.current, id);
        self.current = id.to_string();
        Ok(())
    }

    /// Identifier of the active provider
    pub fn current_provider(&self) -> &str {
        &self.current
    }

    /// Returns true when the active provider has a usable key
    pub fn is_configured(&self) -> bool {
        self.registry.is_configured(&self.current)
    }

    /// Conversation so far
    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Forgets the conversation
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Provider lookup table
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Mutable provider lookup table, used to install keys
    pub fn registry_mut(&mut self) -> &mut ProviderRegistry {
        &mut self.registry
    }

    /// Persona used for the next system prompt
    pub fn persona(&self) -> &PersonaContext {
        &self.persona
    }

    /// Replaces the persona used for the next system prompt
    pub fn set_persona(&mut self, persona: PersonaContext) {
        self.persona = persona;
    }
}

/// Performs the single HTTP exchange for one request
async fn send(
    client: &Client,
    provider: &dyn Provider,
    request: &ChatRequest<'_>,
    credential: &str,
) -> Result<String> {
    let id = provider.id();
    let body = provider.build_request(request)?;
    let auth = provider.auth(credential);

    let mut url = Url::parse(provider.endpoint())
        .map_err(|e| BellaError::Config(format!("Invalid endpoint for {}: {}", id, e)))?;
    if !auth.query.is_empty() {
        url.query_pairs_mut()
            .extend_pairs(auth.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }

    let mut builder = client.post(url).json(&body);
    for (name, value) in &auth.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }

    tracing::debug!(
        "Sending {} request: {} messages, model {}",
        id,
        request.history.len(),
        request.model
    );

    let started = Instant::now();
    let response = builder.send().await.map_err(|e| {
        tracing::error!("{} request failed: {}", id, e);
        BellaError::Transport(format!("{} request failed: {}", id, e))
    })?;

    let status = response.status();
    tracing::info!(
        "API POST {} -> {} in {}ms",
        provider.endpoint(),
        status.as_u16(),
        started.elapsed().as_millis()
    );

    if !status.is_success() {
        let mut error_text = response.text().await.unwrap_or_default();
        if error_text.len() > MAX_ERROR_BODY {
            let mut cut = MAX_ERROR_BODY;
            while !error_text.is_char_boundary(cut) {
                cut -= 1;
            }
            error_text.truncate(cut);
        }
        let kind = ApiErrorKind::from_status(status.as_u16());
        tracing::error!("{} returned error {} ({}): {}", id, status, kind.describe(), error_text);
        return Err(BellaError::Api {
            provider: id.to_string(),
            status: status.as_u16(),
            kind,
            message: error_text,
        }
        .into());
    }

    let json: serde_json::Value = response.json().await.map_err(|e| {
        tracing::error!("Failed to parse {} response: {}", id, e);
        BellaError::MalformedResponse {
            provider: id.to_string(),
            message: format!("body is not JSON: {}", e),
        }
    })?;

    let reply = provider.extract_reply(&json)?.trim().to_string();
    if reply.is_empty() {
        return Err(BellaError::MalformedResponse {
            provider: id.to_string(),
            message: "empty reply".to_string(),
        }
        .into());
    }
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_dispatcher as dispatcher;

    #[tokio::test]
    async fn test_unknown_provider_appends_nothing() {
        let mut d = dispatcher("local");
        let err = d.chat("hello").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BellaError>(),
            Some(BellaError::UnknownProvider(_))
        ));
        assert!(d.history().is_empty());
    }

    #[tokio::test]
    async fn test_missing_credentials_keeps_user_message() {
        let mut d = dispatcher("openai");
        let err = d.chat("hello").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BellaError>(),
            Some(BellaError::MissingCredentials(ref p)) if p == "openai"
        ));
        assert_eq!(d.history().len(), 1);
        assert_eq!(d.history().last().unwrap().role, Role::User);
    }

    #[test]
    fn test_set_provider_unknown_keeps_current() {
        let mut d = dispatcher("openai");
        assert!(d.set_provider("local").is_err());
        assert_eq!(d.current_provider(), "openai");
        d.set_provider("claude").unwrap();
        assert_eq!(d.current_provider(), "claude");
    }

    #[test]
    fn test_is_configured_follows_registry() {
        let mut d = dispatcher("groq");
        assert!(!d.is_configured());
        d.registry_mut().set_credential("groq", "gsk-1").unwrap();
        assert!(d.is_configured());
    }

    #[test]
    fn test_from_config_applies_persona_settings() {
        let mut config = Config::default();
        config.chat.persona_name = "Aria".to_string();
        config.chat.max_history_length = 4;
        let d = Dispatcher::from_config(&config).unwrap();
        assert_eq!(d.persona().persona_name, "Aria");
        assert_eq!(d.history().max_len(), 4);
        assert_eq!(d.current_provider(), "openai");
    }
}
