//! Chat session orchestration
//!
//! A [`ChatSession`] sits between the terminal and the [`Dispatcher`]. For
//! every user message it updates the relationship heuristics, frames the
//! text for the current chat mode, dispatches it and optionally speaks the
//! reply. Provider failures never reach the user as errors: they become one
//! of the configured fallback lines.

use crate::chat::dispatcher::Dispatcher;
use crate::chat::history::ConversationHistory;
use crate::chat_mode::ChatMode;
use crate::config::{ChatConfig, ProactiveConfig, VoiceConfig};
use crate::error::Result;
use crate::features::{
    select_voice, ActivityTracker, NoopSpeech, SpeechSynthesizer, Voice, VoiceParams,
};
use crate::preferences::{AdvancedSettings, ChatSettings, PreferenceStore, UserPreferences};
use crate::prompts::enhance_for_mode;
use crate::providers::ProviderSummary;
use crate::relationship::{
    analyze_emotion, reply_suggestions, EmotionalState, EmotionalTheme, MessageEmotion,
    PolicyTable, RelationshipState,
};

use rand::seq::IndexedRandom;
use serde::Serialize;
use std::str::FromStr;
use std::sync::Arc;

/// Line used if the fallback list is somehow empty
const LAST_RESORT_REPLY: &str = "Sorry, I lost my train of thought. Could you say that again?";

/// Snapshot of the session for status displays
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemInfo {
    /// Active provider identifier
    pub provider: String,
    /// Active chat mode
    pub mode: ChatMode,
    /// Companion mood
    pub emotional_state: EmotionalState,
    /// Sentiment of the last user message
    pub last_user_emotion: MessageEmotion,
    /// Messages currently in the history
    pub history_length: usize,
    /// Whether the active provider has a usable key
    pub is_configured: bool,
    /// Relationship level between 1 and 10
    pub relationship_level: u8,
    /// Speech output toggle
    pub voice_enabled: bool,
    /// Proactive message toggle
    pub proactive_enabled: bool,
    /// Voice picked for spoken replies
    pub voice: Option<String>,
}

/// One conversation with its persisted context
pub struct ChatSession {
    dispatcher: Dispatcher,
    preferences: PreferenceStore,
    policy: PolicyTable,
    mode: ChatMode,
    user: UserPreferences,
    relationship: RelationshipState,
    emotional_state: EmotionalState,
    last_user_emotion: MessageEmotion,
    settings: AdvancedSettings,
    fallback_responses: Vec<String>,
    speech: Arc<dyn SpeechSynthesizer>,
    voice_language: String,
    voice: Option<Voice>,
    activity: Arc<ActivityTracker>,
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("dispatcher", &self.dispatcher)
            .field("mode", &self.mode)
            .field("relationship", &self.relationship)
            .field("emotional_state", &self.emotional_state)
            .finish_non_exhaustive()
    }
}

impl ChatSession {
    /// Creates a session and restores what the store remembers
    ///
    /// The stored provider and mode, when present, take precedence over the
    /// configured defaults. A stored provider that is no longer registered
    /// is ignored with a warning.
    ///
    /// # Arguments
    ///
    /// * `dispatcher` - Provider dispatch and history
    /// * `preferences` - Persisted preferences
    /// * `chat` - Default mode and fallback lines
    pub fn new(dispatcher: Dispatcher, preferences: PreferenceStore, chat: &ChatConfig) -> Self {
        let mode = ChatMode::from_str(&chat.default_mode).unwrap_or_else(|_| {
            tracing::warn!("Unknown default mode '{}', using casual", chat.default_mode);
            ChatMode::default()
        });

        let mut session = Self {
            dispatcher,
            user: preferences.load_preferences(),
            relationship: preferences.load_relationship(),
            settings: preferences.load_advanced_settings(),
            preferences,
            policy: PolicyTable::default(),
            mode,
            emotional_state: EmotionalState::default(),
            last_user_emotion: MessageEmotion::Neutral,
            fallback_responses: chat.fallback_responses.clone(),
            speech: Arc::new(NoopSpeech),
            voice_language: VoiceConfig::default().language,
            voice: None,
            activity: Arc::new(ActivityTracker::new()),
        };

        if let Some(stored) = session.preferences.load_chat_settings() {
            session.mode = stored.mode;
            if let Err(e) = session.dispatcher.set_provider(&stored.provider) {
                tracing::warn!("Ignoring stored provider: {}", e);
            }
        }

        session.refresh_persona();
        tracing::debug!(
            "Session restored: provider {}, mode {}, level {}",
            session.dispatcher.current_provider(),
            session.mode,
            session.relationship.level
        );
        session
    }

    /// Uses a speech synthesizer for replies
    pub fn with_speech(mut self, speech: Arc<dyn SpeechSynthesizer>) -> Self {
        self.speech = speech;
        self.choose_voice();
        self
    }

    /// Replaces the keyword rules
    pub fn with_policy(mut self, policy: PolicyTable) -> Self {
        self.policy = policy;
        self
    }

    /// Shares an activity tracker, typically with a proactive scheduler
    pub fn with_activity(mut self, activity: Arc<ActivityTracker>) -> Self {
        self.activity = activity;
        self
    }

    /// Applies voice configuration
    ///
    /// Configured voice values are used where the user has not stored an
    /// override; voice output is on if either side enables it.
    pub fn with_voice_config(mut self, voice: &VoiceConfig) -> Self {
        self.settings.voice_enabled |= voice.enabled;
        self.settings.voice_rate.get_or_insert(voice.rate);
        self.settings.voice_pitch.get_or_insert(voice.pitch);
        self.settings.voice_volume.get_or_insert(voice.volume);
        self.voice_language = voice.language.clone();
        self.choose_voice();
        self
    }

    fn choose_voice(&mut self) {
        let voices = self.speech.voices();
        self.voice = select_voice(&voices, &self.voice_language).cloned();
        match &self.voice {
            Some(voice) => tracing::debug!("Using voice {} ({})", voice.name, voice.lang),
            None => tracing::debug!("No voice available for {}", self.voice_language),
        }
    }

    /// Enables proactive messages when the configuration asks for them
    ///
    /// The configured flag is not written back to the store.
    pub fn with_proactive_config(mut self, proactive: &ProactiveConfig) -> Self {
        self.settings.proactive_enabled |= proactive.enabled;
        self
    }

    /// Answers a user message, never failing
    ///
    /// Any dispatch error is logged and replaced by a random fallback line.
    pub async fn respond(&mut self, text: &str) -> String {
        match self.try_respond(text).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!("Chat request failed: {:#}", e);
                self.fallback_line()
            }
        }
    }

    /// Answers a user message, returning dispatch errors to the caller
    ///
    /// # Errors
    ///
    /// Returns any error from [`Dispatcher::chat`]
    pub async fn try_respond(&mut self, text: &str) -> Result<String> {
        self.activity.touch();
        self.apply_heuristics(text);
        self.refresh_persona();

        let framed = enhance_for_mode(self.mode, text);
        let reply = self.dispatcher.chat(&framed).await?;
        self.speak(&reply);
        Ok(reply)
    }

    fn apply_heuristics(&mut self, text: &str) {
        self.last_user_emotion = analyze_emotion(text);
        let analysis = self.policy.analyze(text);

        if analysis.level_delta > 0 {
            if self.relationship.raise(analysis.level_delta) {
                tracing::info!("Relationship level is now {}", self.relationship.level);
            }
            if let Err(e) = self.preferences.save_relationship(&self.relationship) {
                tracing::warn!("Failed to save relationship: {}", e);
            }
        }

        if let Some(state) = analysis.emotional_state {
            self.emotional_state = state;
        }

        let mut learned = false;
        for interest in analysis.interests {
            learned |= self.user.interests.insert(interest);
        }
        if learned {
            self.save_user();
        }
    }

    fn refresh_persona(&mut self) {
        let mut persona = self.dispatcher.persona().clone().with_preferences(&self.user);
        persona.relationship = self.relationship.clone();
        persona.emotional_state = self.emotional_state;
        persona.user_emotion = self.last_user_emotion;
        self.dispatcher.set_persona(persona);
    }

    fn speak(&self, reply: &str) {
        if !self.settings.voice_enabled {
            return;
        }
        let params = self.voice_params();
        if !self.speech.speak(reply, &params) {
            tracing::debug!("Speech output unavailable");
        }
    }

    /// Prosody for the current mood with user overrides applied
    ///
    /// Stored overrides only shift the emotion preset relative to the
    /// neutral happy preset, so moods stay audible.
    pub fn voice_params(&self) -> VoiceParams {
        let base = VoiceParams::default();
        let preset = VoiceParams::for_emotion(self.emotional_state);
        let shift = |value: Option<f32>, neutral: f32, target: f32| value.map(|v| target + (v - neutral));
        let rate = shift(self.settings.voice_rate, base.rate, preset.rate);
        let pitch = shift(self.settings.voice_pitch, base.pitch, preset.pitch);
        let volume = shift(self.settings.voice_volume, base.volume, preset.volume);
        preset
            .with_overrides(rate, pitch, volume)
            .with_voice(self.voice.as_ref())
    }

    fn fallback_line(&self) -> String {
        self.fallback_responses
            .choose(&mut rand::rng())
            .cloned()
            .unwrap_or_else(|| LAST_RESORT_REPLY.to_string())
    }

    fn save_user(&self) {
        if let Err(e) = self.preferences.save_preferences(&self.user) {
            tracing::warn!("Failed to save preferences: {}", e);
        }
    }

    fn save_settings(&self) -> Result<()> {
        self.preferences.save_advanced_settings(&self.settings)
    }

    fn save_chat_settings(&self) -> Result<()> {
        self.preferences.save_chat_settings(&ChatSettings {
            provider: self.dispatcher.current_provider().to_string(),
            mode: self.mode,
        })
    }

    /// Switches the chat mode and remembers it
    pub fn set_mode(&mut self, mode: ChatMode) -> Result<()> {
        tracing::info!("Chat mode: {} -> {}", self.mode, mode);
        self.mode = mode;
        self.save_chat_settings()
    }

    /// Switches the chat mode by name
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedMode` for an unknown name; the mode is unchanged
    pub fn set_mode_str(&mut self, name: &str) -> Result<ChatMode> {
        let mode = ChatMode::from_str(name)?;
        self.set_mode(mode)?;
        Ok(mode)
    }

    /// Switches the active provider and remembers it
    ///
    /// # Errors
    ///
    /// Returns `UnknownProvider` if the identifier is not registered
    pub fn set_provider(&mut self, id: &str) -> Result<()> {
        self.dispatcher.set_provider(id)?;
        self.save_chat_settings()
    }

    /// Installs an API key for a provider for this run
    ///
    /// # Errors
    ///
    /// Returns `UnknownProvider` if the identifier is not registered
    pub fn set_credential(&mut self, id: &str, secret: &str) -> Result<()> {
        self.dispatcher.registry_mut().set_credential(id, secret)
    }

    /// Remembers how the user wants to be called
    pub fn set_user_name(&mut self, name: &str) -> Result<()> {
        let name = name.trim();
        self.user.name = if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        };
        self.preferences.save_preferences(&self.user)?;
        self.refresh_persona();
        Ok(())
    }

    /// Puts the companion in the mood named by a theme
    ///
    /// Unknown theme names select the default mood.
    pub fn set_emotional_theme(&mut self, theme: &str) -> EmotionalState {
        self.emotional_state = EmotionalTheme::from_name(theme).emotional_state();
        self.refresh_persona();
        self.emotional_state
    }

    /// Turns spoken replies on or off
    pub fn set_voice_enabled(&mut self, enabled: bool) -> Result<()> {
        self.settings.voice_enabled = enabled;
        if !enabled {
            self.speech.stop();
        }
        self.save_settings()
    }

    /// Turns proactive messages on or off
    pub fn set_proactive_enabled(&mut self, enabled: bool) -> Result<()> {
        self.settings.proactive_enabled = enabled;
        self.save_settings()
    }

    /// Turns notifications on or off
    pub fn set_notifications_enabled(&mut self, enabled: bool) -> Result<()> {
        self.settings.notifications_enabled = enabled;
        self.save_settings()
    }

    /// Reply suggestions for the last assistant message
    pub fn suggestions(&self) -> Vec<String> {
        reply_suggestions(self.dispatcher.history())
    }

    /// Status snapshot
    pub fn system_info(&self) -> SystemInfo {
        SystemInfo {
            provider: self.dispatcher.current_provider().to_string(),
            mode: self.mode,
            emotional_state: self.emotional_state,
            last_user_emotion: self.last_user_emotion,
            history_length: self.dispatcher.history().len(),
            is_configured: self.dispatcher.is_configured(),
            relationship_level: self.relationship.level,
            voice_enabled: self.settings.voice_enabled,
            proactive_enabled: self.settings.proactive_enabled,
            voice: self.voice.as_ref().map(|v| v.name.clone()),
        }
    }

    /// Registered providers with their configured state
    pub fn available_providers(&self) -> Vec<ProviderSummary> {
        self.dispatcher.registry().available()
    }

    /// Conversation so far
    pub fn history(&self) -> &ConversationHistory {
        self.dispatcher.history()
    }

    /// Forgets the conversation
    pub fn clear_history(&mut self) {
        self.dispatcher.clear_history();
        tracing::info!("Conversation history cleared");
    }

    /// Current chat mode
    pub fn mode(&self) -> ChatMode {
        self.mode
    }

    /// Active provider identifier
    pub fn current_provider(&self) -> &str {
        self.dispatcher.current_provider()
    }

    /// Companion mood
    pub fn emotional_state(&self) -> EmotionalState {
        self.emotional_state
    }

    /// Relationship progress
    pub fn relationship(&self) -> &RelationshipState {
        &self.relationship
    }

    /// What is known about the user
    pub fn user(&self) -> &UserPreferences {
        &self.user
    }

    /// Feature toggles
    pub fn settings(&self) -> &AdvancedSettings {
        &self.settings
    }

    /// Voice picked for spoken replies
    pub fn voice(&self) -> Option<&Voice> {
        self.voice.as_ref()
    }

    /// Shared activity tracker
    pub fn activity(&self) -> Arc<ActivityTracker> {
        Arc::clone(&self.activity)
    }

    /// Underlying dispatcher
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BellaError;
    use crate::features::speech::MockSpeechSynthesizer;
    use crate::test_utils::{memory_preferences as memory_prefs, test_dispatcher};
    use std::time::Duration;

    fn session_with(prefs: PreferenceStore) -> ChatSession {
        ChatSession::new(test_dispatcher("openai"), prefs, &ChatConfig::default())
    }

    #[tokio::test]
    async fn test_respond_without_key_returns_fallback() {
        let mut session = session_with(memory_prefs());
        let reply = session.respond("hello").await;
        assert!(ChatConfig::default().fallback_responses.contains(&reply));
        // The framed user message is kept even though dispatch failed
        assert_eq!(session.history().len(), 1);
        assert!(session.history().last().unwrap().content.ends_with("hello"));
    }

    #[tokio::test]
    async fn test_try_respond_surfaces_error() {
        let mut session = session_with(memory_prefs());
        let err = session.try_respond("hello").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BellaError>(),
            Some(BellaError::MissingCredentials(_))
        ));
    }

    #[tokio::test]
    async fn test_heuristics_persist_even_when_dispatch_fails() {
        let prefs = memory_prefs();
        let mut session = session_with(prefs.clone());
        session.respond("I love you, and I love music").await;

        assert_eq!(session.relationship().level, 3);
        assert_eq!(session.emotional_state(), EmotionalState::Excited);
        assert_eq!(prefs.load_relationship().level, 3);
        assert!(prefs.load_preferences().interests.contains("music"));
        assert_eq!(session.system_info().last_user_emotion, MessageEmotion::Positive);
    }

    #[test]
    fn test_stored_chat_settings_restored() {
        let prefs = memory_prefs();
        prefs
            .save_chat_settings(&ChatSettings {
                provider: "claude".to_string(),
                mode: ChatMode::Creative,
            })
            .unwrap();
        let session = session_with(prefs);
        assert_eq!(session.current_provider(), "claude");
        assert_eq!(session.mode(), ChatMode::Creative);
    }

    #[test]
    fn test_stored_unknown_provider_ignored() {
        let prefs = memory_prefs();
        prefs
            .save_chat_settings(&ChatSettings {
                provider: "local".to_string(),
                mode: ChatMode::Assistant,
            })
            .unwrap();
        let session = session_with(prefs);
        assert_eq!(session.current_provider(), "openai");
        assert_eq!(session.mode(), ChatMode::Assistant);
    }

    #[test]
    fn test_set_mode_and_provider_persist() {
        let prefs = memory_prefs();
        let mut session = session_with(prefs.clone());
        session.set_mode_str("assistant").unwrap();
        session.set_provider("gemini").unwrap();

        let stored = prefs.load_chat_settings().unwrap();
        assert_eq!(stored.provider, "gemini");
        assert_eq!(stored.mode, ChatMode::Assistant);

        let err = session.set_mode_str("poetic").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BellaError>(),
            Some(BellaError::UnsupportedMode(_))
        ));
        assert_eq!(session.mode(), ChatMode::Assistant);
        assert!(session.set_provider("local").is_err());
        assert_eq!(session.current_provider(), "gemini");
    }

    #[test]
    fn test_theme_and_name() {
        let prefs = memory_prefs();
        let mut session = session_with(prefs.clone());
        assert_eq!(session.set_emotional_theme("supportive"), EmotionalState::Thoughtful);
        assert_eq!(session.set_emotional_theme("unknown"), EmotionalState::Happy);

        session.set_user_name("  Marco ").unwrap();
        assert_eq!(prefs.load_preferences().name.as_deref(), Some("Marco"));
        assert_eq!(session.dispatcher().persona().user_name.as_deref(), Some("Marco"));
    }

    #[test]
    fn test_set_credential_marks_configured() {
        let mut session = session_with(memory_prefs());
        assert!(!session.system_info().is_configured);
        session.set_credential("openai", "sk-real").unwrap();
        assert!(session.system_info().is_configured);
        assert!(session.set_credential("local", "x").is_err());
    }

    #[test]
    fn test_voice_params_follow_mood() {
        let mut session = session_with(memory_prefs());
        session.set_emotional_theme("caring");
        assert_eq!(
            session.voice_params(),
            VoiceParams::for_emotion(EmotionalState::Caring)
        );
    }

    #[tokio::test]
    async fn test_voice_disabled_does_not_speak() {
        let mut speech = MockSpeechSynthesizer::new();
        speech.expect_voices().return_const(Vec::new());
        speech.expect_speak().times(0);
        let mut session = session_with(memory_prefs()).with_speech(Arc::new(speech));
        session.respond("hello").await;
    }

    #[test]
    fn test_toggles_persist() {
        let prefs = memory_prefs();
        let mut speech = MockSpeechSynthesizer::new();
        speech.expect_voices().return_const(Vec::new());
        speech.expect_stop().times(1).return_const(());
        let mut session = session_with(prefs.clone()).with_speech(Arc::new(speech));

        session.set_voice_enabled(true).unwrap();
        session.set_proactive_enabled(true).unwrap();
        session.set_voice_enabled(false).unwrap();
        let stored = prefs.load_advanced_settings();
        assert!(!stored.voice_enabled);
        assert!(stored.proactive_enabled);
    }

    fn italian_speech() -> MockSpeechSynthesizer {
        let mut speech = MockSpeechSynthesizer::new();
        speech.expect_voices().return_const(vec![
            Voice::new("Samantha Female", "en-US"),
            Voice::new("Alice Female", "it-IT"),
        ]);
        speech
    }

    #[test]
    fn test_voice_follows_configured_language() {
        let voice = VoiceConfig {
            language: "it-IT".to_string(),
            ..VoiceConfig::default()
        };
        let session = session_with(memory_prefs())
            .with_speech(Arc::new(italian_speech()))
            .with_voice_config(&voice);

        assert_eq!(session.voice().map(|v| v.name.as_str()), Some("Alice Female"));
        assert_eq!(session.voice_params().voice.as_deref(), Some("Alice Female"));
        assert_eq!(session.system_info().voice.as_deref(), Some("Alice Female"));
    }

    #[test]
    fn test_spoken_reply_uses_chosen_voice() {
        let mut speech = italian_speech();
        speech
            .expect_speak()
            .withf(|text, params| {
                text == "Ciao!" && params.voice.as_deref() == Some("Samantha Female")
            })
            .times(1)
            .return_const(true);
        let mut session = session_with(memory_prefs()).with_speech(Arc::new(speech));
        session.set_voice_enabled(true).unwrap();
        session.speak("Ciao!");
    }

    #[tokio::test]
    async fn test_user_emotion_reaches_persona() {
        let mut session = session_with(memory_prefs());
        session.respond("I'm so sad today").await;
        assert_eq!(session.dispatcher().persona().user_emotion, MessageEmotion::Negative);

        session.respond("ok").await;
        assert_eq!(session.dispatcher().persona().user_emotion, MessageEmotion::Neutral);
    }

    #[tokio::test]
    async fn test_respond_touches_activity() {
        let activity = Arc::new(ActivityTracker::new());
        if let Some(past) = std::time::Instant::now().checked_sub(Duration::from_secs(600)) {
            activity.touch_at(past);
        }
        let mut session = session_with(memory_prefs()).with_activity(activity.clone());
        session.respond("hi").await;
        assert!(activity.idle_for() < Duration::from_secs(5));
    }
}
