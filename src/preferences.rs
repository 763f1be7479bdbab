//! Persisted user preferences and settings
//!
//! Everything Bella remembers between runs lives under four JSON-valued
//! keys in a [`KeyValueStore`]. Missing or unreadable values fall back to
//! defaults so a corrupt store never prevents a conversation.

use crate::chat_mode::ChatMode;
use crate::error::Result;
use crate::relationship::RelationshipState;
use crate::storage::{KeyValueStore, StoredEntry};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Storage key for [`UserPreferences`]
pub const USER_PREFERENCES_KEY: &str = "bella_user_preferences";
/// Storage key for [`RelationshipState`]
pub const RELATIONSHIP_KEY: &str = "bella_relationship_level";
/// Storage key for [`ChatSettings`]
pub const CHAT_SETTINGS_KEY: &str = "bella_chat_settings";
/// Storage key for [`AdvancedSettings`]
pub const ADVANCED_SETTINGS_KEY: &str = "bella_advanced_settings";

/// Every key this module writes
pub const ALL_KEYS: [&str; 4] = [
    USER_PREFERENCES_KEY,
    RELATIONSHIP_KEY,
    CHAT_SETTINGS_KEY,
    ADVANCED_SETTINGS_KEY,
];

/// What Bella knows about the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    /// How the user wants to be called
    #[serde(default)]
    pub name: Option<String>,
    /// Interests picked up from conversation
    #[serde(default)]
    pub interests: BTreeSet<String>,
    /// Preferred tone
    #[serde(default = "default_conversation_style")]
    pub conversation_style: String,
    /// Topics the user asked to talk about
    #[serde(default)]
    pub preferred_topics: Vec<String>,
    /// Time zone or UTC offset of the user
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_conversation_style() -> String {
    "friendly".to_string()
}

fn default_timezone() -> String {
    std::env::var("TZ").unwrap_or_else(|_| chrono::Local::now().offset().to_string())
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            name: None,
            interests: BTreeSet::new(),
            conversation_style: default_conversation_style(),
            preferred_topics: Vec::new(),
            timezone: default_timezone(),
        }
    }
}

/// Last provider and mode the user picked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSettings {
    /// Provider identifier
    pub provider: String,
    /// Chat mode
    #[serde(default)]
    pub mode: ChatMode,
}

/// Optional feature toggles and voice tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedSettings {
    /// Speak replies aloud
    #[serde(default)]
    pub voice_enabled: bool,
    /// Show notifications
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,
    /// Send re-engagement messages after inactivity
    #[serde(default)]
    pub proactive_enabled: bool,
    /// Voice rate override
    #[serde(default)]
    pub voice_rate: Option<f32>,
    /// Voice pitch override
    #[serde(default)]
    pub voice_pitch: Option<f32>,
    /// Voice volume override
    #[serde(default)]
    pub voice_volume: Option<f32>,
}

fn default_true() -> bool {
    true
}

impl Default for AdvancedSettings {
    fn default() -> Self {
        Self {
            voice_enabled: false,
            notifications_enabled: true,
            proactive_enabled: false,
            voice_rate: None,
            voice_pitch: None,
            voice_volume: None,
        }
    }
}

/// Typed access to the persisted preference keys
#[derive(Clone)]
pub struct PreferenceStore {
    store: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for PreferenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreferenceStore").finish_non_exhaustive()
    }
}

impl PreferenceStore {
    /// Wraps a key-value backend
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Reads and decodes a key, returning `None` when absent or unreadable
    fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", key, e);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Discarding corrupt value for {}: {}", key, e);
                None
            }
        }
    }

    fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.store.set(key, &json)?;
        tracing::debug!("Saved {}", key);
        Ok(())
    }

    /// Loads user preferences, defaulting when missing or corrupt
    pub fn load_preferences(&self) -> UserPreferences {
        self.read(USER_PREFERENCES_KEY).unwrap_or_default()
    }

    /// Saves user preferences
    pub fn save_preferences(&self, preferences: &UserPreferences) -> Result<()> {
        self.write(USER_PREFERENCES_KEY, preferences)
    }

    /// Loads relationship progress
    ///
    /// Accepts both the structured form and a bare integer level. Missing
    /// or corrupt values yield level 1.
    pub fn load_relationship(&self) -> RelationshipState {
        match self.read::<serde_json::Value>(RELATIONSHIP_KEY) {
            Some(serde_json::Value::Number(n)) => {
                let level = n.as_u64().unwrap_or(1).min(u64::from(u8::MAX)) as u8;
                RelationshipState::at_level(level)
            }
            Some(value) => serde_json::from_value::<RelationshipState>(value)
                .map(RelationshipState::normalized)
                .unwrap_or_else(|e| {
                    tracing::warn!("Discarding corrupt value for {}: {}", RELATIONSHIP_KEY, e);
                    RelationshipState::default()
                }),
            None => RelationshipState::default(),
        }
    }

    /// Saves relationship progress
    pub fn save_relationship(&self, state: &RelationshipState) -> Result<()> {
        self.write(RELATIONSHIP_KEY, state)
    }

    /// Loads the last chosen provider and mode, if any
    pub fn load_chat_settings(&self) -> Option<ChatSettings> {
        self.read(CHAT_SETTINGS_KEY)
    }

    /// Saves the chosen provider and mode
    pub fn save_chat_settings(&self, settings: &ChatSettings) -> Result<()> {
        self.write(CHAT_SETTINGS_KEY, settings)
    }

    /// Loads feature toggles
    pub fn load_advanced_settings(&self) -> AdvancedSettings {
        self.read(ADVANCED_SETTINGS_KEY).unwrap_or_default()
    }

    /// Saves feature toggles
    pub fn save_advanced_settings(&self, settings: &AdvancedSettings) -> Result<()> {
        self.write(ADVANCED_SETTINGS_KEY, settings)
    }

    /// Raw entries for display
    pub fn entries(&self) -> Result<Vec<StoredEntry>> {
        self.store.entries()
    }

    /// Deletes every key this store manages
    pub fn reset(&self) -> Result<()> {
        for key in ALL_KEYS {
            self.store.remove(key)?;
        }
        tracing::info!("Preferences reset");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn store() -> (PreferenceStore, Arc<MemoryStore>) {
        let backend = Arc::new(MemoryStore::new());
        (PreferenceStore::new(backend.clone()), backend)
    }

    #[test]
    fn test_missing_preferences_default() {
        let (prefs, _) = store();
        let loaded = prefs.load_preferences();
        assert_eq!(loaded.name, None);
        assert!(loaded.interests.is_empty());
        assert_eq!(loaded.conversation_style, "friendly");
    }

    #[test]
    fn test_preferences_roundtrip() {
        let (prefs, _) = store();
        let mut value = UserPreferences::default();
        value.name = Some("Luca".to_string());
        value.interests.insert("music".to_string());
        prefs.save_preferences(&value).unwrap();
        assert_eq!(prefs.load_preferences(), value);
    }

    #[test]
    fn test_preferences_camel_case_on_disk() {
        let (prefs, backend) = store();
        prefs.save_preferences(&UserPreferences::default()).unwrap();
        let raw = backend.get(USER_PREFERENCES_KEY).unwrap().unwrap();
        assert!(raw.contains("conversationStyle"));
        assert!(raw.contains("preferredTopics"));
    }

    #[test]
    fn test_corrupt_preferences_fall_back() {
        let (prefs, backend) = store();
        backend.set(USER_PREFERENCES_KEY, "{not json").unwrap();
        assert_eq!(prefs.load_preferences().conversation_style, "friendly");
    }

    #[test]
    fn test_legacy_integer_relationship_level() {
        let (prefs, backend) = store();
        backend.set(RELATIONSHIP_KEY, "4").unwrap();
        let state = prefs.load_relationship();
        assert_eq!(state.level, 4);
        assert_eq!(state.points, 0);
    }

    #[test]
    fn test_relationship_out_of_range_is_clamped() {
        let (prefs, backend) = store();
        backend.set(RELATIONSHIP_KEY, "99").unwrap();
        assert_eq!(prefs.load_relationship().level, 10);
        backend
            .set(RELATIONSHIP_KEY, r#"{"level":0,"points":3,"milestones":[]}"#)
            .unwrap();
        assert_eq!(prefs.load_relationship().level, 1);
    }

    #[test]
    fn test_corrupt_relationship_defaults_to_level_one() {
        let (prefs, backend) = store();
        backend.set(RELATIONSHIP_KEY, "\"close\"").unwrap();
        assert_eq!(prefs.load_relationship(), RelationshipState::default());
    }

    #[test]
    fn test_chat_settings_absent_then_saved() {
        let (prefs, _) = store();
        assert!(prefs.load_chat_settings().is_none());
        let settings = ChatSettings {
            provider: "claude".to_string(),
            mode: ChatMode::Creative,
        };
        prefs.save_chat_settings(&settings).unwrap();
        assert_eq!(prefs.load_chat_settings(), Some(settings));
    }

    #[test]
    fn test_advanced_settings_defaults_from_partial_json() {
        let (prefs, backend) = store();
        backend
            .set(ADVANCED_SETTINGS_KEY, r#"{"voiceEnabled":true}"#)
            .unwrap();
        let settings = prefs.load_advanced_settings();
        assert!(settings.voice_enabled);
        assert!(settings.notifications_enabled);
        assert!(!settings.proactive_enabled);
    }

    #[test]
    fn test_reset_removes_all_keys() {
        let (prefs, backend) = store();
        prefs.save_preferences(&UserPreferences::default()).unwrap();
        prefs.save_relationship(&RelationshipState::at_level(3)).unwrap();
        backend.set("unrelated", "1").unwrap();
        prefs.reset().unwrap();
        let keys: Vec<String> = prefs.entries().unwrap().into_iter().map(|e| e.key).collect();
        assert_eq!(keys, vec!["unrelated"]);
    }
}
