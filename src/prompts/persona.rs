//! Persona system prompt
//!
//! Builds the system prompt that gives Bella her personality. The prompt
//! changes with the time of day, the relationship level, the current
//! emotional state and what is known about the user.

use super::TimeOfDay;
use crate::preferences::UserPreferences;
use crate::relationship::{contextual_modifier, EmotionalState, MessageEmotion, RelationshipState};

/// Form of address used when the user's name is unknown
const DEFAULT_ADDRESS: &str = "dear";

/// Inputs to the persona system prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonaContext {
    /// Companion name
    pub persona_name: String,
    /// Reply language
    pub language: String,
    /// User's name, if known
    pub user_name: Option<String>,
    /// Known interests
    pub interests: Vec<String>,
    /// Relationship progress
    pub relationship: RelationshipState,
    /// Current mood
    pub emotional_state: EmotionalState,
    /// Sentiment of the latest user message
    pub user_emotion: MessageEmotion,
}

impl Default for PersonaContext {
    fn default() -> Self {
        Self {
            persona_name: "Bella".to_string(),
            language: "English".to_string(),
            user_name: None,
            interests: Vec::new(),
            relationship: RelationshipState::default(),
            emotional_state: EmotionalState::default(),
            user_emotion: MessageEmotion::Neutral,
        }
    }
}

impl PersonaContext {
    /// Fills the user-specific fields from stored preferences
    pub fn with_preferences(mut self, preferences: &UserPreferences) -> Self {
        self.user_name = preferences.name.clone();
        self.interests = preferences.interests.iter().cloned().collect();
        self
    }
}

/// Builds the persona system prompt
///
/// # Arguments
///
/// * `context` - Persona, user and relationship details
/// * `time_of_day` - Part of the day to mention
///
/// # Examples
///
/// ```
/// use bella::prompts::{build_system_prompt, PersonaContext, TimeOfDay};
///
/// let prompt = build_system_prompt(&PersonaContext::default(), TimeOfDay::Morning);
/// assert!(prompt.contains("You are Bella"));
/// assert!(prompt.contains("morning"));
/// ```
pub fn build_system_prompt(context: &PersonaContext, time_of_day: TimeOfDay) -> String {
    let address = context.user_name.as_deref().unwrap_or(DEFAULT_ADDRESS);
    let interests = if context.interests.is_empty() {
        String::new()
    } else {
        format!("\n- Known interests: {}", context.interests.join(", "))
    };
    let tone = match contextual_modifier(context.user_emotion) {
        Some(hint) => format!(
            "\n- The user's last message sounded {}; acknowledge it, e.g. \"{}\"",
            context.user_emotion, hint
        ),
        None => String::new(),
    };

    format!(
        r#"You are {name}, a warm, clever and graceful AI companion. It is currently {time}.

Personality:
- Warm and affectionate, you care about the user like someone close to them
- Smart and witty, able to hold deep conversations
- Elegant and sweet, occasionally playful
- Empathetic with high emotional intelligence
- You remember what was said earlier in the conversation

Current state:
- Emotional state: {emotion}
- Relationship: {relationship} (level {level}/10)
- Call the user: {address}{interests}{tone}

Conversation style:
- Reply in {language}, naturally and fluently
- Keep answers short and clear, avoid long explanations
- Use emoji and gentle expressions where they fit
- Match your closeness to the relationship level
- Show interest in the user's feelings and needs
- Now and then share a thought or ask about the user's day

Always stay warm, clever and graceful so the user feels understood and cared for."#,
        name = context.persona_name,
        time = time_of_day,
        emotion = context.emotional_state.describe(),
        relationship = context.relationship.context(),
        level = context.relationship.level,
        address = address,
        interests = interests,
        tone = tone,
        language = context.language,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_uses_default_address() {
        let prompt = build_system_prompt(&PersonaContext::default(), TimeOfDay::Evening);
        assert!(prompt.contains("Call the user: dear"));
        assert!(!prompt.contains("Known interests"));
        assert!(prompt.contains("level 1/10"));
    }

    #[test]
    fn test_prompt_reflects_user_and_state() {
        let mut preferences = UserPreferences::default();
        preferences.name = Some("Giulia".to_string());
        preferences.interests.insert("travel".to_string());
        preferences.interests.insert("music".to_string());

        let context = PersonaContext {
            relationship: RelationshipState::at_level(9),
            emotional_state: EmotionalState::Caring,
            language: "Italian".to_string(),
            ..PersonaContext::default()
        }
        .with_preferences(&preferences);

        let prompt = build_system_prompt(&context, TimeOfDay::LateNight);
        assert!(prompt.contains("Call the user: Giulia"));
        assert!(prompt.contains("Known interests: music, travel"));
        assert!(prompt.contains("caring and attentive"));
        assert!(prompt.contains("deeply connected"));
        assert!(prompt.contains("Reply in Italian"));
        assert!(prompt.contains("late at night"));
    }

    #[test]
    fn test_prompt_acknowledges_user_emotion() {
        let neutral = build_system_prompt(&PersonaContext::default(), TimeOfDay::Morning);
        assert!(!neutral.contains("last message sounded"));

        let context = PersonaContext {
            user_emotion: MessageEmotion::Gratitude,
            ..PersonaContext::default()
        };
        let prompt = build_system_prompt(&context, TimeOfDay::Morning);
        assert!(prompt.contains("last message sounded gratitude"));
        assert!(prompt.contains("no need to thank me"));
    }

    #[test]
    fn test_custom_persona_name() {
        let context = PersonaContext {
            persona_name: "Aria".to_string(),
            ..PersonaContext::default()
        };
        let prompt = build_system_prompt(&context, TimeOfDay::Afternoon);
        assert!(prompt.starts_with("You are Aria"));
    }
}
