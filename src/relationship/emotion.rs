//! Message sentiment, reply suggestions and emotional themes

use super::EmotionalState;
use crate::providers::{Message, Role};
use serde::Serialize;
use std::fmt;

/// Maximum number of reply suggestions returned
pub const MAX_SUGGESTIONS: usize = 3;

/// Coarse sentiment of a user message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageEmotion {
    /// Happy or enthusiastic
    Positive,
    /// Sad, angry or disappointed
    Negative,
    /// Asking something
    Question,
    /// Thanking
    Gratitude,
    /// Nothing detected
    Neutral,
}

impl fmt::Display for MessageEmotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Question => "question",
            Self::Gratitude => "gratitude",
            Self::Neutral => "neutral",
        };
        f.write_str(name)
    }
}

// Checked in this order; the first category with a hit wins.
const EMOTION_KEYWORDS: &[(MessageEmotion, &[&str])] = &[
    (
        MessageEmotion::Positive,
        &[
            "开心", "高兴", "快乐", "兴奋", "喜欢", "爱", "棒", "好", "happy", "glad", "great",
            "awesome", "love", "felice", "contento", "bellissim",
        ],
    ),
    (
        MessageEmotion::Negative,
        &[
            "伤心", "难过", "生气", "失望", "糟糕", "讨厌", "烦", "sad", "angry", "upset",
            "disappointed", "terrible", "hate", "triste", "arrabbiat",
        ],
    ),
    (
        MessageEmotion::Question,
        &[
            "吗", "呢", "？", "什么", "怎么", "为什么", "如何", "?", "what", "why", "how",
            "perché",
        ],
    ),
    (
        MessageEmotion::Gratitude,
        &["谢谢", "感谢", "谢", "thank", "grazie"],
    ),
];

/// Classifies the sentiment of a message by keyword
///
/// # Examples
///
/// ```
/// use bella::relationship::{analyze_emotion, MessageEmotion};
///
/// assert_eq!(analyze_emotion("I'm so happy today"), MessageEmotion::Positive);
/// assert_eq!(analyze_emotion("where are you from?"), MessageEmotion::Question);
/// assert_eq!(analyze_emotion("ok"), MessageEmotion::Neutral);
/// ```
pub fn analyze_emotion(text: &str) -> MessageEmotion {
    let lower = text.to_lowercase();
    EMOTION_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(emotion, _)| *emotion)
        .unwrap_or(MessageEmotion::Neutral)
}

/// Short phrase that acknowledges the user's sentiment, if any
pub fn contextual_modifier(emotion: MessageEmotion) -> Option<&'static str> {
    match emotion {
        MessageEmotion::Positive => Some("I'm so happy for you! 😊"),
        MessageEmotion::Negative => {
            Some("I understand how you feel, everything will be okay 🤗")
        }
        MessageEmotion::Question => Some("let me think about how to answer that"),
        MessageEmotion::Gratitude => Some("no need to thank me, I'm glad to help 💕"),
        MessageEmotion::Neutral => None,
    }
}

/// Suggests up to three quick replies to the most recent assistant message
///
/// Returns nothing when the conversation is empty or the last message is
/// not from the assistant.
pub fn reply_suggestions<'a>(history: impl IntoIterator<Item = &'a Message>) -> Vec<String> {
    let last = match history.into_iter().last() {
        Some(message) if message.role == Role::Assistant => message,
        _ => return Vec::new(),
    };

    let text = last.content.to_lowercase();
    let has = |terms: &[&str]| terms.iter().any(|t| text.contains(t));

    let suggestions: &[&str] = if has(&["你好", "嗨", "hello", "hi!", "hey", "ciao"]) {
        &[
            "Hi! Nice to see you 😊",
            "Hey! How's your day going?",
            "Hello! What shall we talk about?",
        ]
    } else if has(&["怎么样", "如何", "how are", "how was", "come stai", "come va"]) {
        &["Pretty good!", "Not bad at all", "Thanks for asking 💕"]
    } else if has(&["谢谢", "感谢", "thank", "grazie"]) {
        &["You're welcome!", "Anytime 😊", "Glad I could help"]
    } else {
        &[
            "Go on, I'm listening",
            "Really?",
            "I think so too",
            "How interesting!",
            "Let's keep talking 😊",
        ]
    };

    suggestions
        .iter()
        .take(MAX_SUGGESTIONS)
        .map(|s| s.to_string())
        .collect()
}

/// Named moods the user can ask the companion to adopt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmotionalTheme {
    /// Affectionate
    Romantic,
    /// Gentle
    Caring,
    /// Light-hearted
    Playful,
    /// Encouraging
    Supportive,
    /// Anything else
    Default,
}

impl EmotionalTheme {
    /// Parses a theme name; unrecognized names map to [`EmotionalTheme::Default`]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "romantic" => Self::Romantic,
            "caring" => Self::Caring,
            "playful" => Self::Playful,
            "supportive" => Self::Supportive,
            _ => Self::Default,
        }
    }

    /// Emotional state the theme puts the companion in
    pub fn emotional_state(&self) -> EmotionalState {
        match self {
            Self::Romantic => EmotionalState::Excited,
            Self::Caring => EmotionalState::Caring,
            Self::Playful => EmotionalState::Playful,
            Self::Supportive => EmotionalState::Thoughtful,
            Self::Default => EmotionalState::Happy,
        }
    }
}
