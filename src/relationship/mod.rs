//! Relationship heuristics
//!
//! Keyword rules that nudge the relationship level, the companion's
//! emotional state and the set of known user interests based on what the
//! user writes. The rules live in a [`PolicyTable`] so they can be replaced
//! without touching the session.

pub mod emotion;

pub use emotion::{
    analyze_emotion, contextual_modifier, reply_suggestions, EmotionalTheme, MessageEmotion,
};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lowest relationship level
pub const MIN_LEVEL: u8 = 1;

/// Highest relationship level
pub const MAX_LEVEL: u8 = 10;

/// The companion's current mood
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionalState {
    /// Cheerful
    #[default]
    Happy,
    /// Thrilled, after an expression of affection
    Excited,
    /// Reflective
    Thoughtful,
    /// Gentle and supportive, after the user sounds sad
    Caring,
    /// Teasing and light-hearted
    Playful,
}

impl EmotionalState {
    /// Lowercase identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Happy => "happy",
            Self::Excited => "excited",
            Self::Thoughtful => "thoughtful",
            Self::Caring => "caring",
            Self::Playful => "playful",
        }
    }

    /// Short description used inside the persona prompt
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Happy => "cheerful and content",
            Self::Excited => "excited and thrilled",
            Self::Thoughtful => "thoughtful and reflective",
            Self::Caring => "caring and attentive",
            Self::Playful => "playful and cute",
        }
    }
}

impl fmt::Display for EmotionalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmotionalState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "happy" => Ok(Self::Happy),
            "excited" => Ok(Self::Excited),
            "thoughtful" => Ok(Self::Thoughtful),
            "caring" => Ok(Self::Caring),
            "playful" => Ok(Self::Playful),
            other => Err(format!("Unknown emotional state: {}", other)),
        }
    }
}

/// Persisted relationship progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipState {
    /// Closeness between 1 and 10
    pub level: u8,
    /// Total points earned, uncapped
    #[serde(default)]
    pub points: u32,
    /// Free-form milestone notes
    #[serde(default)]
    pub milestones: Vec<String>,
}

impl Default for RelationshipState {
    fn default() -> Self {
        Self {
            level: MIN_LEVEL,
            points: 0,
            milestones: Vec::new(),
        }
    }
}

impl RelationshipState {
    /// Creates a state at the given level, clamped into range
    pub fn at_level(level: u8) -> Self {
        Self {
            level: level.clamp(MIN_LEVEL, MAX_LEVEL),
            ..Self::default()
        }
    }

    /// Raises the level, never beyond [`MAX_LEVEL`]
    ///
    /// Returns true when the level changed.
    ///
    /// # Examples
    ///
    /// ```
    /// use bella::relationship::RelationshipState;
    ///
    /// let mut state = RelationshipState::at_level(9);
    /// assert!(state.raise(2));
    /// assert_eq!(state.level, 10);
    /// assert!(!state.raise(1));
    /// ```
    pub fn raise(&mut self, by: u8) -> bool {
        self.points = self.points.saturating_add(u32::from(by));
        let before = self.level;
        self.level = self.level.saturating_add(by).min(MAX_LEVEL);
        self.level != before
    }

    /// Brings a level read from storage back into range
    pub fn normalized(mut self) -> Self {
        self.level = self.level.clamp(MIN_LEVEL, MAX_LEVEL);
        self
    }

    /// Describes how close the user and the companion are
    pub fn context(&self) -> &'static str {
        match self.level {
            0..=2 => "just met, still getting to know each other",
            3..=5 => "familiar, building a deeper connection",
            6..=8 => "close, with mutual trust",
            _ => "deeply connected, understanding each other without words",
        }
    }
}

/// An interest and the substrings that reveal it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterestRule {
    /// Name stored in the preference interest set
    pub name: String,
    /// Lowercase substrings that indicate the interest
    pub terms: Vec<String>,
}

/// Keyword rules driving the relationship heuristics
///
/// Affection, gratitude and sadness are checked in that order and the
/// first match wins. Interest rules are all checked independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyTable {
    /// Expressions of affection
    pub affection: Vec<String>,
    /// Expressions of thanks
    pub gratitude: Vec<String>,
    /// Expressions of sadness
    pub sadness: Vec<String>,
    /// Interest detection rules
    pub interests: Vec<InterestRule>,
    /// Level increase for affection
    pub affection_bonus: u8,
    /// Level increase for gratitude
    pub gratitude_bonus: u8,
}

fn strings(terms: &[&str]) -> Vec<String> {
    terms.iter().map(|t| t.to_string()).collect()
}

impl Default for PolicyTable {
    fn default() -> Self {
        let interest = |name: &str, terms: &[&str]| InterestRule {
            name: name.to_string(),
            terms: strings(terms),
        };
        Self {
            affection: strings(&[
                "爱你", "喜欢你", "love you", "ti amo", "ti voglio bene", "mi piaci",
            ]),
            gratitude: strings(&["谢谢", "感谢", "thank", "grazie"]),
            sadness: strings(&["伤心", "难过", "sad", "upset", "triste"]),
            interests: vec![
                interest("music", &["音乐", "music", "musica", "song"]),
                interest("movies", &["电影", "movie", "film", "cinema"]),
                interest("games", &["游戏", "game", "gioco", "giochi", "videogioc"]),
                interest("travel", &["旅行", "travel", "viagg"]),
                interest("food", &["美食", "food", "cibo", "cucina", "cooking"]),
                interest("sports", &["运动", "sport", "football", "calcio"]),
                interest("reading", &["读书", "book", "reading", "libr", "leggere"]),
                interest("programming", &["编程", "programming", "coding", "programmazione"]),
            ],
            affection_bonus: 2,
            gratitude_bonus: 1,
        }
    }
}

/// What a single user message implies
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Analysis {
    /// Relationship level increase
    pub level_delta: u8,
    /// New emotional state, when one of the mood rules matched
    pub emotional_state: Option<EmotionalState>,
    /// Interests mentioned in the message
    pub interests: Vec<String>,
}

impl Analysis {
    /// Returns true when the message changes nothing
    pub fn is_empty(&self) -> bool {
        self.level_delta == 0 && self.emotional_state.is_none() && self.interests.is_empty()
    }
}

impl PolicyTable {
    /// Evaluates one user message against the rules
    ///
    /// # Examples
    ///
    /// ```
    /// use bella::relationship::{EmotionalState, PolicyTable};
    ///
    /// let analysis = PolicyTable::default().analyze("Thank you! I love music");
    /// assert_eq!(analysis.level_delta, 1);
    /// assert_eq!(analysis.emotional_state, Some(EmotionalState::Happy));
    /// assert_eq!(analysis.interests, vec!["music".to_string()]);
    /// ```
    pub fn analyze(&self, text: &str) -> Analysis {
        let lower = text.to_lowercase();
        let hit = |terms: &[String]| terms.iter().any(|t| lower.contains(t.as_str()));

        let mut analysis = Analysis::default();
        if hit(&self.affection) {
            analysis.level_delta = self.affection_bonus;
            analysis.emotional_state = Some(EmotionalState::Excited);
        } else if hit(&self.gratitude) {
            analysis.level_delta = self.gratitude_bonus;
            analysis.emotional_state = Some(EmotionalState::Happy);
        } else if hit(&self.sadness) {
            analysis.emotional_state = Some(EmotionalState::Caring);
        }

        analysis.interests = self
            .interests
            .iter()
            .filter(|rule| hit(&rule.terms))
            .map(|rule| rule.name.clone())
            .collect();

        if !analysis.is_empty() {
            tracing::debug!("Message analysis: {:?}", analysis);
        }
        analysis
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_affection_raises_by_two_and_excites() {
        let analysis = PolicyTable::default().analyze("我爱你");
        assert_eq!(analysis.level_delta, 2);
        assert_eq!(analysis.emotional_state, Some(EmotionalState::Excited));
    }

    #[test]
    fn test_affection_wins_over_gratitude() {
        let analysis = PolicyTable::default().analyze("Thank you, I love you!");
        assert_eq!(analysis.level_delta, 2);
        assert_eq!(analysis.emotional_state, Some(EmotionalState::Excited));
    }

    #[test]
    fn test_gratitude_in_italian() {
        let analysis = PolicyTable::default().analyze("Grazie mille!");
        assert_eq!(analysis.level_delta, 1);
        assert_eq!(analysis.emotional_state, Some(EmotionalState::Happy));
    }

    #[test]
    fn test_sadness_sets_caring_without_level_change() {
        let analysis = PolicyTable::default().analyze("今天很难过");
        assert_eq!(analysis.level_delta, 0);
        assert_eq!(analysis.emotional_state, Some(EmotionalState::Caring));
    }

    #[test]
    fn test_interests_checked_independently() {
        let analysis = PolicyTable::default().analyze("我喜欢你，也喜欢音乐和编程");
        assert_eq!(analysis.level_delta, 2);
        assert_eq!(analysis.interests, vec!["music", "programming"]);
    }

    #[test]
    fn test_neutral_message_is_empty() {
        let analysis = PolicyTable::default().analyze("what time is it?");
        assert!(analysis.is_empty());
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let analysis = PolicyTable::default().analyze("I LOVE YOU");
        assert_eq!(analysis.level_delta, 2);
    }

    #[test]
    fn test_custom_policy_table() {
        let table = PolicyTable {
            affection: vec!["<3".to_string()],
            gratitude: vec![],
            sadness: vec![],
            interests: vec![],
            affection_bonus: 3,
            gratitude_bonus: 0,
        };
        assert_eq!(table.analyze("<3").level_delta, 3);
        assert!(table.analyze("I love you").is_empty());
    }

    #[test]
    fn test_level_is_capped_at_ten() {
        let mut state = RelationshipState::default();
        for _ in 0..20 {
            state.raise(2);
        }
        assert_eq!(state.level, MAX_LEVEL);
        assert_eq!(state.points, 40);
    }

    #[test]
    fn test_raise_reports_change() {
        let mut state = RelationshipState::default();
        assert!(state.raise(1));
        assert_eq!(state.level, 2);
        assert!(!state.raise(0));
    }

    #[test]
    fn test_normalized_clamps_out_of_range() {
        let state = RelationshipState {
            level: 0,
            points: 0,
            milestones: vec![],
        };
        assert_eq!(state.normalized().level, 1);
        assert_eq!(RelationshipState::at_level(42).level, 10);
    }

    #[test]
    fn test_relationship_context_bands() {
        assert!(RelationshipState::at_level(2).context().starts_with("just met"));
        assert!(RelationshipState::at_level(5).context().starts_with("familiar"));
        assert!(RelationshipState::at_level(8).context().starts_with("close"));
        assert!(RelationshipState::at_level(10).context().starts_with("deeply"));
    }

    #[test]
    fn test_emotional_state_parse_and_display() {
        assert_eq!("Playful".parse::<EmotionalState>().unwrap(), EmotionalState::Playful);
        assert!("angry".parse::<EmotionalState>().is_err());
        assert_eq!(EmotionalState::Caring.to_string(), "caring");
        assert_eq!(EmotionalState::default(), EmotionalState::Happy);
    }

    #[test]
    fn test_relationship_state_json_shape() {
        let json = serde_json::to_value(RelationshipState::default()).unwrap();
        assert_eq!(json, serde_json::json!({"level": 1, "points": 0, "milestones": []}));
    }
}
