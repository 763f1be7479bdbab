//! Speech synthesis and recognition ports
//!
//! Bella can speak replies and listen for spoken input when the host
//! provides those capabilities. Both are optional: the no-op
//! implementations report that nothing happened.

use crate::relationship::EmotionalState;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A voice offered by a synthesizer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    /// Display name, e.g. "Google italiano Female"
    pub name: String,
    /// BCP-47 language tag, e.g. "it-IT"
    pub lang: String,
}

impl Voice {
    /// Creates a voice description
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
        }
    }
}

/// Voice and prosody for one utterance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceParams {
    /// Name of the voice to use, `None` for the host default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    /// Speaking rate
    pub rate: f32,
    /// Pitch
    pub pitch: f32,
    /// Volume between 0 and 1
    pub volume: f32,
}

impl Default for VoiceParams {
    fn default() -> Self {
        Self::for_emotion(EmotionalState::Happy)
    }
}

impl VoiceParams {
    /// Preset prosody for an emotional state
    ///
    /// # Examples
    ///
    /// ```
    /// use bella::features::VoiceParams;
    /// use bella::relationship::EmotionalState;
    ///
    /// let params = VoiceParams::for_emotion(EmotionalState::Excited);
    /// assert_eq!(params.pitch, 1.2);
    /// ```
    pub fn for_emotion(state: EmotionalState) -> Self {
        let (rate, pitch, volume) = match state {
            EmotionalState::Happy => (0.9, 1.1, 0.8),
            EmotionalState::Excited => (1.0, 1.2, 0.9),
            EmotionalState::Caring => (0.8, 1.0, 0.7),
            EmotionalState::Playful => (1.1, 1.3, 0.8),
            EmotionalState::Thoughtful => (0.7, 0.9, 0.6),
        };
        Self {
            voice: None,
            rate,
            pitch,
            volume,
        }
    }

    /// Speaks with the given voice
    pub fn with_voice(mut self, voice: Option<&Voice>) -> Self {
        self.voice = voice.map(|v| v.name.clone());
        self
    }

    /// Replaces individual values with user overrides
    pub fn with_overrides(mut self, rate: Option<f32>, pitch: Option<f32>, volume: Option<f32>) -> Self {
        if let Some(rate) = rate {
            self.rate = rate;
        }
        if let Some(pitch) = pitch {
            self.pitch = pitch;
        }
        if let Some(volume) = volume {
            self.volume = volume.clamp(0.0, 1.0);
        }
        self
    }
}

/// Picks the most suitable voice for a language
///
/// Preference order: a female voice in the language, any voice in the
/// language, any female voice, the first voice.
///
/// # Examples
///
/// ```
/// use bella::features::{select_voice, Voice};
///
/// let voices = vec![
///     Voice::new("Daniel", "en-GB"),
///     Voice::new("Alice Female", "it-IT"),
///     Voice::new("Luca", "it-IT"),
/// ];
/// assert_eq!(select_voice(&voices, "it").unwrap().name, "Alice Female");
/// ```
pub fn select_voice<'a>(voices: &'a [Voice], language: &str) -> Option<&'a Voice> {
    let language = language.to_lowercase();
    let prefix = language.split(['-', '_']).next().unwrap_or(&language).to_string();
    let matches_lang = |v: &Voice| v.lang.to_lowercase().starts_with(&prefix);
    let is_female = |v: &Voice| v.name.to_lowercase().contains("female");

    voices
        .iter()
        .find(|v| matches_lang(v) && is_female(v))
        .or_else(|| voices.iter().find(|v| matches_lang(v)))
        .or_else(|| voices.iter().find(|v| is_female(v)))
        .or_else(|| voices.first())
}

/// Text-to-speech capability
#[cfg_attr(test, mockall::automock)]
pub trait SpeechSynthesizer: Send + Sync {
    /// Voices the host offers
    fn voices(&self) -> Vec<Voice>;

    /// Speaks text, interrupting anything already playing
    ///
    /// Returns false when nothing was spoken.
    fn speak(&self, text: &str, params: &VoiceParams) -> bool;

    /// Stops any ongoing speech
    fn stop(&self);
}

/// Synthesizer for hosts without speech output
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSpeech;

impl SpeechSynthesizer for NoopSpeech {
    fn voices(&self) -> Vec<Voice> {
        Vec::new()
    }

    fn speak(&self, _text: &str, _params: &VoiceParams) -> bool {
        false
    }

    fn stop(&self) {}
}

/// Speech-to-text capability
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Listens for one utterance and returns its transcript
    ///
    /// Returns `None` if recognition is unavailable or nothing was heard.
    async fn listen(&self) -> Option<String>;
}

/// Recognizer for hosts without a microphone
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRecognizer;

#[async_trait]
impl SpeechRecognizer for NoopRecognizer {
    async fn listen(&self) -> Option<String> {
        None
    }
}
