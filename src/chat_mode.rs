//! Chat mode types and utilities
//!
//! This module defines the conversational modes Bella can be in:
//! - Casual mode: relaxed, friendly small talk
//! - Assistant mode: focused, practical help
//! - Creative mode: imaginative, playful writing
//!
//! It also defines the REPL prompt state that shows the active mode and
//! provider.

use crate::error::BellaError;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Chat mode for conversations
///
/// Determines how the user's message is framed before it is sent to the
/// provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    /// Relaxed conversation with emotional warmth
    #[default]
    Casual,

    /// Practical help and clear answers
    Assistant,

    /// Stories, ideas and imaginative play
    Creative,
}

impl fmt::Display for ChatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Casual => write!(f, "CASUAL"),
            Self::Assistant => write!(f, "ASSISTANT"),
            Self::Creative => write!(f, "CREATIVE"),
        }
    }
}

impl FromStr for ChatMode {
    type Err = BellaError;

    /// Parse a chat mode from a string
    ///
    /// # Examples
    ///
    /// ```
    /// use bella::chat_mode::ChatMode;
    ///
    /// let mode: ChatMode = "Creative".parse().unwrap();
    /// assert_eq!(mode, ChatMode::Creative);
    /// assert!("poetic".parse::<ChatMode>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "casual" => Ok(Self::Casual),
            "assistant" => Ok(Self::Assistant),
            "creative" => Ok(Self::Creative),
            other => Err(BellaError::UnsupportedMode(other.to_string())),
        }
    }
}

impl ChatMode {
    /// All modes in display order
    pub const ALL: [ChatMode; 3] = [Self::Casual, Self::Assistant, Self::Creative];

    /// Lowercase identifier used in config and storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Casual => "casual",
            Self::Assistant => "assistant",
            Self::Creative => "creative",
        }
    }

    /// Get a user-friendly description of this mode
    pub fn description(&self) -> &'static str {
        match self {
            Self::Casual => "Relaxed, friendly conversation",
            Self::Assistant => "Focused, practical help",
            Self::Creative => "Imaginative stories and ideas",
        }
    }

    /// Get a colored tag representation of this mode
    ///
    /// # Examples
    ///
    /// ```ignore
    /// use bella::chat_mode::ChatMode;
    ///
    /// let tag = ChatMode::Casual.colored_tag();
    /// println!("{}", tag);  // Displays "[CASUAL]" in magenta
    /// ```
    pub fn colored_tag(&self) -> String {
        match self {
            Self::Casual => format!("[{}]", "CASUAL".magenta()),
            Self::Assistant => format!("[{}]", "ASSISTANT".cyan()),
            Self::Creative => format!("[{}]", "CREATIVE".yellow()),
        }
    }
}

/// What the REPL prompt shows: the active mode and provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatModeState {
    /// The current chat mode
    pub chat_mode: ChatMode,
    /// The current provider identifier
    pub provider: String,
}

impl ChatModeState {
    /// Create a new chat mode state
    ///
    /// # Examples
    ///
    /// ```
    /// use bella::chat_mode::{ChatMode, ChatModeState};
    ///
    /// let state = ChatModeState::new(ChatMode::Casual, "claude");
    /// assert_eq!(state.format_prompt(), "[CASUAL][claude] >> ");
    /// ```
    pub fn new(chat_mode: ChatMode, provider: impl Into<String>) -> Self {
        Self {
            chat_mode,
            provider: provider.into(),
        }
    }

    /// Switch to a new chat mode, returning the old one
    pub fn switch_mode(&mut self, new_mode: ChatMode) -> ChatMode {
        std::mem::replace(&mut self.chat_mode, new_mode)
    }

    /// Switch to a new provider, returning the old one
    pub fn switch_provider(&mut self, provider: impl Into<String>) -> String {
        std::mem::replace(&mut self.provider, provider.into())
    }

    /// Format a plain prompt string
    pub fn format_prompt(&self) -> String {
        format!("[{}][{}] >> ", self.chat_mode, self.provider)
    }

    /// Format a prompt string with colored mode indicators
    pub fn format_colored_prompt(&self) -> String {
        format!(
            "{}[{}] >> ",
            self.chat_mode.colored_tag(),
            self.provider.blue()
        )
    }

    /// Get the current status as a formatted string
    pub fn status(&self) -> String {
        format!(
            "Mode: {} ({})\nProvider: {}",
            self.chat_mode,
            self.chat_mode.description(),
            self.provider
        )
    }
}
