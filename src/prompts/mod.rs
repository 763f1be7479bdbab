//! Prompts sent to the providers
//!
//! This module provides the persona system prompt, parameterized by time of
//! day and relationship state, and the mode-specific framing applied to each
//! user message.

pub mod mode_prompt;
pub mod persona;

pub use mode_prompt::enhance_for_mode;
pub use persona::{build_system_prompt, PersonaContext};

use chrono::Timelike;
use std::fmt;

/// Coarse part of the day used to color the persona prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeOfDay {
    /// Midnight to 6am
    LateNight,
    /// 6am to noon
    Morning,
    /// Noon to 6pm
    Afternoon,
    /// 6pm to midnight
    Evening,
}

impl TimeOfDay {
    /// Buckets an hour in 0..24
    ///
    /// # Examples
    ///
    /// ```
    /// use bella::prompts::TimeOfDay;
    ///
    /// assert_eq!(TimeOfDay::from_hour(5), TimeOfDay::LateNight);
    /// assert_eq!(TimeOfDay::from_hour(6), TimeOfDay::Morning);
    /// assert_eq!(TimeOfDay::from_hour(23), TimeOfDay::Evening);
    /// ```
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            0..=5 => Self::LateNight,
            6..=11 => Self::Morning,
            12..=17 => Self::Afternoon,
            _ => Self::Evening,
        }
    }

    /// Time of day on the local clock
    pub fn now() -> Self {
        Self::from_hour(chrono::Local::now().hour())
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LateNight => write!(f, "late at night"),
            Self::Morning => write!(f, "morning"),
            Self::Afternoon => write!(f, "afternoon"),
            Self::Evening => write!(f, "evening"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_of_day_boundaries() {
        assert_eq!(TimeOfDay::from_hour(0), TimeOfDay::LateNight);
        assert_eq!(TimeOfDay::from_hour(11), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(12), TimeOfDay::Afternoon);
        assert_eq!(TimeOfDay::from_hour(17), TimeOfDay::Afternoon);
        assert_eq!(TimeOfDay::from_hour(18), TimeOfDay::Evening);
    }

    #[test]
    fn test_time_of_day_display() {
        assert_eq!(TimeOfDay::LateNight.to_string(), "late at night");
        assert_eq!(TimeOfDay::Evening.to_string(), "evening");
    }
}
