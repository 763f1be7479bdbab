//! Mode framing for user messages
//!
//! Each chat mode wraps the user's text in a short instruction before it
//! is added to the conversation.

use crate::chat_mode::ChatMode;

/// Wraps the user's message with the instruction for the given mode
///
/// # Examples
///
/// ```
/// use bella::chat_mode::ChatMode;
/// use bella::prompts::enhance_for_mode;
///
/// let text = enhance_for_mode(ChatMode::Creative, "tell me a story");
/// assert!(text.ends_with("tell me a story"));
/// assert!(text.contains("imagination"));
/// ```
pub fn enhance_for_mode(mode: ChatMode, text: &str) -> String {
    let instruction = match mode {
        ChatMode::Casual => {
            "Please reply in a warm, light tone, like a caring friend. Keep it short and engaging"
        }
        ChatMode::Assistant => {
            "As a professional but warm AI assistant, give accurate and useful information and advice"
        }
        ChatMode::Creative => {
            "Use creativity and imagination, and give interesting and unique answers and ideas"
        }
    };
    format!("{}: {}", instruction, text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_mode_keeps_user_text() {
        for mode in ChatMode::ALL {
            let text = enhance_for_mode(mode, "ciao");
            assert!(text.ends_with(": ciao"), "{:?}", mode);
        }
    }

    #[test]
    fn test_modes_differ() {
        let casual = enhance_for_mode(ChatMode::Casual, "x");
        let assistant = enhance_for_mode(ChatMode::Assistant, "x");
        assert_ne!(casual, assistant);
        assert!(casual.contains("warm, light tone"));
        assert!(assistant.contains("accurate"));
    }
}
