//! Special commands parser for the interactive chat
//!
//! Special commands change the session instead of being sent to the
//! provider. They are prefixed with `/`; the command word is
//! case-insensitive while arguments such as names and keys keep their case.

use crate::chat_mode::ChatMode;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an unsupported argument
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Feature that can be switched on or off from the chat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    /// Spoken replies
    Voice,
    /// Proactive re-engagement messages
    Proactive,
    /// Notifications
    Notifications,
}

/// Special commands that can be executed during interactive chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Switch to a different chat mode
    SwitchMode(ChatMode),

    /// Switch to a different provider
    SwitchProvider(String),

    /// List the providers and whether they have keys
    ListProviders,

    /// Install an API key for a provider for this run
    SetKey { provider: String, secret: String },

    /// Forget the conversation
    ClearHistory,

    /// Print the conversation
    ShowHistory,

    /// Display provider, mode, mood and relationship level
    ShowStatus,

    /// Remember how the user wants to be called
    SetName(String),

    /// Change the companion's mood by theme name
    SetTheme(String),

    /// Suggest quick replies to the last message
    Suggest,

    /// Turn a feature on or off
    Toggle(Toggle, bool),

    /// Take the next message from the speech recognizer
    Listen,

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command
    ///
    /// The input should be sent to the provider.
    None,
}

fn missing(command: &str, usage: &str) -> CommandError {
    CommandError::MissingArgument {
        command: command.to_string(),
        usage: usage.to_string(),
    }
}

fn unsupported(command: &str, arg: &str) -> CommandError {
    CommandError::UnsupportedArgument {
        command: command.to_string(),
        arg: arg.to_string(),
    }
}

fn parse_toggle(command: &str, toggle: Toggle, arg: &str) -> Result<SpecialCommand, CommandError> {
    match arg.to_lowercase().as_str() {
        "" => Err(missing(command, &format!("{} <on|off>", command))),
        "on" | "enable" => Ok(SpecialCommand::Toggle(toggle, true)),
        "off" | "disable" => Ok(SpecialCommand::Toggle(toggle, false)),
        other => Err(unsupported(command, other)),
    }
}

/// Parse a user input string into a special command
///
/// # Arguments
///
/// * `input` - The user input string to parse
///
/// # Returns
///
/// Returns Ok(SpecialCommand) for valid commands or SpecialCommand::None for
/// ordinary messages.
///
/// # Errors
///
/// Returns CommandError::UnknownCommand if input starts with "/" but is not a valid command.
/// Returns CommandError::UnsupportedArgument if a command receives an invalid argument.
/// Returns CommandError::MissingArgument if a command requires an argument but none was provided.
///
/// # Examples
///
/// ```
/// use bella::commands::special_commands::{parse_special_command, SpecialCommand};
/// use bella::chat_mode::ChatMode;
///
/// let cmd = parse_special_command("/mode creative").unwrap();
/// assert_eq!(cmd, SpecialCommand::SwitchMode(ChatMode::Creative));
///
/// let cmd = parse_special_command("hello Bella").unwrap();
/// assert_eq!(cmd, SpecialCommand::None);
///
/// assert!(parse_special_command("/foo").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if lower == "exit" || lower == "quit" {
        return Ok(SpecialCommand::Exit);
    }
    if !trimmed.starts_with('/') {
        return Ok(SpecialCommand::None);
    }

    let (word, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((word, rest)) => (word.to_lowercase(), rest.trim()),
        None => (lower.clone(), ""),
    };

    match word.as_str() {
        "/mode" => {
            if rest.is_empty() {
                return Err(missing("/mode", "/mode <casual|assistant|creative>"));
            }
            ChatMode::from_str(rest)
                .map(SpecialCommand::SwitchMode)
                .map_err(|_| unsupported("/mode", rest))
        }
        "/casual" => Ok(SpecialCommand::SwitchMode(ChatMode::Casual)),
        "/assistant" => Ok(SpecialCommand::SwitchMode(ChatMode::Assistant)),
        "/creative" => Ok(SpecialCommand::SwitchMode(ChatMode::Creative)),

        "/provider" => {
            if rest.is_empty() {
                Err(missing("/provider", "/provider <id>"))
            } else {
                Ok(SpecialCommand::SwitchProvider(rest.to_lowercase()))
            }
        }
        "/providers" => Ok(SpecialCommand::ListProviders),

        "/key" => match rest.split_once(char::is_whitespace) {
            Some((provider, secret)) if !secret.trim().is_empty() => Ok(SpecialCommand::SetKey {
                provider: provider.to_lowercase(),
                secret: secret.trim().to_string(),
            }),
            _ => Err(missing("/key", "/key <provider> <api-key>")),
        },

        "/clear" => Ok(SpecialCommand::ClearHistory),
        "/history" => Ok(SpecialCommand::ShowHistory),
        "/status" => Ok(SpecialCommand::ShowStatus),

        "/name" => {
            if rest.is_empty() {
                Err(missing("/name", "/name <your name>"))
            } else {
                Ok(SpecialCommand::SetName(rest.to_string()))
            }
        }
        "/theme" => {
            if rest.is_empty() {
                Err(missing(
                    "/theme",
                    "/theme <romantic|caring|playful|supportive|default>",
                ))
            } else {
                Ok(SpecialCommand::SetTheme(rest.to_lowercase()))
            }
        }
        "/suggest" => Ok(SpecialCommand::Suggest),

        "/voice" => parse_toggle("/voice", Toggle::Voice, rest),
        "/proactive" => parse_toggle("/proactive", Toggle::Proactive, rest),
        "/notifications" => parse_toggle("/notifications", Toggle::Notifications, rest),
        "/listen" => Ok(SpecialCommand::Listen),

        "/help" | "/?" => Ok(SpecialCommand::Help),
        "/exit" | "/quit" => Ok(SpecialCommand::Exit),

        other => Err(CommandError::UnknownCommand(other.to_string())),
    }
}

/// Display help text for special commands
pub fn print_help() {
    println!(
        r#"
Special Commands for Interactive Chat
=====================================

CHAT MODE:
  /mode <name>      - Switch to casual, assistant or creative mode
  /casual           - Shorthand for /mode casual
  /assistant        - Shorthand for /mode assistant
  /creative         - Shorthand for /mode creative

PROVIDERS:
  /providers        - List providers and whether they have a key
  /provider <id>    - Switch provider (openai, claude, gemini, ...)
  /key <id> <key>   - Use an API key for this run

COMPANION:
  /name <name>      - Tell Bella what to call you
  /theme <theme>    - romantic, caring, playful, supportive or default
  /suggest          - Suggest replies to the last message

FEATURES:
  /voice on|off          - Speak replies aloud
  /proactive on|off      - Allow messages after a period of inactivity
  /notifications on|off  - Allow notifications
  /listen                - Speak your next message

SESSION:
  /status           - Show provider, mode, mood and relationship level
  /history          - Show the conversation
  /clear            - Forget the conversation
  /help             - Show this help message
  exit              - Exit interactive mode
  quit              - Same as exit

NOTES:
  - Command names are case-insensitive
  - Regular text (not starting with /) is sent to Bella
"#
    );
}
