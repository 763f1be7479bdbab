//! Bella - conversational companion library
//!
//! This library provides the pieces behind the `bella` terminal companion:
//! provider adapters for several chat-completion APIs, a dispatcher with a
//! bounded conversation history, persisted preferences, relationship
//! heuristics and optional speech, notification and proactive features.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `providers`: Provider trait, request builders and the registry
//! - `chat`: Conversation history, dispatcher and chat session
//! - `prompts`: Persona system prompt and chat mode framing
//! - `relationship`: Keyword heuristics, sentiment and reply suggestions
//! - `preferences` / `storage`: Persisted state over a key-value store
//! - `features`: Speech, notification and proactive ports
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli` / `commands`: Command-line interface and handlers
//!
//! # Example
//!
//! ```no_run
//! use bella::{ChatSession, Config, Dispatcher, PreferenceStore};
//! use bella::storage::MemoryStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let dispatcher = Dispatcher::from_config(&config)?;
//!     let preferences = PreferenceStore::new(Arc::new(MemoryStore::new()));
//!     let mut session = ChatSession::new(dispatcher, preferences, &config.chat);
//!     println!("{}", session.respond("Hi Bella!").await);
//!     Ok(())
//! }
//! ```

pub mod chat;
pub mod chat_mode;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod features;
pub mod preferences;
pub mod prompts;
pub mod providers;
pub mod relationship;
pub mod storage;

// Re-export commonly used types
pub use chat::{ChatSession, ConversationHistory, Dispatcher};
pub use chat_mode::ChatMode;
pub use config::Config;
pub use error::{BellaError, Result};
pub use preferences::PreferenceStore;
pub use providers::{Provider, ProviderRegistry};
pub use relationship::{EmotionalState, PolicyTable};

#[cfg(test)]
pub mod test_utils;
