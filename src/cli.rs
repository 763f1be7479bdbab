//! Command-line interface definition for Bella
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for interactive chat, one-shot questions, provider
//! listing, and preference management.

use clap::{Parser, Subcommand};

/// Bella - conversational companion in your terminal
///
/// Chat with Bella through any of the supported chat-completion
/// providers. Preferences and relationship progress persist between runs.
#[derive(Parser, Debug, Clone)]
#[command(name = "bella")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the preference database location
    #[arg(long, env = "BELLA_STORE_DB")]
    pub storage_path: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Bella
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive chat session
    Chat {
        /// Override the provider from config (openai, claude, gemini, ...)
        #[arg(short, long)]
        provider: Option<String>,

        /// Chat mode: casual, assistant or creative
        #[arg(short, long)]
        mode: Option<String>,
    },

    /// Send a single message and print the reply
    Ask {
        /// Message text
        #[arg(required = true)]
        text: Vec<String>,

        /// Override the provider from config
        #[arg(short, long)]
        provider: Option<String>,

        /// Chat mode: casual, assistant or creative
        #[arg(short, long)]
        mode: Option<String>,
    },

    /// List providers and whether each one has a usable API key
    Providers,

    /// Inspect or reset stored preferences
    Prefs {
        /// Preference subcommand
        #[command(subcommand)]
        command: PrefsCommand,
    },
}

/// Preference management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum PrefsCommand {
    /// Show stored preferences, relationship level and settings
    Show {
        /// Print as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Delete all stored preferences
    Reset,
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            storage_path: None,
            command: Commands::Providers,
        }
    }
}
