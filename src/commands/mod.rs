/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes four top-level command modules:

- `chat`      - Interactive chat session
- `ask`       - Send one message and print the reply
- `providers` - List providers and their key status
- `prefs`     - Inspect or reset stored preferences
*/

use crate::chat::{ChatSession, Dispatcher};
use crate::config::Config;
use crate::error::{BellaError, Result};
use crate::preferences::PreferenceStore;
use crate::storage::SqliteStore;
use std::sync::Arc;

// Special commands parser for the interactive chat
pub mod special_commands;

/// Opens the preference store, honoring a path override
///
/// # Errors
///
/// Returns error if the database cannot be created
pub fn open_preferences(storage_path: Option<&str>) -> Result<PreferenceStore> {
    let store = match storage_path {
        Some(path) => SqliteStore::new_with_path(path)?,
        None => SqliteStore::new()?,
    };
    tracing::debug!("Using preference store at {}", store.path().display());
    Ok(PreferenceStore::new(Arc::new(store)))
}

/// Builds a session from configuration and applies explicit overrides
///
/// Overrides given on the command line win over the stored provider and
/// mode, which in turn win over the configuration defaults.
pub fn build_session(
    config: &Config,
    preferences: PreferenceStore,
    provider: Option<&str>,
    mode: Option<&str>,
) -> Result<ChatSession> {
    let dispatcher = Dispatcher::from_config(config)?;
    let mut session = ChatSession::new(dispatcher, preferences, &config.chat)
        .with_voice_config(&config.voice)
        .with_proactive_config(&config.proactive);

    if let Some(provider) = provider {
        session.set_provider(provider)?;
    }
    if let Some(mode) = mode {
        session.set_mode_str(mode)?;
    }
    Ok(session)
}

// Chat command handler
pub mod chat {
    //! Interactive chat session handler.
    //!
    //! Builds a session, starts the proactive scheduler and runs a
    //! readline loop. Lines starting with `/` are special commands; all
    //! other input is sent to the active provider.

    use super::*;
    use crate::chat_mode::ChatModeState;
    use crate::commands::special_commands::{
        parse_special_command, print_help, SpecialCommand, Toggle,
    };
    use crate::features::{
        NoopNotifier, NoopRecognizer, Notifier, ProactiveScheduler, SpeechRecognizer,
        TerminalNotifier,
    };
    use crate::providers::Role;
    use colored::Colorize;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;

    /// Start interactive chat mode
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration
    /// * `preferences` - Persisted preferences
    /// * `provider_name` - Optional override for the provider
    /// * `mode` - Optional override for the chat mode
    ///
    /// # Errors
    ///
    /// Returns error if the session cannot be built or the terminal fails
    pub async fn run_chat(
        config: Config,
        preferences: PreferenceStore,
        provider_name: Option<String>,
        mode: Option<String>,
    ) -> Result<()> {
        tracing::info!("Starting interactive chat mode");

        let mut session = build_session(
            &config,
            preferences,
            provider_name.as_deref(),
            mode.as_deref(),
        )?;
        let recognizer = NoopRecognizer;

        let notifier: Arc<dyn Notifier> = if config.notifications.enabled {
            Arc::new(TerminalNotifier)
        } else {
            Arc::new(NoopNotifier)
        };
        let mut scheduler = ProactiveScheduler::new(
            &config.proactive,
            config.chat.persona_name.clone(),
            session.activity(),
            notifier,
        );
        sync_scheduler(&scheduler, &session);
        scheduler.start();

        let mut mode_state = ChatModeState::new(session.mode(), session.current_provider());
        let mut rl = DefaultEditor::new()?;

        print_welcome_banner(&session, &config.chat.persona_name);

        loop {
            // Waiting at the prompt counts as being in the background
            session.activity().set_hidden(true);
            let line = match rl.readline(&mode_state.format_colored_prompt()) {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) => {
                    println!("Interrupted. Type 'exit' to quit.");
                    continue;
                }
                Err(ReadlineError::Eof) => break,
                Err(e) => {
                    tracing::error!("Readline error: {}", e);
                    break;
                }
            };
            session.activity().set_hidden(false);
            session.activity().touch();

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            rl.add_history_entry(trimmed)?;

            let command = match parse_special_command(trimmed) {
                Ok(command) => command,
                Err(e) => {
                    eprintln!("{}", e.to_string().red());
                    continue;
                }
            };

            let message = match command {
                SpecialCommand::None => trimmed.to_string(),
                SpecialCommand::Exit => break,
                SpecialCommand::Listen => match recognizer.listen().await {
                    Some(transcript) => {
                        println!("{} {}", "You said:".dimmed(), transcript);
                        transcript
                    }
                    None => {
                        println!("{}", "Speech recognition is not available.".yellow());
                        continue;
                    }
                },
                other => {
                    if let Err(e) =
                        handle_command(other, &mut session, &mut mode_state, &scheduler)
                    {
                        eprintln!("{}", format!("Error: {}", e).red());
                    }
                    continue;
                }
            };

            let reply = session.respond(&message).await;
            println!(
                "\n{} {}\n",
                format!("{}:", config.chat.persona_name).magenta().bold(),
                reply
            );
        }

        scheduler.stop();
        println!("Goodbye!");
        Ok(())
    }

    /// Proactive messages need both proactive mode and notifications
    fn sync_scheduler(scheduler: &ProactiveScheduler, session: &ChatSession) {
        let settings = session.settings();
        scheduler.set_enabled(settings.proactive_enabled && settings.notifications_enabled);
    }

    fn handle_command(
        command: SpecialCommand,
        session: &mut ChatSession,
        mode_state: &mut ChatModeState,
        scheduler: &ProactiveScheduler,
    ) -> Result<()> {
        match command {
            SpecialCommand::SwitchMode(mode) => {
                session.set_mode(mode)?;
                let old = mode_state.switch_mode(mode);
                println!("Switched from {} to {} mode\n", old, mode);
            }
            SpecialCommand::SwitchProvider(id) => {
                session.set_provider(&id)?;
                let old = mode_state.switch_provider(id.as_str());
                println!("Switched from {} to {}\n", old, id);
                if !session.system_info().is_configured {
                    println!(
                        "{}",
                        format!("No API key for {}. Use /key {} <api-key>.", id, id).yellow()
                    );
                }
            }
            SpecialCommand::ListProviders => {
                super::providers::print_providers_table(&session.available_providers());
            }
            SpecialCommand::SetKey { provider, secret } => {
                session.set_credential(&provider, &secret)?;
                println!("API key set for {} (this run only)\n", provider);
            }
            SpecialCommand::ClearHistory => {
                session.clear_history();
                println!("Conversation cleared\n");
            }
            SpecialCommand::ShowHistory => print_history(session),
            SpecialCommand::ShowStatus => print_status_display(session, mode_state),
            SpecialCommand::SetName(name) => {
                session.set_user_name(&name)?;
                println!("Nice to meet you, {}!\n", name);
            }
            SpecialCommand::SetTheme(theme) => {
                let state = session.set_emotional_theme(&theme);
                println!("Mood is now {} ({})\n", state, state.describe());
            }
            SpecialCommand::Suggest => {
                let suggestions = session.suggestions();
                if suggestions.is_empty() {
                    println!("No suggestions yet\n");
                } else {
                    for (i, suggestion) in suggestions.iter().enumerate() {
                        println!("  {}. {}", i + 1, suggestion);
                    }
                    println!();
                }
            }
            SpecialCommand::Toggle(toggle, on) => {
                let state = if on { "on" } else { "off" };
                match toggle {
                    Toggle::Voice => session.set_voice_enabled(on)?,
                    Toggle::Proactive => session.set_proactive_enabled(on)?,
                    Toggle::Notifications => session.set_notifications_enabled(on)?,
                }
                sync_scheduler(scheduler, session);
                println!("{:?} turned {}\n", toggle, state);
            }
            SpecialCommand::Help => print_help(),
            SpecialCommand::Listen | SpecialCommand::Exit | SpecialCommand::None => {}
        }
        Ok(())
    }

    fn print_welcome_banner(session: &ChatSession, persona_name: &str) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!(
            "║{:^62}║",
            format!("{} - Interactive Chat", persona_name)
        );
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        let mode = session.mode();
        println!("Mode:     {} ({})", mode.colored_tag(), mode.description());
        println!("Provider: {}", session.current_provider().blue());
        if !session.system_info().is_configured {
            println!(
                "{}",
                "No API key configured for this provider. Use /key <provider> <api-key>.".yellow()
            );
        }
        println!("\nType '/help' for available commands, 'exit' to quit\n");
    }

    fn print_status_display(session: &ChatSession, mode_state: &ChatModeState) {
        let info = session.system_info();
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                        Session Status                        ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!(
            "Chat Mode:         {} ({})",
            info.mode.colored_tag(),
            info.mode.description()
        );
        println!(
            "Provider:          {} ({})",
            info.provider,
            if info.is_configured {
                "configured".green()
            } else {
                "no API key".red()
            }
        );
        println!(
            "Mood:              {} ({})",
            info.emotional_state,
            info.emotional_state.describe()
        );
        println!("Last Message Tone: {}", info.last_user_emotion);
        println!(
            "Relationship:      {}/10, {}",
            info.relationship_level,
            session.relationship().context()
        );
        println!("Conversation Size: {} messages", info.history_length);
        println!(
            "Voice:             {} ({})",
            on_off(info.voice_enabled),
            info.voice.as_deref().unwrap_or("host default")
        );
        println!("Proactive:         {}", on_off(info.proactive_enabled));
        println!("Prompt Format:     {}", mode_state.format_colored_prompt());
        println!();
    }

    fn on_off(value: bool) -> &'static str {
        if value {
            "on"
        } else {
            "off"
        }
    }

    fn print_history(session: &ChatSession) {
        if session.history().is_empty() {
            println!("No messages yet\n");
            return;
        }
        for message in session.history() {
            let who = match message.role {
                Role::User => "You".cyan(),
                Role::Assistant => "Bella".magenta(),
                Role::System => "System".dimmed(),
            };
            println!(
                "[{}] {}: {}",
                message.timestamp.format("%H:%M:%S"),
                who,
                message.content
            );
        }
        println!();
    }
}

// One-shot question handler
pub mod ask {
    //! Sends one message through a full session and prints the reply.

    use super::*;

    /// Send a single message and print the reply
    ///
    /// Unlike the interactive chat, a failed request is reported as an
    /// error instead of a fallback line.
    ///
    /// # Errors
    ///
    /// Returns error if the session cannot be built or the request fails
    pub async fn run_ask(
        config: Config,
        preferences: PreferenceStore,
        text: &str,
        provider: Option<String>,
        mode: Option<String>,
    ) -> Result<()> {
        let mut session = build_session(&config, preferences, provider.as_deref(), mode.as_deref())?;
        let reply = session.try_respond(text).await?;
        println!("{}", reply);
        Ok(())
    }
}

// Provider listing handler
pub mod providers {
    //! Lists registered providers.

    use super::*;
    use crate::providers::{ProviderRegistry, ProviderSummary};
    use colored::Colorize;
    use prettytable::{row, Table};

    /// Print every provider with its model and key status
    ///
    /// # Errors
    ///
    /// Returns error if a provider override in the configuration is unknown
    pub fn list_providers(config: &Config) -> Result<()> {
        let registry = ProviderRegistry::from_config(&config.api)?;
        print_providers_table(&registry.available());
        println!("Default provider: {}\n", config.api.provider.blue());
        Ok(())
    }

    /// Render provider summaries as a table
    pub fn print_providers_table(providers: &[ProviderSummary]) {
        let mut table = Table::new();
        table.add_row(row!["ID", "Name", "Model", "API Key"]);
        for provider in providers {
            let key = if provider.configured {
                "configured".green()
            } else {
                "missing".red()
            };
            table.add_row(row![provider.id, provider.name, provider.model, key]);
        }
        println!();
        table.printstd();
        println!();
    }
}

// Preference management handler
pub mod prefs {
    //! Shows or deletes stored preferences.

    use super::*;
    use prettytable::{row, Table};
    use serde_json::json;

    /// Print stored preferences
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be read or JSON output fails
    pub fn show(preferences: &PreferenceStore, as_json: bool) -> Result<()> {
        let user = preferences.load_preferences();
        let relationship = preferences.load_relationship();
        let chat = preferences.load_chat_settings();
        let advanced = preferences.load_advanced_settings();

        if as_json {
            let value = json!({
                "preferences": user,
                "relationship": relationship,
                "chatSettings": chat,
                "advancedSettings": advanced,
            });
            let text = serde_json::to_string_pretty(&value).map_err(BellaError::Serialization)?;
            println!("{}", text);
            return Ok(());
        }

        let mut table = Table::new();
        table.add_row(row!["Setting", "Value"]);
        table.add_row(row!["Name", user.name.as_deref().unwrap_or("-")]);
        table.add_row(row![
            "Interests",
            user.interests.iter().cloned().collect::<Vec<_>>().join(", ")
        ]);
        table.add_row(row!["Conversation style", user.conversation_style]);
        table.add_row(row!["Time zone", user.timezone]);
        table.add_row(row![
            "Relationship",
            format!("{}/10 ({} points)", relationship.level, relationship.points)
        ]);
        if let Some(chat) = chat {
            table.add_row(row!["Provider", chat.provider]);
            table.add_row(row!["Mode", chat.mode]);
        }
        table.add_row(row!["Voice", advanced.voice_enabled]);
        table.add_row(row!["Notifications", advanced.notifications_enabled]);
        table.add_row(row!["Proactive", advanced.proactive_enabled]);

        println!();
        table.printstd();
        let entries = preferences.entries()?;
        if let Some(latest) = entries.iter().map(|e| e.updated_at).max() {
            println!("\nLast updated: {}", latest.format("%Y-%m-%d %H:%M:%S UTC"));
        }
        println!();
        Ok(())
    }

    /// Delete every stored preference
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be written
    pub fn reset(preferences: &PreferenceStore) -> Result<()> {
        preferences.reset()?;
        println!("Preferences reset");
        Ok(())
    }
}
