//! Bella - conversational companion CLI
//!
#![doc = "Main entry point for the Bella terminal companion."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use bella::cli::{Cli, Commands, PrefsCommand};
use bella::commands;
use bella::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    if let Some(db_path) = &cli.storage_path {
        tracing::info!("Using preference store override: {}", db_path);
    }

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    let preferences = commands::open_preferences(cli.storage_path.as_deref())?;

    // Execute command
    match cli.command {
        Commands::Chat { provider, mode } => {
            if let Some(p) = &provider {
                tracing::debug!("Using provider override: {}", p);
            }
            if let Some(m) = &mode {
                tracing::debug!("Using mode override: {}", m);
            }
            commands::chat::run_chat(config, preferences, provider, mode).await?;
            Ok(())
        }
        Commands::Ask {
            text,
            provider,
            mode,
        } => {
            let text = text.join(" ");
            tracing::info!("Sending one message ({} chars)", text.chars().count());
            commands::ask::run_ask(config, preferences, &text, provider, mode).await?;
            Ok(())
        }
        Commands::Providers => {
            commands::providers::list_providers(&config)?;
            Ok(())
        }
        Commands::Prefs { command } => match command {
            PrefsCommand::Show { json } => commands::prefs::show(&preferences, json),
            PrefsCommand::Reset => commands::prefs::reset(&preferences),
        },
    }
}

/// Initialize tracing subscriber with environment filter
///
/// `RUST_LOG` wins, then `BELLA_LOG`, then the verbosity flag.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "bella=debug" } else { "bella=info" };
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_from_env("BELLA_LOG"))
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
