//! Integration tests for configuration loading

mod common;

use serial_test::serial;

use bella::cli::{Cli, Commands};
use bella::config::Config;

use common::temp_config_file;

const SAMPLE: &str = r#"
api:
  provider: gemini
  timeout_seconds: 20
  sampling:
    max_tokens: 120
  providers:
    gemini:
      model: gemini-1.5-pro-latest
      api_key: AIza-file

chat:
  max_history_length: 8
  default_mode: assistant
  language: Italian

voice:
  enabled: true
  language: it-IT
"#;

fn cli_for(path: &str, command: Commands) -> Cli {
    Cli {
        config: Some(path.to_string()),
        command,
        ..Cli::default()
    }
}

#[test]
#[serial]
fn test_load_from_yaml_file() {
    let (_dir, path) = temp_config_file(SAMPLE);
    let path = path.to_string_lossy().to_string();
    let config = Config::load(&path, &cli_for(&path, Commands::Providers)).unwrap();

    assert_eq!(config.api.provider, "gemini");
    assert_eq!(config.api.timeout_seconds, 20);
    assert_eq!(config.api.sampling.max_tokens, 120);
    assert_eq!(config.api.sampling.top_p, 0.9);
    assert_eq!(config.chat.max_history_length, 8);
    assert_eq!(config.chat.language, "Italian");
    assert!(config.voice.enabled);
    assert_eq!(
        config.api.providers["gemini"].api_key.as_deref(),
        Some("AIza-file")
    );
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn test_missing_file_uses_defaults() {
    let config = Config::load(
        "/nonexistent/bella/config.yaml",
        &cli_for("/nonexistent/bella/config.yaml", Commands::Providers),
    )
    .unwrap();
    assert_eq!(config.api.provider, "openai");
    assert_eq!(config.chat.max_history_length, 15);
}

#[test]
#[serial]
fn test_env_and_cli_precedence() {
    let (_dir, path) = temp_config_file(SAMPLE);
    let path = path.to_string_lossy().to_string();

    std::env::set_var("BELLA_PROVIDER", "groq");
    std::env::set_var("BELLA_GROQ_API_KEY", "gsk-env");
    let from_env = Config::load(&path, &cli_for(&path, Commands::Providers));

    let from_cli = Config::load(
        &path,
        &cli_for(
            &path,
            Commands::Chat {
                provider: Some("claude".to_string()),
                mode: Some("creative".to_string()),
            },
        ),
    );
    std::env::remove_var("BELLA_PROVIDER");
    std::env::remove_var("BELLA_GROQ_API_KEY");

    let from_env = from_env.unwrap();
    assert_eq!(from_env.api.provider, "groq");
    assert_eq!(
        from_env.api.providers["groq"].api_key.as_deref(),
        Some("gsk-env")
    );

    let from_cli = from_cli.unwrap();
    assert_eq!(from_cli.api.provider, "claude");
    assert_eq!(from_cli.chat.default_mode, "creative");
}

#[test]
#[serial]
fn test_invalid_file_is_config_error() {
    let (_dir, path) = temp_config_file("api: [unclosed");
    let path = path.to_string_lossy().to_string();
    let err = Config::load(&path, &cli_for(&path, Commands::Providers)).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config"));
}

#[test]
#[serial]
fn test_validation_rejects_bad_values() {
    let (_dir, path) = temp_config_file("chat:\n  max_history_length: 0\n");
    let path = path.to_string_lossy().to_string();
    let config = Config::load(&path, &cli_for(&path, Commands::Providers)).unwrap();
    assert!(config.validate().is_err());

    let (_dir, path) = temp_config_file(
        "api:\n  providers:\n    openai:\n      endpoint: ftp://example.com\n",
    );
    let path = path.to_string_lossy().to_string();
    let config = Config::load(&path, &cli_for(&path, Commands::Providers)).unwrap();
    assert!(config.validate().is_err());
}
