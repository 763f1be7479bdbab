//! Test utilities for Bella
//!
//! Shared builders for in-memory stores, dispatchers and configuration
//! used across the unit tests.

use crate::chat::{ConversationHistory, Dispatcher};
use crate::config::Config;
use crate::preferences::PreferenceStore;
use crate::providers::{ProviderRegistry, SamplingParams};
use crate::storage::MemoryStore;
use std::sync::Arc;
use std::time::Duration;

/// Create a preference store backed by memory
pub fn memory_preferences() -> PreferenceStore {
    PreferenceStore::new(Arc::new(MemoryStore::new()))
}

/// Create a dispatcher over the built-in providers without any keys
///
/// # Panics
///
/// Panics if the HTTP client cannot be built
pub fn test_dispatcher(provider: &str) -> Dispatcher {
    Dispatcher::new(
        ProviderRegistry::with_defaults(),
        ConversationHistory::new(15),
        provider,
        SamplingParams::default(),
        Duration::from_secs(5),
    )
    .expect("Failed to build dispatcher")
}

/// Assert that an error's display text contains the expected message
///
/// # Panics
///
/// Panics if the result is Ok or if the error doesn't contain the expected message
pub fn assert_error_contains<T>(result: crate::error::Result<T>, expected: &str) {
    match result {
        Ok(_) => panic!("Expected error containing '{}' but got Ok", expected),
        Err(e) => {
            let error_msg = format!("{:#}", e);
            assert!(
                error_msg.contains(expected),
                "Error message '{}' does not contain '{}'",
                error_msg,
                expected
            );
        }
    }
}

/// Create a test configuration with default values
pub fn test_config() -> Config {
    Config::default()
}

/// Create a test configuration YAML string
pub fn test_config_yaml() -> String {
    r#"
api:
  provider: claude
  timeout_seconds: 30
  sampling:
    temperature: 0.7
    top_p: 0.9
    max_tokens: 150
  providers:
    claude:
      model: claude-3-5-sonnet-latest
      api_key: sk-ant-test
    gemini:
      endpoint: http://localhost:9000/gemini

chat:
  max_history_length: 10
  default_mode: creative
  persona_name: Bella

proactive:
  enabled: true
  idle_threshold_seconds: 120
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_yaml_parses_and_validates() {
        let config: Config = serde_yaml::from_str(&test_config_yaml()).unwrap();
        assert_eq!(config.api.provider, "claude");
        assert_eq!(config.chat.max_history_length, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_assert_error_contains() {
        let result: crate::error::Result<()> =
            Err(crate::error::BellaError::Config("invalid".to_string()).into());
        assert_error_contains(result, "invalid");
    }

    #[test]
    fn test_test_config_is_valid() {
        assert!(test_config().validate().is_ok());
        assert!(!test_dispatcher("openai").is_configured());
        assert!(memory_preferences().entries().unwrap().is_empty());
    }
}
