//! Error types for Bella
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Classification of a non-success HTTP status returned by a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// 429 Too Many Requests
    RateLimited,
    /// 401 or 403, the credential was rejected
    Unauthorized,
    /// 402 Payment Required, the account has run out of credit
    QuotaExceeded,
    /// Any 5xx status
    Server,
    /// Everything else
    Generic,
}

impl ApiErrorKind {
    /// Classify an HTTP status code
    ///
    /// # Examples
    ///
    /// ```
    /// use bella::error::ApiErrorKind;
    ///
    /// assert_eq!(ApiErrorKind::from_status(429), ApiErrorKind::RateLimited);
    /// assert_eq!(ApiErrorKind::from_status(503), ApiErrorKind::Server);
    /// ```
    pub fn from_status(status: u16) -> Self {
        match status {
            429 => Self::RateLimited,
            401 | 403 => Self::Unauthorized,
            402 => Self::QuotaExceeded,
            500..=599 => Self::Server,
            _ => Self::Generic,
        }
    }

    /// Human-readable explanation shown in logs and diagnostics
    pub fn describe(&self) -> &'static str {
        match self {
            Self::RateLimited => "rate limit reached, try again in a few minutes",
            Self::Unauthorized => "API key rejected, check your credentials",
            Self::QuotaExceeded => "insufficient credit on the provider account",
            Self::Server => "provider server error",
            Self::Generic => "unexpected response status",
        }
    }
}

impl std::fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateLimited => write!(f, "rate-limited"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::QuotaExceeded => write!(f, "quota-exceeded"),
            Self::Server => write!(f, "server"),
            Self::Generic => write!(f, "generic"),
        }
    }
}

/// Main error type for Bella operations
///
/// Covers configuration loading, provider dispatch, response parsing
/// and preference storage.
#[derive(Error, Debug)]
pub enum BellaError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Provider identifier is not in the registry
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// Missing credentials for provider
    #[error("Missing credentials for provider: {0}")]
    MissingCredentials(String),

    /// Chat mode string did not match a known mode
    #[error("Unsupported chat mode: {0}")]
    UnsupportedMode(String),

    /// Provider answered with a non-success HTTP status
    #[error("{provider} API error ({kind}): HTTP {status}: {message}")]
    Api {
        /// Provider identifier
        provider: String,
        /// HTTP status code
        status: u16,
        /// Classification of the status
        kind: ApiErrorKind,
        /// Response body or status text
        message: String,
    },

    /// Response body did not have the expected envelope
    #[error("Malformed response from {provider}: {message}")]
    MalformedResponse {
        /// Provider identifier
        provider: String,
        /// What was missing or unparseable
        message: String,
    },

    /// The request never produced a response (DNS, connect, timeout)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Preference storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl BellaError {
    /// Returns the API error classification, if this is an API error
    pub fn api_kind(&self) -> Option<ApiErrorKind> {
        match self {
            Self::Api { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Result type alias for Bella operations
///
/// Uses `anyhow::Error` so callers can attach context; the concrete
/// `BellaError` can be recovered with `downcast_ref`.
pub type Result<T> = anyhow::Result<T>;
