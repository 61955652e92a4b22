//! Error types for the insights relay.

use std::time::Duration;
use thiserror::Error;

/// Missing or invalid settings. Fatal to the subsystem being activated, never to the host.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("instrumentation key missing (section `{section}`, env APPINSIGHTS_INSTRUMENTATIONKEY)")]
    MissingKey { section: String },

    #[error("invalid schedule expression `{expr}`: {reason}")]
    InvalidSchedule { expr: String, reason: String },

    #[error("invalid probe target `{name}`: {reason}")]
    InvalidTarget { name: String, reason: String },

    #[error("duplicate probe target name `{0}`")]
    DuplicateTarget(String),

    #[error("schedule `{0}` is already registered")]
    DuplicateSchedule(String),

    #[error("subscriber `{0}` is already registered")]
    DuplicateSubscription(String),

    #[error("invalid value for `{key}`: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

/// Transport-level failure of a single probe. Recorded, never propagated.
#[derive(Debug, Error)]
pub enum ProbeTransportError {
    #[error("request timed out after {timeout:?}: {source}")]
    Timeout {
        timeout: Duration,
        #[source]
        source: reqwest::Error,
    },

    #[error("connection failed: {0}")]
    Connect(#[source] reqwest::Error),

    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("unexpected status {0}")]
    UnexpectedStatus(u16),
}

impl ProbeTransportError {
    pub fn from_reqwest(error: reqwest::Error, timeout: Duration) -> Self {
        if error.is_timeout() {
            ProbeTransportError::Timeout {
                timeout,
                source: error,
            }
        } else if error.is_connect() {
            ProbeTransportError::Connect(error)
        } else {
            ProbeTransportError::Request(error)
        }
    }
}

/// Top-level error returned by activation and host entry points.
#[derive(Debug, Error)]
pub enum InsightsError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("HTTP client error: {0}")]
    Http(String),

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("Logging error: {0}")]
    Logging(String),
}

impl From<config::ConfigError> for InsightsError {
    fn from(err: config::ConfigError) -> Self {
        InsightsError::Configuration(ConfigurationError::Load(err))
    }
}

impl InsightsError {
    /// True when the error is a missing instrumentation key.
    pub fn is_missing_key(&self) -> bool {
        matches!(
            self,
            InsightsError::Configuration(ConfigurationError::MissingKey { .. })
        )
    }
}
