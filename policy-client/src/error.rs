//! Error types for the policy administration client.
//!
//! Only configuration errors are meant to reach the process boundary.
//! Transport errors are produced by [`crate::transport::TransportClient`]
//! and absorbed by the repositories, which turn them into `false` or empty
//! results after logging.

use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while building [`crate::config::Settings`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No API credential was supplied.
    #[error(
        "POLICY_API_KEY is not set. Export it or add it to a .env file in the \
         current directory (POLICY_API_KEY=<your admin API key>)"
    )]
    MissingCredential,

    /// An environment variable could not be parsed.
    #[error("Invalid value for {name}: '{value}'")]
    InvalidValue { name: String, value: String },
}

/// Failure outcome of a single administrative call.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The call did not complete within the configured timeout and was aborted.
    #[error("{method} {endpoint} timed out after {timeout:?}")]
    Timeout {
        method: String,
        endpoint: String,
        timeout: Duration,
    },

    /// The request could not be sent or the response could not be read.
    #[error("{method} {endpoint} failed: {message}")]
    Network {
        method: String,
        endpoint: String,
        message: String,
    },

    /// The remote service answered with a non-2xx, non-409 status.
    #[error("Request rejected with status {status}")]
    Rejected { status: u16, data: Option<Value> },
}

impl TransportError {
    /// HTTP status, if the remote service answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Parsed response body attached to a rejection.
    pub fn data(&self) -> Option<&Value> {
        match self {
            TransportError::Rejected { data, .. } => data.as_ref(),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout { .. })
    }

    /// Short human readable reason, preferring the service's own message.
    pub fn reason(&self) -> String {
        if let Some(data) = self.data() {
            for field in ["message", "detail", "error"] {
                if let Some(msg) = data.get(field).and_then(Value::as_str) {
                    return format!("{} ({})", self, msg);
                }
            }
        }
        self.to_string()
    }
}

/// Errors raised while loading or validating a preset bundle.
#[derive(Debug, Error)]
pub enum PresetError {
    #[error("Failed to read preset file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse preset YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid preset: {0}")]
    Validation(String),
}
