//! Layered error definitions
//!
//! Categorized by source: config / dispatcher / registration / sink

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Dispatcher Errors =====
    /// Worker pool started with zero workers
    #[error("no workers configured for dispatcher")]
    NoWorkers,

    /// Job submitted after the dispatcher was stopped
    #[error("dispatcher stopped, write job for '{metric}' discarded")]
    DispatcherStopped { metric: String },

    // ===== Registration Errors =====
    /// One or more observable instruments failed registration checks
    #[error("{}", .errors.join("; "))]
    InvalidRegistration { errors: Vec<String> },

    /// A callback observed an instrument outside its registered set
    #[error("observable instrument not registered for callback: \"{name}\"")]
    UnregisteredObservation { name: String },

    // ===== Sink Errors =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Create unregistered-observation error
    pub fn unregistered_observation(name: impl Into<String>) -> Self {
        Self::UnregisteredObservation { name: name.into() }
    }
}
