//! Error types for the briefing pipeline.

use std::path::PathBuf;

/// Top-level error type for a briefing run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Seen-item store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to read seen-item store at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write seen-item store at {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Generation backend errors, classed for retry-vs-skip dispatch.
///
/// `Transient` means another attempt with the same credential may succeed
/// (overload, 5xx, timeout). `Permanent` means it will not (bad credential,
/// bad request, quota exhausted) and dispatch should advance to the next
/// credential in the pool.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("Backend overloaded or unavailable: {0}")]
    Transient(String),

    #[error("Request rejected by backend: {0}")]
    Permanent(String),
}

impl GenerateError {
    pub fn is_transient(&self) -> bool {
        matches!(self, GenerateError::Transient(_))
    }
}

/// Message delivery errors.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Send failed: {reason}")]
    SendFailed { reason: String },

    #[error("Sink rejected {formatting} payload: {reason}")]
    Rejected { formatting: String, reason: String },

    #[error("All {total} chunks failed to send")]
    AllChunksFailed { total: usize },
}

/// Run-level pipeline errors.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Seen-item store write failed: {0}")]
    Store(#[from] StoreError),

    #[error("Delivery failed: {0}")]
    Delivery(#[from] DeliveryError),
}

/// Result type alias for the pipeline.
pub type Result<T> = std::result::Result<T, Error>;
