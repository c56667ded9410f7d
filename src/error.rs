//! Error types for bay generation and cut-length computation.

use crate::formula::FormulaError;
use crate::store::EntityKind;
use crate::types::RecordId;
use thiserror::Error;

/// Storage-related errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{kind} record not found: {id}")]
    NotFound { kind: EntityKind, id: RecordId },

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Failed to (de)serialize {kind} record: {message}")]
    Serialization { kind: EntityKind, message: String },

    #[error("Invalid page token: {0}")]
    InvalidPageToken(String),
}

/// Errors surfaced by the generation and length passes
#[derive(Debug, Error)]
pub enum ChassisError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    #[error("Formula error: {0}")]
    Formula(#[from] FormulaError),

    #[error("Regeneration cancelled by user")]
    Cancelled,

    #[error("Confirmation prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),
}

impl From<config::ConfigError> for ChassisError {
    fn from(err: config::ConfigError) -> Self {
        ChassisError::ConfigError(err.to_string())
    }
}
