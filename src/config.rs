//! Configuration System
//!
//! Layered configuration for generation tolerances, store batching and
//! logging. Sources are merged in order: built-in defaults, the global user
//! file, the workspace files, then `BAYCUT__` environment variables.

use crate::error::ChassisError;
use crate::geometry::FrameContext;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BaycutConfig {
    /// Geometry and cut-length tolerances
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Record store settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Tolerances used by the generation passes and the cut-length engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Linear tolerance for coordinate matching (length units)
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// Window for matching a mullion start against the passage-height transom
    #[serde(default = "default_passage_match_tolerance")]
    pub passage_match_tolerance: f64,

    /// Window for matching a top-transom segment against the passage span
    #[serde(default = "default_passage_span_tolerance")]
    pub passage_span_tolerance: f64,
}

fn default_tolerance() -> f64 {
    FrameContext::DEFAULT_TOLERANCE
}

fn default_passage_match_tolerance() -> f64 {
    5.0
}

fn default_passage_span_tolerance() -> f64 {
    1.0
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
            passage_match_tolerance: default_passage_match_tolerance(),
            passage_span_tolerance: default_passage_span_tolerance(),
        }
    }
}

/// Record store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Concurrent writes per chunk
    #[serde(default = "default_write_chunk_size")]
    pub write_chunk_size: usize,

    /// Records per query page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Sled database directory
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

fn default_write_chunk_size() -> usize {
    20
}

fn default_page_size() -> usize {
    5000
}

fn default_store_path() -> PathBuf {
    PathBuf::from(".baycut/store")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            write_chunk_size: default_write_chunk_size(),
            page_size: default_page_size(),
            path: default_store_path(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    Generation(String),
    Store(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Generation(msg) => write!(f, "Generation: {}", msg),
            ValidationError::Store(msg) => write!(f, "Store: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl GenerationConfig {
    pub fn validate(&self) -> Result<(), String> {
        let windows = [
            ("tolerance", self.tolerance),
            ("passage_match_tolerance", self.passage_match_tolerance),
            ("passage_span_tolerance", self.passage_span_tolerance),
        ];
        for (name, value) in windows {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{} must be a non-negative number", name));
            }
        }
        Ok(())
    }
}

impl StoreConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.write_chunk_size == 0 {
            return Err("write_chunk_size must be at least 1".to_string());
        }
        if self.page_size == 0 {
            return Err("page_size must be at least 1".to_string());
        }
        if self.path.as_os_str().is_empty() {
            return Err("Store path cannot be empty".to_string());
        }
        Ok(())
    }
}

impl BaycutConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.generation.validate() {
            errors.push(ValidationError::Generation(e));
        }
        if let Err(e) = self.store.validate() {
            errors.push(ValidationError::Store(e));
        }
        if !matches!(self.logging.format.as_str(), "json" | "text") {
            errors.push(ValidationError::Logging(format!(
                "Invalid log format: {}",
                self.logging.format
            )));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate, folding every problem into one configuration error.
    pub fn validated(self) -> Result<Self, ChassisError> {
        self.validate().map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ChassisError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                messages.join("\n")
            ))
        })?;
        Ok(self)
    }
}
