//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service.

use crate::config::ConfigError;
use studium_core::ports::{ExtractionError, GenerationError, StoreError};

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents a failure of the document extraction pipeline.
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Represents a failure of the document registry.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Represents the terminal failure of the generation path.
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}
