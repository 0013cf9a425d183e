//! Unified error handling for the rasp crate
//!
//! This module provides a unified error type that consolidates the
//! domain-specific errors into a single `Error` enum.
//!
//! # Architecture
//!
//! - [`RaspErrorTrait`] - Common interface implemented by the error types
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors
//!
//! Only [`Error::InvalidTarget`] and storage failures reach callers of the
//! refresh pipeline. Fetch failures and missing page structure are
//! reported through logs and degrade to an empty schedule.

use thiserror::Error;

pub use crate::utils::error::{FetchError, GridStage, StorageError, StructureMissing};

/// Common trait for rasp error types
pub trait RaspErrorTrait: std::error::Error {
    /// Check if this error is recoverable (can be retried by the caller)
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Network-related errors (HTTP client, timeout)
    Network,
    /// Storage and I/O errors
    Storage,
    /// Configuration errors
    Config,
    /// Rejected input (bad URL, missing subject id)
    Validation,
}

impl ErrorCategory {
    /// Short human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "network error",
            Self::Storage => "storage error",
            Self::Config => "configuration error",
            Self::Validation => "validation error",
        }
    }

    /// Whether the caller supplied the bad input
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation)
    }
}

/// Unified error type for the rasp crate
#[derive(Error, Debug)]
pub enum Error {
    /// Target URL or host was rejected before any network call
    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    /// Fetch-specific errors
    #[error("Fetch error: {0}")]
    Fetch(FetchError),

    /// Storage failures
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),
}

impl From<FetchError> for Error {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::InvalidTarget(msg) => Self::InvalidTarget(msg),
            other => Self::Fetch(other),
        }
    }
}

impl RaspErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::InvalidTarget(_) => false,
            Self::Fetch(e) => e.is_recoverable(),
            Self::Storage(_) => true, // disk full or permissions may be fixed
            Self::Config(_) => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidTarget(_) => ErrorCategory::Validation,
            Self::Fetch(_) => ErrorCategory::Network,
            Self::Storage(_) => ErrorCategory::Storage,
            Self::Config(_) => ErrorCategory::Config,
        }
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
