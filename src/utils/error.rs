//! Error types for the schedule scraper
//!
//! This module defines the domain errors raised by the fetcher, the grid
//! extractor and the storage layer.

use thiserror::Error;

/// Errors that can occur while fetching a schedule page
#[derive(Error, Debug)]
pub enum FetchError {
    /// Target URL failed validation before any request was sent
    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("Unexpected status: {0}")]
    Status(u16),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Content decoding error
    #[error("Decoding error: {0}")]
    Decode(String),
}

impl FetchError {
    /// Whether a later attempt could succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::InvalidTarget(_) | Self::Decode(_) => false,
            Self::Status(code) => *code >= 500 || *code == 429,
            Self::Http(_) | Self::Timeout => true,
        }
    }
}

/// Container stage of the schedule grid walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridStage {
    /// `div.container.timetable`
    Container,
    /// `div.card-default.timetable-card`
    Card,
    /// `div.schedule`
    Body,
    /// `div.schedule__items`
    Items,
}

impl GridStage {
    /// Class marker the stage looks for
    pub fn marker(&self) -> &'static str {
        match self {
            Self::Container => "container timetable",
            Self::Card => "card-default timetable-card",
            Self::Body => "schedule",
            Self::Items => "schedule__items",
        }
    }
}

impl std::fmt::Display for GridStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.marker())
    }
}

/// An expected schedule container was absent from the document
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Schedule structure missing: {stage} not found")]
pub struct StructureMissing {
    pub stage: GridStage,
}

/// Errors raised by a schedule store
#[derive(Error, Debug)]
pub enum StorageError {
    /// Reading a stored value failed
    #[error("Failed to read '{key}': {source}")]
    Read {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Writing a value failed
    #[error("Failed to write '{key}': {source}")]
    Write {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Value could not be serialized
    #[error("Failed to serialize '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}
