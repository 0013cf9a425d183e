//! rasp - University class schedule scraper
//!
//! Fetches the published weekly schedule pages of the university, extracts
//! structured lesson records, caches them as JSON and serves them to a
//! browser timetable.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`crawler`] - Target validation and page fetching
//! - [`parser`] - Grid extraction, lesson normalization and placeholder trimming
//! - [`models`] - Core data structures and their JSON shape
//! - [`storage`] - Storage keys and the injected document store
//! - [`pipeline`] - Refresh and lookup of cached schedules
//! - [`directory`] - Group and staff directory crawling and search
//! - [`week`] - Academic week arithmetic and grid layout
//! - [`server`] - HTTP API for the timetable UI
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use rasp::config::Config;
//! use rasp::crawler::ScheduleRequest;
//! use rasp::models::SubjectKind;
//! use rasp::pipeline::ScheduleService;
//! use rasp::storage::FileStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let store = Arc::new(FileStore::new(&config.storage.data_dir));
//!     let service = ScheduleService::new(&config, store)?;
//!
//!     let request = ScheduleRequest::subject(SubjectKind::Group, "531030143", Some("5"));
//!     let report = service.refresh(&request).await?;
//!     println!("{} cells stored under {}", report.cells, report.key);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod crawler;
pub mod directory;
pub mod error;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod server;
pub mod storage;
pub mod utils;
pub mod week;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::crawler::{ScheduleFetcher, ScheduleRequest};
    pub use crate::error::{Error, ErrorCategory, RaspErrorTrait, Result};
    pub use crate::models::{GroupLink, Groups, Lesson, SlotCell, SubjectKind};
    pub use crate::pipeline::{Lookup, RefreshReport, ScheduleService};
    pub use crate::storage::{FileStore, MemoryStore, ScheduleKey, ScheduleStore};
}

// Direct re-exports for convenience
pub use models::{Groups, Lesson, SlotCell, SubjectKind};
