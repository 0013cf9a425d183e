//! Schedule page retrieval
//!
//! This module validates fetch targets against the source site's domain and
//! retrieves schedule documents over HTTP.

pub mod fetcher;
pub mod target;

pub use fetcher::ScheduleFetcher;
pub use target::{subject_url, validate_target, ResolvedTarget, ScheduleRequest};
