//! HTML parsing and schedule extraction
//!
//! This module turns a fetched schedule page into the filtered slot cell
//! sequence that gets cached and served.

pub mod filter;
pub mod grid;
pub mod lesson;
pub mod selectors;

pub use filter::{trim_leading_placeholders, Trimmed};
pub use grid::ScheduleDocument;
pub use lesson::{extract_groups, extract_lesson, normalize_cell};

/// Run grid extraction, lesson normalization and placeholder trimming
///
/// Never fails: a page without the schedule structure gives an empty
/// sequence with nothing removed.
pub fn extract_schedule(html: &str, remove_count: usize) -> Trimmed {
    let cells = ScheduleDocument::parse(html).extract_cells();
    trim_leading_placeholders(cells, remove_count)
}
