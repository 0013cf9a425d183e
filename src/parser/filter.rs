//! Leading placeholder trimming
//!
//! The source site renders a fixed number of non-informative slots before
//! the real week begins. They arrive as placeholders at the head of the
//! sequence and are dropped here, up to a configured budget.

use tracing::info;

use crate::models::SlotCell;

/// Cells left after trimming, with the number removed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trimmed {
    pub cells: Vec<SlotCell>,
    pub removed: usize,
}

/// Drop at most `remove_count` placeholder cells from the head of `cells`
///
/// Removal stops at the first non-placeholder cell or when the budget runs
/// out. Every cell after that point is kept, placeholders included.
pub fn trim_leading_placeholders(mut cells: Vec<SlotCell>, remove_count: usize) -> Trimmed {
    let removed = cells
        .iter()
        .take(remove_count)
        .take_while(|cell| cell.is_placeholder())
        .count();

    cells.drain(..removed);
    info!(removed, remaining = cells.len(), "Trimmed leading placeholders");

    Trimmed { cells, removed }
}
