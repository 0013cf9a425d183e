//! Academic week arithmetic and the weekly grid layout
//!
//! Weeks are counted from 1 September of the current academic year. The
//! grid is `rows × days` slots laid out row-major.

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use crate::models::{Lesson, SlotCell};

/// Time labels of the grid rows
pub const TIMES: [&str; 8] = [
    "08:00 - 09:35",
    "09:45 - 11:20",
    "11:30 - 13:05",
    "13:30 - 15:05",
    "15:15 - 16:50",
    "17:00 - 18:35",
    "18:45 - 20:15",
    "20:25 - 21:55",
];

/// Weekday names of the grid columns
pub const DAYS: [&str; 6] = [
    "Понедельник",
    "Вторник",
    "Среда",
    "Четверг",
    "Пятница",
    "Суббота",
];

/// First day of the academic year containing `date`
pub fn academic_year_start(date: NaiveDate) -> NaiveDate {
    let year = if date.month() >= 9 {
        date.year()
    } else {
        date.year() - 1
    };

    // 1 September exists in every year
    NaiveDate::from_ymd_opt(year, 9, 1).unwrap_or(date)
}

/// Academic week number of `date`, starting at 1
pub fn academic_week(date: NaiveDate) -> u32 {
    let days = (date - academic_year_start(date)).num_days();
    u32::try_from(days / 7).unwrap_or(0) + 1
}

/// Monday of academic week `week`, relative to the year containing `today`
///
/// The week is located by counting from 1 September, then moved back to
/// its Monday. `None` when the date falls outside the calendar range.
pub fn week_start(week: u32, today: NaiveDate) -> Option<NaiveDate> {
    let offset = i64::from(week.max(1) - 1) * 7;
    let day = academic_year_start(today).checked_add_signed(Duration::days(offset))?;
    day.checked_sub_signed(Duration::days(i64::from(
        day.weekday().num_days_from_monday(),
    )))
}

/// Cell sequence laid out as rows of days
///
/// Placeholders become empty positions. Cells beyond `rows × days` are
/// ignored; missing ones are padded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekGrid {
    rows: Vec<Vec<Vec<Lesson>>>,
}

impl WeekGrid {
    /// Lay out `cells` as `rows` rows of `days` positions
    pub fn from_cells(cells: &[SlotCell], rows: usize, days: usize) -> Self {
        let grid = (0..rows)
            .map(|row| {
                (0..days)
                    .map(|day| {
                        cells
                            .get(row * days + day)
                            .map(|cell| cell.lessons().to_vec())
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect();

        Self { rows: grid }
    }

    /// Lessons at one position, empty when out of range
    pub fn at(&self, row: usize, day: usize) -> &[Lesson] {
        self.rows
            .get(row)
            .and_then(|r| r.get(day))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of lessons over the whole grid
    pub fn lesson_count(&self) -> usize {
        self.rows.iter().flatten().map(Vec::len).sum()
    }
}
