//! The trailing calendar window a run measures returns over.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Columns in a report row besides the daily closes: ticker, company name,
/// percent growth.
pub const METADATA_COLUMNS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    #[error("a {days}-day window ending {end} starts before the earliest representable date")]
    OutOfRange { end: NaiveDate, days: u32 },
}

/// Inclusive calendar range `[start, end]` with `start = end - days`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrailingWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl TrailingWindow {
    /// Window of `days` days ending on `end`.
    pub fn ending(end: NaiveDate, days: u32) -> Result<Self, WindowError> {
        let start = end
            .checked_sub_signed(Duration::days(i64::from(days)))
            .ok_or(WindowError::OutOfRange { end, days })?;
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of calendar days covered, both ends included.
    pub fn day_count(&self) -> usize {
        ((self.end - self.start).num_days() + 1) as usize
    }

    /// Every calendar day in the window, ascending.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        self.start.iter_days().take(self.day_count())
    }

    /// Column count of a complete report row over this window.
    pub fn expected_columns(&self) -> usize {
        self.day_count() + METADATA_COLUMNS
    }

    /// ISO labels for the per-day report columns.
    pub fn date_labels(&self) -> Vec<String> {
        self.dates().map(|d| d.format("%Y-%m-%d").to_string()).collect()
    }
}
