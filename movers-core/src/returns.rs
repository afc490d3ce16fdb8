//! Trailing percent growth and report-row construction.

use crate::data::normalize::{closes, NormalizedSeries};
use crate::window::{TrailingWindow, METADATA_COLUMNS};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a normalized series did not produce a report row.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReturnError {
    #[error("insufficient data: row has {have} columns, expected {expected}")]
    InsufficientData { have: usize, expected: usize },

    #[error("first close in window is zero; growth is undefined")]
    ZeroBaseline,

    #[error("growth is not a finite number ({0})")]
    NonFinite(f64),
}

/// One ranked candidate: symbol, display name, daily closes, growth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub symbol: String,
    pub name: String,
    /// One close per calendar day of the window, chronological.
    pub closes: Vec<f64>,
    /// Percent change from the first to the last close.
    pub growth: f64,
}

impl ReportRow {
    /// Number of columns this row occupies in the report.
    pub fn column_count(&self) -> usize {
        self.closes.len() + METADATA_COLUMNS
    }
}

/// `(last - first) / first * 100`.
pub fn percent_growth(first: f64, last: f64) -> f64 {
    (last - first) / first * 100.0
}

/// Build a report row from a normalized series.
///
/// Only days carrying a finite close count as columns, so a series that
/// still has empty leading days after the first-day repair comes up short
/// and is rejected.
pub fn build_row(
    symbol: &str,
    name: &str,
    series: &NormalizedSeries,
    window: &TrailingWindow,
) -> Result<ReportRow, ReturnError> {
    let daily: Vec<f64> = closes(series)
        .into_iter()
        .flatten()
        .filter(|c| c.is_finite())
        .collect();

    let have = daily.len() + METADATA_COLUMNS;
    let expected = window.expected_columns();
    if have != expected {
        return Err(ReturnError::InsufficientData { have, expected });
    }

    let (first, last) = match (daily.first(), daily.last()) {
        (Some(&first), Some(&last)) => (first, last),
        _ => return Err(ReturnError::InsufficientData { have, expected }),
    };

    if first == 0.0 {
        return Err(ReturnError::ZeroBaseline);
    }

    let growth = percent_growth(first, last);
    if !growth.is_finite() {
        return Err(ReturnError::NonFinite(growth));
    }

    Ok(ReportRow {
        symbol: symbol.to_string(),
        name: name.to_string(),
        closes: daily,
        growth,
    })
}
