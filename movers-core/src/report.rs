//! Ranking and the final report table.
//!
//! Rows are ranked by absolute percent growth and laid out as a polars
//! DataFrame: `Symbol`, `Company Name`, one column per calendar day of the
//! window (ISO date labels, chronological), `Percent Growth`.

use crate::returns::ReportRow;
use crate::window::TrailingWindow;
use polars::prelude::*;
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const SYMBOL_COLUMN: &str = "Symbol";
pub const NAME_COLUMN: &str = "Company Name";
pub const GROWTH_COLUMN: &str = "Percent Growth";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("report frame: {0}")]
    Frame(#[from] PolarsError),

    #[error("report I/O on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Sort by `|growth|` descending and keep the first `top_n`.
///
/// The sort is stable: equal magnitudes keep their input order.
pub fn rank(mut rows: Vec<ReportRow>, top_n: usize) -> Vec<ReportRow> {
    rows.sort_by(|a, b| b.growth.abs().total_cmp(&a.growth.abs()));
    rows.truncate(top_n);
    rows
}

/// Lay ranked rows out as the report table.
pub fn to_dataframe(rows: &[ReportRow], window: &TrailingWindow) -> Result<DataFrame, ReportError> {
    let mut columns = Vec::with_capacity(window.expected_columns());

    columns.push(Column::new(
        SYMBOL_COLUMN.into(),
        rows.iter().map(|r| r.symbol.as_str()).collect::<Vec<_>>(),
    ));
    columns.push(Column::new(
        NAME_COLUMN.into(),
        rows.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
    ));

    for (day, label) in window.date_labels().into_iter().enumerate() {
        let values: Vec<Option<f64>> = rows.iter().map(|r| r.closes.get(day).copied()).collect();
        columns.push(Column::new(label.into(), values));
    }

    columns.push(Column::new(
        GROWTH_COLUMN.into(),
        rows.iter().map(|r| r.growth).collect::<Vec<f64>>(),
    ));

    Ok(DataFrame::new(columns)?)
}

/// Write the report as CSV, header included even when there are no rows.
pub fn write_report(
    path: &Path,
    rows: &[ReportRow],
    window: &TrailingWindow,
) -> Result<(), ReportError> {
    let io_err = |source| ReportError::Io {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let mut df = to_dataframe(rows, window)?;
    let mut file = fs::File::create(path).map_err(io_err)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)?;
    Ok(())
}
