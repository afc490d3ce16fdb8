//! Movers Core: trailing-return ranking of an equity universe.
//!
//! This crate contains the whole batch pipeline:
//! - Universe loading from an HTML listing, with filename-safe symbols
//! - Yahoo Finance price provider behind the `DataProvider` trait
//! - Flat per-symbol CSV cache, written once and reused
//! - Calendar reindexing with forward-fill and first-day repair
//! - Percent growth with an exact-coverage guard
//! - Ranking by absolute growth and the polars report table

pub mod config;
pub mod data;
pub mod pipeline;
pub mod report;
pub mod returns;
pub mod window;

pub use config::{ConfigError, MoversConfig};
pub use pipeline::{
    evaluate_universe, process_symbol, run, PipelineError, PipelineResult, SkippedSymbol,
    SymbolError,
};
pub use report::{rank, write_report, ReportError};
pub use returns::{build_row, percent_growth, ReportRow, ReturnError};
pub use window::{TrailingWindow, WindowError};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: provider and universe seams are object safe and
    /// the provider can cross threads.
    #[allow(dead_code)]
    fn assert_traits() {
        fn require_send_sync<T: Send + Sync + ?Sized>() {}

        require_send_sync::<dyn data::DataProvider>();
        require_send_sync::<data::YahooProvider>();
        require_send_sync::<data::CsvCache>();
        require_send_sync::<ReportRow>();
        require_send_sync::<TrailingWindow>();
        require_send_sync::<MoversConfig>();

        fn _universe_is_object_safe(_: &dyn data::UniverseSource) {}
    }
}
