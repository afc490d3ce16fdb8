//! The batch run: universe → fetch/cache → normalize → return → rank → report.
//!
//! Symbols are processed strictly in universe order, one at a time. A
//! failure for one symbol is logged and recorded as a skip; only a universe
//! failure (or failing to write an output file) aborts the run.

use crate::config::MoversConfig;
use crate::data::cache::CsvCache;
use crate::data::fetch::fetch_symbol;
use crate::data::normalize::normalize;
use crate::data::provider::{DataError, DataProvider, DataSource};
use crate::data::universe::{Universe, UniverseError, UniverseSource};
use crate::report::{self, ReportError};
use crate::returns::{build_row, ReportRow, ReturnError};
use crate::window::{TrailingWindow, WindowError};
use chrono::NaiveDate;
use thiserror::Error;
use tracing::{info, warn};

/// Per-symbol failure. Never fatal.
#[derive(Debug, Error)]
pub enum SymbolError {
    #[error(transparent)]
    Fetch(#[from] DataError),

    #[error(transparent)]
    Return(#[from] ReturnError),
}

/// Fatal run failure.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("window: {0}")]
    Window(#[from] WindowError),

    #[error("universe: {0}")]
    Universe(#[from] UniverseError),

    #[error("report: {0}")]
    Report(#[from] ReportError),
}

/// A symbol that produced no report row, and why.
#[derive(Debug)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: SymbolError,
}

/// Everything a run produced.
#[derive(Debug)]
pub struct PipelineResult {
    pub window: TrailingWindow,
    pub universe_size: usize,
    /// Accepted rows before ranking and truncation.
    pub accepted: usize,
    /// Accepted symbols whose history came from the cache.
    pub cache_hits: usize,
    /// Ranked rows, at most `top_n`.
    pub rows: Vec<ReportRow>,
    pub skipped: Vec<SkippedSymbol>,
}

impl PipelineResult {
    /// Skips caused by provider or cache errors.
    pub fn fetch_failures(&self) -> usize {
        self.skipped
            .iter()
            .filter(|s| matches!(s.reason, SymbolError::Fetch(_)))
            .count()
    }

    /// Skips caused by short or unusable series.
    pub fn data_rejections(&self) -> usize {
        self.skipped.len() - self.fetch_failures()
    }
}

/// Fetch, normalize and measure one symbol. Also reports where its
/// history came from.
pub fn process_symbol(
    provider: &dyn DataProvider,
    cache: &CsvCache,
    symbol: &str,
    window: &TrailingWindow,
) -> Result<(ReportRow, DataSource), SymbolError> {
    let fetched = fetch_symbol(provider, cache, symbol, window)?;
    let series = normalize(&fetched.bars, window);
    let row = build_row(&fetched.symbol, &fetched.name, &series, window)?;
    Ok((row, fetched.source))
}

/// Evaluate every symbol, then rank the accepted rows.
pub fn evaluate_universe(
    symbols: &[String],
    provider: &dyn DataProvider,
    cache: &CsvCache,
    window: &TrailingWindow,
    top_n: usize,
) -> PipelineResult {
    let total = symbols.len();
    let mut accepted = Vec::new();
    let mut skipped = Vec::new();
    let mut cache_hits = 0;

    for (i, symbol) in symbols.iter().enumerate() {
        match process_symbol(provider, cache, symbol, window) {
            Ok((row, source)) => {
                if source == DataSource::Cache {
                    cache_hits += 1;
                }
                info!(
                    symbol = %symbol,
                    source = ?source,
                    "[{}/{total}] {} day return for {symbol} is {:.4}%",
                    i + 1,
                    window.day_count() - 1,
                    row.growth
                );
                accepted.push(row);
            }
            Err(reason) => {
                warn!(symbol = %symbol, "[{}/{total}] skipping {symbol}: {reason}", i + 1);
                skipped.push(SkippedSymbol {
                    symbol: symbol.clone(),
                    reason,
                });
            }
        }
    }

    PipelineResult {
        window: *window,
        universe_size: total,
        accepted: accepted.len(),
        cache_hits,
        rows: report::rank(accepted, top_n),
        skipped,
    }
}

/// Run the whole batch for the window ending on `today`.
///
/// The ticker list is written only after the window is valid and the
/// universe loads; either failure leaves no output files at all.
pub fn run(
    config: &MoversConfig,
    source: &dyn UniverseSource,
    provider: &dyn DataProvider,
    today: NaiveDate,
) -> Result<PipelineResult, PipelineError> {
    let window = TrailingWindow::ending(today, config.window_days)?;
    let universe = Universe::load(source)?;
    universe.save_ticker_list(&config.ticker_list_path)?;
    info!(
        symbols = universe.len(),
        path = %config.ticker_list_path.display(),
        "universe loaded"
    );

    let cache = CsvCache::new(&config.cache_dir);
    info!(
        start = %window.start(),
        end = %window.end(),
        cache = %cache.cache_dir().display(),
        "evaluating window"
    );

    let result = evaluate_universe(universe.symbols(), provider, &cache, &window, config.top_n);

    report::write_report(&config.report_path, &result.rows, &window)?;
    info!(
        accepted = result.accepted,
        cache_hits = result.cache_hits,
        skipped = result.skipped.len(),
        written = result.rows.len(),
        path = %config.report_path.display(),
        "report written"
    );

    Ok(result)
}
