//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over price sources (Yahoo Finance today)
//! so the pipeline can be driven by an in-memory provider in tests.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Daily OHLCV bar, dated on a naive calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<u64>,
}

impl PriceBar {
    /// Same record, re-dated to `date`.
    pub fn on(&self, date: NaiveDate) -> Self {
        Self {
            date,
            ..self.clone()
        }
    }
}

/// Structured error types for data operations.
///
/// Every variant is recoverable at the per-symbol level: the pipeline logs it
/// and skips the symbol.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("HTTP {status} for {symbol}")]
    HttpStatus { symbol: String, status: u16 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("missing field '{0}' in provider response")]
    MissingField(&'static str),

    #[error("cache error: {0}")]
    CacheError(String),

    #[error("malformed cache file {path}: {reason}")]
    MalformedCache { path: String, reason: String },

    #[error("no cached data for symbol '{symbol}'")]
    NoCachedData { symbol: String },
}

/// Result of a successful history fetch for a single symbol.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub symbol: String,
    pub bars: Vec<PriceBar>,
    pub source: DataSource,
}

/// Where the price history came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    YahooFinance,
    Cache,
}

/// Trait for price providers.
///
/// The cache layer sits above this trait; providers don't know about the cache.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily bars for a symbol over a date range (inclusive).
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate)
        -> Result<FetchResult, DataError>;

    /// Fetch the company display name for a symbol.
    fn fetch_name(&self, symbol: &str) -> Result<String, DataError>;
}
