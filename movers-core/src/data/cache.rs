//! Flat CSV price cache, one file per symbol.
//!
//! Layout: `{cache_dir}/{SYMBOL}.csv` with header
//! `Date,Open,High,Low,Close,Volume`.
//!
//! Entries are written once, on the first fetch, and reused on every later
//! run. Nothing here refreshes or expires them.
//!
//! Features:
//! - Atomic writes (write to .tmp, rename into place)
//! - Tolerant date parsing: plain dates, naive datetimes, and offset
//!   datetimes (the offset is dropped, the wall-clock date kept)
//! - Unknown extra columns are ignored on load

use super::provider::{DataError, PriceBar};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// One row of a cache file.
#[derive(Debug, Serialize, Deserialize)]
struct CacheRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Open")]
    open: Option<f64>,
    #[serde(rename = "High")]
    high: Option<f64>,
    #[serde(rename = "Low")]
    low: Option<f64>,
    #[serde(rename = "Close")]
    close: Option<f64>,
    #[serde(rename = "Volume")]
    volume: Option<f64>,
}

/// The per-symbol CSV cache.
pub struct CsvCache {
    cache_dir: PathBuf,
}

impl CsvCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Root directory of the cache.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Path to the cache file for a symbol: `{cache_dir}/{SYMBOL}.csv`
    pub fn path(&self, symbol: &str) -> PathBuf {
        self.cache_dir.join(format!("{symbol}.csv"))
    }

    /// Whether a cache entry exists for `symbol`.
    pub fn contains(&self, symbol: &str) -> bool {
        self.path(symbol).is_file()
    }

    /// Write bars for a symbol. Atomic: write to .tmp then rename.
    pub fn write(&self, symbol: &str, bars: &[PriceBar]) -> Result<(), DataError> {
        if bars.is_empty() {
            return Err(DataError::CacheError("no bars to cache".into()));
        }

        fs::create_dir_all(&self.cache_dir)
            .map_err(|e| DataError::CacheError(format!("failed to create dir: {e}")))?;

        let path = self.path(symbol);
        let tmp_path = path.with_extension("csv.tmp");

        write_rows(&tmp_path, bars)?;

        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            DataError::CacheError(format!("atomic rename failed: {e}"))
        })
    }

    /// Load all cached bars for a symbol, sorted by date ascending.
    pub fn load(&self, symbol: &str) -> Result<Vec<PriceBar>, DataError> {
        let path = self.path(symbol);
        if !path.is_file() {
            return Err(DataError::NoCachedData {
                symbol: symbol.to_string(),
            });
        }

        let malformed = |reason: String| DataError::MalformedCache {
            path: path.display().to_string(),
            reason,
        };

        let mut reader = csv::Reader::from_path(&path).map_err(|e| malformed(e.to_string()))?;

        let mut bars = Vec::new();
        for (i, row) in reader.deserialize::<CacheRow>().enumerate() {
            let row = row.map_err(|e| malformed(format!("row {}: {e}", i + 1)))?;
            let date = parse_cache_date(&row.date)
                .ok_or_else(|| malformed(format!("row {}: bad date '{}'", i + 1, row.date)))?;
            let volume = row
                .volume
                .map(|v| {
                    parse_volume(v)
                        .ok_or_else(|| malformed(format!("row {}: bad volume {v}", i + 1)))
                })
                .transpose()?;
            bars.push(PriceBar {
                date,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume,
            });
        }

        if bars.is_empty() {
            return Err(malformed("no rows".into()));
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}

fn write_rows(path: &Path, bars: &[PriceBar]) -> Result<(), DataError> {
    let map_err = |e: csv::Error| DataError::CacheError(format!("write csv: {e}"));

    let mut writer = csv::Writer::from_path(path).map_err(map_err)?;
    for bar in bars {
        writer
            .serialize(CacheRow {
                date: bar.date.format("%Y-%m-%d").to_string(),
                open: bar.open,
                high: bar.high,
                low: bar.low,
                close: bar.close,
                volume: bar.volume.map(|v| v as f64),
            })
            .map_err(map_err)?;
    }
    writer
        .flush()
        .map_err(|e| DataError::CacheError(format!("flush csv: {e}")))
}

/// Share counts are whole and non-negative; anything else is a damaged file.
fn parse_volume(raw: f64) -> Option<u64> {
    if raw.is_finite() && raw >= 0.0 && raw.fract() == 0.0 && raw <= u64::MAX as f64 {
        Some(raw as u64)
    } else {
        None
    }
}

/// Parse a cache `Date` cell into a naive calendar date.
///
/// Offset-qualified timestamps keep their local wall-clock date.
pub fn parse_cache_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(dt.naive_local().date());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local().date());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|dt| dt.date())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn sample_bars() -> Vec<PriceBar> {
        vec![
            PriceBar {
                date: d(2024, 1, 3),
                open: Some(101.0),
                high: Some(103.0),
                low: Some(100.0),
                close: Some(102.0),
                volume: Some(1100),
            },
            PriceBar {
                date: d(2024, 1, 2),
                open: Some(100.0),
                high: Some(102.0),
                low: Some(99.0),
                close: Some(101.0),
                volume: Some(1000),
            },
        ]
    }

    #[test]
    fn write_and_load_roundtrip_sorts_by_date() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CsvCache::new(dir.path());

        cache.write("SPY", &sample_bars()).unwrap();
        let loaded = cache.load("SPY").unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].date, d(2024, 1, 2));
        assert_eq!(loaded[0].open, Some(100.0));
        assert_eq!(loaded[1].close, Some(102.0));
        assert_eq!(loaded[1].volume, Some(1100));
    }

    #[test]
    fn write_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CsvCache::new(dir.path());
        cache.write("BRK-B", &sample_bars()).unwrap();

        assert!(cache.contains("BRK-B"));
        assert!(dir.path().join("BRK-B.csv").is_file());
        assert!(!dir.path().join("BRK-B.csv.tmp").exists());
    }

    #[test]
    fn write_rejects_empty_series() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CsvCache::new(dir.path());
        assert!(cache.write("SPY", &[]).is_err());
        assert!(!cache.contains("SPY"));
    }

    #[test]
    fn load_nonexistent_returns_no_cached_data() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CsvCache::new(dir.path());
        assert!(matches!(
            cache.load("NOPE"),
            Err(DataError::NoCachedData { .. })
        ));
    }

    #[test]
    fn load_accepts_offset_timestamps_and_extra_columns() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CsvCache::new(dir.path());
        fs::write(
            cache.path("AAPL"),
            "Date,Open,High,Low,Close,Volume,Dividends,Stock Splits\n\
             2024-01-02 00:00:00-05:00,187.15,188.44,183.89,185.64,82488700,0.0,0.0\n\
             2024-01-03 00:00:00-05:00,184.22,185.88,183.43,184.25,58414500,0.0,0.0\n",
        )
        .unwrap();

        let bars = cache.load("AAPL").unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, d(2024, 1, 2));
        assert_eq!(bars[1].close, Some(184.25));
    }

    #[test]
    fn load_reads_empty_cells_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CsvCache::new(dir.path());
        fs::write(
            cache.path("XYZ"),
            "Date,Open,High,Low,Close,Volume\n2024-01-02,,,,,\n",
        )
        .unwrap();

        let bars = cache.load("XYZ").unwrap();
        assert_eq!(bars[0].close, None);
        assert_eq!(bars[0].volume, None);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CsvCache::new(dir.path());
        fs::write(
            cache.path("BAD"),
            "Date,Open,High,Low,Close,Volume\nyesterday,1,2,3,4,5\n",
        )
        .unwrap();
        assert!(matches!(
            cache.load("BAD"),
            Err(DataError::MalformedCache { .. })
        ));

        fs::write(cache.path("EMPTY"), "Date,Open,High,Low,Close,Volume\n").unwrap();
        assert!(matches!(
            cache.load("EMPTY"),
            Err(DataError::MalformedCache { .. })
        ));
    }

    #[test]
    fn negative_or_fractional_volume_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CsvCache::new(dir.path());
        fs::write(
            cache.path("NEG"),
            "Date,Open,High,Low,Close,Volume\n2024-01-02,1,2,0.5,1.5,-300\n",
        )
        .unwrap();
        fs::write(
            cache.path("FRAC"),
            "Date,Open,High,Low,Close,Volume\n2024-01-02,1,2,0.5,1.5,100.5\n",
        )
        .unwrap();
        fs::write(
            cache.path("WHOLE"),
            "Date,Open,High,Low,Close,Volume\n2024-01-02,1,2,0.5,1.5,1200.0\n",
        )
        .unwrap();

        assert!(matches!(
            cache.load("NEG"),
            Err(DataError::MalformedCache { .. })
        ));
        assert!(matches!(
            cache.load("FRAC"),
            Err(DataError::MalformedCache { .. })
        ));
        assert_eq!(cache.load("WHOLE").unwrap()[0].volume, Some(1200));
    }

    #[test]
    fn cache_date_formats() {
        assert_eq!(parse_cache_date("2024-01-02"), Some(d(2024, 1, 2)));
        assert_eq!(parse_cache_date("2024-01-02 00:00:00"), Some(d(2024, 1, 2)));
        assert_eq!(
            parse_cache_date("2024-01-02 23:00:00-05:00"),
            Some(d(2024, 1, 2))
        );
        assert_eq!(
            parse_cache_date("2024-01-02T00:00:00+09:00"),
            Some(d(2024, 1, 2))
        );
        assert_eq!(parse_cache_date("not a date"), None);
    }
}
