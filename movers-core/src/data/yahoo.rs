//! Yahoo Finance data provider.
//!
//! Fetches daily OHLCV bars and the company display name from Yahoo's v8
//! chart API. One request per call: no retries, no backoff. The blocking
//! client's timeout is the only time limit.

use super::provider::{DataError, DataProvider, DataSource, FetchResult, PriceBar};
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;

const CHART_API_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Option<Indicators>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    long_name: Option<String>,
    short_name: Option<String>,
    /// Exchange offset from UTC in seconds.
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

/// Yahoo Finance data provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
}

impl YahooProvider {
    pub fn new(timeout: Duration) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| DataError::NetworkUnreachable(format!("http client: {e}")))?;

        Ok(Self { client })
    }

    /// Build the chart API URL for a symbol and date range.
    fn history_url(symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        let start_ts = start.and_hms_opt(0, 0, 0).map_or(0, |dt| dt.and_utc().timestamp());
        let end_ts = end
            .and_hms_opt(23, 59, 59)
            .map_or(0, |dt| dt.and_utc().timestamp());
        format!(
            "{CHART_API_URL}/{symbol}?period1={start_ts}&period2={end_ts}&interval=1d&events=history"
        )
    }

    /// Short-range chart query; only its `meta` block is used.
    fn meta_url(symbol: &str) -> String {
        format!("{CHART_API_URL}/{symbol}?range=5d&interval=1d")
    }

    fn get_chart(&self, symbol: &str, url: &str) -> Result<ChartResponse, DataError> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        if !status.is_success() {
            return Err(DataError::HttpStatus {
                symbol: symbol.to_string(),
                status: status.as_u16(),
            });
        }

        resp.json().map_err(|e| {
            DataError::ResponseFormatChanged(format!("failed to parse response for {symbol}: {e}"))
        })
    }
}

/// Unwrap the single `result` entry, mapping Yahoo's error block.
fn first_result(symbol: &str, resp: ChartResponse) -> Result<ChartData, DataError> {
    let result = resp.chart.result.ok_or_else(|| match resp.chart.error {
        Some(err) if err.code == "Not Found" => DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        },
        Some(err) => DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description)),
        None => DataError::ResponseFormatChanged("empty result with no error".into()),
    })?;

    result
        .into_iter()
        .next()
        .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))
}

/// Parse a chart response into bars dated on the exchange's calendar day.
fn parse_history(symbol: &str, resp: ChartResponse) -> Result<Vec<PriceBar>, DataError> {
    let data = first_result(symbol, resp)?;

    let offset = data.meta.as_ref().and_then(|m| m.gmtoffset).unwrap_or(0);

    let timestamps = data
        .timestamp
        .ok_or_else(|| DataError::ResponseFormatChanged("no timestamps".into()))?;

    let quote = data
        .indicators
        .and_then(|i| i.quote.into_iter().next())
        .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

    let mut bars = Vec::with_capacity(timestamps.len());

    for (i, &ts) in timestamps.iter().enumerate() {
        // Shift into exchange-local time, then drop the zone.
        let date = chrono::DateTime::from_timestamp(ts + offset, 0)
            .map(|dt| dt.naive_utc().date())
            .ok_or_else(|| DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}")))?;

        let bar = PriceBar {
            date,
            open: quote.open.get(i).copied().flatten(),
            high: quote.high.get(i).copied().flatten(),
            low: quote.low.get(i).copied().flatten(),
            close: quote.close.get(i).copied().flatten(),
            volume: quote.volume.get(i).copied().flatten(),
        };

        // Holidays come back with every field null
        if bar.open.is_none() && bar.high.is_none() && bar.low.is_none() && bar.close.is_none() {
            continue;
        }

        bars.push(bar);
    }

    if bars.is_empty() {
        return Err(DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        });
    }

    Ok(bars)
}

/// Extract the display name, preferring `longName`.
fn parse_name(symbol: &str, resp: ChartResponse) -> Result<String, DataError> {
    let meta = first_result(symbol, resp)?
        .meta
        .ok_or(DataError::MissingField("meta"))?;

    meta.long_name
        .or(meta.short_name)
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or(DataError::MissingField("longName"))
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        let chart = self.get_chart(symbol, &Self::history_url(symbol, start, end))?;
        let bars = parse_history(symbol, chart)?;
        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
            source: DataSource::YahooFinance,
        })
    }

    fn fetch_name(&self, symbol: &str) -> Result<String, DataError> {
        let chart = self.get_chart(symbol, &Self::meta_url(symbol))?;
        parse_name(symbol, chart)
    }
}
