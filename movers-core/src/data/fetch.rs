//! Cache-or-fetch for a single symbol.

use super::cache::CsvCache;
use super::provider::{DataError, DataProvider, DataSource, PriceBar};
use crate::window::TrailingWindow;
use tracing::debug;

/// Price history and display name for one symbol.
#[derive(Debug, Clone)]
pub struct FetchedSymbol {
    pub symbol: String,
    pub name: String,
    pub bars: Vec<PriceBar>,
    pub source: DataSource,
}

/// Load `symbol` from the cache, or fetch and cache it on a miss.
///
/// A cache hit still asks the provider for the display name; history is
/// never re-fetched for a cached symbol, however stale. On a miss the
/// history is written to the cache only after both requests succeed, so a
/// failing symbol leaves no cache file behind.
pub fn fetch_symbol(
    provider: &dyn DataProvider,
    cache: &CsvCache,
    symbol: &str,
    window: &TrailingWindow,
) -> Result<FetchedSymbol, DataError> {
    if cache.contains(symbol) {
        let bars = cache.load(symbol)?;
        let name = provider.fetch_name(symbol)?;
        debug!(symbol, bars = bars.len(), "loaded from cache");
        return Ok(FetchedSymbol {
            symbol: symbol.to_string(),
            name,
            bars,
            source: DataSource::Cache,
        });
    }

    let fetched = provider.fetch(symbol, window.start(), window.end())?;
    let name = provider.fetch_name(symbol)?;
    cache.write(symbol, &fetched.bars)?;
    debug!(
        symbol,
        bars = fetched.bars.len(),
        provider = provider.name(),
        "fetched and cached"
    );

    Ok(FetchedSymbol {
        symbol: fetched.symbol,
        name,
        bars: fetched.bars,
        source: fetched.source,
    })
}
