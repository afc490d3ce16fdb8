//! Data acquisition: universe, provider, cache, and calendar normalization.

pub mod cache;
pub mod fetch;
pub mod normalize;
pub mod provider;
pub mod universe;
pub mod yahoo;

pub use cache::CsvCache;
pub use fetch::{fetch_symbol, FetchedSymbol};
pub use normalize::{normalize, NormalizedSeries};
pub use provider::{DataError, DataProvider, DataSource, FetchResult, PriceBar};
pub use universe::{Universe, UniverseError, UniverseSource, WikipediaUniverse};
pub use yahoo::YahooProvider;
