//! The symbol universe for a run.
//!
//! Symbols come from an external listing (the S&P 500 constituents table on
//! Wikipedia by default), are rewritten into filename-safe form, and are
//! persisted as a one-column CSV for inspection. The list is fetched fresh on
//! every run; a failure here is fatal.

use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_UNIVERSE_URL: &str = "https://en.wikipedia.org/wiki/List_of_S%26P_500_companies";

/// Header of the column holding tickers in the listing table.
const SYMBOL_HEADER: &str = "Symbol";

/// Header of the persisted ticker list.
const TICKERS_HEADER: &str = "Tickers";

#[derive(Debug, Error)]
pub enum UniverseError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("no table found in listing page")]
    MissingTable,

    #[error("listing table has no '{0}' column")]
    MissingColumn(String),

    #[error("listing produced no symbols")]
    Empty,

    #[error("parse error: {0}")]
    Parse(String),

    #[error("failed to write ticker list: {0}")]
    Write(#[from] csv::Error),
}

/// Source of raw ticker strings.
pub trait UniverseSource {
    fn fetch_symbols(&self) -> Result<Vec<String>, UniverseError>;
}

/// Scrapes the first HTML table of a listing page.
pub struct WikipediaUniverse {
    url: String,
    client: reqwest::blocking::Client,
}

impl WikipediaUniverse {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, UniverseError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("movers/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl UniverseSource for WikipediaUniverse {
    fn fetch_symbols(&self) -> Result<Vec<String>, UniverseError> {
        let resp = self.client.get(&self.url).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(UniverseError::HttpStatus {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }
        let html = resp.text()?;
        parse_symbol_column(&html)
    }
}

/// An ordered, de-duplicated list of filename-safe symbols.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Universe {
    symbols: Vec<String>,
}

impl Universe {
    /// Fetch from `source` and sanitize. Fails fast; there is no partial universe.
    pub fn load(source: &dyn UniverseSource) -> Result<Self, UniverseError> {
        Self::from_raw(source.fetch_symbols()?)
    }

    /// Sanitize raw tickers, dropping blanks and repeats (first one wins).
    pub fn from_raw<I, S>(raw: I) -> Result<Self, UniverseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let symbols: Vec<String> = raw
            .into_iter()
            .map(|s| sanitize_symbol(s.as_ref()))
            .filter(|s| !s.is_empty())
            .filter(|s| seen.insert(s.clone()))
            .collect();

        if symbols.is_empty() {
            return Err(UniverseError::Empty);
        }
        Ok(Self { symbols })
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Write the list as a one-column CSV headed `Tickers`.
    pub fn save_ticker_list(&self, path: &Path) -> Result<(), UniverseError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(csv::Error::from)?;
        }
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record([TICKERS_HEADER])?;
        for symbol in &self.symbols {
            writer.write_record([symbol])?;
        }
        writer.flush().map_err(csv::Error::from)?;
        Ok(())
    }
}

/// Rewrite a ticker into a form usable as a file name component.
///
/// `BRK.B` becomes `BRK-B`, which is also the form Yahoo expects.
pub fn sanitize_symbol(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| match c {
            '.' | '/' | '\\' => '-',
            c if c.is_whitespace() => '-',
            c => c,
        })
        .collect()
}

/// Extract the `Symbol` column of the first `<table>` in `html`.
pub fn parse_symbol_column(html: &str) -> Result<Vec<String>, UniverseError> {
    let compile = |pattern: &str| {
        Regex::new(pattern).map_err(|e| UniverseError::Parse(format!("regex: {e}")))
    };
    let table_re = compile(r"(?is)<table\b[^>]*>(.*?)</table>")?;
    let row_re = compile(r"(?is)<tr\b[^>]*>(.*?)</tr>")?;
    let cell_re = compile(r"(?is)<t([hd])\b[^>]*>(.*?)</t[hd]>")?;
    let tag_re = compile(r"(?s)<[^>]*>")?;

    let table = table_re
        .captures(html)
        .and_then(|c| c.get(1))
        .ok_or(UniverseError::MissingTable)?
        .as_str();

    let mut column: Option<usize> = None;
    let mut symbols = Vec::new();

    for row in row_re.captures_iter(table) {
        let cells: Vec<(bool, String)> = cell_re
            .captures_iter(&row[1])
            .map(|c| (&c[1] == "h" || &c[1] == "H", cell_text(&tag_re, &c[2])))
            .collect();

        match column {
            None => {
                if cells.iter().all(|(header, _)| *header) {
                    column = cells.iter().position(|(_, text)| text == SYMBOL_HEADER);
                    if column.is_none() && !cells.is_empty() {
                        return Err(UniverseError::MissingColumn(SYMBOL_HEADER.into()));
                    }
                }
            }
            Some(idx) => {
                if let Some((false, text)) = cells.get(idx) {
                    if !text.is_empty() {
                        symbols.push(text.clone());
                    }
                }
            }
        }
    }

    if column.is_none() {
        return Err(UniverseError::MissingColumn(SYMBOL_HEADER.into()));
    }
    if symbols.is_empty() {
        return Err(UniverseError::Empty);
    }
    Ok(symbols)
}

fn cell_text(tag_re: &Regex, inner: &str) -> String {
    tag_re
        .replace_all(inner, "")
        .replace("&amp;", "&")
        .replace("&nbsp;", " ")
        .replace("&#160;", " ")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
        <html><body>
        <table class="wikitable sortable" id="constituents">
        <tbody>
        <tr><th>Symbol</th><th>Security</th><th>GICS Sector</th></tr>
        <tr><td><a rel="nofollow" class="external text" href="https://www.nyse.com/quote/XNYS:MMM">MMM</a></td><td><a href="/wiki/3M">3M</a></td><td>Industrials</td></tr>
        <tr><td><a href="x">BRK.B</a>
        </td><td>Berkshire Hathaway</td><td>Financials</td></tr>
        <tr><td>AT&amp;T</td><td>odd</td><td>Communication Services</td></tr>
        </tbody></table>
        <table><tr><th>Date</th><th>Added</th></tr><tr><td>x</td><td>y</td></tr></table>
        </body></html>
    "#;

    struct StaticSource(Vec<&'static str>);

    impl UniverseSource for StaticSource {
        fn fetch_symbols(&self) -> Result<Vec<String>, UniverseError> {
            Ok(self.0.iter().map(|s| s.to_string()).collect())
        }
    }

    struct DownSource;

    impl UniverseSource for DownSource {
        fn fetch_symbols(&self) -> Result<Vec<String>, UniverseError> {
            Err(UniverseError::MissingTable)
        }
    }

    #[test]
    fn parses_symbol_column_of_first_table() {
        let symbols = parse_symbol_column(LISTING).unwrap();
        assert_eq!(symbols, vec!["MMM", "BRK.B", "AT&T"]);
    }

    #[test]
    fn missing_symbol_header_is_an_error() {
        let html = "<table><tr><th>Ticker</th></tr><tr><td>MMM</td></tr></table>";
        assert!(matches!(
            parse_symbol_column(html),
            Err(UniverseError::MissingColumn(_))
        ));
    }

    #[test]
    fn page_without_table_is_an_error() {
        assert!(matches!(
            parse_symbol_column("<html><p>maintenance</p></html>"),
            Err(UniverseError::MissingTable)
        ));
    }

    #[test]
    fn dots_become_dashes() {
        assert_eq!(sanitize_symbol("BRK.B"), "BRK-B");
        assert_eq!(sanitize_symbol(" BF.B "), "BF-B");
        assert_eq!(sanitize_symbol("AAPL"), "AAPL");
    }

    #[test]
    fn load_sanitizes_and_dedups_in_order() {
        let universe = Universe::load(&StaticSource(vec!["MSFT", "BRK.B", "", "BRK-B", "AAPL"]))
            .unwrap();
        assert_eq!(universe.symbols(), ["MSFT", "BRK-B", "AAPL"]);
    }

    #[test]
    fn empty_listing_fails() {
        assert!(matches!(
            Universe::load(&StaticSource(vec![])),
            Err(UniverseError::Empty)
        ));
    }

    #[test]
    fn source_failure_propagates() {
        assert!(Universe::load(&DownSource).is_err());
    }

    #[test]
    fn ticker_list_has_single_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ticker_list.csv");
        let universe = Universe::from_raw(["MMM", "BRK.B"]).unwrap();
        universe.save_ticker_list(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "Tickers\nMMM\nBRK-B\n");
    }

    #[test]
    fn ticker_list_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("lists").join("tickers.csv");
        let universe = Universe::from_raw(["AAPL"]).unwrap();
        universe.save_ticker_list(&path).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Tickers\nAAPL\n");
    }
}
