//! Request builders for each kind of Yahoo! Finance data.
//!
//! A builder is configured fluently and then either awaited with `fetch()` or moved onto
//! a tokio task with `spawn()`.

pub mod historical;
pub mod index_component;
pub mod key_statistics;
pub mod summary;

pub use historical::HistoricalQuoteRequest;
pub use index_component::IndexComponentRequest;
pub use key_statistics::KeyStatisticsRequest;
pub use summary::SummaryQuoteRequest;

use crate::config::ClientConfig;
use crate::utils::error::{Result, YFinanceError};
use crate::utils::text::{element_text, select_texts, url_encode};
use crate::utils::validation::validate_symbol;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use std::sync::{Arc, LazyLock};

static COMP_NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\w+\s-\s(.+)").expect("company name pattern is valid"));
// e.g. "Alphabet Inc. (GOOG)"
static COMP_NAME_O2_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(.+)\s\(.+\)").expect("company name pattern is valid"));
static EXCHANGE_CURRENCY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\w+)\s+.+Currency\s+in\s+(\w+)").expect("currency pattern is valid")
});

const CSS_SELECT_COMP_NAME: &str = "h1[class*=D]";
const CSS_SELECT_CURRENCY: &str = "div[class*=C] > span";

static COMP_NAME_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| parse_selector(CSS_SELECT_COMP_NAME));
static CURRENCY_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| parse_selector(CSS_SELECT_CURRENCY));

pub(crate) const NOT_AVAILABLE: &str = "N/A";

pub(crate) fn parse_selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector {}: {:?}", css, e))
}

/// State every builder shares: the HTTP client, settings, symbol and timeout override.
#[derive(Debug, Clone)]
pub(crate) struct RequestBase {
    client: Client,
    config: Arc<ClientConfig>,
    symbol: Option<String>,
    timeout_ms: Option<u64>,
}

impl RequestBase {
    pub(crate) fn new(client: Client, config: Arc<ClientConfig>) -> Self {
        Self {
            client,
            config,
            symbol: None,
            timeout_ms: None,
        }
    }

    pub(crate) fn set_symbol(&mut self, symbol: &str) {
        self.symbol = Some(symbol.trim().to_uppercase());
    }

    pub(crate) fn clear_symbol(&mut self) {
        self.symbol = None;
    }

    /// Zero resets to the configured timeout.
    pub(crate) fn set_timeout(&mut self, timeout_ms: u64) {
        self.timeout_ms = Some(timeout_ms).filter(|t| *t > 0);
    }

    pub(crate) fn symbol(&self) -> Option<&str> {
        self.symbol.as_deref()
    }

    pub(crate) fn timeout_ms(&self) -> u64 {
        self.timeout_ms.unwrap_or(self.config.timeout_ms)
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    pub(crate) fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn require_symbol(&self) -> Result<String> {
        let symbol = self.symbol.clone().ok_or_else(|| YFinanceError::InvalidSymbol {
            symbol: String::new(),
            reason: "Quote symbol must exist for lookup".to_string(),
        })?;
        validate_symbol(&symbol)?;
        Ok(symbol)
    }

    pub(crate) fn encoded_symbol(&self) -> String {
        url_encode(self.symbol(), "")
    }
}

/// The `td` texts of one page section, addressed by position.
pub(crate) struct Cells {
    section: &'static str,
    selector: &'static str,
    values: Vec<String>,
}

impl Cells {
    pub(crate) fn select(
        document: &Html,
        section: &'static str,
        selector_css: &'static str,
        selector: &Selector,
    ) -> Self {
        Self {
            section,
            selector: selector_css,
            values: select_texts(document, selector),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn get(&self, index: usize) -> Result<&str> {
        self.values
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| YFinanceError::MissingElement {
                section: self.section.to_string(),
                selector: self.selector.to_string(),
                index,
            })
    }
}

/// Company name from the page header, falling back to the symbol.
pub(crate) fn parse_company_name(document: &Html, symbol: &str) -> Result<String> {
    let heading = document
        .select(&COMP_NAME_SELECTOR)
        .next()
        .map(element_text)
        .ok_or_else(|| YFinanceError::MissingElement {
            section: "company name".to_string(),
            selector: CSS_SELECT_COMP_NAME.to_string(),
            index: 0,
        })?;

    let name = COMP_NAME_PATTERN
        .captures(&heading)
        .or_else(|| COMP_NAME_O2_PATTERN.captures(&heading))
        .map(|caps| caps[1].trim().to_string())
        .unwrap_or_else(|| symbol.to_string());
    Ok(name)
}

/// `(exchange, currency)` from the "NasdaqGS - ... Currency in USD" line.
pub(crate) fn parse_exchange_currency(document: &Html) -> Result<(String, String)> {
    // The third span is the exchange/currency line.
    let line = document
        .select(&CURRENCY_SELECTOR)
        .nth(2)
        .map(element_text)
        .ok_or_else(|| YFinanceError::MissingElement {
            section: "exchange and currency".to_string(),
            selector: CSS_SELECT_CURRENCY.to_string(),
            index: 2,
        })?;

    Ok(match EXCHANGE_CURRENCY_PATTERN.captures(&line) {
        Some(caps) => (caps[1].to_string(), caps[2].to_string()),
        None => (NOT_AVAILABLE.to_string(), NOT_AVAILABLE.to_string()),
    })
}
