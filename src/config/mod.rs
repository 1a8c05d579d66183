#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::utils::error::Result;
use crate::utils::validation::{validate_non_empty_string, validate_range, validate_url, Validate};
use serde::{Deserialize, Serialize};

/// Timeout in milliseconds for both connecting and reading.
pub const TIMEOUT_MILLIS: u64 = 10_000;

/// Default start of historical data: 1985-12-28T00:00:00Z.
pub const START_EPOCH: i64 = 504_576_000;

/// Date format used on Yahoo! Finance pages, e.g. `Jul 26, 2022`.
pub const DATE_FORMAT: &str = "%b %d, %Y";

/// Date format of the historical quote CSV, e.g. `2022-07-26`.
pub const CSV_DATE_FORMAT: &str = "%Y-%m-%d";

/// Value with percent, e.g. `2.46%` or `-0.31%`.
pub const VALUE_WITH_PERCENT_REGEX: &str = r"(?i)([-+]?\d[\d,]*\.?\d*)%";

/// Value with scale unit, e.g. `1.35B`.
pub const VALUE_WITH_UNIT_REGEX: &str = r"(?i)([-+]?\d[\d,]*\.?\d*)([A-Z])";

/// Factor ratio, e.g. `1:3`.
pub const FACTOR_REGEX: &str = r"(\d+\.?\d*):(\d+\.?\d*)";

pub const DEFAULT_QUERY_BASE_URL: &str = "https://query1.finance.yahoo.com";
pub const DEFAULT_QUOTE_BASE_URL: &str = "https://finance.yahoo.com";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) yfinance-etl/0.1";

/// HTTP settings shared by every request builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub timeout_ms: u64,
    pub user_agent: String,
    /// Host serving the historical quote CSV download.
    pub query_base_url: String,
    /// Host serving the quote, key-statistics and components pages.
    pub quote_base_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_ms: TIMEOUT_MILLIS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            query_base_url: DEFAULT_QUERY_BASE_URL.to_string(),
            quote_base_url: DEFAULT_QUOTE_BASE_URL.to_string(),
        }
    }
}

impl ClientConfig {
    /// Point both hosts at one base URL, e.g. a mock server.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        self.query_base_url = base.to_string();
        self.quote_base_url = base.to_string();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        if timeout_ms > 0 {
            self.timeout_ms = timeout_ms;
        }
        self
    }
}

impl Validate for ClientConfig {
    fn validate(&self) -> Result<()> {
        validate_range("client.timeout_ms", self.timeout_ms, 1, 600_000)?;
        validate_non_empty_string("client.user_agent", &self.user_agent)?;
        validate_url("client.query_base_url", &self.query_base_url)?;
        validate_url("client.quote_base_url", &self.quote_base_url)?;
        Ok(())
    }
}
