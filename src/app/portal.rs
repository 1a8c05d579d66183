use crate::adapters::http::build_http_client;
use crate::app::fan_out::run_bounded;
use crate::app::requests::{
    HistoricalQuoteRequest, IndexComponentRequest, KeyStatisticsRequest, SummaryQuoteRequest,
};
use crate::config::ClientConfig;
use crate::domain::model::SummaryQuote;
use crate::utils::error::Result;
use reqwest::Client;
use std::sync::Arc;

/// Entry point of the library. Hands out request builders that share one HTTP client.
///
/// ```no_run
/// # async fn demo() -> yfinance_etl::Result<()> {
/// let finance = yfinance_etl::YFinance::new(Default::default())?;
/// let quotes = finance.historical_quotes().symbol("^FTSE").fetch().await?;
/// println!("{} quotes", quotes.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct YFinance {
    client: Client,
    config: Arc<ClientConfig>,
}

impl YFinance {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = build_http_client(&config)?;
        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn historical_quotes(&self) -> HistoricalQuoteRequest {
        HistoricalQuoteRequest::new(self.client.clone(), Arc::clone(&self.config))
    }

    pub fn summary_quote(&self) -> SummaryQuoteRequest {
        SummaryQuoteRequest::new(self.client.clone(), Arc::clone(&self.config))
    }

    pub fn key_statistics(&self) -> KeyStatisticsRequest {
        KeyStatisticsRequest::new(self.client.clone(), Arc::clone(&self.config))
    }

    pub fn index_components(&self) -> IndexComponentRequest {
        IndexComponentRequest::new(self.client.clone(), Arc::clone(&self.config))
    }

    /// Summary quotes of many symbols, at most `limit` requests at a time, in input order.
    pub async fn summary_quotes(
        &self,
        symbols: &[String],
        limit: usize,
    ) -> Vec<(String, Result<SummaryQuote>)> {
        let tasks: Vec<_> = symbols
            .iter()
            .map(|symbol| {
                let request = self.summary_quote().symbol(symbol);
                async move { request.fetch().await }
            })
            .collect();

        symbols
            .iter()
            .cloned()
            .zip(run_bounded(tasks, limit).await)
            .collect()
    }
}

impl Default for YFinance {
    fn default() -> Self {
        let config = ClientConfig::default();
        match build_http_client(&config) {
            Ok(client) => Self {
                client,
                config: Arc::new(config),
            },
            Err(e) => {
                tracing::warn!("Falling back to a plain HTTP client: {}", e);
                Self {
                    client: Client::new(),
                    config: Arc::new(config),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders_share_config() {
        let config = ClientConfig::default()
            .with_base_url("http://127.0.0.1:9")
            .with_timeout_ms(2_000);
        let finance = YFinance::new(config).unwrap();

        assert_eq!(finance.config().timeout_ms, 2_000);
        assert!(finance
            .summary_quote()
            .symbol("GOOG")
            .target_url()
            .starts_with("http://127.0.0.1:9/quote/GOOG"));
        assert!(finance
            .historical_quotes()
            .symbol("GOOG")
            .target_url()
            .starts_with("http://127.0.0.1:9/v7/finance/download/GOOG"));
    }

    #[tokio::test]
    async fn test_summary_quotes_are_bounded_and_ordered() {
        use httpmock::prelude::*;
        use std::time::{Duration, Instant};

        let delay = Duration::from_millis(250);
        let server = MockServer::start();
        for symbol in ["AAA", "BBB", "CCC"] {
            server.mock(|when, then| {
                when.method(GET).path(format!("/quote/{}", symbol));
                then.status(200).delay(delay).body("<html></html>");
            });
        }
        let finance =
            YFinance::new(ClientConfig::default().with_base_url(&server.base_url())).unwrap();
        let symbols: Vec<String> = ["AAA", "BBB", "CCC"].iter().map(|s| s.to_string()).collect();

        let started = Instant::now();
        let results = finance.summary_quotes(&symbols, 1).await;

        assert!(started.elapsed() >= delay * 3);
        let order: Vec<&str> = results.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(order, vec!["AAA", "BBB", "CCC"]);
        // empty pages have no header, so every quote fails to parse
        assert!(results.iter().all(|(_, r)| r.is_err()));
    }

    #[test]
    fn test_default_uses_yahoo_hosts() {
        let finance = YFinance::default();
        assert_eq!(
            finance.key_statistics().symbol("GOOG").target_url(),
            "https://finance.yahoo.com/quote/GOOG/key-statistics?p=GOOG"
        );
    }
}
