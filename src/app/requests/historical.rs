use super::RequestBase;
use crate::adapters::http::download_csv_to_list;
use crate::config::{ClientConfig, START_EPOCH};
use crate::domain::model::{HistoricalQuote, Interval};
use crate::utils::datetime::{end_of_day_epoch, end_of_today_epoch, start_of_day_epoch};
use crate::utils::error::Result;
use chrono::NaiveDate;
use reqwest::Client;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Builder for the historical price download of one symbol.
#[derive(Debug, Clone)]
pub struct HistoricalQuoteRequest {
    base: RequestBase,
    start_epoch: i64,
    end_epoch: i64,
    interval: Interval,
}

impl HistoricalQuoteRequest {
    pub fn new(client: Client, config: Arc<ClientConfig>) -> Self {
        Self {
            base: RequestBase::new(client, config),
            start_epoch: START_EPOCH,
            end_epoch: end_of_today_epoch(),
            interval: Interval::Daily,
        }
    }

    pub fn symbol(mut self, symbol: &str) -> Self {
        self.base.set_symbol(symbol);
        self
    }

    /// First trading day, from midnight UTC. `None` restores the default.
    pub fn start_date(mut self, date: Option<NaiveDate>) -> Self {
        self.start_epoch = date.map(start_of_day_epoch).unwrap_or(START_EPOCH);
        self
    }

    /// Last trading day, up to 23:59:59 UTC. `None` means today.
    pub fn end_date(mut self, date: Option<NaiveDate>) -> Self {
        self.end_epoch = date.map(end_of_day_epoch).unwrap_or_else(end_of_today_epoch);
        self
    }

    pub fn interval(mut self, interval: Interval) -> Self {
        self.interval = interval;
        self
    }

    pub fn timeout(mut self, timeout_ms: u64) -> Self {
        self.base.set_timeout(timeout_ms);
        self
    }

    pub fn target_url(&self) -> String {
        format!(
            "{}/v7/finance/download/{}?period1={}&period2={}&interval={}&events=history&includeAdjustedClose=true",
            self.base.config().query_base_url.trim_end_matches('/'),
            self.base.encoded_symbol(),
            self.start_epoch,
            self.end_epoch,
            self.interval.code()
        )
    }

    /// Download the quotes, oldest first. Rows without prices are dropped.
    pub async fn fetch(&self) -> Result<Vec<HistoricalQuote>> {
        let symbol = self.base.require_symbol()?;
        let url = self.target_url();
        tracing::info!(
            "Downloading {} quotes of {} ({} - {})",
            self.interval.code(),
            symbol,
            self.start_epoch,
            self.end_epoch
        );

        let mut quotes = download_csv_to_list(
            self.base.client(),
            &url,
            self.base.timeout_ms(),
            |row| {
                let fields: Vec<&str> = row.iter().collect();
                HistoricalQuote::from_csv_fields(&symbol, &fields)
            },
        )
        .await?;
        quotes.sort_by(|a, b| a.trade_date.cmp(&b.trade_date));

        tracing::info!("Downloaded {} quotes of {}", quotes.len(), symbol);
        Ok(quotes)
    }

    /// Run [`fetch`](Self::fetch) on a tokio task.
    pub fn spawn(self) -> JoinHandle<Result<Vec<HistoricalQuote>>> {
        tokio::spawn(async move { self.fetch().await })
    }
}
