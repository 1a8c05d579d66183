use crate::app::fan_out::run_bounded;
use crate::app::portal::YFinance;
use crate::domain::model::{ExportBundle, HistoricalQuote};
use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
use crate::domain::services::{bullish_days_by_year, quotes_to_csv, quotes_to_json};
use crate::utils::error::{Result, YFinanceError};
use std::collections::BTreeMap;
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

pub const QUOTES_CSV_FILE: &str = "quotes.csv";
pub const QUOTES_JSON_FILE: &str = "quotes.json";
pub const BULLISH_DAYS_FILE: &str = "bullish_days.json";

/// 下載多個代號的歷史報價並打包成 ZIP
pub struct HistoricalExportPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    finance: YFinance,
}

impl<S: Storage, C: ConfigProvider> HistoricalExportPipeline<S, C> {
    pub fn new(storage: S, config: C, finance: YFinance) -> Self {
        Self {
            storage,
            config,
            finance,
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for HistoricalExportPipeline<S, C> {
    async fn extract(&self) -> Result<Vec<HistoricalQuote>> {
        let symbols = self.config.symbols();
        if symbols.is_empty() {
            return Err(YFinanceError::MissingConfigError {
                field: "export.symbols".to_string(),
            });
        }

        let limit = self.config.concurrent_requests().max(1);
        tracing::info!(
            "Downloading {} symbols, at most {} at a time",
            symbols.len(),
            limit
        );

        let tasks: Vec<_> = symbols
            .iter()
            .map(|symbol| {
                let request = self
                    .finance
                    .historical_quotes()
                    .symbol(symbol)
                    .start_date(self.config.start_date())
                    .end_date(self.config.end_date())
                    .interval(self.config.interval());
                async move { request.fetch().await }
            })
            .collect();

        // results follow the configured symbol order
        let mut downloaded: Vec<HistoricalQuote> = Vec::new();
        let mut succeeded = 0usize;
        let mut failed = 0usize;

        for (symbol, result) in symbols.iter().zip(run_bounded(tasks, limit).await) {
            match result {
                Ok(quotes) => {
                    tracing::info!("{}: {} quotes", symbol, quotes.len());
                    succeeded += 1;
                    downloaded.extend(quotes);
                }
                Err(e) => {
                    failed += 1;
                    tracing::warn!("{}: download failed: {}", symbol, e);
                }
            }
        }

        if succeeded == 0 {
            return Err(YFinanceError::ProcessingError {
                message: format!("None of the {} symbols could be downloaded", symbols.len()),
            });
        }
        if failed > 0 {
            tracing::warn!("{} of {} symbols were skipped", failed, symbols.len());
        }

        Ok(downloaded)
    }

    async fn transform(&self, data: Vec<HistoricalQuote>) -> Result<ExportBundle> {
        let csv_output = quotes_to_csv(&data)?;
        let json_output = quotes_to_json(&data)?;

        let mut by_symbol: BTreeMap<String, Vec<HistoricalQuote>> = BTreeMap::new();
        for quote in &data {
            by_symbol
                .entry(quote.symbol.clone())
                .or_default()
                .push(quote.clone());
        }
        let bullish_days = by_symbol
            .into_iter()
            .map(|(symbol, quotes)| (symbol, bullish_days_by_year(&quotes)))
            .collect();

        tracing::debug!("Transformed {} quotes", data.len());
        Ok(ExportBundle {
            quotes: data,
            csv_output,
            json_output,
            bullish_days,
        })
    }

    async fn load(&self, result: ExportBundle) -> Result<String> {
        let archive_name = self.config.archive_name();
        let output_path = format!("{}/{}", self.config.output_path(), archive_name);

        let zip_data = {
            let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

            zip.start_file::<_, ()>(QUOTES_CSV_FILE, FileOptions::default())?;
            zip.write_all(result.csv_output.as_bytes())?;

            zip.start_file::<_, ()>(QUOTES_JSON_FILE, FileOptions::default())?;
            zip.write_all(result.json_output.as_bytes())?;

            zip.start_file::<_, ()>(BULLISH_DAYS_FILE, FileOptions::default())?;
            let bullish_json = serde_json::to_string_pretty(&result.bullish_days)?;
            zip.write_all(bullish_json.as_bytes())?;

            let cursor = zip.finish()?;
            cursor.into_inner()
        };

        tracing::debug!("Writing ZIP file ({} bytes) to storage", zip_data.len());
        self.storage.write_file(archive_name, &zip_data).await?;

        Ok(output_path)
    }
}
