use crate::domain::model::{ExportBundle, HistoricalQuote, Interval};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Settings the export pipeline reads.
pub trait ConfigProvider: Send + Sync {
    fn symbols(&self) -> &[String];
    fn output_path(&self) -> &str;
    fn archive_name(&self) -> &str;
    fn interval(&self) -> Interval;
    fn start_date(&self) -> Option<NaiveDate>;
    fn end_date(&self) -> Option<NaiveDate>;
    fn concurrent_requests(&self) -> usize;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<HistoricalQuote>>;
    async fn transform(&self, data: Vec<HistoricalQuote>) -> Result<ExportBundle>;
    async fn load(&self, result: ExportBundle) -> Result<String>;
}
