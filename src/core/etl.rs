use crate::core::Pipeline;
use crate::utils::error::Result;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("Starting ETL process...");

        // Extract
        tracing::info!("Extracting quotes...");
        let quotes = self.pipeline.extract().await?;
        tracing::info!("Extracted {} quotes", quotes.len());

        // Transform
        tracing::info!("Transforming quotes...");
        let bundle = self.pipeline.transform(quotes).await?;
        tracing::info!(
            "Transformed {} quotes of {} symbols",
            bundle.quotes.len(),
            bundle.bullish_days.len()
        );

        // Load
        tracing::info!("Loading archive...");
        let output_path = self.pipeline.load(bundle).await?;
        tracing::info!("Output saved to: {}", output_path);

        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ExportBundle, HistoricalQuote};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct RecordingPipeline {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl Pipeline for RecordingPipeline {
        async fn extract(&self) -> Result<Vec<HistoricalQuote>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn transform(&self, data: Vec<HistoricalQuote>) -> Result<ExportBundle> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ExportBundle {
                quotes: data,
                csv_output: String::new(),
                json_output: "[]".to_string(),
                bullish_days: Default::default(),
            })
        }

        async fn load(&self, _result: ExportBundle) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("out/quotes.zip".to_string())
        }
    }

    #[tokio::test]
    async fn test_run_calls_every_phase() {
        let calls = Arc::new(AtomicUsize::new(0));
        let engine = EtlEngine::new(RecordingPipeline {
            calls: Arc::clone(&calls),
        });

        let output = engine.run().await.unwrap();
        assert_eq!(output, "out/quotes.zip");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
