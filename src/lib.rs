pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;
pub use config::{toml_config::ExportConfig, toml_config::TomlConfig, ClientConfig};

pub use adapters::storage::LocalStorage;
pub use app::pipelines::HistoricalExportPipeline;
pub use app::portal::YFinance;
pub use core::etl::EtlEngine;
pub use domain::model::{
    DecimalWithUnit, FactorRatio, HistoricalQuote, IndexComponent, IndexComponentInfo, Interval,
    KeyStatistics, ScaleUnit, StockQuote, SummaryQuote,
};
pub use utils::error::{Result, YFinanceError};
