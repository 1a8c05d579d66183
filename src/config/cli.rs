use crate::config::toml_config::{ExportConfig, TomlConfig};
use crate::config::ClientConfig;
use crate::domain::model::Interval;
use crate::utils::error::Result;
use crate::utils::validation::{validate_path, validate_range, validate_symbol, Validate};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Clone, Parser)]
#[command(name = "yfinance-etl", version)]
#[command(about = "Download quotes, key statistics and index components from Yahoo! Finance")]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// HTTP connect and read timeout in milliseconds
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Historical quotes of one symbol
    History {
        symbol: String,
        /// First day, yyyy-MM-dd
        #[arg(short, long)]
        start: Option<NaiveDate>,
        /// Last day, yyyy-MM-dd
        #[arg(short, long)]
        end: Option<NaiveDate>,
        /// d (daily), w (weekly) or m (monthly)
        #[arg(short, long, value_parser = parse_interval, default_value = "d")]
        interval: Interval,
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// Number of bullish days per year
    Bullish {
        symbol: String,
        #[arg(short, long)]
        start: Option<NaiveDate>,
        #[arg(short, long)]
        end: Option<NaiveDate>,
    },
    /// Quote summary page
    Summary { symbol: String },
    /// Key statistics page
    Stats { symbol: String },
    /// One-line description from both the summary and the key statistics
    Describe { symbol: String },
    /// Components of a stock index, e.g. ^FTSE
    Components { symbol: String },
    /// P/E ratio of every component of an index; the leading ^ may be omitted
    IndexPe {
        index: String,
        /// Summary pages fetched at once; defaults to export.concurrent_requests
        #[arg(long)]
        concurrent_requests: Option<usize>,
    },
    /// Download several symbols and write a ZIP archive
    Export {
        #[arg(long, value_delimiter = ',')]
        symbols: Vec<String>,
        #[arg(long)]
        output_path: Option<String>,
        #[arg(long)]
        archive_name: Option<String>,
        #[arg(short, long, value_parser = parse_interval)]
        interval: Option<Interval>,
        #[arg(short, long)]
        start: Option<NaiveDate>,
        #[arg(short, long)]
        end: Option<NaiveDate>,
        #[arg(long)]
        concurrent_requests: Option<usize>,
    },
}

/// `d`, `w`, `m` or the interval name / download code.
pub fn parse_interval(value: &str) -> std::result::Result<Interval, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "d" | "1d" | "daily" => Ok(Interval::Daily),
        "w" | "1wk" | "weekly" => Ok(Interval::Weekly),
        "m" | "1mo" | "monthly" => Ok(Interval::Monthly),
        other => Err(format!("unknown interval '{}', expected d, w or m", other)),
    }
}

impl Command {
    /// The symbol a single-symbol command works on.
    pub fn symbol(&self) -> Option<&str> {
        match self {
            Command::History { symbol, .. }
            | Command::Bullish { symbol, .. }
            | Command::Summary { symbol }
            | Command::Stats { symbol }
            | Command::Describe { symbol }
            | Command::Components { symbol } => Some(symbol),
            Command::IndexPe { index, .. } => Some(index),
            Command::Export { .. } => None,
        }
    }
}

impl CliConfig {
    /// Settings from the TOML file named by `--config`, or the defaults.
    pub fn load_toml(&self) -> Result<TomlConfig> {
        match &self.config {
            Some(path) => {
                tracing::info!("Loading configuration from: {}", path);
                TomlConfig::from_file(path)
            }
            None => Ok(TomlConfig::default()),
        }
    }

    /// Command-line flags layered over `base`.
    pub fn client_config(&self, base: ClientConfig) -> ClientConfig {
        base.with_timeout_ms(self.timeout_ms.unwrap_or(0))
    }

    /// `export` flags layered over `base`; other commands leave it unchanged.
    pub fn export_config(&self, mut base: ExportConfig) -> ExportConfig {
        if let Command::Export {
            symbols,
            output_path,
            archive_name,
            interval,
            start,
            end,
            concurrent_requests,
        } = &self.command
        {
            if !symbols.is_empty() {
                base.symbols = symbols.iter().map(|s| s.trim().to_uppercase()).collect();
            }
            if let Some(path) = output_path {
                base.output_path = path.clone();
            }
            if let Some(name) = archive_name {
                base.archive_name = name.clone();
            }
            if let Some(interval) = interval {
                base.interval = *interval;
            }
            if start.is_some() {
                base.start_date = *start;
            }
            if end.is_some() {
                base.end_date = *end;
            }
            if let Some(limit) = concurrent_requests {
                base.concurrent_requests = *limit;
            }
        }
        base
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let Some(path) = &self.config {
            validate_path("config", path)?;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            validate_range("timeout_ms", timeout_ms, 1, 600_000)?;
        }
        if let Some(symbol) = self.command.symbol() {
            validate_symbol(symbol)?;
        }
        if let Command::IndexPe {
            concurrent_requests: Some(limit),
            ..
        }
        | Command::Export {
            concurrent_requests: Some(limit),
            ..
        } = &self.command
        {
            validate_range("concurrent_requests", *limit, 1, 32)?;
        }
        Ok(())
    }
}
