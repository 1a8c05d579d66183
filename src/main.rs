use anyhow::Context;
use clap::Parser;
use yfinance_etl::config::cli::{Command, LogFormat, OutputFormat};
use yfinance_etl::domain::services::{bullish_days_by_year, quotes_to_csv, quotes_to_json};
use yfinance_etl::utils::error::ErrorSeverity;
use yfinance_etl::utils::{logger, validation::Validate};
use yfinance_etl::{
    CliConfig, EtlEngine, ExportConfig, HistoricalExportPipeline, LocalStorage, StockQuote,
    YFinance, YFinanceError,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    match cli.log_format {
        LogFormat::Text => logger::init_cli_logger(cli.verbose),
        LogFormat::Json => logger::init_json_logger(cli.verbose),
    }
    tracing::debug!("CLI config: {:?}", cli);

    // 驗證配置
    if let Err(e) = cli.validate() {
        exit_with_config_error(e);
    }

    // defaults < TOML < CLI
    let toml = match cli.load_toml() {
        Ok(toml) => toml,
        Err(e) => exit_with_config_error(e),
    };
    let client_config = cli.client_config(toml.client.clone());
    if let Err(e) = client_config.validate() {
        exit_with_config_error(e);
    }

    let finance = YFinance::new(client_config).context("Failed to create the HTTP client")?;

    if let Err(e) = run_command(&cli, &finance, toml.export).await {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

fn exit_with_config_error(e: YFinanceError) -> ! {
    tracing::error!("❌ Configuration validation failed: {}", e);
    tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    std::process::exit(1);
}

async fn run_command(
    cli: &CliConfig,
    finance: &YFinance,
    export: ExportConfig,
) -> yfinance_etl::Result<()> {
    match &cli.command {
        Command::History {
            symbol,
            start,
            end,
            interval,
            format,
        } => {
            let quotes = finance
                .historical_quotes()
                .symbol(symbol)
                .start_date(*start)
                .end_date(*end)
                .interval(*interval)
                .fetch()
                .await?;
            let output = match format {
                OutputFormat::Json => quotes_to_json(&quotes)?,
                OutputFormat::Csv => quotes_to_csv(&quotes)?,
            };
            println!("{}", output);
        }
        Command::Bullish { symbol, start, end } => {
            let quotes = finance
                .historical_quotes()
                .symbol(symbol)
                .start_date(*start)
                .end_date(*end)
                .fetch()
                .await?;
            println!("For {}, bullish days count per year:", symbol.to_uppercase());
            println!("{}", "-*-".repeat(20));
            for (year, count) in bullish_days_by_year(&quotes) {
                println!("{}: {}", year, count);
            }
        }
        Command::Summary { symbol } => {
            let quote = finance.summary_quote().symbol(symbol).fetch().await?;
            println!("{}", serde_json::to_string_pretty(&quote)?);
        }
        Command::Stats { symbol } => {
            let stats = finance.key_statistics().symbol(symbol).fetch().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::Describe { symbol } => describe(finance, symbol).await?,
        Command::Components { symbol } => {
            let info = finance.index_components().symbol(symbol).fetch().await?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        Command::IndexPe {
            index,
            concurrent_requests,
        } => {
            let limit = concurrent_requests.unwrap_or(export.concurrent_requests);
            index_pe(finance, index, limit).await?
        }
        Command::Export { .. } => {
            let export = cli.export_config(export);
            export.validate()?;

            let storage = LocalStorage::new(export.output_path.clone());
            let pipeline = HistoricalExportPipeline::new(storage, export, finance.clone());
            let engine = EtlEngine::new(pipeline);

            let output_path = engine.run().await?;
            tracing::info!("✅ Export completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
    }
    Ok(())
}

/// Summary and key statistics side by side, fetched concurrently.
async fn describe(finance: &YFinance, symbol: &str) -> yfinance_etl::Result<()> {
    let summary = finance.summary_quote().symbol(symbol).spawn();
    let stats = finance.key_statistics().symbol(symbol).spawn();

    let quotes: Vec<StockQuote> = vec![join(summary).await?.into(), join(stats).await?.into()];
    for quote in &quotes {
        match quote {
            StockQuote::Summary(sq) => {
                println!("{}", sq.symbol);
                println!("Day Range: {} - {}", sq.day_low, sq.day_high);
            }
            StockQuote::KeyStatistics(ks) => {
                println!("{}", ks.company_name);
                println!("50-day Moving Average: {}", ks.fifty_day_moving_average);
            }
        }
    }
    Ok(())
}

/// P/E ratio of each component of `^index`.
async fn index_pe(finance: &YFinance, index: &str, limit: usize) -> yfinance_etl::Result<()> {
    let symbol = if index.starts_with('^') {
        index.to_string()
    } else {
        format!("^{}", index)
    };
    let info = finance.index_components().symbol(&symbol).fetch().await?;

    let symbols: Vec<String> = info.components.iter().map(|c| c.symbol.clone()).collect();
    tracing::info!(
        "Fetching {} summaries, at most {} at a time",
        symbols.len(),
        limit
    );

    println!("Index {} Component Stock P/E Ratio:", symbol.to_uppercase());
    for (component, result) in finance.summary_quotes(&symbols, limit).await {
        match result {
            Ok(quote) => println!("{}: {}", quote.symbol, quote.pe_ratio),
            Err(e) => {
                tracing::warn!("{}: {}", component, e);
                println!("{}: N/A", component);
            }
        }
    }
    Ok(())
}

async fn join<T>(
    handle: tokio::task::JoinHandle<yfinance_etl::Result<T>>,
) -> yfinance_etl::Result<T> {
    handle.await.map_err(|e| YFinanceError::ProcessingError {
        message: format!("Request task failed: {}", e),
    })?
}
