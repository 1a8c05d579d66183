use crate::config::ClientConfig;
use crate::domain::model::Interval;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{Result, YFinanceError};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_range, validate_symbol, Validate,
};
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

static ENV_VAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub client: ClientConfig,
    pub export: ExportConfig,
}

/// `[export]` table: what the export pipeline downloads and where it writes the archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub symbols: Vec<String>,
    pub output_path: String,
    pub archive_name: String,
    pub interval: Interval,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub concurrent_requests: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            symbols: Vec::new(),
            output_path: "./output".to_string(),
            archive_name: "quotes.zip".to_string(),
            interval: Interval::Daily,
            start_date: None,
            end_date: None,
            concurrent_requests: 4,
        }
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(YFinanceError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| YFinanceError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${YAHOO_QUOTE_HOST})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR_PATTERN
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.client.validate()?;
        self.export.validate()
    }
}

impl Validate for ExportConfig {
    fn validate(&self) -> Result<()> {
        validate_path("export.output_path", &self.output_path)?;
        validate_non_empty_string("export.archive_name", &self.archive_name)?;
        validate_range("export.concurrent_requests", self.concurrent_requests, 1, 32)?;

        for symbol in &self.symbols {
            validate_symbol(symbol)?;
        }

        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(YFinanceError::InvalidConfigValueError {
                    field: "export.start_date".to_string(),
                    value: start.to_string(),
                    reason: format!("Start date is after end date {}", end),
                });
            }
        }

        Ok(())
    }
}

impl ConfigProvider for ExportConfig {
    fn symbols(&self) -> &[String] {
        &self.symbols
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn archive_name(&self) -> &str {
        &self.archive_name
    }

    fn interval(&self) -> Interval {
        self.interval
    }

    fn start_date(&self) -> Option<NaiveDate> {
        self.start_date
    }

    fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    fn concurrent_requests(&self) -> usize {
        self.concurrent_requests
    }
}
