use thiserror::Error;

#[derive(Error, Debug)]
pub enum YFinanceError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Unsuccessful Status Code: {status} ({url})")]
    UnsuccessfulStatus { status: u16, url: String },

    #[error("Invalid symbol '{symbol}': {reason}")]
    InvalidSymbol { symbol: String, reason: String },

    #[error("Missing element #{index} of {section} (selector: {selector})")]
    MissingElement {
        section: String,
        selector: String,
        index: usize,
    },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Parsing,
    Configuration,
    Storage,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl YFinanceError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::HttpError(_) | Self::UnsuccessfulStatus { .. } => ErrorCategory::Network,
            Self::CsvError(_) | Self::MissingElement { .. } | Self::SerializationError(_) => {
                ErrorCategory::Parsing
            }
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::InvalidSymbol { .. } => ErrorCategory::Configuration,
            Self::IoError(_) | Self::ZipError(_) => ErrorCategory::Storage,
            Self::ProcessingError { .. } => ErrorCategory::Data,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::HttpError(_) | Self::UnsuccessfulStatus { .. } => ErrorSeverity::Medium,
            Self::IoError(_) | Self::ZipError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    /// Transient network failures and 429/5xx responses are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::HttpError(e) => e.is_timeout() || e.is_connect(),
            Self::UnsuccessfulStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::HttpError(e) if e.is_timeout() => {
                "Yahoo! Finance did not answer before the timeout".to_string()
            }
            Self::HttpError(_) => "Could not reach Yahoo! Finance".to_string(),
            Self::UnsuccessfulStatus { status, .. } => {
                format!("Yahoo! Finance answered with status {}", status)
            }
            Self::InvalidSymbol { symbol, reason } => {
                format!("Symbol '{}' cannot be used: {}", symbol, reason)
            }
            Self::MissingElement { section, .. } => format!(
                "The {} section was not found on the page; the page layout may have changed",
                section
            ),
            Self::CsvError(_) => "The downloaded quote data is not valid CSV".to_string(),
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => format!("Configuration problem: {}", self),
            Self::IoError(_) | Self::ZipError(_) => format!("Could not write output: {}", self),
            Self::SerializationError(_) => format!("Could not serialize output: {}", self),
            Self::ProcessingError { message } => message.clone(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network if self.is_retryable() => {
                "Check the network connection or raise --timeout-ms, then retry"
            }
            ErrorCategory::Network => "Check that the symbol exists on Yahoo! Finance",
            ErrorCategory::Parsing => "The page layout may have changed; try another symbol",
            ErrorCategory::Configuration => "Review the command-line flags and the TOML config",
            ErrorCategory::Storage => "Check that the output path exists and is writable",
            ErrorCategory::Data => "Check that the symbols have quote data for the date range",
        }
    }
}

pub type Result<T> = std::result::Result<T, YFinanceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_category_and_retry() {
        let err = YFinanceError::UnsuccessfulStatus {
            status: 503,
            url: "https://finance.yahoo.com/quote/GOOG".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Network);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert!(err.is_retryable());

        let not_found = YFinanceError::UnsuccessfulStatus {
            status: 404,
            url: "https://finance.yahoo.com/quote/NOPE".to_string(),
        };
        assert!(!not_found.is_retryable());
        assert!(not_found.user_friendly_message().contains("404"));
    }

    #[test]
    fn test_symbol_error_is_configuration() {
        let err = YFinanceError::InvalidSymbol {
            symbol: "FTSE".to_string(),
            reason: "index symbols start with '^'".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.to_string().contains("FTSE"));
    }
}
