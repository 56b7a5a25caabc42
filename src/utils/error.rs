use thiserror::Error;

#[derive(Error, Debug)]
pub enum GrabError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("WebDriver error: {0}")]
    WebDriverError(#[from] thirtyfour::error::WebDriverError),

    #[error("Spreadsheet read error: {0}")]
    SpreadsheetReadError(#[from] calamine::XlsxError),

    #[error("Spreadsheet write error: {0}")]
    SpreadsheetWriteError(#[from] rust_xlsxwriter::XlsxError),

    #[error("Scraping error: {message}")]
    ScrapeError { message: String },

    #[error("Export error: {message}")]
    ExportError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Automation,
    Data,
    Configuration,
    System,
}

impl GrabError {
    pub fn scrape(message: impl Into<String>) -> Self {
        GrabError::ScrapeError {
            message: message.into(),
        }
    }

    pub fn export(message: impl Into<String>) -> Self {
        GrabError::ExportError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            GrabError::HttpError(_) => ErrorCategory::Network,
            GrabError::WebDriverError(_) | GrabError::ScrapeError { .. } => {
                ErrorCategory::Automation
            }
            GrabError::CsvError(_)
            | GrabError::SerializationError(_)
            | GrabError::SpreadsheetReadError(_)
            | GrabError::SpreadsheetWriteError(_)
            | GrabError::ExportError { .. }
            | GrabError::ValidationError { .. } => ErrorCategory::Data,
            GrabError::ConfigValidationError { .. }
            | GrabError::InvalidConfigValueError { .. }
            | GrabError::MissingConfigError { .. } => ErrorCategory::Configuration,
            GrabError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            GrabError::HttpError(_)
            | GrabError::WebDriverError(_)
            | GrabError::ScrapeError { .. } => ErrorSeverity::Medium,
            GrabError::ConfigValidationError { .. }
            | GrabError::InvalidConfigValueError { .. }
            | GrabError::MissingConfigError { .. } => ErrorSeverity::High,
            GrabError::IoError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            GrabError::HttpError(_) => {
                "Check network connectivity and that the target site is reachable".to_string()
            }
            GrabError::WebDriverError(_) => {
                "Ensure chromedriver is running at the configured WebDriver URL and that \
                 CHROME_BIN points to a valid Chromium binary"
                    .to_string()
            }
            GrabError::ScrapeError { .. } => {
                "The page layout may have changed; inspect the saved debug HTML under \
                 downloads/html_debug"
                    .to_string()
            }
            GrabError::CsvError(_) | GrabError::SpreadsheetReadError(_) => {
                "Verify the input file is a valid export from a supported platform".to_string()
            }
            GrabError::SpreadsheetWriteError(_) | GrabError::ExportError { .. } => {
                "Check that the downloads directory exists and is writable".to_string()
            }
            GrabError::ConfigValidationError { .. }
            | GrabError::InvalidConfigValueError { .. }
            | GrabError::MissingConfigError { .. } => {
                "Review the command-line flags and configuration file values".to_string()
            }
            GrabError::IoError(_) => "Check file permissions and available disk space".to_string(),
            _ => "Re-run with --verbose for detailed logs".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            GrabError::HttpError(e) => format!("A network request failed: {}", e),
            GrabError::WebDriverError(e) => format!("Browser automation failed: {}", e),
            GrabError::ScrapeError { message } => format!("Scraping failed: {}", message),
            GrabError::ExportError { message } => format!("Export failed: {}", message),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GrabError>;
