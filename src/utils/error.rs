use thiserror::Error;

/// 錯誤分類，用於日誌與退出碼判斷
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Upstream,
    Configuration,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Error, Debug)]
pub enum ExplorerError {
    #[error("Upstream returned an unexpected format (status {status}) from {url}: {preview}")]
    UpstreamFormatError {
        status: u16,
        url: String,
        preview: String,
    },

    #[error("Upstream request failed: {message}")]
    UpstreamRequestError {
        message: String,
        status: Option<u16>,
    },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

impl ExplorerError {
    /// 建立上游請求錯誤
    pub fn upstream(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::UpstreamRequestError {
            message: message.into(),
            status,
        }
    }

    /// 上游回應的 HTTP 狀態碼（若有）
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::UpstreamFormatError { status, .. } => Some(*status),
            Self::UpstreamRequestError { status, .. } => *status,
            _ => None,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UpstreamFormatError { .. } | Self::UpstreamRequestError { .. } => {
                ErrorCategory::Upstream
            }
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
            Self::CsvError(_) => ErrorCategory::Data,
            Self::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Upstream => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::UpstreamFormatError { .. } => {
                "Check that the endpoint points at the predictions API and not a proxy or HTML page"
            }
            Self::UpstreamRequestError { .. } => {
                "Check the upstream service and apply the filters again"
            }
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => "Fix the configuration file or command line flags",
            Self::CsvError(_) | Self::IoError(_) => "Check the export path and its permissions",
        }
    }

    /// 給使用者看的簡短訊息
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::UpstreamFormatError {
                status,
                url,
                preview,
            } => format!(
                "Upstream returned an unexpected format (HTTP {}) from {}. Body preview: {}",
                status, url, preview
            ),
            Self::UpstreamRequestError {
                message,
                status: Some(status),
            } => format!("Upstream request failed (HTTP {}): {}", status, message),
            Self::UpstreamRequestError { message, .. } => {
                format!("Upstream request failed: {}", message)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ExplorerError>;
