use thiserror::Error;

#[derive(Error, Debug)]
pub enum FxError {
    #[error("Rate fetch failed: {message}")]
    FetchError { message: String },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Currency {target} is not quoted against {base}")]
    UnknownCurrencyError { base: String, target: String },

    #[error("Invalid currency code: '{value}'")]
    InvalidCurrencyCode { value: String },

    #[error("No currency picker is open")]
    NoPickerOpen,

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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Lookup,
    Input,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl FxError {
    pub fn fetch(message: impl Into<String>) -> Self {
        FxError::FetchError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            FxError::FetchError { .. } | FxError::HttpError(_) => ErrorCategory::Network,
            FxError::UnknownCurrencyError { .. } => ErrorCategory::Lookup,
            FxError::InvalidCurrencyCode { .. } | FxError::NoPickerOpen => ErrorCategory::Input,
            FxError::ConfigError { .. }
            | FxError::ConfigValidationError { .. }
            | FxError::InvalidConfigValueError { .. }
            | FxError::MissingConfigError { .. } => ErrorCategory::Configuration,
            FxError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Lookup | ErrorCategory::Input => ErrorSeverity::Low,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 下一次請求會重新抓取，不需要重啟
    pub fn is_retryable(&self) -> bool {
        self.category() == ErrorCategory::Network
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            FxError::FetchError { .. } | FxError::HttpError(_) => "Rate unavailable".to_string(),
            FxError::UnknownCurrencyError { base, target } => {
                format!("No exchange rate from {} to {}", base, target)
            }
            FxError::InvalidCurrencyCode { value } => {
                format!("'{}' is not a valid currency code", value)
            }
            FxError::NoPickerOpen => "Choose base or target before picking a currency".to_string(),
            FxError::ConfigError { .. }
            | FxError::ConfigValidationError { .. }
            | FxError::InvalidConfigValueError { .. }
            | FxError::MissingConfigError { .. } => format!("Configuration problem: {}", self),
            FxError::IoError(_) => format!("Internal error: {}", self),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            FxError::FetchError { .. } | FxError::HttpError(_) => {
                "Check the network connection and API key, then try again"
            }
            FxError::UnknownCurrencyError { .. } => "Pick a target currency from the list",
            FxError::InvalidCurrencyCode { .. } => "Use a code such as USD or EUR",
            FxError::NoPickerOpen => "Open the base or target picker first",
            FxError::MissingConfigError { .. } => "Provide the missing value via flag, env or config file",
            FxError::ConfigError { .. }
            | FxError::ConfigValidationError { .. }
            | FxError::InvalidConfigValueError { .. } => "Fix the configuration and run again",
            FxError::IoError(_) => "Check file paths and permissions",
        }
    }
}

pub type Result<T> = std::result::Result<T, FxError>;
