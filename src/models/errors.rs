//! Centralized Error Handling Module
//!
//! Every failure carries a unique error code so provider problems can be
//! told apart in logs without parsing messages.
//!
//! Error codes follow pattern: CATEGORY_SPECIFIC_ERROR
//! - PROVIDER_xxx: data provider errors
//! - CFG_xxx: configuration / setup errors
//! - INPUT_xxx: caller input errors

use std::fmt;

/// Application-wide error type
#[derive(Debug)]
pub struct AppError {
    /// Unique error code for logging/monitoring
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Optional underlying error
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new AppError
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create AppError with source error
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get error code as string (for logging)
    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }

    /// Shortcut for `self.code.is_rate_limited()`
    pub fn is_rate_limited(&self) -> bool {
        self.code.is_rate_limited()
    }

    /// Setup errors abort an analysis; everything else is recoverable per node
    pub fn is_fatal(&self) -> bool {
        self.code.is_setup()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Unique error codes for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // ============================================
    // Provider Errors (1xx)
    // ============================================
    /// Connection to the explorer failed
    ProviderConnectionFailed,
    /// Explorer request timed out
    ProviderTimeout,
    /// Explorer rate limited us (HTTP 429 or rate-limit message)
    ProviderRateLimited,
    /// Explorer returned a 5xx status
    ProviderHttpError,
    /// Explorer rejected the request (4xx other than 429)
    ProviderClientError,
    /// Explorer returned something we could not parse
    ProviderInvalidResponse,
    /// Explorer reported an API-level error
    ProviderApiError,

    // ============================================
    // Configuration / Setup Errors (4xx)
    // ============================================
    /// No provider registered for the requested chain
    ProviderNotConfigured,
    /// Chain exists but is not enabled yet
    ChainDisabled,
    /// Unknown chain name or id
    ChainUnsupported,
    /// Missing API key
    ConfigMissingApiKey,
    /// Invalid configuration value
    ConfigInvalidValue,

    // ============================================
    // Input Errors (5xx)
    // ============================================
    /// Malformed wallet address
    InvalidAddress,
    /// Request shape is invalid (e.g. too few wallets to compare)
    InvalidInput,

    // ============================================
    // Generic Errors (9xx)
    // ============================================
    /// Unknown error
    Unknown,
}

impl ErrorCode {
    /// Get string representation of error code
    pub fn as_str(&self) -> &'static str {
        match self {
            // Provider Errors
            Self::ProviderConnectionFailed => "PROVIDER_CONNECTION_FAILED",
            Self::ProviderTimeout => "PROVIDER_TIMEOUT",
            Self::ProviderRateLimited => "PROVIDER_RATE_LIMITED",
            Self::ProviderHttpError => "PROVIDER_HTTP_ERROR",
            Self::ProviderClientError => "PROVIDER_CLIENT_ERROR",
            Self::ProviderInvalidResponse => "PROVIDER_INVALID_RESPONSE",
            Self::ProviderApiError => "PROVIDER_API_ERROR",

            // Setup Errors
            Self::ProviderNotConfigured => "PROVIDER_NOT_CONFIGURED",
            Self::ChainDisabled => "CFG_CHAIN_DISABLED",
            Self::ChainUnsupported => "CFG_UNSUPPORTED_CHAIN",
            Self::ConfigMissingApiKey => "CFG_MISSING_API_KEY",
            Self::ConfigInvalidValue => "CFG_INVALID_VALUE",

            // Input Errors
            Self::InvalidAddress => "INPUT_INVALID_ADDRESS",
            Self::InvalidInput => "INPUT_INVALID",

            // Generic
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Setup errors are surfaced to the caller immediately
    pub fn is_setup(&self) -> bool {
        matches!(
            self,
            Self::ProviderNotConfigured
                | Self::ChainDisabled
                | Self::ChainUnsupported
                | Self::ConfigMissingApiKey
                | Self::ConfigInvalidValue
                | Self::InvalidAddress
                | Self::InvalidInput
        )
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ProviderTimeout
                | Self::ProviderRateLimited
                | Self::ProviderConnectionFailed
                | Self::ProviderHttpError
        )
    }

    /// HTTP 429 class
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::ProviderRateLimited)
    }
}

// ============================================
// Convenience constructors
// ============================================

impl AppError {
    /// Provider rate limited
    pub fn rate_limited() -> Self {
        Self::new(ErrorCode::ProviderRateLimited, "Rate limited (HTTP 429)")
    }

    /// Provider connection failed
    pub fn connection_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ProviderConnectionFailed, msg)
    }

    /// Provider returned an error payload
    pub fn provider_api(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ProviderApiError, msg)
    }

    /// Provider response could not be parsed
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ProviderInvalidResponse, msg)
    }

    /// Non-success HTTP status
    pub fn http_status(status: u16) -> Self {
        match status {
            429 => Self::rate_limited(),
            400..=499 => Self::new(
                ErrorCode::ProviderClientError,
                format!("HTTP error: {}", status),
            ),
            _ => Self::new(ErrorCode::ProviderHttpError, format!("HTTP error: {}", status)),
        }
    }

    /// No provider for the chain
    pub fn provider_not_configured(chain: &str) -> Self {
        Self::new(
            ErrorCode::ProviderNotConfigured,
            format!("No provider configured for {}. Please add your API key.", chain),
        )
    }

    /// Chain known but disabled
    pub fn chain_disabled(chain: &str) -> Self {
        Self::new(ErrorCode::ChainDisabled, format!("{} is coming soon", chain))
    }

    /// Unsupported chain
    pub fn unsupported_chain(chain: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::ChainUnsupported,
            format!("Unsupported chain: {}", chain),
        )
    }

    /// Missing API key
    pub fn missing_api_key(key_name: &str) -> Self {
        Self::new(
            ErrorCode::ConfigMissingApiKey,
            format!("Missing API key: {}", key_name),
        )
    }

    /// Invalid wallet address
    pub fn invalid_address(address: &str) -> Self {
        Self::new(
            ErrorCode::InvalidAddress,
            format!("Invalid address: {}", address),
        )
    }

    /// Invalid request
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, msg)
    }
}

// ============================================
// Result type alias
// ============================================

/// Application Result type
pub type AppResult<T> = Result<T, AppError>;

// ============================================
// Conversion from common error types
// ============================================

impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        Self::new(ErrorCode::Unknown, err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::new(ErrorCode::ProviderTimeout, "Request timeout")
        } else if err.is_connect() {
            Self::new(ErrorCode::ProviderConnectionFailed, "Connection failed")
        } else if let Some(status) = err.status() {
            Self::http_status(status.as_u16())
        } else {
            Self::new(ErrorCode::Unknown, err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorCode::ProviderInvalidResponse, "JSON parse error", err)
    }
}
