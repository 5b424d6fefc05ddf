//! Structured Error Handling for fuzzy-dpi
//!
//! Provides a unified error type with:
//! - Error codes for programmatic handling
//! - Structured error responses (JSON-friendly)
//! - Context preservation through error chains
//! - HTTP status code mapping
//!
//! # Error Categories
//!
//! - Model errors (1xxx) - malformed fuzzy sets, bad rule text, dangling
//!   references. Raised while loading the model; fatal at startup.
//! - Validation errors (5xxx) - bad calculation input. Reported per request.
//! - Config errors (7xxx) - configuration files and environment overrides.
//! - Internal errors (9xxx)
//!
//! # Example
//!
//! ```rust
//! use fuzzy_dpi::error::{DpiError, ErrorCode};
//!
//! fn check_hours(hours: f64) -> Result<(), DpiError> {
//!     if !(0.0..=24.0).contains(&hours) {
//!         return Err(DpiError::out_of_range("focus_time", hours, 0.0, 24.0)
//!             .with_hint("Focus time is measured in hours per day"));
//!     }
//!     Ok(())
//! }
//!
//! assert_eq!(check_hours(30.0).unwrap_err().code, ErrorCode::OutOfRange);
//! ```

use std::collections::HashMap;
use std::fmt;
use serde::{Deserialize, Serialize};

// ============================================================================
// Error Codes
// ============================================================================

/// Unique error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Model errors (1xxx)
    /// Generic model error
    ModelError = 1000,
    /// Rule text could not be parsed
    InvalidRuleSyntax = 1001,
    /// Fuzzy set shape is malformed
    InvalidFuzzySet = 1002,
    /// Universe of discourse is malformed
    InvalidUniverse = 1003,
    /// Variable declared twice
    DuplicateVariable = 1004,
    /// Term declared twice within a variable
    DuplicateTerm = 1005,
    /// Rule id used twice
    DuplicateRuleId = 1006,
    /// Rule references an undeclared variable or term
    UnknownReference = 1007,
    /// Rule weight outside [0, 1]
    InvalidWeight = 1008,
    /// Model has no variables or no rules
    EmptyModel = 1009,

    // Validation errors (5xxx)
    /// Generic validation error
    ValidationError = 5000,
    /// Invalid format
    InvalidFormat = 5003,
    /// Missing required field
    MissingRequired = 5004,
    /// Invalid value
    InvalidValue = 5005,
    /// Value outside its declared range
    OutOfRange = 5006,

    // Config errors (7xxx)
    /// Generic config error
    ConfigError = 7000,
    /// Config file not found
    ConfigNotFound = 7001,
    /// Invalid config syntax
    InvalidConfigSyntax = 7002,
    /// Invalid config value
    InvalidConfigValue = 7004,

    // Internal errors (9xxx)
    /// Internal error
    InternalError = 9000,
}

impl ErrorCode {
    /// Get the numeric code value
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// Get a short description of the error code
    pub fn description(&self) -> &'static str {
        match self {
            // Model errors
            ErrorCode::ModelError => "Model error",
            ErrorCode::InvalidRuleSyntax => "Invalid rule syntax",
            ErrorCode::InvalidFuzzySet => "Invalid fuzzy set",
            ErrorCode::InvalidUniverse => "Invalid universe of discourse",
            ErrorCode::DuplicateVariable => "Duplicate variable",
            ErrorCode::DuplicateTerm => "Duplicate term",
            ErrorCode::DuplicateRuleId => "Duplicate rule id",
            ErrorCode::UnknownReference => "Unknown variable or term",
            ErrorCode::InvalidWeight => "Invalid rule weight",
            ErrorCode::EmptyModel => "Empty model",

            // Validation errors
            ErrorCode::ValidationError => "Validation error",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::MissingRequired => "Missing required field",
            ErrorCode::InvalidValue => "Invalid value",
            ErrorCode::OutOfRange => "Value out of range",

            // Config errors
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::ConfigNotFound => "Configuration file not found",
            ErrorCode::InvalidConfigSyntax => "Invalid configuration syntax",
            ErrorCode::InvalidConfigValue => "Invalid configuration value",

            // Internal errors
            ErrorCode::InternalError => "Internal error",
        }
    }

    /// Get the HTTP status code for this error
    pub fn http_status(&self) -> u16 {
        match self {
            // Validation errors -> 400 Bad Request
            ErrorCode::ValidationError
            | ErrorCode::InvalidFormat
            | ErrorCode::MissingRequired
            | ErrorCode::InvalidValue
            | ErrorCode::OutOfRange => 400,

            // Not found
            ErrorCode::ConfigNotFound => 404,

            // A broken model or config is a server-side fault
            ErrorCode::ModelError
            | ErrorCode::InvalidRuleSyntax
            | ErrorCode::InvalidFuzzySet
            | ErrorCode::InvalidUniverse
            | ErrorCode::DuplicateVariable
            | ErrorCode::DuplicateTerm
            | ErrorCode::DuplicateRuleId
            | ErrorCode::UnknownReference
            | ErrorCode::InvalidWeight
            | ErrorCode::EmptyModel
            | ErrorCode::ConfigError
            | ErrorCode::InvalidConfigSyntax
            | ErrorCode::InvalidConfigValue
            | ErrorCode::InternalError => 500,
        }
    }

    /// Whether this code belongs to the model (load-time) category
    pub fn is_model_error(&self) -> bool {
        (1000..2000).contains(&self.code())
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

// ============================================================================
// Error Context
// ============================================================================

/// Additional context information for an error
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Key-value pairs of context information
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub fields: HashMap<String, String>,
    /// Stack of error causes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
}

impl ErrorContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }
}

// ============================================================================
// Main Error Type
// ============================================================================

/// The main error type for fuzzy-dpi
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DpiError {
    /// Error code for programmatic handling
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Additional context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ErrorContext>,
    /// Hint for resolving the error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl DpiError {
    /// Create a new error with a code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
            hint: None,
        }
    }

    // ========================================================================
    // Factory methods for common error types
    // ========================================================================

    /// Create a model error
    pub fn model(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ModelError, message)
    }

    /// Create a reference error for an undeclared variable or term
    pub fn unknown_reference(variable: &str, term: Option<&str>) -> Self {
        let message = match term {
            Some(term) => format!("Unknown term '{}' for variable '{}'", term, variable),
            None => format!("Unknown variable '{}'", variable),
        };
        Self::new(ErrorCode::UnknownReference, message)
            .with_context("variable", variable)
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    /// Create a missing field error
    pub fn missing(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequired,
            format!("Missing required input '{}'", field),
        )
        .with_context("field", field)
    }

    /// Create an out of range error
    pub fn out_of_range(field: &str, value: f64, min: f64, max: f64) -> Self {
        Self::new(
            ErrorCode::OutOfRange,
            format!("{} must be between {} and {} (got {})", field, min, max, value),
        )
        .with_context("field", field)
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    // ========================================================================
    // Builder methods
    // ========================================================================

    /// Set the error code
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = code;
        self
    }

    /// Add context to the error
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::new);
        ctx.fields.insert(key.into(), value.into());
        self
    }

    /// Add a cause to the error chain
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::new);
        ctx.causes.push(cause.into());
        self
    }

    /// Add a hint for resolving the error
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Get the HTTP status code for this error
    pub fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    /// Check if this is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        let status = self.http_status();
        (400..500).contains(&status)
    }

    /// Check if this is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        let status = self.http_status();
        (500..600).contains(&status)
    }

    /// Look up a context field
    pub fn context_field(&self, key: &str) -> Option<&str> {
        self.context
            .as_ref()
            .and_then(|c| c.fields.get(key))
            .map(String::as_str)
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":"INTERNAL_ERROR","message":"{}"}}"#, self.message)
        })
    }
}

impl fmt::Display for DpiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)?;

        if let Some(ref ctx) = self.context {
            if !ctx.causes.is_empty() {
                write!(f, "\nCaused by:")?;
                for cause in &ctx.causes {
                    write!(f, "\n  - {}", cause)?;
                }
            }
        }

        if let Some(ref hint) = self.hint {
            write!(f, "\nHint: {}", hint)?;
        }

        Ok(())
    }
}

impl std::error::Error for DpiError {}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<std::io::Error> for DpiError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;
        let code = match err.kind() {
            ErrorKind::NotFound => ErrorCode::ConfigNotFound,
            _ => ErrorCode::InternalError,
        };
        DpiError::new(code, err.to_string())
    }
}

// ============================================================================
// Result type alias
// ============================================================================

/// A Result type using DpiError
pub type DpiResult<T> = Result<T, DpiError>;

// ============================================================================
// Error response for HTTP APIs
// ============================================================================

/// Failure body returned by the HTTP API.
///
/// `status` is always `"error"` so clients can tell it apart from the
/// `"success"` envelope without looking at the HTTP status line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always "error"
    pub status: String,
    /// Error code (string form)
    pub code: String,
    /// Numeric error code
    pub code_num: u32,
    /// Human-readable message
    pub detail: String,
    /// Additional details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, String>>,
    /// Hint for resolution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl From<&DpiError> for ErrorResponse {
    fn from(err: &DpiError) -> Self {
        Self {
            status: "error".to_string(),
            code: format!("{:?}", err.code),
            code_num: err.code.code(),
            detail: err.message.clone(),
            details: err.context.as_ref().map(|c| c.fields.clone()),
            hint: err.hint.clone(),
        }
    }
}

impl From<DpiError> for ErrorResponse {
    fn from(err: DpiError) -> Self {
        Self::from(&err)
    }
}

// ============================================================================
// Macros for convenient error creation
// ============================================================================

/// Bail out early with an error
#[macro_export]
macro_rules! dpi_bail {
    ($code:expr, $msg:expr) => {
        return Err($crate::error::DpiError::new($code, $msg))
    };
    ($code:expr, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::error::DpiError::new($code, format!($fmt, $($arg)*)))
    };
}

/// Ensure a condition holds, or return an error
#[macro_export]
macro_rules! dpi_ensure {
    ($cond:expr, $code:expr, $msg:expr) => {
        if !$cond {
            $crate::dpi_bail!($code, $msg);
        }
    };
    ($cond:expr, $code:expr, $fmt:expr, $($arg:tt)*) => {
        if !$cond {
            $crate::dpi_bail!($code, $fmt, $($arg)*);
        }
    };
}

// ============================================================================
// Tests
// ============================================================================
