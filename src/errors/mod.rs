//! Error taxonomy for the sprint metrics core.
//!
//! Every failure in validation, calculation or serialization is converted at its
//! origin into a [`StructuredError`] and returned, never raised.

mod recovery;

pub use recovery::*;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::validation::ValidationResult;

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const NETWORK_ERROR: &str = "NETWORK_ERROR";
    pub const FILE_SYSTEM_ERROR: &str = "FILE_SYSTEM_ERROR";
    pub const DATA_CORRUPTION: &str = "DATA_CORRUPTION";
    pub const CALCULATION_ERROR: &str = "CALCULATION_ERROR";
    pub const UNKNOWN_ERROR: &str = "UNKNOWN_ERROR";
}

/// Filesystem error codes recognised by [`StructuredError::file_system`].
pub mod fs_codes {
    pub const ENOENT: &str = "ENOENT";
    pub const EACCES: &str = "EACCES";
    pub const ENOSPC: &str = "ENOSPC";
}

/// Classification of a failure.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorType {
    Validation,
    Network,
    FileSystem,
    DataCorruption,
    Calculation,
    Unknown,
}

impl ErrorType {
    /// Get the error code for this error type.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorType::Validation => codes::VALIDATION_ERROR,
            ErrorType::Network => codes::NETWORK_ERROR,
            ErrorType::FileSystem => codes::FILE_SYSTEM_ERROR,
            ErrorType::DataCorruption => codes::DATA_CORRUPTION,
            ErrorType::Calculation => codes::CALCULATION_ERROR,
            ErrorType::Unknown => codes::UNKNOWN_ERROR,
        }
    }
}

/// How badly a failure affects the caller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// The single error shape crossing the core boundary.
///
/// Fields are private so a constructed error cannot be altered; use the
/// accessors to read it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StructuredError {
    #[serde(rename = "type")]
    error_type: ErrorType,
    severity: Severity,
    message: String,
    user_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    context: String,
    timestamp: String,
}

impl StructuredError {
    /// Create a structured error, stamping the current UTC time.
    pub fn new(
        error_type: ErrorType,
        severity: Severity,
        message: impl Into<String>,
        user_message: impl Into<String>,
        details: Option<serde_json::Value>,
        context: impl Into<String>,
    ) -> Self {
        let error = Self {
            error_type,
            severity,
            message: message.into(),
            user_message: user_message.into(),
            details,
            context: context.into(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };

        if error.severity >= Severity::High {
            tracing::error!(
                code = error.error_type.code(),
                context = %error.context,
                "{}",
                error.message
            );
        }

        error
    }

    /// Validation failure from a list of error messages.
    ///
    /// A single error is shown verbatim; several are bulleted under a prompt.
    pub fn validation(errors: &[String], context: impl Into<String>) -> Self {
        let user_message = match errors {
            [] => "Validation failed".to_string(),
            [single] => single.clone(),
            many => {
                let bullets: Vec<String> = many.iter().map(|e| format!("• {}", e)).collect();
                format!("Please fix the following issues:\n{}", bullets.join("\n"))
            }
        };

        Self::new(
            ErrorType::Validation,
            Severity::Medium,
            format!("Validation failed: {}", errors.join(", ")),
            user_message,
            Some(serde_json::json!({ "errors": errors })),
            context,
        )
    }

    /// Validation failure carrying the full result, including per-field messages.
    pub fn from_validation_result(result: &ValidationResult, context: impl Into<String>) -> Self {
        let base = Self::validation(&result.errors, context);
        Self {
            details: Some(serde_json::json!({
                "errors": result.errors,
                "fieldErrors": result.field_errors,
            })),
            ..base
        }
    }

    /// Transport-layer failure keyed by HTTP status.
    pub fn network(status: Option<u16>, message: impl Into<String>, context: impl Into<String>) -> Self {
        let (severity, user_message) = match status {
            Some(400) => (
                Severity::Medium,
                "Invalid request. Please check your input and try again.",
            ),
            Some(401) => (
                Severity::High,
                "Authentication required. Please log in and try again.",
            ),
            Some(500) => (
                Severity::High,
                "Server error. Please try again later.",
            ),
            _ => (
                Severity::Medium,
                "A network error occurred. Please check your connection and try again.",
            ),
        };

        Self::new(
            ErrorType::Network,
            severity,
            message,
            user_message,
            status.map(|s| serde_json::json!({ "status": s })),
            context,
        )
    }

    /// Storage-layer failure keyed by a POSIX-style error code.
    pub fn file_system(code: Option<&str>, message: impl Into<String>, context: impl Into<String>) -> Self {
        let (severity, user_message) = match code {
            Some(fs_codes::ENOENT) => (
                Severity::Low,
                "Data file not found. Starting with empty data.",
            ),
            Some(fs_codes::EACCES) => (
                Severity::Critical,
                "Permission denied. Please check file permissions.",
            ),
            Some(fs_codes::ENOSPC) => (
                Severity::Critical,
                "Not enough disk space. Please free up some space and try again.",
            ),
            _ => (
                Severity::Medium,
                "File operation failed. Please try again.",
            ),
        };

        Self::new(
            ErrorType::FileSystem,
            severity,
            message,
            user_message,
            code.map(|c| serde_json::json!({ "code": c })),
            context,
        )
    }

    /// Structurally invalid persisted or imported data.
    pub fn data_corruption(
        message: impl Into<String>,
        details: Option<serde_json::Value>,
        context: impl Into<String>,
    ) -> Self {
        Self::new(
            ErrorType::DataCorruption,
            Severity::High,
            message,
            "Data file appears to be corrupted. Using backup data if available.",
            details,
            context,
        )
    }

    /// Fault while deriving a computed value.
    pub fn calculation(
        message: impl Into<String>,
        details: Option<serde_json::Value>,
        context: impl Into<String>,
    ) -> Self {
        Self::new(
            ErrorType::Calculation,
            Severity::Medium,
            message,
            "There was an error calculating sprint metrics. Please check your input values.",
            details,
            context,
        )
    }

    /// Fallback for anything unclassified.
    pub fn unknown(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::new(
            ErrorType::Unknown,
            Severity::High,
            message,
            "An unexpected error occurred. Please try again.",
            None,
            context,
        )
    }

    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Internal, diagnostic message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Display-safe message.
    pub fn user_message(&self) -> &str {
        &self.user_message
    }

    pub fn details(&self) -> Option<&serde_json::Value> {
        self.details.as_ref()
    }

    /// Tag of the operation that failed.
    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Fill in the operation tag on an error that was converted without one.
    pub(crate) fn or_context(self, context: &str) -> Self {
        if self.context.is_empty() {
            Self {
                context: context.to_string(),
                ..self
            }
        } else {
            self
        }
    }
}

impl std::fmt::Display for StructuredError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_type.code(), self.message)
    }
}

impl std::error::Error for StructuredError {}

impl From<std::io::Error> for StructuredError {
    fn from(err: std::io::Error) -> Self {
        let code = match err.kind() {
            std::io::ErrorKind::NotFound => Some(fs_codes::ENOENT),
            std::io::ErrorKind::PermissionDenied => Some(fs_codes::EACCES),
            _ if err.raw_os_error() == Some(28) => Some(fs_codes::ENOSPC),
            _ => None,
        };
        tracing::warn!("File system error: {:?}", err);
        StructuredError::file_system(code, format!("File system error: {}", err), "")
    }
}

impl From<serde_json::Error> for StructuredError {
    fn from(err: serde_json::Error) -> Self {
        StructuredError::data_corruption(
            format!("Invalid JSON format: {}", err),
            Some(serde_json::json!({
                "reason": crate::serializer::reasons::SYNTAX,
                "line": err.line(),
                "column": err.column(),
            })),
            "",
        )
    }
}

impl From<ValidationResult> for StructuredError {
    fn from(result: ValidationResult) -> Self {
        StructuredError::from_validation_result(&result, "")
    }
}
