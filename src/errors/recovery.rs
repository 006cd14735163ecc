//! Recovery advice, display formatting and the error-handling seam.

use std::future::Future;
use std::panic::{self, AssertUnwindSafe};

use serde::Serialize;

use super::{ErrorType, Severity, StructuredError};
use crate::models::{AppConfig, AppData};

/// What a caller can do after a failure.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRecovery {
    pub can_recover: bool,
    pub suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_data: Option<AppData>,
}

/// Presentation-ready view of an error.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayError {
    pub title: &'static str,
    pub message: String,
    pub severity: Severity,
    pub can_retry: bool,
}

/// Result envelope returned by [`with_error_handling`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResult<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<StructuredError>,
}

impl<T: Serialize> OperationResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: StructuredError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }

    /// Convert the envelope back into a plain `Result`.
    pub fn into_result(self) -> Result<T, StructuredError> {
        match (self.data, self.error) {
            (Some(data), _) => Ok(data),
            (None, Some(error)) => Err(error),
            (None, None) => Err(StructuredError::unknown(
                "Operation produced neither data nor error",
                "",
            )),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Decide whether and how a caller can recover from `error`.
///
/// `defaults` supplies the configuration placed in any fallback dataset.
pub fn get_error_recovery(error: &StructuredError, defaults: &AppConfig) -> ErrorRecovery {
    match error.error_type() {
        ErrorType::Validation => ErrorRecovery {
            can_recover: true,
            suggestions: strings(&[
                "Please correct the highlighted fields",
                "Check that all required fields are filled",
            ]),
            fallback_data: None,
        },
        ErrorType::Network => ErrorRecovery {
            can_recover: true,
            suggestions: strings(&[
                "Check your internet connection",
                "Try again in a few moments",
            ]),
            fallback_data: None,
        },
        ErrorType::DataCorruption => ErrorRecovery {
            can_recover: true,
            suggestions: strings(&[
                "The application will start with empty data",
                "Import a previously exported backup to restore your sprints",
            ]),
            fallback_data: Some(AppData::empty(defaults.clone())),
        },
        ErrorType::FileSystem if error.severity() == Severity::Critical => ErrorRecovery {
            can_recover: false,
            suggestions: strings(&[
                "Check file permissions for the data directory",
                "Make sure there is enough free disk space",
            ]),
            fallback_data: None,
        },
        ErrorType::FileSystem => ErrorRecovery {
            can_recover: true,
            suggestions: strings(&["A new data file will be created on the next save"]),
            fallback_data: Some(AppData::empty(defaults.clone())),
        },
        ErrorType::Calculation => ErrorRecovery {
            can_recover: true,
            suggestions: strings(&[
                "Check that point values are consistent",
                "Make sure working hours are greater than zero",
            ]),
            fallback_data: None,
        },
        ErrorType::Unknown => ErrorRecovery {
            can_recover: false,
            suggestions: strings(&["Try the operation again", "Restart the application"]),
            fallback_data: None,
        },
    }
}

/// Map an error onto a title and retry affordance for display.
pub fn format_error_for_display(error: &StructuredError) -> DisplayError {
    let title = match error.severity() {
        Severity::Low => "Notice",
        Severity::Medium => "Warning",
        Severity::High => "Error",
        Severity::Critical => "Critical Error",
    };

    DisplayError {
        title,
        message: error.user_message().to_string(),
        severity: error.severity(),
        can_retry: error.severity() != Severity::Critical,
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "operation panicked".to_string()
    }
}

fn finish<T: Serialize>(
    error: StructuredError,
    context: &str,
    on_error: Option<&dyn Fn(&StructuredError)>,
) -> OperationResult<T> {
    let error = error.or_context(context);
    tracing::warn!(context, "{}", error);
    if let Some(callback) = on_error {
        callback(&error);
    }
    OperationResult::err(error)
}

/// Run `operation`, classifying any failure (including a panic) as a
/// [`StructuredError`] tagged with `context`.
pub fn with_error_handling<T, E, F>(
    operation: F,
    context: &str,
    on_error: Option<&dyn Fn(&StructuredError)>,
) -> OperationResult<T>
where
    T: Serialize,
    E: Into<StructuredError>,
    F: FnOnce() -> Result<T, E>,
{
    match panic::catch_unwind(AssertUnwindSafe(operation)) {
        Ok(Ok(data)) => OperationResult::ok(data),
        Ok(Err(err)) => finish(err.into(), context, on_error),
        Err(payload) => finish(
            StructuredError::unknown(panic_message(payload.as_ref()), context),
            context,
            on_error,
        ),
    }
}

/// Async counterpart of [`with_error_handling`] for the file-read boundary.
pub async fn with_error_handling_async<T, E, Fut>(
    operation: Fut,
    context: &str,
    on_error: Option<&(dyn Fn(&StructuredError) + Sync)>,
) -> OperationResult<T>
where
    T: Serialize,
    E: Into<StructuredError>,
    Fut: Future<Output = Result<T, E>>,
{
    match operation.await {
        Ok(data) => OperationResult::ok(data),
        Err(err) => {
            let error = err.into().or_context(context);
            tracing::warn!(context, "{}", error);
            if let Some(callback) = on_error {
                callback(&error);
            }
            OperationResult::err(error)
        }
    }
}
