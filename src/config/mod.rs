//! Runtime configuration.
//!
//! Loaded from environment variables (and an optional `.env` file) with
//! sensible defaults.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::models::{AppConfig, DEFAULT_MEETING_PERCENTAGE, DEFAULT_VELOCITY_CALCULATION_SPRINTS};
use crate::validation::validate_app_config;

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the JSON dataset
    pub data_path: PathBuf,
    /// Directory export files are written to
    pub export_dir: PathBuf,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit logs as JSON lines instead of human-readable text
    pub log_json: bool,
    /// Default rolling window for forecasts
    pub velocity_window: u32,
    /// Default meeting percentage for new team members
    pub meeting_percentage: f64,
}

/// Parse an environment variable, falling back to `default` when unset or invalid.
fn parse_var<T: FromStr + Copy + std::fmt::Display>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid {} value {:?}, using {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}

/// Keep the configured window and meeting percentage only if they form valid
/// settings; otherwise fall back to the built-in defaults.
fn checked_defaults(velocity_window: u32, meeting_percentage: f64) -> (u32, f64) {
    let candidate = AppConfig::with_defaults(velocity_window, meeting_percentage);
    let result = validate_app_config(&candidate);
    if result.is_valid {
        return (velocity_window, meeting_percentage);
    }

    tracing::warn!(
        "Invalid default settings ({}), using {} / {}",
        result.errors.join("; "),
        DEFAULT_VELOCITY_CALCULATION_SPRINTS,
        DEFAULT_MEETING_PERCENTAGE
    );
    (DEFAULT_VELOCITY_CALCULATION_SPRINTS, DEFAULT_MEETING_PERCENTAGE)
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let data_path = env::var("SPRINT_DATA_PATH")
            .unwrap_or_else(|_| "./data/sprint-data.json".to_string())
            .into();

        let export_dir = env::var("SPRINT_EXPORT_DIR")
            .unwrap_or_else(|_| "./exports".to_string())
            .into();

        let log_level = env::var("SPRINT_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_json = env::var("SPRINT_LOG_FORMAT")
            .map(|f| f.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let (velocity_window, meeting_percentage) = checked_defaults(
            parse_var("SPRINT_VELOCITY_WINDOW", DEFAULT_VELOCITY_CALCULATION_SPRINTS),
            parse_var("SPRINT_MEETING_PERCENTAGE", DEFAULT_MEETING_PERCENTAGE),
        );

        Self {
            data_path,
            export_dir,
            log_level,
            log_json,
            velocity_window,
            meeting_percentage,
        }
    }

    /// Settings used when no dataset exists yet or a fallback is needed.
    pub fn default_app_config(&self) -> AppConfig {
        AppConfig::with_defaults(self.velocity_window, self.meeting_percentage)
    }
}
