//! Sprint Metrics command-line driver
//!
//! Thin wrapper over the library: reads the dataset, runs it through import,
//! and prints, exports or forecasts.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sprint_metrics::config::Config;
use sprint_metrics::errors::{
    format_error_for_display, get_error_recovery, with_error_handling, with_error_handling_async,
};
use sprint_metrics::serializer::{
    encode_csv, encode_json, generate_filename, import_csv, import_json, read_file_content,
};
use sprint_metrics::validation::{validate_numeric_field, NumericRules};
use sprint_metrics::{AppConfig, AppData, Severity, StructuredError};

#[derive(Debug, Parser)]
#[command(name = "sprint-metrics", version, about = "Validate, forecast and export sprint data")]
struct Cli {
    /// Path to the JSON dataset (defaults to SPRINT_DATA_PATH)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Integrity-check and validate the dataset
    Validate,
    /// Write the dataset to a timestamped export file
    Export {
        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
        /// Output directory (defaults to SPRINT_EXPORT_DIR)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Import a CSV or JSON file and print the resulting dataset
    Import { file: PathBuf },
    /// Forecast capacity for an upcoming sprint
    Forecast {
        /// Working hours planned for the upcoming sprint
        #[arg(long)]
        hours: f64,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let (text_layer, json_layer) = if config.log_json {
        (
            None,
            Some(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)),
        )
    } else {
        (
            Some(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
            None,
        )
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(text_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    tracing::debug!("Data path: {:?}", cli.data.as_ref().unwrap_or(&config.data_path));

    match run(cli, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let display = format_error_for_display(&error);
            eprintln!("{}: {}", display.title, display.message);
            let recovery = get_error_recovery(&error, &config.default_app_config());
            for suggestion in recovery.suggestions {
                eprintln!("  - {}", suggestion);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: &Config) -> Result<(), StructuredError> {
    let data_path = cli.data.unwrap_or_else(|| config.data_path.clone());
    let defaults = config.default_app_config();

    match cli.command {
        Command::Validate => {
            let data = load_dataset(&data_path, &defaults).await?;
            println!(
                "OK: {} sprints, {} team members, velocity window {}",
                data.sprints.len(),
                data.config.team_members.len(),
                data.config.velocity_calculation_sprints
            );
        }
        Command::Export { format, out } => {
            let data = load_dataset(&data_path, &defaults).await?;
            let text = match format {
                ExportFormat::Csv => encode_csv(&data.sprints),
                ExportFormat::Json => encode_json(&data)?,
            };

            let dir = out.unwrap_or_else(|| config.export_dir.clone());
            tokio::fs::create_dir_all(&dir).await?;
            let path = dir.join(generate_filename("sprint-data", format.extension(), Utc::now()));
            tokio::fs::write(&path, text).await?;

            tracing::info!("Exported {} sprints to {:?}", data.sprints.len(), path);
            println!("{}", path.display());
        }
        Command::Import { file } => {
            let text = read_file_content(&file).await?;
            let is_csv = file
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

            let data = with_error_handling(
                || -> Result<AppData, StructuredError> {
                    if is_csv {
                        Ok(AppData {
                            sprints: import_csv(&text, &defaults)?,
                            config: defaults.clone(),
                        })
                    } else {
                        import_json(&text)
                    }
                },
                "import",
                None,
            )
            .into_result()?;

            println!("{}", encode_json(&data)?);
        }
        Command::Forecast { hours } => {
            let rules = NumericRules::non_negative(None);
            if let Some(message) = validate_numeric_field(hours, "Hours", &rules) {
                return Err(StructuredError::validation(&[message], "forecast"));
            }

            let data = load_dataset(&data_path, &defaults).await?;
            println!("{:.1}", data.forecast(hours));
        }
    }

    Ok(())
}

/// Read and import the dataset, falling back to an empty one when the file is
/// missing.
async fn load_dataset(path: &Path, defaults: &AppConfig) -> Result<AppData, StructuredError> {
    let read = with_error_handling_async(read_file_content(path), "load-dataset", None).await;

    let text = match read.into_result() {
        Ok(text) => text,
        Err(error) if error.severity() == Severity::Low => {
            let recovery = get_error_recovery(&error, defaults);
            return match recovery.fallback_data {
                Some(fallback) => {
                    tracing::warn!("Data file {:?} not found, starting with empty data", path);
                    Ok(fallback)
                }
                None => Err(error),
            };
        }
        Err(error) => return Err(error),
    };

    with_error_handling(|| import_json(&text), "load-dataset", None).into_result()
}
