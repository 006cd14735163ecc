//! CSV and JSON serialization, file reading and the import pipelines.
//!
//! Import runs decode, the integrity sniff, entity validation and a full
//! metric recompute, in that order.

mod csv;
mod json;

pub use self::csv::*;
pub use self::json::*;

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::errors::StructuredError;
use crate::metrics::recompute_sprints;
use crate::models::{AppConfig, AppData, Sprint};
use crate::validation::{
    duplicate_sprint_ids, is_data_corrupted, validate_app_config, validate_sprint_form_data,
};

/// Values of the `reason` detail on decode failures.
pub mod reasons {
    /// Text is not parseable JSON.
    pub const SYNTAX: &str = "syntax";
    /// Required top-level keys are missing or the wrong kind.
    pub const STRUCTURE: &str = "structure";
    /// A field inside a record has the wrong type.
    pub const FIELD_TYPE: &str = "fieldType";
    /// CSV lacks a header or data rows.
    pub const FORMAT: &str = "format";
    /// A CSV row is shorter than the header.
    pub const COLUMNS: &str = "columns";
    /// A required CSV numeric cell failed to parse.
    pub const NUMERIC: &str = "numeric";
    /// The structural sniff failed.
    pub const INTEGRITY: &str = "integrity";
}

/// `{prefix}_{timestamp}.{ext}` with `:` and `.` in the timestamp replaced by `-`.
pub fn generate_filename(prefix: &str, extension: &str, at: DateTime<Utc>) -> String {
    let stamp = at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("{}_{}.{}", prefix, stamp, extension)
}

/// Read a whole file as UTF-8 text.
pub async fn read_file_content(path: impl AsRef<Path>) -> Result<String, StructuredError> {
    let path = path.as_ref();
    tokio::fs::read_to_string(path).await.map_err(|e| {
        StructuredError::from(e).or_context(&format!("read-file:{}", path.display()))
    })
}

/// Validate every sprint's inputs, collecting failures under the sprint's name.
fn validate_sprints(sprints: &[Sprint], context: &str) -> Result<(), StructuredError> {
    let mut errors = Vec::new();

    for sprint in sprints {
        let result = validate_sprint_form_data(
            &sprint.form_data(),
            sprint.working_hours,
            sprint.number_of_people as usize,
        );
        for error in result.errors {
            errors.push(format!("Sprint '{}': {}", sprint.sprint_name, error));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        tracing::warn!(context, errors = errors.len(), "Imported sprints rejected");
        Err(StructuredError::validation(&errors, context))
    }
}

/// Reject a dataset in which two sprints share an id.
fn ensure_unique_ids(sprints: &[Sprint], context: &str) -> Result<(), StructuredError> {
    let duplicates = duplicate_sprint_ids(sprints);
    if duplicates.is_empty() {
        return Ok(());
    }

    Err(StructuredError::data_corruption(
        format!("Duplicate sprint ids: {}", duplicates.join(", ")),
        Some(serde_json::json!({ "reason": reasons::INTEGRITY, "ids": duplicates })),
        context,
    ))
}

/// Import a JSON dataset: decode, sniff, validate, recompute.
pub fn import_json(text: &str) -> Result<AppData, StructuredError> {
    const CONTEXT: &str = "import-json";

    let value = parse_json_text(text)?;
    if is_data_corrupted(&value) {
        return Err(StructuredError::data_corruption(
            "Data integrity check failed",
            Some(serde_json::json!({ "reason": reasons::INTEGRITY })),
            CONTEXT,
        ));
    }

    let data = decode_json_value(value)?;
    ensure_unique_ids(&data.sprints, CONTEXT)?;

    let config_result = validate_app_config(&data.config);
    if !config_result.is_valid {
        return Err(StructuredError::from_validation_result(&config_result, CONTEXT));
    }
    validate_sprints(&data.sprints, CONTEXT)?;

    let sprints = recompute_sprints(&data.sprints, data.config.velocity_calculation_sprints);
    tracing::info!(sprints = sprints.len(), "Imported JSON dataset");
    Ok(AppData {
        sprints,
        config: data.config,
    })
}

/// Import CSV sprints: decode, validate, recompute using `config`'s window.
pub fn import_csv(text: &str, config: &AppConfig) -> Result<Vec<Sprint>, StructuredError> {
    const CONTEXT: &str = "import-csv";

    let decoded = decode_csv(text)?;
    ensure_unique_ids(&decoded, CONTEXT)?;
    validate_sprints(&decoded, CONTEXT)?;

    let sprints = recompute_sprints(&decoded, config.velocity_calculation_sprints);
    tracing::info!(sprints = sprints.len(), "Imported CSV sprints");
    Ok(sprints)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_generate_filename() {
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(
            generate_filename("sprint-data", "csv", at),
            "sprint-data_2024-01-15T10-30-00-000Z.csv"
        );
    }

    #[test]
    fn test_import_json_rejects_missing_ids() {
        let err = import_json(r#"{ "sprints": [{ "sprintName": "x" }], "config": {} }"#).unwrap_err();
        assert_eq!(err.error_type(), crate::errors::ErrorType::DataCorruption);
        assert_eq!(err.details().unwrap()["reason"], reasons::INTEGRITY);
    }

    #[test]
    fn test_import_csv_rejects_invalid_rows() {
        let text = format!(
            "{}\n\"S1\",10,2,52,30,5,9,25,0,25,30,83.3,0.48,0,\"a\",\"b\"",
            CSV_HEADERS.join(",")
        );
        let err = import_csv(&text, &AppConfig::default()).unwrap_err();
        assert_eq!(err.error_type(), crate::errors::ErrorType::Validation);
        assert!(err
            .user_message()
            .contains("Carry over points completed cannot exceed carry over total"));
    }

    #[test]
    fn test_import_csv_recomputes_metrics() {
        let text = format!(
            "{}\n\"S1\",10,2,52,30,5,3,0,0,25,0,0,0,0,\"2024-01-01T00:00:00.000Z\",\"2024-01-01T00:00:00.000Z\"",
            CSV_HEADERS.join(",")
        );
        let sprints = import_csv(&text, &AppConfig::default()).unwrap();
        assert_eq!(sprints[0].new_work_points, 25.0);
        assert_eq!(sprints[0].planned_points, 30.0);
        assert_eq!(sprints[0].velocity, 25.0 / 52.0);
    }

    #[test]
    fn test_import_json_rejects_duplicate_ids() {
        let sprint = |name: &str| {
            serde_json::json!({
                "id": "dup",
                "sprintName": name,
                "businessDays": 10,
                "numberOfPeople": 1,
                "workingHours": 52,
                "totalPointsInSprint": 30,
                "carryOverPointsTotal": 5,
                "carryOverPointsCompleted": 3,
                "newWorkPoints": 25,
                "unplannedPointsBroughtIn": 0,
                "pointsCompleted": 25,
                "plannedPoints": 30,
                "percentComplete": 0,
                "velocity": 0,
                "predictedCapacity": 0,
                "createdAt": "2024-01-01T00:00:00.000Z",
                "updatedAt": "2024-01-01T00:00:00.000Z"
            })
        };
        let text = serde_json::json!({
            "sprints": [sprint("S1"), sprint("S2")],
            "config": { "velocityCalculationSprints": 6, "defaultMeetingPercentage": 20 }
        })
        .to_string();

        let err = import_json(&text).unwrap_err();
        assert_eq!(err.error_type(), crate::errors::ErrorType::DataCorruption);
        assert_eq!(err.details().unwrap()["reason"], reasons::INTEGRITY);
        assert_eq!(err.details().unwrap()["ids"][0], "dup");
    }

    #[test]
    fn test_import_csv_rejects_duplicate_ids() {
        let row = "\"S1\",10,1,52,30,5,3,0,0,25,0,0,0,0,\"2024-01-01T00:00:00.000Z\",\"2024-01-01T00:00:00.000Z\",\"dup\"";
        let text = format!("{},ID\n{}\n{}", CSV_HEADERS.join(","), row, row);

        let err = import_csv(&text, &AppConfig::default()).unwrap_err();
        assert_eq!(err.details().unwrap()["reason"], reasons::INTEGRITY);
        assert!(err.message().contains("Duplicate sprint ids: dup"));
    }

    #[tokio::test]
    async fn test_read_missing_file_is_low_severity() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = read_file_content(dir.path().join("absent.json"))
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), crate::errors::ErrorType::FileSystem);
        assert_eq!(err.severity(), crate::errors::Severity::Low);
        assert!(err.context().starts_with("read-file:"));
    }
}
