//! JSON encoding and decoding of the full dataset.

use serde_json::Value;

use super::reasons;
use crate::errors::StructuredError;
use crate::models::{AppConfig, AppData, Sprint};

const CONTEXT: &str = "decode-json";

/// Pretty-print the dataset with 2-space indentation, `sprints` before `config`.
pub fn encode_json(data: &AppData) -> Result<String, StructuredError> {
    let text = serde_json::to_string_pretty(data).map_err(|e| {
        StructuredError::unknown(format!("Failed to serialize data: {}", e), "encode-json")
    })?;
    tracing::debug!(sprints = data.sprints.len(), "Encoded JSON");
    Ok(text)
}

/// Parse text into a JSON value, failing with a syntax-level error.
pub fn parse_json_text(text: &str) -> Result<Value, StructuredError> {
    serde_json::from_str(text).map_err(|e| {
        StructuredError::data_corruption(
            format!("Invalid JSON format: {}", e),
            Some(serde_json::json!({
                "reason": reasons::SYNTAX,
                "line": e.line(),
                "column": e.column(),
            })),
            CONTEXT,
        )
    })
}

fn structural(message: &str) -> StructuredError {
    StructuredError::data_corruption(
        message,
        Some(serde_json::json!({ "reason": reasons::STRUCTURE })),
        CONTEXT,
    )
}

/// Type an already-parsed value, checking the top-level shape first.
pub fn decode_json_value(value: Value) -> Result<AppData, StructuredError> {
    let Value::Object(mut object) = value else {
        return Err(structural("Missing or invalid sprints array"));
    };

    let sprints = match object.remove("sprints") {
        Some(sprints @ Value::Array(_)) => sprints,
        _ => return Err(structural("Missing or invalid sprints array")),
    };
    let config = match object.remove("config") {
        Some(config @ Value::Object(_)) => config,
        _ => return Err(structural("Missing or invalid config object")),
    };

    let sprints: Vec<Sprint> = serde_json::from_value(sprints).map_err(|e| {
        StructuredError::data_corruption(
            format!("Invalid sprint data: {}", e),
            Some(serde_json::json!({ "reason": reasons::FIELD_TYPE })),
            CONTEXT,
        )
    })?;
    let config: AppConfig = serde_json::from_value(config).map_err(|e| {
        StructuredError::data_corruption(
            format!("Invalid config data: {}", e),
            Some(serde_json::json!({ "reason": reasons::FIELD_TYPE })),
            CONTEXT,
        )
    })?;

    tracing::debug!(sprints = sprints.len(), "Decoded JSON");
    Ok(AppData { sprints, config })
}

/// Decode text produced by [`encode_json`].
///
/// Unparsable text, a bad top-level shape and badly typed fields fail with
/// distinct `reason` details.
pub fn decode_json(text: &str) -> Result<AppData, StructuredError> {
    decode_json_value(parse_json_text(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TeamMember;

    fn data() -> AppData {
        let sprint = Sprint {
            id: "3f1c".to_string(),
            sprint_name: "Sprint 12".to_string(),
            sprint_link: "https://tracker.example.com/12".to_string(),
            business_days: 9,
            number_of_people: 3,
            working_hours: 156.5,
            total_points_in_sprint: 42.0,
            carry_over_points_total: 6.0,
            carry_over_points_completed: 6.0,
            new_work_points: 36.0,
            unplanned_points_brought_in: 3.0,
            points_completed: 40.0,
            planned_points: 42.0,
            percent_complete: 40.0 / 42.0 * 100.0,
            velocity: 40.0 / 156.5,
            predicted_capacity: 37.123456789,
            created_at: "2024-02-01T09:00:00.000Z".to_string(),
            updated_at: "2024-02-02T09:00:00.000Z".to_string(),
        };
        AppData {
            sprints: vec![sprint],
            config: AppConfig {
                team_members: vec![TeamMember::new("Ada", 80.0, 4.0, 16.0, 0.5)],
                ..AppConfig::default()
            },
        }
    }

    #[test]
    fn test_round_trip() {
        let original = data();
        let decoded = decode_json(&encode_json(&original).unwrap()).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_pretty_print_and_key_order() {
        let text = encode_json(&data()).unwrap();
        assert!(text.starts_with("{\n  \"sprints\": ["));
        let sprints_at = text.find("\"sprints\"").unwrap();
        let config_at = text.find("\"config\"").unwrap();
        assert!(sprints_at < config_at);
        assert!(text.contains("\"velocityCalculationSprints\": 6"));
    }

    #[test]
    fn test_syntax_error() {
        let err = decode_json("{ not json").unwrap_err();
        assert!(err.message().starts_with("Invalid JSON format"));
        assert_eq!(err.details().unwrap()["reason"], reasons::SYNTAX);
    }

    #[test]
    fn test_missing_sprints() {
        let err = decode_json(r#"{ "config": {} }"#).unwrap_err();
        assert_eq!(err.message(), "Missing or invalid sprints array");
        assert_eq!(err.details().unwrap()["reason"], reasons::STRUCTURE);

        let err = decode_json(r#"{ "sprints": "nope", "config": {} }"#).unwrap_err();
        assert_eq!(err.message(), "Missing or invalid sprints array");
    }

    #[test]
    fn test_missing_config() {
        let err = decode_json(r#"{ "sprints": [] }"#).unwrap_err();
        assert_eq!(err.message(), "Missing or invalid config object");

        let err = decode_json(r#"{ "sprints": [], "config": [] }"#).unwrap_err();
        assert_eq!(err.message(), "Missing or invalid config object");
    }

    #[test]
    fn test_badly_typed_sprint() {
        let err = decode_json(
            r#"{ "sprints": [{ "id": "a", "sprintName": 5 }], "config": { "velocityCalculationSprints": 6, "defaultMeetingPercentage": 20 } }"#,
        )
        .unwrap_err();
        assert!(err.message().starts_with("Invalid sprint data"));
        assert_eq!(err.details().unwrap()["reason"], reasons::FIELD_TYPE);
    }
}
