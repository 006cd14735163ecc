//! Untyped input boundary.
//!
//! Raw form or import payloads arrive as `serde_json::Value`. Nothing typed is
//! handed back until every field has the right JSON type and passes validation.
//! Strings are never coerced into numbers.

use serde_json::{Map, Value};

use super::{validate_app_config, validate_numeric_field, validate_sprint_form_data};
use super::{validate_team_member, Collector, NumericRules, ValidationResult};
use super::{BUSINESS_DAYS_RULES, NUMBER_OF_PEOPLE_RULES, VELOCITY_WINDOW_RULES};
use crate::errors::StructuredError;
use crate::models::{AppConfig, SprintFormData, TeamMember};

/// Reads typed fields out of a JSON object, recording type mismatches.
struct FieldReader<'a> {
    object: &'a Map<String, Value>,
    collector: Collector,
}

impl<'a> FieldReader<'a> {
    fn new(object: &'a Map<String, Value>) -> Self {
        Self {
            object,
            collector: Collector::default(),
        }
    }

    /// Missing or null reads as empty.
    fn string(&mut self, key: &str, label: &str) -> String {
        match self.object.get(key) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(_) => {
                self.collector.fail(key, format!("{} must be text", label));
                String::new()
            }
        }
    }

    /// Missing or null reads as `NaN`.
    fn number(&mut self, key: &str, label: &str) -> f64 {
        match self.object.get(key) {
            None | Some(Value::Null) => f64::NAN,
            Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
            Some(_) => {
                self.collector.fail(key, format!("{} must be a number", label));
                f64::NAN
            }
        }
    }

    /// A whole-number field. Checked against `rules` before narrowing so
    /// messages match what the entity validator would report.
    fn count(&mut self, key: &str, label: &str, rules: &NumericRules) -> u32 {
        let raw = self.number(key, label);
        if self.collector.has_error(key) {
            return 0;
        }
        match validate_numeric_field(raw, label, rules) {
            Some(message) => {
                self.collector.fail(key, message);
                0
            }
            None if (0.0..=f64::from(u32::MAX)).contains(&raw) => raw as u32,
            None => {
                self.collector.fail(key, format!("{} is out of range", label));
                0
            }
        }
    }

    fn finish(self, entity: ValidationResult) -> ValidationResult {
        let mut collector = self.collector;
        collector.absorb_new(entity);
        collector.finish()
    }
}

fn expect_object<'a>(value: &'a Value, context: &str) -> Result<&'a Map<String, Value>, StructuredError> {
    value.as_object().ok_or_else(|| {
        StructuredError::validation(&["Invalid input: expected an object".to_string()], context)
    })
}

fn into_outcome<T>(value: T, result: ValidationResult, context: &str) -> Result<T, StructuredError> {
    if result.is_valid {
        Ok(value)
    } else {
        tracing::warn!(context, errors = result.errors.len(), "Rejected input");
        Err(StructuredError::from_validation_result(&result, context))
    }
}

fn read_member(reader: &mut FieldReader<'_>) -> TeamMember {
    TeamMember {
        name: reader.string("name", "Name"),
        total_gross_hours: reader.number("totalGrossHours", "Total gross hours"),
        on_call_hours: reader.number("onCallHours", "On-call hours"),
        meeting_hours: reader.number("meetingHours", "Meeting hours"),
        time_off_hours: reader.number("timeOffHours", "Time off hours"),
        net_hours: reader.number("netHours", "Net hours"),
    }
}

/// Validate and type an untyped team member payload.
pub fn parse_team_member(value: &Value) -> Result<TeamMember, StructuredError> {
    const CONTEXT: &str = "parse-team-member";
    let object = expect_object(value, CONTEXT)?;

    let mut reader = FieldReader::new(object);
    let member = read_member(&mut reader);
    let result = reader.finish(validate_team_member(&member));

    into_outcome(member, result, CONTEXT)
}

/// Validate and type an untyped sprint form payload.
pub fn parse_sprint_form(
    value: &Value,
    working_hours: f64,
    team_member_count: usize,
) -> Result<SprintFormData, StructuredError> {
    const CONTEXT: &str = "parse-sprint-form";
    let object = expect_object(value, CONTEXT)?;

    let mut reader = FieldReader::new(object);
    let form = SprintFormData {
        sprint_name: reader.string("sprintName", "Sprint name"),
        sprint_link: reader.string("sprintLink", "Sprint link"),
        business_days: reader.count("businessDays", "Business days", &BUSINESS_DAYS_RULES),
        number_of_people: reader.count(
            "numberOfPeople",
            "Number of people",
            &NUMBER_OF_PEOPLE_RULES,
        ),
        total_points_in_sprint: reader.number("totalPointsInSprint", "Total points in sprint"),
        carry_over_points_total: reader.number("carryOverPointsTotal", "Carry over points total"),
        carry_over_points_completed: reader
            .number("carryOverPointsCompleted", "Carry over points completed"),
        unplanned_points_brought_in: reader
            .number("unplannedPointsBroughtIn", "Unplanned points brought in"),
        points_completed: reader.number("pointsCompleted", "Points completed"),
    };
    let result = reader.finish(validate_sprint_form_data(
        &form,
        working_hours,
        team_member_count,
    ));

    into_outcome(form, result, CONTEXT)
}

/// Validate and type an untyped settings payload.
pub fn parse_app_config(value: &Value) -> Result<AppConfig, StructuredError> {
    const CONTEXT: &str = "parse-app-config";
    let object = expect_object(value, CONTEXT)?;

    let mut reader = FieldReader::new(object);
    let velocity_calculation_sprints = reader.count(
        "velocityCalculationSprints",
        "Velocity calculation sprints",
        &VELOCITY_WINDOW_RULES,
    );
    let default_meeting_percentage =
        reader.number("defaultMeetingPercentage", "Default meeting percentage");

    let mut team_members = Vec::new();
    match object.get("teamMembers") {
        None | Some(Value::Null) => {}
        Some(Value::Array(items)) => {
            for (index, item) in items.iter().enumerate() {
                match item.as_object() {
                    Some(member_object) => {
                        let mut member_reader = FieldReader::new(member_object);
                        let member = read_member(&mut member_reader);
                        let type_errors = member_reader.collector.finish();
                        reader.collector.absorb(
                            type_errors,
                            &format!("Team member {}: ", index + 1),
                            &format!("teamMembers[{}].", index),
                        );
                        team_members.push(member);
                    }
                    None => reader.collector.fail(
                        &format!("teamMembers[{}]", index),
                        format!("Team member {} must be an object", index + 1),
                    ),
                }
            }
        }
        Some(_) => reader
            .collector
            .fail("teamMembers", "Team members must be a list"),
    }

    let config = AppConfig {
        velocity_calculation_sprints,
        default_meeting_percentage,
        team_members,
    };
    let result = reader.finish(validate_app_config(&config));

    into_outcome(config, result, CONTEXT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorType;
    use serde_json::json;

    #[test]
    fn test_parse_valid_member() {
        let member = parse_team_member(&json!({
            "name": "Ada",
            "totalGrossHours": 80,
            "onCallHours": 0,
            "meetingHours": 16,
            "timeOffHours": 8,
            "netHours": 56
        }))
        .unwrap();
        assert_eq!(member.name, "Ada");
        assert_eq!(member.net_hours, 56.0);
    }

    #[test]
    fn test_string_numbers_are_not_coerced() {
        let err = parse_team_member(&json!({
            "name": "Ada",
            "totalGrossHours": "80",
            "onCallHours": 0,
            "meetingHours": 0,
            "timeOffHours": 0,
            "netHours": 80
        }))
        .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Validation);
        let details = err.details().unwrap();
        assert_eq!(
            details["fieldErrors"]["totalGrossHours"],
            "Total gross hours must be a number"
        );
    }

    #[test]
    fn test_missing_fields_are_required() {
        let err = parse_sprint_form(&json!({ "sprintName": "Sprint 1" }), 40.0, 1).unwrap_err();
        let field_errors = &err.details().unwrap()["fieldErrors"];
        assert_eq!(field_errors["businessDays"], "Business days is required");
        assert_eq!(field_errors["pointsCompleted"], "Points completed is required");
    }

    #[test]
    fn test_parse_sprint_form() {
        let form = parse_sprint_form(
            &json!({
                "sprintName": "Sprint 7",
                "sprintLink": "https://tracker.example.com/7",
                "businessDays": 10,
                "numberOfPeople": 3,
                "totalPointsInSprint": 40,
                "carryOverPointsTotal": 8,
                "carryOverPointsCompleted": 8,
                "unplannedPointsBroughtIn": 0,
                "pointsCompleted": 35.5
            }),
            120.0,
            3,
        )
        .unwrap();
        assert_eq!(form.business_days, 10);
        assert_eq!(form.points_completed, 35.5);
    }

    #[test]
    fn test_fractional_business_days_rejected() {
        let err = parse_sprint_form(
            &json!({
                "sprintName": "Sprint 7",
                "businessDays": 9.5,
                "numberOfPeople": 3,
                "totalPointsInSprint": 40,
                "carryOverPointsTotal": 0,
                "carryOverPointsCompleted": 0,
                "unplannedPointsBroughtIn": 0,
                "pointsCompleted": 0
            }),
            120.0,
            3,
        )
        .unwrap_err();
        let field_errors = &err.details().unwrap()["fieldErrors"];
        assert_eq!(field_errors["businessDays"], "Business days must be a whole number");
        assert_eq!(err.user_message(), "Business days must be a whole number");
    }

    #[test]
    fn test_non_object_rejected() {
        let err = parse_app_config(&json!([1, 2])).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Validation);
    }

    #[test]
    fn test_parse_config_with_duplicates() {
        let member = json!({
            "name": "John Doe",
            "totalGrossHours": 80,
            "onCallHours": 0,
            "meetingHours": 16,
            "timeOffHours": 0,
            "netHours": 64
        });
        let mut other = member.clone();
        other["name"] = json!("john doe");
        let err = parse_app_config(&json!({
            "velocityCalculationSprints": 6,
            "defaultMeetingPercentage": 20,
            "teamMembers": [member, other]
        }))
        .unwrap_err();
        assert!(err.message().contains("Duplicate team member names"));
    }
}
