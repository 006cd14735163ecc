//! Sprint record lifecycle: creation, whole-record edits and dataset recompute.

use chrono::{DateTime, SecondsFormat, Utc};

use super::{calculate_sprint_metrics, calculate_working_hours};
use crate::errors::StructuredError;
use crate::models::{AppConfig, Sprint, SprintFormData, TeamMember};
use crate::validation::{validate_sprint_form_data, validate_team_member, ValidationResult};

/// A computed record and any calculation fault flagged while deriving it.
#[derive(Debug, Clone)]
pub struct BuiltSprint {
    pub sprint: Sprint,
    pub calculation_error: Option<StructuredError>,
}

/// ISO-8601 UTC timestamp with millisecond precision.
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn validate_submission(
    form: &SprintFormData,
    members: &[TeamMember],
    working_hours: f64,
) -> ValidationResult {
    let mut errors = Vec::new();
    let mut field_errors = std::collections::BTreeMap::new();

    for member in members {
        let result = validate_team_member(member);
        for error in result.errors {
            errors.push(format!("{}: {}", member.name, error));
        }
    }
    if !errors.is_empty() {
        field_errors.insert(
            "teamMembers".to_string(),
            "Selected team members have invalid hours".to_string(),
        );
    }

    let form_result = validate_sprint_form_data(form, working_hours, members.len());
    errors.extend(form_result.errors);
    for (field, message) in form_result.field_errors {
        field_errors.entry(field).or_insert(message);
    }

    ValidationResult {
        is_valid: errors.is_empty(),
        errors,
        field_errors,
    }
}

/// Identity and timestamps assigned to a built record.
struct Stamp {
    id: String,
    created_at: String,
    updated_at: String,
}

fn build(
    stamp: Stamp,
    form: &SprintFormData,
    members: &[TeamMember],
    history: &[Sprint],
    config: &AppConfig,
    context: &str,
) -> Result<BuiltSprint, StructuredError> {
    let working_hours = calculate_working_hours(members);

    let result = validate_submission(form, members, working_hours);
    if !result.is_valid {
        tracing::warn!(context, errors = result.errors.len(), "Sprint rejected");
        return Err(StructuredError::from_validation_result(&result, context));
    }

    let outcome = calculate_sprint_metrics(
        form,
        working_hours,
        history,
        config.velocity_calculation_sprints,
    );

    Ok(BuiltSprint {
        sprint: Sprint::from_parts(
            stamp.id,
            form,
            working_hours,
            outcome.metrics,
            stamp.created_at,
            stamp.updated_at,
        ),
        calculation_error: outcome.calculation_error,
    })
}

/// Validate a submission and compute a new record.
///
/// `history` holds earlier sprints, oldest first, and feeds the forecast.
pub fn create_sprint(
    form: &SprintFormData,
    members: &[TeamMember],
    history: &[Sprint],
    config: &AppConfig,
    now: DateTime<Utc>,
) -> Result<BuiltSprint, StructuredError> {
    let timestamp = iso_timestamp(now);
    let stamp = Stamp {
        id: uuid::Uuid::new_v4().to_string(),
        created_at: timestamp.clone(),
        updated_at: timestamp,
    };
    build(stamp, form, members, history, config, "create-sprint")
}

/// Revalidate and recompute `existing` from new input.
///
/// Keeps `id` and `createdAt`; refreshes `updatedAt`.
pub fn update_sprint(
    existing: &Sprint,
    form: &SprintFormData,
    members: &[TeamMember],
    history: &[Sprint],
    config: &AppConfig,
    now: DateTime<Utc>,
) -> Result<BuiltSprint, StructuredError> {
    let stamp = Stamp {
        id: existing.id.clone(),
        created_at: existing.created_at.clone(),
        updated_at: iso_timestamp(now),
    };
    build(stamp, form, members, history, config, "update-sprint")
}

/// Recompute every derived field from stored inputs and working hours.
///
/// Sprints are processed oldest first by `createdAt` so each forecast only sees
/// earlier sprints; the returned list keeps the input order.
pub fn recompute_sprints(sprints: &[Sprint], window: u32) -> Vec<Sprint> {
    let mut order: Vec<usize> = (0..sprints.len()).collect();
    order.sort_by(|&a, &b| sprints[a].created_at.cmp(&sprints[b].created_at));

    let mut history: Vec<Sprint> = Vec::with_capacity(sprints.len());
    let mut recomputed: Vec<Option<Sprint>> = vec![None; sprints.len()];

    for index in order {
        let original = &sprints[index];
        let outcome = calculate_sprint_metrics(
            &original.form_data(),
            original.working_hours,
            &history,
            window,
        );
        let sprint = Sprint {
            new_work_points: outcome.metrics.new_work_points,
            planned_points: outcome.metrics.planned_points,
            percent_complete: outcome.metrics.percent_complete,
            velocity: outcome.metrics.velocity,
            predicted_capacity: outcome.metrics.predicted_capacity,
            ..original.clone()
        };
        history.push(sprint.clone());
        recomputed[index] = Some(sprint);
    }

    recomputed.into_iter().flatten().collect()
}

/// `sprints` ordered oldest first by `createdAt`.
pub fn sort_by_created_at(sprints: &[Sprint]) -> Vec<Sprint> {
    let mut sorted = sprints.to_vec();
    sorted.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    sorted
}
