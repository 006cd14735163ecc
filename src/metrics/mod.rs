//! Sprint metric calculator.
//!
//! Derives new work, planned points, completion, velocity and forecast capacity
//! from validated inputs. Stored values keep full floating-point precision.

mod records;

pub use records::*;

use crate::errors::StructuredError;
use crate::models::{Sprint, SprintFormData, SprintMetrics, TeamMember};

/// A member's available hours after deductions.
pub fn calculate_net_hours(
    total_gross_hours: f64,
    on_call_hours: f64,
    meeting_hours: f64,
    time_off_hours: f64,
) -> f64 {
    total_gross_hours - on_call_hours - meeting_hours - time_off_hours
}

/// Meeting hours implied by a meeting percentage of gross hours.
pub fn default_meeting_hours(total_gross_hours: f64, meeting_percentage: f64) -> f64 {
    total_gross_hours * meeting_percentage / 100.0
}

/// Sum of the selected members' net hours.
pub fn calculate_working_hours(members: &[TeamMember]) -> f64 {
    members.iter().map(|m| m.net_hours).sum()
}

/// Mean velocity of the last `window` sprints in `history` (oldest first).
///
/// Uses every sprint when there are fewer than `window`; 0 when there are none.
pub fn calculate_average_velocity(history: &[Sprint], window: u32) -> f64 {
    let take = (window as usize).min(history.len());
    if take == 0 {
        return 0.0;
    }

    let recent = &history[history.len() - take..];
    recent.iter().map(|s| s.velocity).sum::<f64>() / take as f64
}

/// Forecast points for an upcoming sprint with `upcoming_working_hours`.
pub fn calculate_predicted_capacity(
    history: &[Sprint],
    window: u32,
    upcoming_working_hours: f64,
) -> f64 {
    calculate_average_velocity(history, window) * upcoming_working_hours
}

/// Metrics plus an optional flagged calculation fault.
#[derive(Debug, Clone)]
pub struct MetricsOutcome {
    pub metrics: SprintMetrics,
    /// Set when new work points would have gone negative and were clamped.
    pub calculation_error: Option<StructuredError>,
}

/// Derive every computed sprint field, in dependency order.
pub fn calculate_sprint_metrics(
    form: &SprintFormData,
    working_hours: f64,
    history: &[Sprint],
    window: u32,
) -> MetricsOutcome {
    let raw_new_work = form.total_points_in_sprint - form.carry_over_points_total;
    let (new_work_points, calculation_error) = if raw_new_work < 0.0 {
        tracing::warn!(
            sprint = %form.sprint_name,
            raw_new_work,
            "New work points clamped to 0"
        );
        let error = StructuredError::calculation(
            format!(
                "New work points would be negative ({}): carry over total {} exceeds total points {}",
                raw_new_work, form.carry_over_points_total, form.total_points_in_sprint
            ),
            Some(serde_json::json!({
                "totalPointsInSprint": form.total_points_in_sprint,
                "carryOverPointsTotal": form.carry_over_points_total,
            })),
            "calculate-sprint-metrics",
        );
        (0.0, Some(error))
    } else {
        (raw_new_work, None)
    };

    let planned_points = form.carry_over_points_total + new_work_points;

    let percent_complete = if planned_points == 0.0 {
        0.0
    } else {
        form.points_completed / planned_points * 100.0
    };

    let velocity = if working_hours == 0.0 {
        0.0
    } else {
        form.points_completed / working_hours
    };

    let predicted_capacity = calculate_predicted_capacity(history, window, working_hours);

    MetricsOutcome {
        metrics: SprintMetrics {
            new_work_points,
            planned_points,
            percent_complete,
            velocity,
            predicted_capacity,
        },
        calculation_error,
    }
}
