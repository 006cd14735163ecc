//! Whole-entity validators.

use std::collections::BTreeMap;

use super::{validate_numeric_field, validate_string_field, validate_url, Collector};
use super::{NumericRules, StringRules, ValidationResult};
use crate::metrics::calculate_net_hours;
use crate::models::{AppConfig, SprintFormData, TeamMember};

/// Upper bound for any single hour field on a team member.
pub const MAX_MEMBER_HOURS: f64 = 1000.0;
pub const MAX_NAME_LENGTH: usize = 100;
pub const MAX_POINTS: f64 = 10_000.0;

pub const VELOCITY_WINDOW_RULES: NumericRules = NumericRules::whole(1.0, 20.0);
pub const BUSINESS_DAYS_RULES: NumericRules = NumericRules::whole(1.0, 30.0);
pub const NUMBER_OF_PEOPLE_RULES: NumericRules = NumericRules::whole(1.0, 100.0);
pub const MEETING_PERCENTAGE_RULES: NumericRules = NumericRules::non_negative(Some(100.0));
pub const HOURS_RULES: NumericRules = NumericRules::non_negative(Some(MAX_MEMBER_HOURS));
pub const POINTS_RULES: NumericRules = NumericRules::non_negative(Some(MAX_POINTS));

const NAME_RULES: StringRules<'static> = StringRules {
    required: true,
    min_length: Some(1),
    max_length: Some(MAX_NAME_LENGTH),
    pattern: None,
};

/// Validate a team member's name, hour fields and derived net hours.
///
/// `net_hours` must equal the derived value exactly.
pub fn validate_team_member(member: &TeamMember) -> ValidationResult {
    let mut collector = Collector::default();

    collector.check("name", validate_string_field(&member.name, "Name", &NAME_RULES));

    let hours = [
        ("totalGrossHours", "Total gross hours", member.total_gross_hours),
        ("onCallHours", "On-call hours", member.on_call_hours),
        ("meetingHours", "Meeting hours", member.meeting_hours),
        ("timeOffHours", "Time off hours", member.time_off_hours),
    ];
    for (field, label, value) in hours {
        collector.check(field, validate_numeric_field(value, label, &HOURS_RULES));
    }

    let deductions = member.total_deductions();
    if deductions > member.total_gross_hours {
        collector.fail(
            "totalGrossHours",
            format!(
                "Total deductions ({} hours) cannot exceed total gross hours ({} hours)",
                deductions, member.total_gross_hours
            ),
        );
    }

    let expected = calculate_net_hours(
        member.total_gross_hours,
        member.on_call_hours,
        member.meeting_hours,
        member.time_off_hours,
    );
    if member.net_hours != expected {
        collector.fail(
            "netHours",
            format!(
                "Net hours ({}) does not match gross hours minus deductions ({})",
                member.net_hours, expected
            ),
        );
    }

    collector.finish()
}

/// Validate sprint form input against the working hours and member selection
/// it will be computed with.
pub fn validate_sprint_form_data(
    data: &SprintFormData,
    working_hours: f64,
    team_member_count: usize,
) -> ValidationResult {
    let mut collector = Collector::default();

    collector.check(
        "sprintName",
        validate_string_field(&data.sprint_name, "Sprint name", &NAME_RULES),
    );
    collector.check("sprintLink", validate_url(&data.sprint_link, "Sprint link", false));
    collector.check(
        "businessDays",
        validate_numeric_field(
            f64::from(data.business_days),
            "Business days",
            &BUSINESS_DAYS_RULES,
        ),
    );
    collector.check(
        "numberOfPeople",
        validate_numeric_field(
            f64::from(data.number_of_people),
            "Number of people",
            &NUMBER_OF_PEOPLE_RULES,
        ),
    );

    let points = [
        ("totalPointsInSprint", "Total points in sprint", data.total_points_in_sprint),
        ("carryOverPointsTotal", "Carry over points total", data.carry_over_points_total),
        (
            "carryOverPointsCompleted",
            "Carry over points completed",
            data.carry_over_points_completed,
        ),
        (
            "unplannedPointsBroughtIn",
            "Unplanned points brought in",
            data.unplanned_points_brought_in,
        ),
        ("pointsCompleted", "Points completed", data.points_completed),
    ];
    for (field, label, value) in points {
        collector.check(field, validate_numeric_field(value, label, &POINTS_RULES));
    }

    if team_member_count < 1 {
        collector.fail("teamMembers", "At least one team member must be selected");
    }

    if working_hours.is_infinite() {
        collector.fail("workingHours", "Working hours must be a valid number");
    } else if working_hours.is_nan() || working_hours <= 0.0 {
        collector.fail("workingHours", "Working hours must be greater than 0");
    }

    if data.carry_over_points_completed > data.carry_over_points_total {
        collector.fail(
            "carryOverPointsCompleted",
            "Carry over points completed cannot exceed carry over total",
        );
    }

    collector.finish()
}

/// Validate settings: window size, meeting percentage, every member, and
/// case-insensitive name uniqueness.
pub fn validate_app_config(config: &AppConfig) -> ValidationResult {
    let mut collector = Collector::default();

    collector.check(
        "velocityCalculationSprints",
        validate_numeric_field(
            f64::from(config.velocity_calculation_sprints),
            "Velocity calculation sprints",
            &VELOCITY_WINDOW_RULES,
        ),
    );
    collector.check(
        "defaultMeetingPercentage",
        validate_numeric_field(
            config.default_meeting_percentage,
            "Default meeting percentage",
            &MEETING_PERCENTAGE_RULES,
        ),
    );

    for (index, member) in config.team_members.iter().enumerate() {
        let result = validate_team_member(member);
        if !result.is_valid {
            collector.absorb(
                result,
                &format!("Team member {}: ", index + 1),
                &format!("teamMembers[{}].", index),
            );
        }
    }

    let duplicates = duplicate_names(&config.team_members);
    if !duplicates.is_empty() {
        collector.fail(
            "teamMembers",
            format!("Duplicate team member names: {}", duplicates.join(", ")),
        );
    }

    collector.finish()
}

/// Names that occur more than once after trimming and case folding, in first
/// appearance order.
fn duplicate_names(members: &[TeamMember]) -> Vec<String> {
    let mut seen: BTreeMap<String, usize> = BTreeMap::new();
    let mut duplicates = Vec::new();

    for member in members {
        let key = member.name.trim().to_lowercase();
        let count = seen.entry(key).or_insert(0);
        *count += 1;
        if *count == 2 {
            duplicates.push(member.name.trim().to_string());
        }
    }

    duplicates
}
