//! Sprint models: raw form input and the persisted, fully computed record.

use serde::{Deserialize, Serialize};

/// The user-supplied subset of a sprint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SprintFormData {
    pub sprint_name: String,
    /// Empty, or an `http(s)://` URL.
    #[serde(default)]
    pub sprint_link: String,
    pub business_days: u32,
    pub number_of_people: u32,
    pub total_points_in_sprint: f64,
    pub carry_over_points_total: f64,
    pub carry_over_points_completed: f64,
    pub unplanned_points_brought_in: f64,
    pub points_completed: f64,
}

/// Derived sprint metrics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SprintMetrics {
    pub new_work_points: f64,
    pub planned_points: f64,
    pub percent_complete: f64,
    pub velocity: f64,
    pub predicted_capacity: f64,
}

/// A persisted sprint record.
///
/// Created once on submission and only ever replaced wholesale by a
/// revalidate-and-recompute edit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Sprint {
    pub id: String,
    pub sprint_name: String,
    #[serde(default)]
    pub sprint_link: String,
    pub business_days: u32,
    pub number_of_people: u32,
    pub working_hours: f64,
    pub total_points_in_sprint: f64,
    pub carry_over_points_total: f64,
    pub carry_over_points_completed: f64,
    pub new_work_points: f64,
    pub unplanned_points_brought_in: f64,
    pub points_completed: f64,
    pub planned_points: f64,
    pub percent_complete: f64,
    pub velocity: f64,
    pub predicted_capacity: f64,
    pub created_at: String,
    pub updated_at: String,
}

impl Sprint {
    /// Assemble a record from its validated inputs and computed metrics.
    pub fn from_parts(
        id: String,
        form: &SprintFormData,
        working_hours: f64,
        metrics: SprintMetrics,
        created_at: String,
        updated_at: String,
    ) -> Self {
        Self {
            id,
            sprint_name: form.sprint_name.clone(),
            sprint_link: form.sprint_link.clone(),
            business_days: form.business_days,
            number_of_people: form.number_of_people,
            working_hours,
            total_points_in_sprint: form.total_points_in_sprint,
            carry_over_points_total: form.carry_over_points_total,
            carry_over_points_completed: form.carry_over_points_completed,
            new_work_points: metrics.new_work_points,
            unplanned_points_brought_in: form.unplanned_points_brought_in,
            points_completed: form.points_completed,
            planned_points: metrics.planned_points,
            percent_complete: metrics.percent_complete,
            velocity: metrics.velocity,
            predicted_capacity: metrics.predicted_capacity,
            created_at,
            updated_at,
        }
    }

    /// The raw inputs this record was computed from.
    pub fn form_data(&self) -> SprintFormData {
        SprintFormData {
            sprint_name: self.sprint_name.clone(),
            sprint_link: self.sprint_link.clone(),
            business_days: self.business_days,
            number_of_people: self.number_of_people,
            total_points_in_sprint: self.total_points_in_sprint,
            carry_over_points_total: self.carry_over_points_total,
            carry_over_points_completed: self.carry_over_points_completed,
            unplanned_points_brought_in: self.unplanned_points_brought_in,
            points_completed: self.points_completed,
        }
    }

    pub fn metrics(&self) -> SprintMetrics {
        SprintMetrics {
            new_work_points: self.new_work_points,
            planned_points: self.planned_points,
            percent_complete: self.percent_complete,
            velocity: self.velocity,
            predicted_capacity: self.predicted_capacity,
        }
    }
}
