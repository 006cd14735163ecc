//! Team member model.

use serde::{Deserialize, Serialize};

use crate::metrics::calculate_net_hours;

/// A team member whose available hours feed sprint working hours.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub name: String,
    pub total_gross_hours: f64,
    pub on_call_hours: f64,
    pub meeting_hours: f64,
    pub time_off_hours: f64,
    /// Always derived from the other hour fields.
    pub net_hours: f64,
}

impl TeamMember {
    /// Create a member with `net_hours` derived from the deductions.
    pub fn new(
        name: impl Into<String>,
        total_gross_hours: f64,
        on_call_hours: f64,
        meeting_hours: f64,
        time_off_hours: f64,
    ) -> Self {
        Self {
            name: name.into(),
            total_gross_hours,
            on_call_hours,
            meeting_hours,
            time_off_hours,
            net_hours: calculate_net_hours(
                total_gross_hours,
                on_call_hours,
                meeting_hours,
                time_off_hours,
            ),
        }
    }

    /// Sum of on-call, meeting and time-off hours.
    pub fn total_deductions(&self) -> f64 {
        self.on_call_hours + self.meeting_hours + self.time_off_hours
    }
}
