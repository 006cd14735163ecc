//! Settings and the full dataset.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{Sprint, SprintFormData, TeamMember};
use crate::errors::StructuredError;
use crate::metrics::{
    calculate_predicted_capacity, create_sprint, sort_by_created_at, update_sprint, BuiltSprint,
};
use crate::validation::validate_app_config;

pub const DEFAULT_VELOCITY_CALCULATION_SPRINTS: u32 = 6;
pub const DEFAULT_MEETING_PERCENTAGE: f64 = 20.0;

/// Team settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// Rolling window size for forecasting, 1 to 20.
    pub velocity_calculation_sprints: u32,
    /// 0 to 100.
    pub default_meeting_percentage: f64,
    /// Names are unique ignoring case and surrounding whitespace.
    #[serde(default)]
    pub team_members: Vec<TeamMember>,
}

impl AppConfig {
    /// Defaults with a substitute window and meeting percentage.
    pub fn with_defaults(velocity_calculation_sprints: u32, default_meeting_percentage: f64) -> Self {
        Self {
            velocity_calculation_sprints,
            default_meeting_percentage,
            team_members: Vec::new(),
        }
    }

    /// Look up a member by name, ignoring case and surrounding whitespace.
    pub fn find_member(&self, name: &str) -> Option<&TeamMember> {
        let wanted = name.trim().to_lowercase();
        self.team_members
            .iter()
            .find(|m| m.name.trim().to_lowercase() == wanted)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::with_defaults(DEFAULT_VELOCITY_CALCULATION_SPRINTS, DEFAULT_MEETING_PERCENTAGE)
    }
}

/// The complete dataset. Serializes `sprints` before `config`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppData {
    pub sprints: Vec<Sprint>,
    pub config: AppConfig,
}

impl AppData {
    /// No sprints, the given settings.
    pub fn empty(config: AppConfig) -> Self {
        Self {
            sprints: Vec::new(),
            config,
        }
    }

    /// Sprints oldest first by `createdAt`.
    pub fn sprints_sorted_by_created_at(&self) -> Vec<Sprint> {
        sort_by_created_at(&self.sprints)
    }

    pub fn find_sprint(&self, id: &str) -> Option<&Sprint> {
        self.sprints.iter().find(|s| s.id == id)
    }

    /// Validate and append a new sprint computed against the existing history.
    pub fn add_sprint(
        &mut self,
        form: &SprintFormData,
        selected_members: &[TeamMember],
    ) -> Result<BuiltSprint, StructuredError> {
        let history = self.sprints_sorted_by_created_at();
        let built = create_sprint(form, selected_members, &history, &self.config, Utc::now())?;

        tracing::info!(id = %built.sprint.id, name = %built.sprint.sprint_name, "Sprint created");
        self.sprints.push(built.sprint.clone());
        Ok(built)
    }

    /// Revalidate and recompute an existing sprint in place.
    ///
    /// The forecast uses the sprints ahead of the edited one in `createdAt`
    /// order, ties broken by dataset position, as `recompute_sprints` does.
    pub fn edit_sprint(
        &mut self,
        id: &str,
        form: &SprintFormData,
        selected_members: &[TeamMember],
    ) -> Result<BuiltSprint, StructuredError> {
        let position = self.position(id, "edit-sprint")?;
        let existing = &self.sprints[position];

        let mut history = self.sprints_sorted_by_created_at();
        let rank = history.iter().position(|s| s.id == existing.id).unwrap_or(0);
        history.truncate(rank);
        let built = update_sprint(
            existing,
            form,
            selected_members,
            &history,
            &self.config,
            Utc::now(),
        )?;

        tracing::info!(id = %built.sprint.id, "Sprint updated");
        self.sprints[position] = built.sprint.clone();
        Ok(built)
    }

    /// Remove a sprint, returning it.
    pub fn delete_sprint(&mut self, id: &str) -> Result<Sprint, StructuredError> {
        let position = self.position(id, "delete-sprint")?;
        tracing::info!(id, "Sprint deleted");
        Ok(self.sprints.remove(position))
    }

    /// Replace the settings if `candidate` is valid; otherwise leave them untouched.
    pub fn update_config(&mut self, candidate: AppConfig) -> Result<(), StructuredError> {
        let result = validate_app_config(&candidate);
        if !result.is_valid {
            tracing::warn!(errors = result.errors.len(), "Settings update rejected");
            return Err(StructuredError::from_validation_result(&result, "update-config"));
        }

        self.config = candidate;
        tracing::info!("Settings updated");
        Ok(())
    }

    /// Predicted capacity for an upcoming sprint.
    pub fn forecast(&self, upcoming_working_hours: f64) -> f64 {
        calculate_predicted_capacity(
            &self.sprints_sorted_by_created_at(),
            self.config.velocity_calculation_sprints,
            upcoming_working_hours,
        )
    }

    fn position(&self, id: &str, context: &str) -> Result<usize, StructuredError> {
        self.sprints.iter().position(|s| s.id == id).ok_or_else(|| {
            StructuredError::validation(&[format!("Sprint not found: {}", id)], context)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: &str, completed: f64) -> SprintFormData {
        SprintFormData {
            sprint_name: name.to_string(),
            sprint_link: String::new(),
            business_days: 10,
            number_of_people: 1,
            total_points_in_sprint: 30.0,
            carry_over_points_total: 0.0,
            carry_over_points_completed: 0.0,
            unplanned_points_brought_in: 0.0,
            points_completed: completed,
        }
    }

    fn team() -> Vec<TeamMember> {
        vec![TeamMember::new("Ada", 40.0, 0.0, 8.0, 2.0)]
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.velocity_calculation_sprints, 6);
        assert_eq!(config.default_meeting_percentage, 20.0);
        assert!(config.team_members.is_empty());
    }

    #[test]
    fn test_add_edit_delete() {
        let mut data = AppData::empty(AppConfig::default());
        let id = data.add_sprint(&form("S1", 15.0), &team()).unwrap().sprint.id;
        assert_eq!(data.sprints.len(), 1);
        assert_eq!(data.sprints[0].velocity, 0.5);

        let edited = data.edit_sprint(&id, &form("S1b", 30.0), &team()).unwrap();
        assert_eq!(edited.sprint.id, id);
        assert_eq!(data.sprints[0].sprint_name, "S1b");
        assert_eq!(data.sprints[0].velocity, 1.0);
        assert_eq!(data.find_sprint(&id).unwrap().sprint_name, "S1b");

        let removed = data.delete_sprint(&id).unwrap();
        assert_eq!(removed.id, id);
        assert!(data.sprints.is_empty());
        assert!(data.find_sprint(&id).is_none());
    }

    #[test]
    fn test_invalid_edit_leaves_record_untouched() {
        let mut data = AppData::empty(AppConfig::default());
        let id = data.add_sprint(&form("S1", 15.0), &team()).unwrap().sprint.id;
        let before = data.sprints[0].clone();

        let bad = SprintFormData {
            carry_over_points_completed: 5.0,
            ..form("S1", 15.0)
        };
        assert!(data.edit_sprint(&id, &bad, &team()).is_err());
        assert_eq!(data.sprints[0], before);
    }

    #[test]
    fn test_unknown_sprint_id() {
        let mut data = AppData::empty(AppConfig::default());
        let err = data.delete_sprint("missing").unwrap_err();
        assert!(err.user_message().contains("Sprint not found"));
    }

    #[test]
    fn test_failed_config_update_keeps_previous() {
        let mut data = AppData::empty(AppConfig::default());
        let bad = AppConfig {
            velocity_calculation_sprints: 0,
            ..AppConfig::default()
        };
        assert!(data.update_config(bad).is_err());
        assert_eq!(data.config, AppConfig::default());

        let good = AppConfig {
            team_members: team(),
            ..AppConfig::with_defaults(3, 15.0)
        };
        data.update_config(good.clone()).unwrap();
        assert_eq!(data.config, good);
        assert!(data.config.find_member(" ADA ").is_some());
    }

    #[test]
    fn test_forecast_over_history() {
        let mut data = AppData::empty(AppConfig::with_defaults(2, 20.0));
        data.add_sprint(&form("S1", 15.0), &team()).unwrap();
        data.add_sprint(&form("S2", 30.0), &team()).unwrap();
        assert_eq!(data.forecast(10.0), 7.5);
    }

    #[test]
    fn test_edit_history_matches_recompute_on_equal_timestamps() {
        let mut data = AppData::empty(AppConfig::default());
        let first = data.add_sprint(&form("S1", 15.0), &team()).unwrap().sprint;
        let second = data.add_sprint(&form("S2", 30.0), &team()).unwrap().sprint;
        data.sprints[1].created_at = first.created_at.clone();

        let edited = data.edit_sprint(&second.id, &form("S2", 30.0), &team()).unwrap();
        assert_eq!(edited.sprint.predicted_capacity, first.velocity * 30.0);

        let recomputed = crate::metrics::recompute_sprints(&data.sprints, 6);
        assert_eq!(recomputed[1].predicted_capacity, edited.sprint.predicted_capacity);

        let edited_first = data.edit_sprint(&first.id, &form("S1", 15.0), &team()).unwrap();
        assert_eq!(edited_first.sprint.predicted_capacity, 0.0);
        assert_eq!(recomputed[0].predicted_capacity, 0.0);
    }
}
