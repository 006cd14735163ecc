//! Cheap structural sniff run before full validation.

use std::collections::HashSet;

use serde_json::Value;

use crate::models::Sprint;

/// True when `blob` is obviously unusable: not an object, no `sprints` array,
/// or a sprint without a non-empty string `id`.
///
/// Shallower than entity validation.
pub fn is_data_corrupted(blob: &Value) -> bool {
    let Some(object) = blob.as_object() else {
        return true;
    };

    let Some(sprints) = object.get("sprints").and_then(Value::as_array) else {
        return true;
    };

    sprints.iter().any(|sprint| {
        !sprint
            .get("id")
            .and_then(Value::as_str)
            .is_some_and(|id| !id.trim().is_empty())
    })
}

/// Ids carried by more than one sprint, in first repeat order.
pub fn duplicate_sprint_ids(sprints: &[Sprint]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut duplicates: Vec<String> = Vec::new();

    for sprint in sprints {
        if !seen.insert(sprint.id.as_str()) && !duplicates.contains(&sprint.id) {
            duplicates.push(sprint.id.clone());
        }
    }

    duplicates
}
