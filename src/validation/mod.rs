//! Validation for team members, sprint input and application settings.
//!
//! Field validators are pure predicates over primitive values; entity validators
//! compose them and report every violated rule rather than stopping at the first.

mod boundary;
mod entities;
mod fields;
mod integrity;

pub use boundary::*;
pub use entities::*;
pub use fields::*;
pub use integrity::*;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Outcome of validating one entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    /// First message reported for each field, keyed by camelCase field name.
    pub field_errors: BTreeMap<String, String>,
}

/// Accumulates failures while an entity is checked.
#[derive(Debug, Default)]
pub(crate) struct Collector {
    errors: Vec<String>,
    field_errors: BTreeMap<String, String>,
}

impl Collector {
    /// Record the outcome of a field validator.
    pub fn check(&mut self, field: &str, outcome: Option<String>) {
        if let Some(message) = outcome {
            self.fail(field, message);
        }
    }

    pub fn fail(&mut self, field: &str, message: impl Into<String>) {
        let message = message.into();
        self.field_errors
            .entry(field.to_string())
            .or_insert_with(|| message.clone());
        self.errors.push(message);
    }

    pub fn has_error(&self, field: &str) -> bool {
        self.field_errors.contains_key(field)
    }

    /// Fold another result in, prefixing messages and field keys.
    pub fn absorb(&mut self, result: ValidationResult, message_prefix: &str, field_prefix: &str) {
        for error in result.errors {
            self.errors.push(format!("{}{}", message_prefix, error));
        }
        for (field, message) in result.field_errors {
            self.field_errors
                .entry(format!("{}{}", field_prefix, field))
                .or_insert_with(|| format!("{}{}", message_prefix, message));
        }
    }

    /// Fold in another result, skipping fields that already failed here.
    pub fn absorb_new(&mut self, result: ValidationResult) {
        let shadowed: Vec<&String> = result
            .field_errors
            .iter()
            .filter(|(field, _)| self.field_errors.contains_key(*field))
            .map(|(_, message)| message)
            .collect();
        let kept: Vec<String> = result
            .errors
            .iter()
            .filter(|message| !shadowed.contains(message))
            .cloned()
            .collect();
        let new_fields: Vec<(String, String)> = result
            .field_errors
            .iter()
            .filter(|(field, _)| !self.field_errors.contains_key(*field))
            .map(|(field, message)| (field.clone(), message.clone()))
            .collect();

        self.errors.extend(kept);
        self.field_errors.extend(new_fields);
    }

    pub fn finish(self) -> ValidationResult {
        ValidationResult {
            is_valid: self.errors.is_empty(),
            errors: self.errors,
            field_errors: self.field_errors,
        }
    }
}
