//! Field validators.
//!
//! Each returns `None` when the value is acceptable, or the first failing rule's
//! message.

use once_cell::sync::Lazy;
use regex::Regex;

static URL_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^https?://").expect("valid regex"));

/// Rules for [`validate_string_field`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StringRules<'a> {
    pub required: bool,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<&'a Regex>,
}

/// Rules for [`validate_numeric_field`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NumericRules {
    pub required: bool,
    pub allow_zero: bool,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub integer: bool,
}

impl NumericRules {
    /// A required value that may be zero, bounded below by zero.
    pub const fn non_negative(max: Option<f64>) -> Self {
        Self {
            required: true,
            allow_zero: true,
            min: Some(0.0),
            max,
            integer: false,
        }
    }

    /// A required, nonzero whole number in `min..=max`.
    pub const fn whole(min: f64, max: f64) -> Self {
        Self {
            required: true,
            allow_zero: false,
            min: Some(min),
            max: Some(max),
            integer: true,
        }
    }
}

/// Checks run in order required, min length, max length, pattern.
///
/// An empty value that is not required passes without further checks.
pub fn validate_string_field(value: &str, label: &str, rules: &StringRules<'_>) -> Option<String> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return rules.required.then(|| format!("{} is required", label));
    }

    let length = trimmed.chars().count();

    if let Some(min) = rules.min_length {
        if length < min {
            return Some(format!("{} must be at least {} characters", label, min));
        }
    }

    if let Some(max) = rules.max_length {
        if length > max {
            return Some(format!("{} must be no more than {} characters", label, max));
        }
    }

    if let Some(pattern) = rules.pattern {
        if !pattern.is_match(trimmed) {
            return Some(format!("{} format is invalid", label));
        }
    }

    None
}

/// Checks run in order presence, zero, min, max, integer.
///
/// `NaN` stands for a missing value.
pub fn validate_numeric_field(value: f64, label: &str, rules: &NumericRules) -> Option<String> {
    if value.is_nan() {
        return rules.required.then(|| format!("{} is required", label));
    }

    if value.is_infinite() {
        return Some(format!("{} must be a valid number", label));
    }

    if rules.required && !rules.allow_zero && value == 0.0 {
        return Some(format!("{} must be greater than 0", label));
    }

    if let Some(min) = rules.min {
        if value < min {
            return Some(format!("{} must be at least {}", label, min));
        }
    }

    if let Some(max) = rules.max {
        if value > max {
            return Some(format!("{} must be no more than {}", label, max));
        }
    }

    if rules.integer && value.fract() != 0.0 {
        return Some(format!("{} must be a whole number", label));
    }

    None
}

/// An empty URL passes unless required; anything else must start with
/// `http://` or `https://`.
pub fn validate_url(value: &str, label: &str, required: bool) -> Option<String> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return required.then(|| format!("{} is required", label));
    }

    if !URL_PATTERN.is_match(trimmed) {
        return Some(format!(
            "{} must be a valid URL starting with http:// or https://",
            label
        ));
    }

    None
}
