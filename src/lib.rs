//! Sprint Metrics core
//!
//! Validation, metric calculation and CSV/JSON serialization for agile sprint
//! tracking. Every failure is returned as a [`errors::StructuredError`].

pub mod config;
pub mod errors;
pub mod metrics;
pub mod models;
pub mod serializer;
pub mod validation;

pub use errors::{ErrorType, Severity, StructuredError};
pub use models::{AppConfig, AppData, Sprint, SprintFormData, TeamMember};
pub use validation::ValidationResult;
