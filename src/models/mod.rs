//! Data models for sprint tracking.
//!
//! Field names serialize camelCase so exported JSON matches the dataset format
//! consumed by the presentation layer.

mod app_data;
mod member;
mod sprint;

pub use app_data::*;
pub use member::*;
pub use sprint::*;
