//! Planned vs. actual tracking for individually owned numeric indicators.
//!
//! Variance shares the scoring engine's numeric conventions: percentages are
//! rounded to the nearest integer and a zero denominator yields zero rather
//! than an error.

pub mod domain;
mod tracker;

pub use domain::{variance, KpiDefinition, KpiId, KpiRecord, KpiStatus, KpiUpdate, KpiView};
pub use tracker::{KpiError, KpiVarianceTracker};
