use serde::{Deserialize, Serialize};

use super::collector::UserMetrics;
use super::config_store::ScoringWeights;

/// Sub-scores (0-100) and the weighted overall score for one member.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub completion_score: f64,
    pub timeliness_score: f64,
    pub quality_score: f64,
    pub kra_alignment_score: f64,
    pub overall_score: u8,
}

/// Pure scoring: no I/O, identical inputs always give identical output.
pub struct ScoreCalculator;

impl ScoreCalculator {
    pub fn compute(metrics: &UserMetrics, weights: &ScoringWeights) -> ScoreBreakdown {
        let completion_score = ratio_score(metrics.tasks_completed, metrics.tasks_assigned);

        // No completions means no evidence of lateness.
        let timeliness_score = if metrics.tasks_completed == 0 {
            100.0
        } else {
            ratio_score(metrics.on_time_count, metrics.tasks_completed)
        };

        // Same convention when no completed task carried a checklist.
        let quality_score = metrics
            .quality_checklist_score
            .map(clamp_score)
            .unwrap_or(100.0);

        let kra_alignment_score = ratio_score(metrics.kras_covered_count, metrics.kras_total_count);

        let overall_score = weighted_overall(
            weights,
            completion_score,
            timeliness_score,
            quality_score,
            kra_alignment_score,
        );

        ScoreBreakdown {
            completion_score,
            timeliness_score,
            quality_score,
            kra_alignment_score,
            overall_score,
        }
    }
}

pub(crate) fn weighted_overall(
    weights: &ScoringWeights,
    completion: f64,
    timeliness: f64,
    quality: f64,
    kra_alignment: f64,
) -> u8 {
    let weighted = completion * f64::from(weights.completion)
        + timeliness * f64::from(weights.timeliness)
        + quality * f64::from(weights.quality)
        + kra_alignment * f64::from(weights.kra_alignment);
    (weighted / 100.0).round().clamp(0.0, 100.0) as u8
}

fn ratio_score(numerator: u32, denominator: u32) -> f64 {
    clamp_score(f64::from(numerator) / f64::from(denominator.max(1)) * 100.0)
}

fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}
