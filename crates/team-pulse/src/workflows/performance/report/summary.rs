use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::super::calculator::ScoreBreakdown;
use super::super::collector::{CollectionError, UserMetrics};
use super::super::config_store::ScoringWeights;
use super::super::domain::{ReportWeek, Scope, UserId};

/// Immutable weekly snapshot for one scope. Regeneration replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyReport {
    pub scope: Scope,
    pub scope_key: String,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub tasks_assigned: u32,
    pub tasks_completed: u32,
    pub total_kras: u32,
    pub completed_kras: u32,
    pub team_members: u32,
    pub members_scored: u32,
    pub average_score: f64,
    pub breakdown: ScoreBreakdown,
    pub weights: ScoringWeights,
    pub top_performers: Vec<String>,
    pub member_scores: Vec<MemberScore>,
    pub issues: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial: Option<PartialCollection>,
    pub generated_at: DateTime<Utc>,
}

impl WeeklyReport {
    pub fn week(&self) -> ReportWeek {
        ReportWeek {
            start: self.week_start,
            end: self.week_end,
        }
    }

    pub fn is_partial(&self) -> bool {
        self.partial.is_some()
    }

    /// One-line outcome, e.g. "3/5 members scored".
    pub fn coverage_label(&self) -> String {
        format!("{}/{} members scored", self.members_scored, self.team_members)
    }
}

/// Per-member result retained for auditing the ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberScore {
    pub rank: u32,
    pub user_id: UserId,
    pub display_name: String,
    pub metrics: UserMetrics,
    pub breakdown: ScoreBreakdown,
}

/// Annotation carried by reports where some members could not be collected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialCollection {
    pub resolved: u32,
    pub scored: u32,
    pub failed: Vec<CollectionError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub(crate) struct Totals {
    pub tasks_assigned: u32,
    pub tasks_completed: u32,
    pub overdue: u32,
    pub total_kras: u32,
    pub completed_kras: u32,
}

pub(crate) fn totals(members: &[MemberScore]) -> Totals {
    members.iter().fold(Totals::default(), |mut acc, member| {
        let metrics = &member.metrics;
        acc.tasks_assigned += metrics.tasks_assigned;
        acc.tasks_completed += metrics.tasks_completed;
        acc.overdue += metrics.overdue_count();
        acc.total_kras += metrics.kras_total_count;
        acc.completed_kras += metrics.kras_completed_count;
        acc
    })
}

/// Mean sub-scores across scored members; overall is the rounded mean of member overall scores.
pub(crate) fn aggregate_breakdown(members: &[MemberScore]) -> (f64, ScoreBreakdown) {
    if members.is_empty() {
        return (
            0.0,
            ScoreBreakdown {
                completion_score: 0.0,
                timeliness_score: 0.0,
                quality_score: 0.0,
                kra_alignment_score: 0.0,
                overall_score: 0,
            },
        );
    }

    let count = members.len() as f64;
    let raw_mean = |pick: fn(&ScoreBreakdown) -> f64| {
        members.iter().map(|m| pick(&m.breakdown)).sum::<f64>() / count
    };
    let mean = |pick: fn(&ScoreBreakdown) -> f64| round_tenth(raw_mean(pick));

    let overall_mean = raw_mean(|b| f64::from(b.overall_score));
    let average_score = round_tenth(overall_mean);
    let breakdown = ScoreBreakdown {
        completion_score: mean(|b| b.completion_score),
        timeliness_score: mean(|b| b.timeliness_score),
        quality_score: mean(|b| b.quality_score),
        kra_alignment_score: mean(|b| b.kra_alignment_score),
        overall_score: overall_mean.round().clamp(0.0, 100.0) as u8,
    };

    (average_score, breakdown)
}

pub(crate) fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
