use serde::{Deserialize, Serialize};

use super::summary::{MemberScore, PartialCollection, Totals};

/// Limits that turn aggregate metrics into report findings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IssueThresholds {
    pub minimum_average_score: f64,
    pub maximum_overdue_ratio: f64,
    pub minimum_quality_score: f64,
}

impl Default for IssueThresholds {
    fn default() -> Self {
        Self {
            minimum_average_score: 50.0,
            maximum_overdue_ratio: 0.20,
            minimum_quality_score: 60.0,
        }
    }
}

/// Evaluates the rule set in a fixed order so identical inputs yield identical findings.
pub(crate) fn detect_issues(
    ranked: &[MemberScore],
    totals: &Totals,
    average_score: f64,
    partial: Option<&PartialCollection>,
    thresholds: &IssueThresholds,
) -> Vec<String> {
    let mut issues = Vec::new();

    if let Some(partial) = partial {
        let ids: Vec<&str> = partial
            .failed
            .iter()
            .map(|failure| failure.user_id.as_str())
            .collect();
        issues.push(format!(
            "Scored {} of {} members; metrics could not be collected for {} member{} ({})",
            partial.scored,
            partial.resolved,
            partial.failed.len(),
            plural(partial.failed.len()),
            ids.join(", ")
        ));
    }

    if average_score < thresholds.minimum_average_score {
        issues.push(format!(
            "Average score {:.1} is below the {:.0} threshold",
            average_score, thresholds.minimum_average_score
        ));
    }

    if totals.tasks_assigned > 0 {
        let ratio = f64::from(totals.overdue) / f64::from(totals.tasks_assigned);
        if ratio > thresholds.maximum_overdue_ratio {
            issues.push(format!(
                "{:.0}% of tasks are overdue ({} of {}), above the {:.0}% limit",
                ratio * 100.0,
                totals.overdue,
                totals.tasks_assigned,
                thresholds.maximum_overdue_ratio * 100.0
            ));
        }
    }

    let uncovered = names_where(ranked, |member| {
        member.metrics.kras_total_count > 0 && member.metrics.kras_covered_count == 0
    });
    if !uncovered.is_empty() {
        issues.push(format!(
            "No KRA coverage for {} member{}: {}",
            uncovered.len(),
            plural(uncovered.len()),
            uncovered.join(", ")
        ));
    }

    let stalled = names_where(ranked, |member| {
        member.metrics.tasks_assigned > 0 && member.metrics.tasks_completed == 0
    });
    if !stalled.is_empty() {
        issues.push(format!(
            "{} member{} completed none of their assigned tasks: {}",
            stalled.len(),
            plural(stalled.len()),
            stalled.join(", ")
        ));
    }

    let (quality_sum, samples) = ranked.iter().fold((0.0, 0u32), |(sum, count), member| {
        match member.metrics.quality_checklist_score {
            Some(score) => (
                sum + score * f64::from(member.metrics.quality_samples),
                count + member.metrics.quality_samples,
            ),
            None => (sum, count),
        }
    });
    if samples > 0 {
        let quality = quality_sum / f64::from(samples);
        if quality < thresholds.minimum_quality_score {
            issues.push(format!(
                "Average checklist quality {:.1} is below the {:.0} threshold",
                quality, thresholds.minimum_quality_score
            ));
        }
    }

    issues
}

fn names_where(ranked: &[MemberScore], predicate: impl Fn(&MemberScore) -> bool) -> Vec<&str> {
    ranked
        .iter()
        .filter(|member| predicate(member))
        .map(|member| member.display_name.as_str())
        .collect()
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}
