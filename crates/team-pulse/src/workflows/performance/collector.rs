use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

use super::domain::{GoalId, GoalStatus, ReportWeek, UserId};
use super::sources::{GoalSource, SourceError, TaskSource};

/// Raw counts for one user over one reporting week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserMetrics {
    pub user_id: UserId,
    pub tasks_assigned: u32,
    pub tasks_completed: u32,
    pub on_time_count: u32,
    pub late_count: u32,
    pub overdue_open_count: u32,
    /// Mean checklist result across completed tasks that carry a checklist.
    pub quality_checklist_score: Option<f64>,
    pub quality_samples: u32,
    pub kras_covered_count: u32,
    pub kras_total_count: u32,
    pub kras_completed_count: u32,
}

impl UserMetrics {
    pub fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            tasks_assigned: 0,
            tasks_completed: 0,
            on_time_count: 0,
            late_count: 0,
            overdue_open_count: 0,
            quality_checklist_score: None,
            quality_samples: 0,
            kras_covered_count: 0,
            kras_total_count: 0,
            kras_completed_count: 0,
        }
    }

    pub fn overdue_count(&self) -> u32 {
        self.late_count + self.overdue_open_count
    }
}

/// Collection failure for one member, tagged so a batch can skip it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("could not collect metrics for {user_id}: {reason}")]
pub struct CollectionError {
    pub user_id: UserId,
    pub reason: String,
}

impl CollectionError {
    pub fn new(user_id: UserId, source: &SourceError) -> Self {
        Self {
            user_id,
            reason: source.to_string(),
        }
    }
}

/// Gathers per-user counts from the task and goal stores.
#[derive(Clone)]
pub struct MetricCollector {
    tasks: Arc<dyn TaskSource>,
    goals: Arc<dyn GoalSource>,
}

impl MetricCollector {
    pub fn new(tasks: Arc<dyn TaskSource>, goals: Arc<dyn GoalSource>) -> Self {
        Self { tasks, goals }
    }

    pub async fn collect(
        &self,
        user: &UserId,
        week: ReportWeek,
    ) -> Result<UserMetrics, CollectionError> {
        let tasks = self
            .tasks
            .tasks_for_user(user, week)
            .await
            .map_err(|err| CollectionError::new(user.clone(), &err))?;
        let goals = self
            .goals
            .goals_for_user(user, week)
            .await
            .map_err(|err| CollectionError::new(user.clone(), &err))?;

        let assigned_goals: BTreeSet<&GoalId> = goals
            .iter()
            .filter(|goal| &goal.owner == user)
            .map(|goal| &goal.id)
            .collect();

        let mut metrics = UserMetrics::empty(user.clone());
        let mut quality_total = 0.0;
        let mut touched_goals: BTreeSet<&GoalId> = BTreeSet::new();

        for task in tasks
            .iter()
            .filter(|task| &task.assignee == user && week.contains(task.relevant_date()))
        {
            metrics.tasks_assigned += 1;

            if let Some(goal) = task.goal.as_ref() {
                if assigned_goals.contains(goal) {
                    touched_goals.insert(goal);
                }
            }

            match task.completed_on_time() {
                Some(true) => {
                    metrics.tasks_completed += 1;
                    metrics.on_time_count += 1;
                }
                Some(false) => {
                    metrics.tasks_completed += 1;
                    metrics.late_count += 1;
                }
                None => {
                    if task.is_overdue_at(week.end) {
                        metrics.overdue_open_count += 1;
                    }
                    continue;
                }
            }

            if let Some(score) = task.checklist.as_ref().and_then(|list| list.score()) {
                quality_total += score;
                metrics.quality_samples += 1;
            }
        }

        if metrics.quality_samples > 0 {
            metrics.quality_checklist_score = Some(quality_total / metrics.quality_samples as f64);
        }

        metrics.kras_total_count = assigned_goals.len() as u32;
        metrics.kras_covered_count = touched_goals.len() as u32;
        metrics.kras_completed_count = goals
            .iter()
            .filter(|goal| &goal.owner == user && goal.status == GoalStatus::Completed)
            .map(|goal| &goal.id)
            .collect::<BTreeSet<_>>()
            .len() as u32;

        debug!(
            user = %user,
            week = %week,
            assigned = metrics.tasks_assigned,
            completed = metrics.tasks_completed,
            "collected user metrics"
        );

        Ok(metrics)
    }
}
