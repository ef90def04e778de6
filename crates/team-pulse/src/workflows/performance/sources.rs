use async_trait::async_trait;
use chrono::NaiveDate;

use super::domain::{GoalRecord, Member, ReportWeek, TaskRecord, TeamId, UserId};
use super::report::WeeklyReport;

/// Read-only access to the task store.
#[async_trait]
pub trait TaskSource: Send + Sync {
    async fn tasks_for_user(
        &self,
        user: &UserId,
        week: ReportWeek,
    ) -> Result<Vec<TaskRecord>, SourceError>;
}

/// Read-only access to goals (KRAs) assigned to users.
#[async_trait]
pub trait GoalSource: Send + Sync {
    async fn goals_for_user(
        &self,
        user: &UserId,
        week: ReportWeek,
    ) -> Result<Vec<GoalRecord>, SourceError>;
}

/// User and team directory.
#[async_trait]
pub trait TeamDirectory: Send + Sync {
    async fn member(&self, user: &UserId) -> Result<Option<Member>, SourceError>;
    async fn team_members(&self, team: &TeamId) -> Result<Vec<Member>, SourceError>;
}

/// Failure reported by an external collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    #[error("data source unavailable: {0}")]
    Unavailable(String),
    #[error("not found: {0}")]
    NotFound(String),
}

/// Storage for generated reports. Saving replaces any report with the same identity.
pub trait ReportRepository: Send + Sync {
    /// Stores `report`, returning the report it superseded.
    fn save(&self, report: WeeklyReport) -> Result<Option<WeeklyReport>, RepositoryError>;
    fn fetch(
        &self,
        scope_key: &str,
        week_start: NaiveDate,
    ) -> Result<Option<WeeklyReport>, RepositoryError>;
    /// Reports for a scope, newest week first.
    fn history(&self, scope_key: &str, limit: usize) -> Result<Vec<WeeklyReport>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
