//! Weighted performance scoring and weekly report generation.
//!
//! Raw task and goal records flow through [`MetricCollector`] (one user, one
//! week) into [`ScoreCalculator`], and [`ReportGenerator`] fans that work out
//! across a scope's members before ranking them and deriving findings.

pub mod calculator;
pub mod collector;
pub mod config_store;
pub mod domain;
pub mod report;
pub mod router;
pub mod service;
pub mod sources;

#[cfg(test)]
mod tests;

pub use calculator::{ScoreBreakdown, ScoreCalculator};
pub use collector::{CollectionError, MetricCollector, UserMetrics};
pub use config_store::{
    ConfigStoreError, ScoringConfig, ScoringConfigStore, ScoringConfigUpdate, ScoringWeights,
};
pub use domain::{
    GoalId, GoalRecord, GoalStatus, Member, QualityChecklist, ReportWeek, Scope, TaskId,
    TaskRecord, TeamId, UserId,
};
pub use report::{
    IssueThresholds, MemberScore, PartialCollection, ReportError, ReportGenerator, ReportSettings,
    WeeklyReport,
};
pub use router::performance_router;
pub use service::PerformanceService;
pub use sources::{
    GoalSource, ReportRepository, RepositoryError, SourceError, TaskSource, TeamDirectory,
};
