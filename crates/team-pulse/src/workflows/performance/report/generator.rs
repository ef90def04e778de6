use chrono::{NaiveDate, Utc, Weekday};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::super::calculator::ScoreCalculator;
use super::super::collector::{CollectionError, MetricCollector};
use super::super::config_store::{ScoringConfigStore, ScoringWeights};
use super::super::domain::{Member, ReportWeek, Scope, UserId};
use super::super::sources::{RepositoryError, SourceError, TeamDirectory};
use super::issues::{detect_issues, IssueThresholds};
use super::ranking::{rank_members, top_performers};
use super::summary::{aggregate_breakdown, totals, MemberScore, PartialCollection, WeeklyReport};

/// Knobs for one generator instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSettings {
    pub top_performers: usize,
    /// Upper bound on members collected at once; match the data source's safe limit.
    pub max_concurrency: usize,
    /// Budget for the whole fan-out. Exceeding it discards everything gathered.
    pub timeout: Duration,
    pub week_start: Weekday,
    pub thresholds: IssueThresholds,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            top_performers: 3,
            max_concurrency: 8,
            timeout: Duration::from_secs(30),
            week_start: Weekday::Mon,
            thresholds: IssueThresholds::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("no reporting week can be formed around {0}")]
    WeekOutOfRange(NaiveDate),
    #[error("no members resolved for {0}")]
    EmptyScope(String),
    #[error("no member of {scope_key} could be scored ({} failure(s))", .failures.len())]
    ScopeUnavailable {
        scope_key: String,
        failures: Vec<CollectionError>,
    },
    #[error("team directory failed: {0}")]
    Directory(#[from] SourceError),
    #[error("report generation for {scope_key} timed out after {after:?}")]
    Timeout { scope_key: String, after: Duration },
    #[error("no report for {scope_key} in week starting {week_start}")]
    NotFound {
        scope_key: String,
        week_start: NaiveDate,
    },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

type MemberOutcome = Result<MemberScore, CollectionError>;

/// Fans metric collection out across a scope's members and folds the results into a report.
pub struct ReportGenerator {
    collector: MetricCollector,
    directory: Arc<dyn TeamDirectory>,
    config: Arc<ScoringConfigStore>,
    settings: ReportSettings,
}

impl ReportGenerator {
    pub fn new(
        collector: MetricCollector,
        directory: Arc<dyn TeamDirectory>,
        config: Arc<ScoringConfigStore>,
        settings: ReportSettings,
    ) -> Self {
        Self {
            collector,
            directory,
            config,
            settings,
        }
    }

    pub fn settings(&self) -> &ReportSettings {
        &self.settings
    }

    /// Canonical reporting week for any date.
    pub fn week_for(&self, date: NaiveDate) -> Result<ReportWeek, ReportError> {
        ReportWeek::containing(date, self.settings.week_start)
            .ok_or(ReportError::WeekOutOfRange(date))
    }

    pub async fn generate(
        &self,
        scope: &Scope,
        week_start: NaiveDate,
    ) -> Result<WeeklyReport, ReportError> {
        let week = self.week_for(week_start)?;
        let scope_key = scope.scope_key();
        // One snapshot per run so every member is scored under identical weights.
        let config = self.config.snapshot_or_default();

        let members = self.resolve_members(scope).await?;
        if members.is_empty() {
            warn!(scope = %scope_key, week = %week, "report scope resolved no members");
            return Err(ReportError::EmptyScope(scope_key));
        }

        info!(
            scope = %scope_key,
            week = %week,
            members = members.len(),
            "generating weekly report"
        );

        let resolved = members.len() as u32;
        let mut handles = self.spawn_members(members, week, config.weights);
        let outcomes =
            match tokio::time::timeout(self.settings.timeout, join_members(&mut handles)).await {
                Ok(outcomes) => outcomes,
                Err(_) => {
                    for (_, handle) in &handles {
                        handle.abort();
                    }
                    warn!(
                        scope = %scope_key,
                        after = ?self.settings.timeout,
                        "report generation timed out"
                    );
                    return Err(ReportError::Timeout {
                        scope_key,
                        after: self.settings.timeout,
                    });
                }
            };

        let mut scored = Vec::new();
        let mut failed = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(member) => scored.push(member),
                Err(failure) => {
                    warn!(
                        scope = %scope_key,
                        user = %failure.user_id,
                        reason = %failure.reason,
                        "skipping member"
                    );
                    failed.push(failure);
                }
            }
        }
        failed.sort_by(|a, b| a.user_id.cmp(&b.user_id));

        if scored.is_empty() {
            return Err(ReportError::ScopeUnavailable {
                scope_key,
                failures: failed,
            });
        }

        rank_members(&mut scored);

        let partial = if failed.is_empty() {
            None
        } else {
            Some(PartialCollection {
                resolved,
                scored: scored.len() as u32,
                failed,
            })
        };

        let totals = totals(&scored);
        let (average_score, breakdown) = aggregate_breakdown(&scored);
        let issues = detect_issues(
            &scored,
            &totals,
            average_score,
            partial.as_ref(),
            &self.settings.thresholds,
        );

        let report = WeeklyReport {
            scope: scope.clone(),
            scope_key,
            week_start: week.start,
            week_end: week.end,
            tasks_assigned: totals.tasks_assigned,
            tasks_completed: totals.tasks_completed,
            total_kras: totals.total_kras,
            completed_kras: totals.completed_kras,
            team_members: resolved,
            members_scored: scored.len() as u32,
            average_score,
            breakdown,
            weights: config.weights,
            top_performers: top_performers(&scored, self.settings.top_performers),
            member_scores: scored,
            issues,
            partial,
            generated_at: Utc::now(),
        };

        info!(
            scope = %report.scope_key,
            week = %week,
            coverage = %report.coverage_label(),
            average_score = report.average_score,
            issues = report.issues.len(),
            "weekly report generated"
        );

        Ok(report)
    }

    async fn resolve_members(&self, scope: &Scope) -> Result<Vec<Member>, ReportError> {
        let mut members = match scope {
            Scope::Team(team) => self.directory.team_members(team).await?,
            Scope::User(user) => self.directory.member(user).await?.into_iter().collect(),
        };
        members.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        members.dedup_by(|a, b| a.user_id == b.user_id);
        Ok(members)
    }

    fn spawn_members(
        &self,
        members: Vec<Member>,
        week: ReportWeek,
        weights: ScoringWeights,
    ) -> Vec<(UserId, JoinHandle<MemberOutcome>)> {
        let semaphore = Arc::new(Semaphore::new(self.settings.max_concurrency.max(1)));

        members
            .into_iter()
            .map(|member| {
                let semaphore = semaphore.clone();
                let collector = self.collector.clone();
                let user_id = member.user_id.clone();

                let handle = tokio::spawn(async move {
                    let _permit =
                        semaphore
                            .acquire_owned()
                            .await
                            .map_err(|err| CollectionError {
                                user_id: member.user_id.clone(),
                                reason: format!("worker pool closed: {err}"),
                            })?;
                    let metrics = collector.collect(&member.user_id, week).await?;
                    let breakdown = ScoreCalculator::compute(&metrics, &weights);
                    Ok::<_, CollectionError>(MemberScore {
                        rank: 0,
                        user_id: member.user_id,
                        display_name: member.display_name,
                        metrics,
                        breakdown,
                    })
                });

                (user_id, handle)
            })
            .collect()
    }
}

async fn join_members(handles: &mut [(UserId, JoinHandle<MemberOutcome>)]) -> Vec<MemberOutcome> {
    let mut outcomes = Vec::with_capacity(handles.len());
    for (user_id, handle) in handles.iter_mut() {
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(user = %user_id, error = %err, "member scoring task failed to join");
                Err(CollectionError {
                    user_id: user_id.clone(),
                    reason: format!("scoring task failed: {err}"),
                })
            }
        };
        outcomes.push(outcome);
    }
    outcomes
}
