use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::kpi::KpiVarianceTracker;
use crate::workflows::performance::collector::MetricCollector;
use crate::workflows::performance::config_store::ScoringConfigStore;
use crate::workflows::performance::domain::{
    GoalId, GoalRecord, GoalStatus, Member, QualityChecklist, ReportWeek, TaskId, TaskRecord,
    TeamId, UserId,
};
use crate::workflows::performance::report::{ReportGenerator, ReportSettings, WeeklyReport};
use crate::workflows::performance::service::PerformanceService;
use crate::workflows::performance::sources::{
    GoalSource, ReportRepository, RepositoryError, SourceError, TaskSource, TeamDirectory,
};

pub(super) const TEAM: &str = "platform";

pub(super) fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 9, day).expect("valid date")
}

pub(super) fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, day, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// Monday 2025-09-22 through Sunday 2025-09-28.
pub(super) fn week() -> ReportWeek {
    ReportWeek::iso(date(22)).expect("week in range")
}

pub(super) fn task(
    id: &str,
    user: &str,
    due: Option<u32>,
    completed: Option<u32>,
    goal: Option<&str>,
    checklist: Option<(u32, u32)>,
) -> TaskRecord {
    TaskRecord {
        id: TaskId::new(id),
        assignee: UserId::new(user),
        title: format!("Task {id}"),
        goal: goal.map(GoalId::new),
        assigned_on: date(22),
        due_on: due.map(date),
        completed_at: completed.map(|day| at(day, 15)),
        checklist: checklist.map(|(passed, total)| QualityChecklist::from_counts(passed, total)),
    }
}

pub(super) fn goal(id: &str, owner: &str, status: GoalStatus) -> GoalRecord {
    GoalRecord {
        id: GoalId::new(id),
        owner: UserId::new(owner),
        title: format!("Goal {id}"),
        status,
    }
}

pub(super) fn member(id: &str, name: &str) -> Member {
    Member {
        user_id: UserId::new(id),
        display_name: name.to_string(),
    }
}

/// In-memory collaborator with switchable failures, latency, and in-flight tracking.
#[derive(Default)]
pub(super) struct FakeWorkspace {
    pub tasks: Vec<TaskRecord>,
    pub goals: Vec<GoalRecord>,
    pub teams: BTreeMap<TeamId, Vec<Member>>,
    pub failing_users: HashSet<UserId>,
    pub directory_down: bool,
    pub delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeWorkspace {
    pub(super) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn enter(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn leave(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl TaskSource for FakeWorkspace {
    async fn tasks_for_user(
        &self,
        user: &UserId,
        _week: ReportWeek,
    ) -> Result<Vec<TaskRecord>, SourceError> {
        self.enter().await;
        let result = if self.failing_users.contains(user) {
            Err(SourceError::Unavailable(format!("task store timeout for {user}")))
        } else {
            Ok(self
                .tasks
                .iter()
                .filter(|task| &task.assignee == user)
                .cloned()
                .collect())
        };
        self.leave();
        result
    }
}

#[async_trait]
impl GoalSource for FakeWorkspace {
    async fn goals_for_user(
        &self,
        user: &UserId,
        _week: ReportWeek,
    ) -> Result<Vec<GoalRecord>, SourceError> {
        Ok(self
            .goals
            .iter()
            .filter(|goal| &goal.owner == user)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TeamDirectory for FakeWorkspace {
    async fn member(&self, user: &UserId) -> Result<Option<Member>, SourceError> {
        if self.directory_down {
            return Err(SourceError::Unavailable("directory offline".to_string()));
        }
        Ok(self
            .teams
            .values()
            .flatten()
            .find(|member| &member.user_id == user)
            .cloned())
    }

    async fn team_members(&self, team: &TeamId) -> Result<Vec<Member>, SourceError> {
        if self.directory_down {
            return Err(SourceError::Unavailable("directory offline".to_string()));
        }
        Ok(self.teams.get(team).cloned().unwrap_or_default())
    }
}

/// Five-member team: ana mirrors the reference scoring example, bo is flawless,
/// cy has not delivered, and dee/eli exist only in the directory.
pub(super) fn team_workspace() -> FakeWorkspace {
    let mut tasks = Vec::new();
    for index in 0..6 {
        let goal = match index {
            0 => Some("g-ana-1"),
            1 => Some("g-ana-2"),
            _ => None,
        };
        tasks.push(task(
            &format!("ana-on-time-{index}"),
            "ana",
            Some(25),
            Some(23),
            goal,
            Some((9, 10)),
        ));
    }
    for index in 0..2 {
        tasks.push(task(
            &format!("ana-late-{index}"),
            "ana",
            Some(22),
            Some(24),
            None,
            Some((9, 10)),
        ));
    }
    for index in 0..2 {
        tasks.push(task(
            &format!("ana-open-{index}"),
            "ana",
            Some(28),
            None,
            None,
            None,
        ));
    }
    // Outside the reporting week.
    tasks.push(task("ana-next-week", "ana", Some(30), None, None, None));
    tasks.push(task("ana-last-week", "ana", Some(15), Some(15), None, None));

    for index in 0..4 {
        tasks.push(task(
            &format!("bo-{index}"),
            "bo",
            None,
            Some(24),
            Some("g-bo-1"),
            None,
        ));
    }

    tasks.push(task("cy-overdue", "cy", Some(23), None, None, None));
    tasks.push(task("cy-open", "cy", Some(27), None, None, None));

    let goals = vec![
        goal("g-ana-1", "ana", GoalStatus::Completed),
        goal("g-ana-2", "ana", GoalStatus::Active),
        goal("g-ana-3", "ana", GoalStatus::Active),
        goal("g-ana-4", "ana", GoalStatus::Active),
        goal("g-bo-1", "bo", GoalStatus::Active),
        goal("g-cy-1", "cy", GoalStatus::Active),
    ];

    let mut teams = BTreeMap::new();
    teams.insert(
        TeamId::new(TEAM),
        vec![
            member("eli", "Eli"),
            member("cy", "Cy"),
            member("ana", "Ana"),
            member("dee", "Dee"),
            member("bo", "Bo"),
        ],
    );
    teams.insert(TeamId::new("empty"), Vec::new());

    FakeWorkspace {
        tasks,
        goals,
        teams,
        ..FakeWorkspace::default()
    }
}

pub(super) fn failing(workspace: FakeWorkspace, users: &[&str]) -> FakeWorkspace {
    FakeWorkspace {
        failing_users: users.iter().map(|user| UserId::new(*user)).collect(),
        ..workspace
    }
}

pub(super) fn build_generator(
    workspace: Arc<FakeWorkspace>,
    config: Arc<ScoringConfigStore>,
    settings: ReportSettings,
) -> ReportGenerator {
    let collector = MetricCollector::new(workspace.clone(), workspace.clone());
    ReportGenerator::new(collector, workspace, config, settings)
}

pub(super) fn build_service(
    workspace: FakeWorkspace,
) -> (PerformanceService<MemoryReports>, Arc<MemoryReports>) {
    let workspace = Arc::new(workspace);
    let config = Arc::new(ScoringConfigStore::new());
    let generator = Arc::new(build_generator(
        workspace,
        config.clone(),
        ReportSettings::default(),
    ));
    let reports = Arc::new(MemoryReports::default());
    let service = PerformanceService::new(
        config,
        generator,
        reports.clone(),
        Arc::new(KpiVarianceTracker::new()),
    );
    (service, reports)
}

#[derive(Default)]
pub(super) struct MemoryReports {
    records: Mutex<BTreeMap<(String, NaiveDate), WeeklyReport>>,
}

impl MemoryReports {
    pub(super) fn len(&self) -> usize {
        self.records.lock().expect("reports mutex poisoned").len()
    }
}

impl ReportRepository for MemoryReports {
    fn save(&self, report: WeeklyReport) -> Result<Option<WeeklyReport>, RepositoryError> {
        let mut guard = self.records.lock().expect("reports mutex poisoned");
        Ok(guard.insert((report.scope_key.clone(), report.week_start), report))
    }

    fn fetch(
        &self,
        scope_key: &str,
        week_start: NaiveDate,
    ) -> Result<Option<WeeklyReport>, RepositoryError> {
        let guard = self.records.lock().expect("reports mutex poisoned");
        Ok(guard.get(&(scope_key.to_string(), week_start)).cloned())
    }

    fn history(&self, scope_key: &str, limit: usize) -> Result<Vec<WeeklyReport>, RepositoryError> {
        let guard = self.records.lock().expect("reports mutex poisoned");
        Ok(guard
            .iter()
            .rev()
            .filter(|((key, _), _)| key == scope_key)
            .take(limit)
            .map(|(_, report)| report.clone())
            .collect())
    }
}

pub(super) struct UnavailableReports;

impl ReportRepository for UnavailableReports {
    fn save(&self, _report: WeeklyReport) -> Result<Option<WeeklyReport>, RepositoryError> {
        Err(RepositoryError::Unavailable("report store offline".to_string()))
    }

    fn fetch(
        &self,
        _scope_key: &str,
        _week_start: NaiveDate,
    ) -> Result<Option<WeeklyReport>, RepositoryError> {
        Err(RepositoryError::Unavailable("report store offline".to_string()))
    }

    fn history(
        &self,
        _scope_key: &str,
        _limit: usize,
    ) -> Result<Vec<WeeklyReport>, RepositoryError> {
        Err(RepositoryError::Unavailable("report store offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
