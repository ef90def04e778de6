use chrono::{NaiveDate, Weekday};
use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use team_pulse::workflows::import::{WorkspaceImporter, WorkspaceSnapshot};
use team_pulse::workflows::kpi::KpiVarianceTracker;
use team_pulse::workflows::performance::{
    MetricCollector, PerformanceService, ReportError, ReportGenerator, ReportRepository,
    ReportSettings, RepositoryError, Scope, ScoringConfigStore, TeamId, UserId, WeeklyReport,
};

const TASKS: &str = "Task ID,Assignee ID,Assignee Name,Team,Goal ID,Title,Assigned On,Due Date,Completed At,Checklist Passed,Checklist Total
t-1,u-kim,Kim,ops,g-kim-1,Patch fleet,2025-09-21,2025-09-23,2025-09-22T10:00:00Z,4,4
t-2,u-kim,Kim,ops,,Rotate certs,2025-09-21,2025-09-24,2025-09-24T18:30:00Z,3,4
t-3,u-lee,Lee,ops,,Write postmortem,2025-09-21,2025-09-22,2025-09-23T09:00:00Z,,
t-4,u-lee,Lee,ops,,Tune alerts,2025-09-21,2025-09-26,,,
t-5,u-moe,Moe,ops,,Capacity review,2025-09-22,,,,
t-6,u-kim,Kim,ops,,Backfill logs,2025-09-21,,2025-09-28T08:00:00Z,,
";

const GOALS: &str = "Goal ID,Owner ID,Title,Status
g-kim-1,u-kim,Fleet hygiene,Active
g-kim-2,u-kim,Runbook coverage,Completed
g-lee-1,u-lee,Alert quality,In Progress
";

#[derive(Default)]
struct RecordingRepository {
    records: Mutex<BTreeMap<(String, NaiveDate), WeeklyReport>>,
}

impl ReportRepository for RecordingRepository {
    fn save(&self, report: WeeklyReport) -> Result<Option<WeeklyReport>, RepositoryError> {
        let mut guard = self.records.lock().expect("mutex poisoned");
        Ok(guard.insert((report.scope_key.clone(), report.week_start), report))
    }

    fn fetch(
        &self,
        scope_key: &str,
        week_start: NaiveDate,
    ) -> Result<Option<WeeklyReport>, RepositoryError> {
        let guard = self.records.lock().expect("mutex poisoned");
        Ok(guard.get(&(scope_key.to_string(), week_start)).cloned())
    }

    fn history(&self, scope_key: &str, limit: usize) -> Result<Vec<WeeklyReport>, RepositoryError> {
        let guard = self.records.lock().expect("mutex poisoned");
        Ok(guard
            .iter()
            .rev()
            .filter(|((key, _), _)| key == scope_key)
            .take(limit)
            .map(|(_, report)| report.clone())
            .collect())
    }
}

fn workspace() -> Arc<WorkspaceSnapshot> {
    Arc::new(
        WorkspaceImporter::from_readers(Cursor::new(TASKS), Some(Cursor::new(GOALS)))
            .expect("workspace imports"),
    )
}

fn service(week_start: Weekday) -> PerformanceService<RecordingRepository> {
    let workspace = workspace();
    let config = Arc::new(ScoringConfigStore::new());
    let generator = Arc::new(ReportGenerator::new(
        MetricCollector::new(workspace.clone(), workspace.clone()),
        workspace,
        config.clone(),
        ReportSettings {
            week_start,
            max_concurrency: 2,
            ..ReportSettings::default()
        },
    ));
    PerformanceService::new(
        config,
        generator,
        Arc::new(RecordingRepository::default()),
        Arc::new(KpiVarianceTracker::new()),
    )
}

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 9, day).expect("valid date")
}

#[tokio::test]
async fn imported_team_is_scored_ranked_and_flagged() {
    let service = service(Weekday::Sun);
    service.initialize_defaults("ops-lead");

    let report = service
        .generate(&Scope::Team(TeamId::new("ops")), date(24))
        .await
        .expect("report generated");

    assert_eq!(report.week_start, date(21));
    assert_eq!(report.week_end, date(27));
    assert_eq!(report.tasks_assigned, 5, "next week's completion stays out");
    assert_eq!(report.tasks_completed, 3);
    assert_eq!(report.total_kras, 3);
    assert_eq!(report.completed_kras, 1);

    let ranking: Vec<(&str, u8)> = report
        .member_scores
        .iter()
        .map(|member| (member.display_name.as_str(), member.breakdown.overall_score))
        .collect();
    assert_eq!(ranking, vec![("Kim", 93), ("Moe", 50), ("Lee", 40)]);
    assert_eq!(report.top_performers, vec!["Kim", "Moe", "Lee"]);

    assert_eq!(report.average_score, 61.0);
    assert_eq!(report.breakdown.completion_score, 50.0);
    assert_eq!(report.breakdown.timeliness_score, 66.7);
    assert_eq!(report.breakdown.quality_score, 95.8);
    assert_eq!(report.breakdown.kra_alignment_score, 16.7);

    assert_eq!(
        report.issues,
        vec![
            "40% of tasks are overdue (2 of 5), above the 20% limit".to_string(),
            "No KRA coverage for 1 member: Lee".to_string(),
            "1 member completed none of their assigned tasks: Moe".to_string(),
        ]
    );
}

#[tokio::test]
async fn week_boundary_follows_configured_start_day() {
    let sunday = service(Weekday::Sun)
        .generate(&Scope::User(UserId::new("u-kim")), date(28))
        .await
        .expect("report");
    assert_eq!(sunday.week_start, date(28));
    assert_eq!(sunday.tasks_assigned, 1);

    let monday = service(Weekday::Mon)
        .generate(&Scope::User(UserId::new("u-kim")), date(28))
        .await
        .expect("report");
    assert_eq!(monday.week_start, date(22));
    assert_eq!(monday.tasks_assigned, 3);
}

#[tokio::test]
async fn stored_reports_are_replaced_and_retrievable() {
    let service = service(Weekday::Sun);
    let scope = Scope::Team(TeamId::new("ops"));

    let first = service.generate(&scope, date(21)).await.expect("first");
    let second = service.generate(&scope, date(27)).await.expect("second");
    assert!(second.generated_at >= first.generated_at);

    let stored = service.get_report(&scope, date(23)).expect("stored");
    assert_eq!(stored, second);
    assert_eq!(service.report_history(&scope, 10).expect("history").len(), 1);

    match service.get_report(&scope, date(14)) {
        Err(ReportError::NotFound { week_start, .. }) => assert_eq!(week_start, date(14)),
        other => panic!("expected missing report, got {other:?}"),
    }
}

#[tokio::test]
async fn unknown_team_is_an_empty_scope() {
    let error = service(Weekday::Mon)
        .generate(&Scope::Team(TeamId::new("finance")), date(22))
        .await
        .expect_err("no members");
    assert!(matches!(error, ReportError::EmptyScope(_)));
}
