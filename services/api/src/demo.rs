use crate::infra::{build_service, parse_date, AppService};
use crate::render::{render_kpi_table, render_report};
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use clap::Args;
use std::sync::Arc;
use team_pulse::error::AppError;
use team_pulse::workflows::import::WorkspaceSnapshot;
use team_pulse::workflows::kpi::{KpiDefinition, KpiId, KpiUpdate};
use team_pulse::workflows::performance::{
    GoalId, GoalRecord, GoalStatus, Member, QualityChecklist, ReportError, ReportSettings,
    ReportWeek, Scope, TaskId, TaskRecord, TeamId, UserId,
};

pub(crate) const DEMO_TEAM: &str = "customer-success";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Any date inside the week to score (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) week: Option<NaiveDate>,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let settings = ReportSettings::default();
    let anchor = args.week.unwrap_or_else(|| Local::now().date_naive());
    let week = ReportWeek::containing(anchor, settings.week_start)
        .ok_or(ReportError::WeekOutOfRange(anchor))?;

    println!("Team pulse demo");
    let service = build_service(Arc::new(seed_workspace(week)), settings);
    let config = service.initialize_defaults("demo");
    println!(
        "- Scoring config initialized by {} at {}",
        config.updated_by, config.updated_at
    );

    let report = service
        .generate(&Scope::Team(TeamId::new(DEMO_TEAM)), week.start)
        .await?;
    render_report(&report);

    let owner = UserId::new("u-amara");
    seed_kpis(&service, &owner, week);
    let records = service.kpis_for_owner(&owner);
    render_kpi_table(&records);

    Ok(())
}

fn seed_kpis(service: &AppService, owner: &UserId, week: ReportWeek) {
    let kpis = [
        ("kpi-csat", "Customer satisfaction", 92.0, 90.0, 94.0, 88.0, 93.0),
        ("kpi-renewals", "Renewals closed", 18.0, 20.0, 15.0, 22.0, 20.0),
        ("kpi-tickets", "Escalations resolved", 0.0, 0.0, 6.0, 0.0, 5.0),
    ];

    for (id, name, benchmark, last, planned, actual, target) in kpis {
        let kpi_id = KpiId::new(id);
        if let Err(err) = service.register_kpi(KpiDefinition {
            id: kpi_id.clone(),
            owner: owner.clone(),
            name: name.to_string(),
            benchmark,
        }) {
            println!("  KPI registration rejected: {err}");
            continue;
        }
        let update = KpiUpdate {
            week_start: Some(week.start),
            last_week_actual: Some(last),
            current_week_planned: Some(planned),
            current_week_actual: Some(actual),
            next_week_target: Some(target),
            benchmark: None,
        };
        if let Err(err) = service.record_week(&kpi_id, update) {
            println!("  KPI update rejected: {err}");
        }
    }
}

fn at(day: NaiveDate, hour: i64) -> DateTime<Utc> {
    Utc.from_utc_datetime(&day.and_time(NaiveTime::default())) + Duration::hours(hour)
}

/// Four-person team with a spread of outcomes: one strong week, one solid,
/// one with late deliveries and skipped checklists, one with nothing closed.
pub(crate) fn seed_workspace(week: ReportWeek) -> WorkspaceSnapshot {
    let day = |offset: i64| week.start + Duration::days(offset);
    let team = Some(TeamId::new(DEMO_TEAM));
    let mut workspace = WorkspaceSnapshot::new();

    for (id, name) in [
        ("u-amara", "Amara Obi"),
        ("u-ben", "Ben Ortiz"),
        ("u-chen", "Chen Li"),
        ("u-dana", "Dana Wu"),
    ] {
        workspace.add_member(
            Member {
                user_id: UserId::new(id),
                display_name: name.to_string(),
            },
            team.clone(),
        );
    }

    // (task, assignee, due offset, completed offset, goal, checklist passed/total)
    let tasks: [(&str, &str, Option<i64>, Option<i64>, Option<&str>, Option<(u32, u32)>); 14] = [
        ("cs-101", "u-amara", Some(1), Some(1), Some("g-amara-renewals"), Some((5, 5))),
        ("cs-102", "u-amara", Some(2), Some(2), Some("g-amara-csat"), Some((4, 5))),
        ("cs-103", "u-amara", Some(3), Some(2), None, Some((5, 5))),
        ("cs-104", "u-amara", Some(4), Some(4), Some("g-amara-renewals"), None),
        ("cs-201", "u-ben", Some(1), Some(1), Some("g-ben-onboarding"), Some((3, 4))),
        ("cs-202", "u-ben", Some(2), Some(3), None, Some((4, 4))),
        ("cs-203", "u-ben", Some(4), Some(4), None, Some((3, 4))),
        ("cs-204", "u-ben", Some(6), None, None, None),
        ("cs-301", "u-chen", Some(0), Some(2), None, Some((2, 5))),
        ("cs-302", "u-chen", Some(1), Some(3), Some("g-chen-playbook"), Some((3, 5))),
        ("cs-303", "u-chen", Some(2), None, None, None),
        ("cs-304", "u-chen", Some(3), None, None, None),
        ("cs-401", "u-dana", Some(1), None, Some("g-dana-health"), None),
        ("cs-402", "u-dana", Some(5), None, None, None),
    ];

    for (id, assignee, due, completed, goal, checklist) in tasks {
        workspace.add_task(TaskRecord {
            id: TaskId::new(id),
            assignee: UserId::new(assignee),
            title: format!("Customer success task {id}"),
            goal: goal.map(GoalId::new),
            assigned_on: week.start,
            due_on: due.map(day),
            completed_at: completed.map(|offset| at(day(offset), 15)),
            checklist: checklist
                .map(|(passed, total)| QualityChecklist::from_counts(passed, total)),
        });
    }

    for (id, owner, status) in [
        ("g-amara-renewals", "u-amara", GoalStatus::Active),
        ("g-amara-csat", "u-amara", GoalStatus::Completed),
        ("g-ben-onboarding", "u-ben", GoalStatus::Active),
        ("g-ben-expansion", "u-ben", GoalStatus::Active),
        ("g-chen-playbook", "u-chen", GoalStatus::Active),
        ("g-chen-training", "u-chen", GoalStatus::Active),
        ("g-dana-health", "u-dana", GoalStatus::Active),
    ] {
        workspace.add_goal(GoalRecord {
            id: GoalId::new(id),
            owner: UserId::new(owner),
            title: id.trim_start_matches("g-").replace('-', " "),
            status,
        });
    }

    workspace
}
