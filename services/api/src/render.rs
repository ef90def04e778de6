use std::io::Write;
use team_pulse::error::AppError;
use team_pulse::workflows::kpi::KpiRecord;
use team_pulse::workflows::performance::WeeklyReport;

pub(crate) fn write_report_json<W: Write>(
    report: &WeeklyReport,
    mut out: W,
) -> Result<(), AppError> {
    serde_json::to_writer_pretty(&mut out, report)?;
    writeln!(out)?;
    Ok(())
}

pub(crate) fn render_report(report: &WeeklyReport) {
    println!(
        "\nWeekly report for {} ({} to {})",
        report.scope_key, report.week_start, report.week_end
    );
    println!("- {}", report.coverage_label());
    println!(
        "- Tasks: {} completed of {} assigned | KRAs: {} completed of {}",
        report.tasks_completed, report.tasks_assigned, report.completed_kras, report.total_kras
    );
    println!(
        "- Average score {:.1} (completion {:.1} | timeliness {:.1} | quality {:.1} | KRA alignment {:.1})",
        report.average_score,
        report.breakdown.completion_score,
        report.breakdown.timeliness_score,
        report.breakdown.quality_score,
        report.breakdown.kra_alignment_score
    );
    println!(
        "- Weights {}/{}/{}/{}",
        report.weights.completion,
        report.weights.timeliness,
        report.weights.quality,
        report.weights.kra_alignment
    );

    if !report.top_performers.is_empty() {
        println!("- Top performers: {}", report.top_performers.join(", "));
    }

    println!("Rankings:");
    for member in &report.member_scores {
        println!(
            "  {:>2}. {:<18} {:>3} | {} of {} done | {} late | {} overdue",
            member.rank,
            member.display_name,
            member.breakdown.overall_score,
            member.metrics.tasks_completed,
            member.metrics.tasks_assigned,
            member.metrics.late_count,
            member.metrics.overdue_open_count
        );
    }

    if let Some(partial) = &report.partial {
        for failure in &partial.failed {
            println!("  !! {} not scored: {}", failure.user_id, failure.reason);
        }
    }

    if report.issues.is_empty() {
        println!("Issues: none");
    } else {
        println!("Issues:");
        for issue in &report.issues {
            println!("  - {issue}");
        }
    }
}

pub(crate) fn render_kpi_table(records: &[KpiRecord]) {
    println!("\nKPI tracking");
    println!(
        "  {:<22} {:>8} {:>8} {:>8} {:>8} {:>9}  {}",
        "KPI", "last", "planned", "actual", "target", "variance", "status"
    );
    for record in records {
        println!(
            "  {:<22} {:>8.1} {:>8.1} {:>8.1} {:>8.1} {:>8}%  {}",
            record.name,
            record.last_week_actual,
            record.current_week_planned,
            record.current_week_actual,
            record.next_week_target,
            record.variance(),
            record.status().label()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::{seed_workspace, DEMO_TEAM};
    use crate::infra::build_service;
    use chrono::NaiveDate;
    use std::io;
    use std::sync::Arc;
    use team_pulse::workflows::performance::{ReportSettings, ReportWeek, Scope, TeamId};

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "stdout closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    async fn demo_report() -> WeeklyReport {
        let week = ReportWeek::iso(NaiveDate::from_ymd_opt(2025, 9, 22).expect("valid date"))
            .expect("week in range");
        build_service(Arc::new(seed_workspace(week)), ReportSettings::default())
            .generate(&Scope::Team(TeamId::new(DEMO_TEAM)), week.start)
            .await
            .expect("demo report")
    }

    #[tokio::test]
    async fn json_output_is_the_full_report() {
        let report = demo_report().await;
        let mut out = Vec::new();
        write_report_json(&report, &mut out).expect("written");

        let parsed: WeeklyReport = serde_json::from_slice(&out).expect("valid json");
        assert_eq!(parsed, report);
    }

    #[tokio::test]
    async fn json_output_failures_are_returned() {
        let report = demo_report().await;
        let error = write_report_json(&report, ClosedPipe).expect_err("write fails");
        assert!(matches!(error, AppError::Serialization(_)));
        assert!(error.to_string().starts_with("serialization error"));
    }
}
