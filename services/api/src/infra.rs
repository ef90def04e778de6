use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use team_pulse::workflows::import::WorkspaceSnapshot;
use team_pulse::workflows::kpi::KpiVarianceTracker;
use team_pulse::workflows::performance::{
    MetricCollector, PerformanceService, ReportGenerator, ReportRepository, ReportSettings,
    RepositoryError, ScoringConfigStore, WeeklyReport,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Reports keyed by scope and week start; saving replaces the whole record.
#[derive(Default, Clone)]
pub(crate) struct InMemoryReportRepository {
    records: Arc<Mutex<BTreeMap<(String, NaiveDate), WeeklyReport>>>,
}

impl ReportRepository for InMemoryReportRepository {
    fn save(&self, report: WeeklyReport) -> Result<Option<WeeklyReport>, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.insert((report.scope_key.clone(), report.week_start), report))
    }

    fn fetch(
        &self,
        scope_key: &str,
        week_start: NaiveDate,
    ) -> Result<Option<WeeklyReport>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(&(scope_key.to_string(), week_start)).cloned())
    }

    fn history(&self, scope_key: &str, limit: usize) -> Result<Vec<WeeklyReport>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .iter()
            .rev()
            .filter(|((key, _), _)| key == scope_key)
            .take(limit)
            .map(|(_, report)| report.clone())
            .collect())
    }
}

pub(crate) type AppService = PerformanceService<InMemoryReportRepository>;

/// Wires the snapshot in as task store, goal store, and directory.
pub(crate) fn build_service(
    workspace: Arc<WorkspaceSnapshot>,
    settings: ReportSettings,
) -> Arc<AppService> {
    let config = Arc::new(ScoringConfigStore::new());
    let collector = MetricCollector::new(workspace.clone(), workspace.clone());
    let generator = Arc::new(ReportGenerator::new(
        collector,
        workspace,
        config.clone(),
        settings,
    ));
    Arc::new(PerformanceService::new(
        config,
        generator,
        Arc::new(InMemoryReportRepository::default()),
        Arc::new(KpiVarianceTracker::new()),
    ))
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
