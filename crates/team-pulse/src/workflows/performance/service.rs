use chrono::NaiveDate;
use std::sync::Arc;
use tracing::info;

use super::config_store::{ConfigStoreError, ScoringConfig, ScoringConfigStore, ScoringConfigUpdate};
use super::domain::{Scope, UserId};
use super::report::{ReportError, ReportGenerator, WeeklyReport};
use super::sources::ReportRepository;
use crate::workflows::kpi::{KpiDefinition, KpiError, KpiId, KpiRecord, KpiUpdate, KpiVarianceTracker};

/// Operations exposed to dashboards and export tooling.
pub struct PerformanceService<R> {
    config: Arc<ScoringConfigStore>,
    generator: Arc<ReportGenerator>,
    reports: Arc<R>,
    kpis: Arc<KpiVarianceTracker>,
}

impl<R> PerformanceService<R>
where
    R: ReportRepository + 'static,
{
    pub fn new(
        config: Arc<ScoringConfigStore>,
        generator: Arc<ReportGenerator>,
        reports: Arc<R>,
        kpis: Arc<KpiVarianceTracker>,
    ) -> Self {
        Self {
            config,
            generator,
            reports,
            kpis,
        }
    }

    pub fn get_active_config(&self) -> Result<ScoringConfig, ConfigStoreError> {
        self.config.get_active_config()
    }

    pub fn set_config(
        &self,
        candidate: ScoringConfigUpdate,
    ) -> Result<ScoringConfig, ConfigStoreError> {
        self.config.set_config(candidate)
    }

    pub fn initialize_defaults(&self, initialized_by: &str) -> ScoringConfig {
        self.config.initialize_defaults(initialized_by)
    }

    /// Generates and stores the report, replacing any earlier one for the same scope and week.
    pub async fn generate(
        &self,
        scope: &Scope,
        week_start: NaiveDate,
    ) -> Result<WeeklyReport, ReportError> {
        let report = self.generator.generate(scope, week_start).await?;
        let superseded = self.reports.save(report.clone())?;
        if let Some(previous) = superseded {
            info!(
                scope = %report.scope_key,
                week_start = %report.week_start,
                previous_generated_at = %previous.generated_at,
                "superseded earlier weekly report"
            );
        }
        Ok(report)
    }

    pub fn get_report(
        &self,
        scope: &Scope,
        week_start: NaiveDate,
    ) -> Result<WeeklyReport, ReportError> {
        let week = self.generator.week_for(week_start)?;
        let scope_key = scope.scope_key();
        self.reports
            .fetch(&scope_key, week.start)?
            .ok_or(ReportError::NotFound {
                scope_key,
                week_start: week.start,
            })
    }

    pub fn report_history(
        &self,
        scope: &Scope,
        limit: usize,
    ) -> Result<Vec<WeeklyReport>, ReportError> {
        Ok(self.reports.history(&scope.scope_key(), limit)?)
    }

    pub fn register_kpi(&self, definition: KpiDefinition) -> Result<KpiRecord, KpiError> {
        self.kpis.register(definition)
    }

    pub fn record_week(&self, kpi_id: &KpiId, update: KpiUpdate) -> Result<KpiRecord, KpiError> {
        self.kpis.record_week(kpi_id, update)
    }

    pub fn kpi(&self, kpi_id: &KpiId) -> Result<KpiRecord, KpiError> {
        self.kpis.get(kpi_id)
    }

    pub fn kpis_for_owner(&self, owner: &UserId) -> Vec<KpiRecord> {
        self.kpis.for_owner(owner)
    }
}
