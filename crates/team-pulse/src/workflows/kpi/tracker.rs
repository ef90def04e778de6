use chrono::{NaiveDate, Utc};
use std::collections::BTreeMap;
use std::sync::RwLock;
use tracing::info;

use super::domain::{KpiDefinition, KpiId, KpiRecord, KpiUpdate};
use crate::workflows::performance::domain::UserId;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum KpiError {
    #[error("kpi {0} not found")]
    NotFound(KpiId),
    #[error("kpi {0} already exists")]
    AlreadyExists(KpiId),
    #[error("kpi {id} is tracked for week {current}; cannot record earlier week {requested}")]
    StaleWeek {
        id: KpiId,
        current: NaiveDate,
        requested: NaiveDate,
    },
}

/// Week-over-week planned vs. actual tracking for individual indicators.
#[derive(Debug, Default)]
pub struct KpiVarianceTracker {
    records: RwLock<BTreeMap<KpiId, KpiRecord>>,
}

impl KpiVarianceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, definition: KpiDefinition) -> Result<KpiRecord, KpiError> {
        let mut guard = self.records.write().expect("kpi lock poisoned");
        if guard.contains_key(&definition.id) {
            return Err(KpiError::AlreadyExists(definition.id));
        }
        let record = KpiRecord::new(definition);
        guard.insert(record.id.clone(), record.clone());
        info!(kpi = %record.id, owner = %record.owner, "kpi registered");
        Ok(record)
    }

    /// Applies the supplied fields; a later `week_start` moves the KPI into its next tracked week.
    pub fn record_week(&self, kpi_id: &KpiId, update: KpiUpdate) -> Result<KpiRecord, KpiError> {
        let mut guard = self.records.write().expect("kpi lock poisoned");
        let record = guard
            .get_mut(kpi_id)
            .ok_or_else(|| KpiError::NotFound(kpi_id.clone()))?;

        match (record.week_start, update.week_start) {
            (Some(current), Some(requested)) if requested < current => {
                return Err(KpiError::StaleWeek {
                    id: kpi_id.clone(),
                    current,
                    requested,
                });
            }
            (Some(current), Some(requested)) if requested > current => {
                record.week_start = Some(requested);
                record.weeks_tracked += 1;
            }
            (None, Some(requested)) => {
                record.week_start = Some(requested);
                record.weeks_tracked = record.weeks_tracked.max(1);
            }
            (None, None) => record.weeks_tracked = record.weeks_tracked.max(1),
            _ => {}
        }

        if let Some(value) = update.last_week_actual {
            record.last_week_actual = value;
        }
        if let Some(value) = update.current_week_planned {
            record.current_week_planned = value;
        }
        if let Some(value) = update.current_week_actual {
            record.current_week_actual = value;
        }
        if let Some(value) = update.next_week_target {
            record.next_week_target = value;
        }
        if let Some(value) = update.benchmark {
            record.benchmark = value;
        }
        record.updated_at = Utc::now();

        info!(
            kpi = %record.id,
            weeks_tracked = record.weeks_tracked,
            variance = record.variance(),
            "kpi week recorded"
        );
        Ok(record.clone())
    }

    pub fn get(&self, kpi_id: &KpiId) -> Result<KpiRecord, KpiError> {
        self.records
            .read()
            .expect("kpi lock poisoned")
            .get(kpi_id)
            .cloned()
            .ok_or_else(|| KpiError::NotFound(kpi_id.clone()))
    }

    pub fn for_owner(&self, owner: &UserId) -> Vec<KpiRecord> {
        self.records
            .read()
            .expect("kpi lock poisoned")
            .values()
            .filter(|record| &record.owner == owner)
            .cloned()
            .collect()
    }
}
