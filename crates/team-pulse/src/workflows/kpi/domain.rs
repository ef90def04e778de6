use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::workflows::performance::domain::UserId;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KpiId(pub String);

impl KpiId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl fmt::Display for KpiId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Registration payload for a newly tracked indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiDefinition {
    pub id: KpiId,
    pub owner: UserId,
    pub name: String,
    #[serde(default)]
    pub benchmark: f64,
}

/// Stored weekly values for one KPI. Variance is derived on read and never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiRecord {
    pub id: KpiId,
    pub owner: UserId,
    pub name: String,
    pub last_week_actual: f64,
    pub current_week_planned: f64,
    pub current_week_actual: f64,
    pub next_week_target: f64,
    pub benchmark: f64,
    pub week_start: Option<NaiveDate>,
    pub weeks_tracked: u32,
    pub updated_at: DateTime<Utc>,
}

impl KpiRecord {
    pub fn new(definition: KpiDefinition) -> Self {
        Self {
            id: definition.id,
            owner: definition.owner,
            name: definition.name,
            last_week_actual: 0.0,
            current_week_planned: 0.0,
            current_week_actual: 0.0,
            next_week_target: 0.0,
            benchmark: definition.benchmark,
            week_start: None,
            weeks_tracked: 0,
            updated_at: Utc::now(),
        }
    }

    /// Percent deviation of actual from planned; zero when nothing was planned.
    pub fn variance(&self) -> i64 {
        variance(self.current_week_planned, self.current_week_actual)
    }

    pub fn status(&self) -> KpiStatus {
        match self.weeks_tracked {
            0 => KpiStatus::NotStarted,
            week => KpiStatus::Tracked { week },
        }
    }

    pub fn view(&self) -> KpiView {
        KpiView {
            id: self.id.clone(),
            owner: self.owner.clone(),
            name: self.name.clone(),
            last_week_actual: self.last_week_actual,
            current_week_planned: self.current_week_planned,
            current_week_actual: self.current_week_actual,
            next_week_target: self.next_week_target,
            benchmark: self.benchmark,
            variance: self.variance(),
            status: self.status(),
            week_start: self.week_start,
            updated_at: self.updated_at,
        }
    }
}

pub fn variance(planned: f64, actual: f64) -> i64 {
    if planned == 0.0 {
        return 0;
    }
    ((actual - planned) / planned * 100.0).round() as i64
}

/// Lifecycle position: KPIs start untracked and are re-tracked every week with no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum KpiStatus {
    NotStarted,
    Tracked { week: u32 },
}

impl KpiStatus {
    pub fn label(self) -> String {
        match self {
            Self::NotStarted => "Not Started".to_string(),
            Self::Tracked { week } => format!("Tracked (week {week})"),
        }
    }
}

/// Partial weekly update; only supplied fields change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KpiUpdate {
    #[serde(default)]
    pub week_start: Option<NaiveDate>,
    #[serde(default)]
    pub last_week_actual: Option<f64>,
    #[serde(default)]
    pub current_week_planned: Option<f64>,
    #[serde(default)]
    pub current_week_actual: Option<f64>,
    #[serde(default)]
    pub next_week_target: Option<f64>,
    #[serde(default)]
    pub benchmark: Option<f64>,
}

/// Serialized snapshot including the derived variance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiView {
    pub id: KpiId,
    pub owner: UserId,
    pub name: String,
    pub last_week_actual: f64,
    pub current_week_planned: f64,
    pub current_week_actual: f64,
    pub next_week_target: f64,
    pub benchmark: f64,
    pub variance: i64,
    pub status: KpiStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub week_start: Option<NaiveDate>,
    pub updated_at: DateTime<Utc>,
}
