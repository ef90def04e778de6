use chrono::{DateTime, Datelike, Days, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(UserId);
string_id!(TeamId);
string_id!(GoalId);
string_id!(TaskId);

/// Entity a weekly report is generated for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Scope {
    User(UserId),
    Team(TeamId),
}

impl Scope {
    /// Stable identity used to key stored reports, e.g. `team:platform`.
    pub fn scope_key(&self) -> String {
        match self {
            Scope::User(id) => format!("user:{id}"),
            Scope::Team(id) => format!("team:{id}"),
        }
    }

    pub fn from_parts(kind: &str, id: &str) -> Option<Self> {
        match kind.trim().to_ascii_lowercase().as_str() {
            "user" => Some(Scope::User(UserId::new(id))),
            "team" => Some(Scope::Team(TeamId::new(id))),
            _ => None,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.scope_key())
    }
}

/// Inclusive seven-day reporting window starting on the organization week start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportWeek {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ReportWeek {
    /// Normalizes any date to the week that contains it. `None` when the week
    /// would run past the calendar range `NaiveDate` can represent.
    pub fn containing(date: NaiveDate, week_start: Weekday) -> Option<Self> {
        let offset = (7 + date.weekday().num_days_from_monday()
            - week_start.num_days_from_monday())
            % 7;
        let start = date.checked_sub_days(Days::new(u64::from(offset)))?;
        let end = start.checked_add_days(Days::new(6))?;
        Some(Self { start, end })
    }

    /// ISO week (Monday start).
    pub fn iso(date: NaiveDate) -> Option<Self> {
        Self::containing(date, Weekday::Mon)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

impl fmt::Display for ReportWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Aggregate pass counts for a completed task's quality checklist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityChecklist {
    pub passed: u32,
    pub total: u32,
}

impl QualityChecklist {
    /// Builds a checklist from aggregate counts, as exported by task trackers.
    /// `passed` is capped at `total`.
    pub fn from_counts(passed: u32, total: u32) -> Self {
        Self {
            passed: passed.min(total),
            total,
        }
    }

    /// Percentage of passed items; empty checklists carry no quality signal.
    pub fn score(&self) -> Option<f64> {
        if self.total == 0 {
            return None;
        }
        Some(f64::from(self.passed) / f64::from(self.total) * 100.0)
    }
}

/// Minimal task attributes supplied by the task store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    pub assignee: UserId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<GoalId>,
    pub assigned_on: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_on: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checklist: Option<QualityChecklist>,
}

impl TaskRecord {
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    pub fn completed_on(&self) -> Option<NaiveDate> {
        self.completed_at.map(|at| at.date_naive())
    }

    /// Date used to place the task in a reporting week: completion, then due, then assignment.
    pub fn relevant_date(&self) -> NaiveDate {
        self.completed_on()
            .or(self.due_on)
            .unwrap_or(self.assigned_on)
    }

    /// Tasks without a due date are never late.
    pub fn completed_on_time(&self) -> Option<bool> {
        let completed_on = self.completed_on()?;
        Some(match self.due_on {
            Some(due) => completed_on <= due,
            None => true,
        })
    }

    pub fn is_overdue_at(&self, date: NaiveDate) -> bool {
        !self.is_completed() && self.due_on.map(|due| due < date).unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Active,
    Completed,
}

impl GoalStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Completed => "Completed",
        }
    }
}

/// Goal (KRA) formally assigned to a user for a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalRecord {
    pub id: GoalId,
    pub owner: UserId,
    pub title: String,
    pub status: GoalStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub user_id: UserId,
    pub display_name: String,
}
