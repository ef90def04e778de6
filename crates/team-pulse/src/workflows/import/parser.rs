use super::normalizer::{clean_cell, parse_goal_status};
use super::ImportError;
use crate::workflows::performance::domain::{
    GoalId, GoalRecord, QualityChecklist, TaskId, TaskRecord, TeamId, UserId,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};
use std::io::Read;

/// A task row plus the directory details carried alongside it.
#[derive(Debug)]
pub(crate) struct TaskEntry {
    pub(crate) task: TaskRecord,
    pub(crate) assignee_name: Option<String>,
    pub(crate) team: Option<TeamId>,
}

pub(crate) fn parse_tasks<R: Read>(reader: R) -> Result<Vec<TaskEntry>, ImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let mut record = csv::StringRecord::new();
    let mut entries = Vec::new();

    while csv_reader.read_record(&mut record)? {
        let line = record.position().map(|pos| pos.line()).unwrap_or_default();
        let row: TaskRow = record.deserialize(Some(&headers))?;
        entries.push(row.into_entry(line)?);
    }

    Ok(entries)
}

pub(crate) fn parse_goals<R: Read>(reader: R) -> Result<Vec<GoalRecord>, ImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let mut record = csv::StringRecord::new();
    let mut goals = Vec::new();

    while csv_reader.read_record(&mut record)? {
        let line = record.position().map(|pos| pos.line()).unwrap_or_default();
        let row: GoalRow = record.deserialize(Some(&headers))?;
        let status_text = row.status.unwrap_or_default();
        let Some(status) = parse_goal_status(&status_text) else {
            return Err(ImportError::InvalidRow {
                line,
                detail: format!("unknown goal status '{status_text}'"),
            });
        };
        goals.push(GoalRecord {
            id: GoalId::new(clean_cell(&row.goal_id)),
            owner: UserId::new(clean_cell(&row.owner_id)),
            title: row.title.unwrap_or_default(),
            status,
        });
    }

    Ok(goals)
}

#[derive(Debug, Deserialize)]
struct TaskRow {
    #[serde(rename = "Task ID")]
    task_id: String,
    #[serde(rename = "Assignee ID")]
    assignee_id: String,
    #[serde(
        rename = "Assignee Name",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    assignee_name: Option<String>,
    #[serde(rename = "Team", default, deserialize_with = "empty_string_as_none")]
    team: Option<String>,
    #[serde(rename = "Goal ID", default, deserialize_with = "empty_string_as_none")]
    goal_id: Option<String>,
    #[serde(rename = "Title", default)]
    title: String,
    #[serde(
        rename = "Assigned On",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    assigned_on: Option<String>,
    #[serde(rename = "Due Date", default, deserialize_with = "empty_string_as_none")]
    due_date: Option<String>,
    #[serde(
        rename = "Completed At",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    completed_at: Option<String>,
    #[serde(
        rename = "Checklist Passed",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    checklist_passed: Option<String>,
    #[serde(
        rename = "Checklist Total",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    checklist_total: Option<String>,
}

impl TaskRow {
    fn into_entry(self, line: u64) -> Result<TaskEntry, ImportError> {
        let invalid = |detail: String| ImportError::InvalidRow { line, detail };

        let task_id = clean_cell(&self.task_id);
        let assignee = clean_cell(&self.assignee_id);
        if task_id.is_empty() || assignee.is_empty() {
            return Err(invalid("Task ID and Assignee ID are required".to_string()));
        }

        let due_on = match self.due_date.as_deref() {
            Some(raw) => Some(parse_date(raw).ok_or_else(|| invalid(format!("bad Due Date '{raw}'")))?),
            None => None,
        };
        let completed_at = match self.completed_at.as_deref() {
            Some(raw) => Some(
                parse_datetime(raw).ok_or_else(|| invalid(format!("bad Completed At '{raw}'")))?,
            ),
            None => None,
        };
        let assigned_on = match self.assigned_on.as_deref() {
            Some(raw) => {
                parse_date(raw).ok_or_else(|| invalid(format!("bad Assigned On '{raw}'")))?
            }
            None => due_on
                .or(completed_at.map(|at| at.date_naive()))
                .ok_or_else(|| invalid("task has no Assigned On, Due Date, or Completed At".to_string()))?,
        };

        let checklist = match (self.checklist_passed.as_deref(), self.checklist_total.as_deref()) {
            (None, None) => None,
            (Some(passed), Some(total)) => {
                let passed = parse_count(passed)
                    .ok_or_else(|| invalid(format!("bad Checklist Passed '{passed}'")))?;
                let total = parse_count(total)
                    .ok_or_else(|| invalid(format!("bad Checklist Total '{total}'")))?;
                if passed > total {
                    return Err(invalid(format!(
                        "Checklist Passed {passed} exceeds Checklist Total {total}"
                    )));
                }
                Some(QualityChecklist::from_counts(passed, total))
            }
            _ => {
                return Err(invalid(
                    "Checklist Passed and Checklist Total must be supplied together".to_string(),
                ))
            }
        };

        Ok(TaskEntry {
            task: TaskRecord {
                id: TaskId::new(task_id),
                assignee: UserId::new(assignee),
                title: self.title,
                goal: self.goal_id.map(|goal| GoalId::new(clean_cell(&goal))),
                assigned_on,
                due_on,
                completed_at,
                checklist,
            },
            assignee_name: self.assignee_name,
            team: self.team.map(|team| TeamId::new(clean_cell(&team))),
        })
    }
}

#[derive(Debug, Deserialize)]
struct GoalRow {
    #[serde(rename = "Goal ID")]
    goal_id: String,
    #[serde(rename = "Owner ID")]
    owner_id: String,
    #[serde(rename = "Title", default, deserialize_with = "empty_string_as_none")]
    title: Option<String>,
    #[serde(rename = "Status", default, deserialize_with = "empty_string_as_none")]
    status: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn parse_count(value: &str) -> Option<u32> {
    value.trim().parse().ok()
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    parse_datetime(value).map(|at| at.date_naive())
}

pub(crate) fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|naive| Utc.from_utc_datetime(&naive));
    }

    None
}
