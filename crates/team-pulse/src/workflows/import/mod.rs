//! CSV import of task-tracker and goal exports into a [`WorkspaceSnapshot`]
//! that can stand in for the live task store, goal store, and team directory.

mod normalizer;
mod parser;
mod snapshot;

use crate::workflows::performance::domain::Member;
use std::io::Read;
use std::path::Path;

pub use snapshot::WorkspaceSnapshot;

#[derive(Debug)]
pub enum ImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    InvalidRow { line: u64, detail: String },
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportError::Io(err) => write!(f, "failed to read workspace export: {}", err),
            ImportError::Csv(err) => write!(f, "invalid workspace CSV data: {}", err),
            ImportError::InvalidRow { line, detail } => {
                write!(f, "invalid row on line {}: {}", line, detail)
            }
        }
    }
}

impl std::error::Error for ImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImportError::Io(err) => Some(err),
            ImportError::Csv(err) => Some(err),
            ImportError::InvalidRow { .. } => None,
        }
    }
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

pub struct WorkspaceImporter;

impl WorkspaceImporter {
    pub fn from_paths<P: AsRef<Path>>(
        tasks_csv: P,
        goals_csv: Option<P>,
    ) -> Result<WorkspaceSnapshot, ImportError> {
        let tasks = std::fs::File::open(tasks_csv)?;
        let goals = goals_csv.map(std::fs::File::open).transpose()?;
        Self::from_readers(tasks, goals)
    }

    /// Builds a snapshot; members and team rosters are derived from the task rows.
    pub fn from_readers<T: Read, G: Read>(
        tasks_csv: T,
        goals_csv: Option<G>,
    ) -> Result<WorkspaceSnapshot, ImportError> {
        let mut snapshot = WorkspaceSnapshot::new();

        for entry in parser::parse_tasks(tasks_csv)? {
            let user_id = entry.task.assignee.clone();
            let display_name = entry
                .assignee_name
                .unwrap_or_else(|| user_id.to_string());
            snapshot.add_member(
                Member {
                    user_id,
                    display_name,
                },
                entry.team,
            );
            snapshot.add_task(entry.task);
        }

        if let Some(goals_csv) = goals_csv {
            for goal in parser::parse_goals(goals_csv)? {
                snapshot.add_goal(goal);
            }
        }

        tracing::info!(
            tasks = snapshot.tasks().len(),
            goals = snapshot.goals().len(),
            members = snapshot.members().count(),
            "workspace import complete"
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::performance::domain::{ReportWeek, TeamId, UserId};
    use crate::workflows::performance::sources::{GoalSource, TaskSource, TeamDirectory};
    use chrono::NaiveDate;
    use std::io::Cursor;

    const TASKS: &str = "Task ID,Assignee ID,Assignee Name,Team,Goal ID,Title,Assigned On,Due Date,Completed At,Checklist Passed,Checklist Total
t-1,u-ana,Ana Ruiz,platform,g-1,Migrate queue,2025-09-22,2025-09-24,2025-09-23T16:00:00Z,4,5
t-2,u-ana,Ana Ruiz,platform,,Review PR,2025-09-22,2025-09-26,,,
t-3,u-bo,Bo Chen,platform,,Rotate keys,2025-09-15,2025-09-16,2025-09-16,,
t-4,u-cy,,growth,,Launch email,2025-09-22,,,,
";

    const GOALS: &str = "Goal ID,Owner ID,Title,Status
g-1,u-ana,Queue reliability,Active
g-2,u-ana,On-call handbook,Completed
";

    fn week() -> ReportWeek {
        ReportWeek::iso(NaiveDate::from_ymd_opt(2025, 9, 22).expect("valid date"))
            .expect("week in range")
    }

    #[tokio::test]
    async fn snapshot_serves_sources_for_the_requested_week() {
        let snapshot =
            WorkspaceImporter::from_readers(Cursor::new(TASKS), Some(Cursor::new(GOALS)))
                .expect("import succeeds");

        let platform = snapshot
            .team_members(&TeamId::new("platform"))
            .await
            .expect("directory");
        let names: Vec<_> = platform.iter().map(|m| m.display_name.as_str()).collect();
        assert_eq!(names, vec!["Ana Ruiz", "Bo Chen"]);

        let ana = UserId::new("u-ana");
        assert_eq!(snapshot.tasks_for_user(&ana, week()).await.expect("tasks").len(), 2);
        assert_eq!(snapshot.goals_for_user(&ana, week()).await.expect("goals").len(), 2);
        // Bo's only task landed in the previous week.
        assert!(snapshot
            .tasks_for_user(&UserId::new("u-bo"), week())
            .await
            .expect("tasks")
            .is_empty());

        let cy = snapshot
            .member(&UserId::new("u-cy"))
            .await
            .expect("directory")
            .expect("cy known");
        assert_eq!(cy.display_name, "u-cy");
        assert!(snapshot
            .team_members(&TeamId::new("unknown"))
            .await
            .expect("directory")
            .is_empty());
    }

    #[test]
    fn goals_are_optional() {
        let snapshot = WorkspaceImporter::from_readers(Cursor::new(TASKS), None::<Cursor<&str>>)
            .expect("import succeeds");
        assert!(snapshot.goals().is_empty());
        assert_eq!(snapshot.tasks().len(), 4);
        assert_eq!(snapshot.teams().count(), 2);
    }

    #[test]
    fn missing_file_is_io_error() {
        let error = WorkspaceImporter::from_paths("/nonexistent/tasks.csv", None)
            .expect_err("missing file");
        assert!(matches!(error, ImportError::Io(_)));
        assert!(error.to_string().starts_with("failed to read workspace export"));
    }
}
