use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::workflows::performance::domain::{
    GoalRecord, Member, ReportWeek, TaskRecord, TeamId, UserId,
};
use crate::workflows::performance::sources::{GoalSource, SourceError, TaskSource, TeamDirectory};

/// Point-in-time copy of tasks, goals, and team membership.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceSnapshot {
    tasks: Vec<TaskRecord>,
    goals: Vec<GoalRecord>,
    members: BTreeMap<UserId, Member>,
    teams: BTreeMap<TeamId, Vec<UserId>>,
}

impl WorkspaceSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a member, optionally on a team. A later display name wins over an earlier one.
    pub fn add_member(&mut self, member: Member, team: Option<TeamId>) {
        if let Some(team) = team {
            let roster = self.teams.entry(team).or_default();
            if !roster.contains(&member.user_id) {
                roster.push(member.user_id.clone());
            }
        }
        self.members
            .entry(member.user_id.clone())
            .and_modify(|existing| {
                if member.display_name != member.user_id.as_str() {
                    existing.display_name = member.display_name.clone();
                }
            })
            .or_insert(member);
    }

    pub fn add_task(&mut self, task: TaskRecord) {
        if !self.members.contains_key(&task.assignee) {
            self.add_member(
                Member {
                    user_id: task.assignee.clone(),
                    display_name: task.assignee.to_string(),
                },
                None,
            );
        }
        self.tasks.push(task);
    }

    pub fn add_goal(&mut self, goal: GoalRecord) {
        self.goals.push(goal);
    }

    pub fn tasks(&self) -> &[TaskRecord] {
        &self.tasks
    }

    pub fn goals(&self) -> &[GoalRecord] {
        &self.goals
    }

    pub fn teams(&self) -> impl Iterator<Item = &TeamId> {
        self.teams.keys()
    }

    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.members.values()
    }
}

#[async_trait]
impl TaskSource for WorkspaceSnapshot {
    async fn tasks_for_user(
        &self,
        user: &UserId,
        week: ReportWeek,
    ) -> Result<Vec<TaskRecord>, SourceError> {
        Ok(self
            .tasks
            .iter()
            .filter(|task| &task.assignee == user && week.contains(task.relevant_date()))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl GoalSource for WorkspaceSnapshot {
    async fn goals_for_user(
        &self,
        user: &UserId,
        _week: ReportWeek,
    ) -> Result<Vec<GoalRecord>, SourceError> {
        Ok(self
            .goals
            .iter()
            .filter(|goal| &goal.owner == user)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TeamDirectory for WorkspaceSnapshot {
    async fn member(&self, user: &UserId) -> Result<Option<Member>, SourceError> {
        Ok(self.members.get(user).cloned())
    }

    async fn team_members(&self, team: &TeamId) -> Result<Vec<Member>, SourceError> {
        // Unknown teams resolve to no members; the generator reports that as an empty scope.
        let roster = self.teams.get(team).map(Vec::as_slice).unwrap_or_default();
        Ok(roster
            .iter()
            .filter_map(|user| self.members.get(user).cloned())
            .collect())
    }
}
