use std::cmp::Ordering;

use super::summary::MemberScore;

/// Orders members by overall score, then completions, then user id, and assigns 1-based ranks.
pub(crate) fn rank_members(members: &mut [MemberScore]) {
    members.sort_by(compare);
    for (index, member) in members.iter_mut().enumerate() {
        member.rank = index as u32 + 1;
    }
}

fn compare(left: &MemberScore, right: &MemberScore) -> Ordering {
    right
        .breakdown
        .overall_score
        .cmp(&left.breakdown.overall_score)
        .then_with(|| {
            right
                .metrics
                .tasks_completed
                .cmp(&left.metrics.tasks_completed)
        })
        .then_with(|| left.user_id.cmp(&right.user_id))
}

/// Display names of the first `limit` ranked members.
pub(crate) fn top_performers(ranked: &[MemberScore], limit: usize) -> Vec<String> {
    ranked
        .iter()
        .take(limit)
        .map(|member| member.display_name.clone())
        .collect()
}
