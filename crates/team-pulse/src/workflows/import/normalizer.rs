use crate::workflows::performance::domain::GoalStatus;

/// Strips byte-order marks and zero-width spaces that spreadsheet exports leave behind.
pub(crate) fn clean_cell(value: &str) -> String {
    value.replace(['\u{feff}', '\u{200b}'], "").trim().to_string()
}

pub(crate) fn parse_goal_status(value: &str) -> Option<GoalStatus> {
    let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    match collapsed.to_ascii_lowercase().as_str() {
        "" | "active" | "open" | "in progress" | "on track" | "at risk" => Some(GoalStatus::Active),
        "completed" | "complete" | "done" | "achieved" => Some(GoalStatus::Completed),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_cell_drops_invisible_characters() {
        assert_eq!(clean_cell("\u{feff} u-ana\u{200b} "), "u-ana");
    }

    #[test]
    fn goal_status_accepts_tracker_vocabulary() {
        assert_eq!(parse_goal_status("In  Progress"), Some(GoalStatus::Active));
        assert_eq!(parse_goal_status("DONE"), Some(GoalStatus::Completed));
        assert_eq!(parse_goal_status(""), Some(GoalStatus::Active));
        assert_eq!(parse_goal_status("cancelled"), None);
    }
}
