//! CSV export of daily tasks.
//!
//! The export takes the same filtered collection the analytics views are computed
//! from, so a spreadsheet built from it agrees with the dashboard.

use std::collections::HashMap;

use crate::entities::{Project, User};
use crate::fields::StatusSet;
use crate::task::DailyTask;

pub const CSV_HEADER: &str =
    "Date,Project,Member,Task,Status,Expected Time,Actual Time,Efficiency";

/// Per-task efficiency. Only computed when both hours are present and non-zero.
pub fn row_efficiency(task: &DailyTask) -> i64 {
    match (task.expected_hours, task.actual_hours) {
        (Some(e), Some(a)) if e > 0.0 && a > 0.0 => (e / a * 100.0).round() as i64,
        _ => 0,
    }
}

/// Quote a field if it contains a delimiter, quote or newline.
pub fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Render `tasks` as CSV with a header line. Unknown projects and people are written
/// as `Unknown`.
pub fn tasks_to_csv(tasks: &[DailyTask], projects: &[Project], users: &[User]) -> String {
    let project_names: HashMap<u64, &str> =
        projects.iter().map(|p| (p.id, p.name.as_str())).collect();
    let user_names: HashMap<u64, &str> = users
        .iter()
        .map(|u| (u.id, u.display_name.as_str()))
        .collect();

    let mut csv = String::new();
    csv.push_str(CSV_HEADER);
    csv.push('\n');
    for t in tasks {
        let project = t
            .project_id
            .and_then(|id| project_names.get(&id).copied())
            .unwrap_or("Unknown");
        let member = t
            .user_id
            .and_then(|id| user_names.get(&id).copied())
            .unwrap_or("Unknown");
        csv.push_str(&format!(
            "{},{},{},{},{},{},{},{}\n",
            escape_csv(&t.date),
            escape_csv(project),
            escape_csv(member),
            escape_csv(&t.title),
            t.status.label(),
            t.expected(),
            t.actual(),
            row_efficiency(t),
        ));
    }
    csv
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{Role, TaskStatus};
    use pretty_assertions::assert_eq;

    #[test]
    fn renders_header_and_rows() {
        let projects = vec![Project::new(1, "Website")];
        let users = vec![User::new(3, "Ada Lovelace", Role::Member)];
        let mut a = DailyTask::new(1, "Fix nav, footer", TaskStatus::InProgress, "2024-03-01");
        a.project_id = Some(1);
        a.user_id = Some(3);
        a.expected_hours = Some(2.0);
        a.actual_hours = Some(2.5);
        let mut b = DailyTask::new(2, "Say \"hi\"", TaskStatus::Pending, "2024-03-02");
        b.project_id = Some(9);
        b.expected_hours = Some(1.0);

        let csv = tasks_to_csv(&[a, b], &projects, &users);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines,
            vec![
                CSV_HEADER,
                "2024-03-01,Website,Ada Lovelace,\"Fix nav, footer\",In Progress,2,2.5,80",
                "2024-03-02,Unknown,Unknown,\"Say \"\"hi\"\"\",Pending,1,0,0",
            ]
        );
    }

    #[test]
    fn efficiency_needs_both_hours() {
        let mut t = DailyTask::new(1, "x", TaskStatus::Completed, "2024-03-01");
        assert_eq!(row_efficiency(&t), 0);
        t.expected_hours = Some(3.0);
        t.actual_hours = Some(0.0);
        assert_eq!(row_efficiency(&t), 0);
        t.actual_hours = Some(2.0);
        assert_eq!(row_efficiency(&t), 150);
    }
}
