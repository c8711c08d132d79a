//! Plain-text rendering of records and analytics.
//!
//! Dates are turned into display form ("Mar 04") here and nowhere else; the analytics
//! module works on the literal strings.

use chrono::{TimeZone, Utc};

use crate::analytics::*;
use crate::db::Database;
use crate::entities::{Activity, Project, Resource, Team, User};
use crate::fields::*;
use crate::task::{parse_task_date, Task};

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

/// Short display form of a task date; the literal string if it does not parse.
pub fn display_date(date: &str) -> String {
    match parse_task_date(date) {
        Some(d) => d.format("%b %d").to_string(),
        None if date.is_empty() => "-".into(),
        None => date.to_string(),
    }
}

/// Hours with at most one decimal place.
pub fn format_hours(h: f64) -> String {
    // Small negatives round to -0.0, which would print as "-0h".
    let rounded = match (h * 10.0).round() / 10.0 {
        r if r == 0.0 => 0.0,
        r => r,
    };
    if rounded.fract() == 0.0 {
        format!("{rounded:.0}h")
    } else {
        format!("{rounded:.1}h")
    }
}

/// Signed variance, e.g. "+1.5h" for an overrun.
pub fn format_variance(h: f64) -> String {
    if h > 0.0 {
        format!("+{}", format_hours(h))
    } else {
        format_hours(h)
    }
}

fn format_timestamp(ts: i64) -> String {
    Utc.timestamp_opt(ts, 0)
        .single()
        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".into())
}

pub fn render_summary(m: &SummaryMetrics) -> String {
    let mut out = String::new();
    out.push_str(&format!("Tasks          {}\n", m.total));
    out.push_str(&format!(
        "Completed      {} ({}%)\n",
        m.completed_count, m.completion_rate_percent
    ));
    out.push_str(&format!("In progress    {}\n", m.in_progress_count));
    out.push_str(&format!("Pending        {}\n", m.pending_count));
    out.push_str(&format!("Blocked        {}\n", m.blocked_count));
    out.push_str(&format!(
        "Effort         {} expected / {} actual ({})\n",
        format_hours(m.total_expected_hours),
        format_hours(m.total_actual_hours),
        format_variance(m.time_variance_hours)
    ));
    out.push_str(&format!("Efficiency     {}%\n", m.efficiency_rate_percent));
    out
}

pub fn render_status_distribution<S: StatusSet>(dist: &[StatusCount<S>]) -> String {
    let mut out = String::new();
    for c in dist {
        out.push_str(&format!("{:<13} {}\n", c.label, c.count));
    }
    out
}

pub fn render_priority_distribution(dist: &[PriorityCount]) -> String {
    let mut out = String::new();
    for c in dist {
        out.push_str(&format!("{:<13} {}\n", c.priority.label(), c.count));
    }
    out
}

pub fn render_trend(series: &[VarianceBucket]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<11} {:>5} {:>5} {:>5} {:>5} {:>5} {:>8} {:>8} {:>8} {:>5}\n",
        "Date", "Total", "Done", "Prog", "Pend", "Blkd", "Expected", "Actual", "Variance", "Eff%"
    ));
    for b in series {
        let d = &b.day;
        out.push_str(&format!(
            "{:<11} {:>5} {:>5} {:>5} {:>5} {:>5} {:>8} {:>8} {:>8} {:>5}\n",
            truncate(&display_date(&d.date), 11),
            d.total,
            d.completed_count,
            d.in_progress_count,
            d.pending_count,
            d.blocked_count,
            format_hours(d.total_expected_hours),
            format_hours(d.total_actual_hours),
            format_variance(b.variance_hours),
            b.efficiency_rate_percent
        ));
    }
    out
}

pub fn render_project_rollups(rows: &[ProjectRollup]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<5} {:<16} {:>5} {:>5} {:>6} {:>8} {:>8}\n",
        "ID", "Project", "Tasks", "Done", "Rate", "Expected", "Actual"
    ));
    for r in rows {
        out.push_str(&format!(
            "{:<5} {:<16} {:>5} {:>5} {:>5}% {:>8} {:>8}\n",
            r.project_id,
            truncate(&r.display_name, 16),
            r.total_tasks,
            r.completed_count,
            r.completion_rate_percent,
            format_hours(r.total_expected_hours),
            format_hours(r.total_actual_hours)
        ));
    }
    out
}

pub fn render_user_rollups(rows: &[UserRollup]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<5} {:<18} {:<14} {:>5} {:>5} {:>6} {:>8} {:>8} {:>5}\n",
        "ID", "Member", "Designation", "Tasks", "Done", "Rate", "Expected", "Actual", "Eff%"
    ));
    for r in rows {
        out.push_str(&format!(
            "{:<5} {:<18} {:<14} {:>5} {:>5} {:>5}% {:>8} {:>8} {:>5}\n",
            r.user_id,
            truncate(&r.display_name, 18),
            truncate(r.designation.as_deref().unwrap_or("Not Set"), 14),
            r.total_tasks,
            r.completed_count,
            r.completion_rate_percent,
            format_hours(r.total_expected_hours),
            format_hours(r.total_actual_hours),
            r.efficiency_rate_percent
        ));
    }
    out
}

/// Task table resolving project and owner names through `db`.
pub fn render_tasks<S: StatusSet>(tasks: &[&Task<S>], db: &Database) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<5} {:<11} {:<12} {:<9} {:<14} {:<14} {:>7} {:>7}  {}\n",
        "ID", "Date", "Status", "Priority", "Project", "Owner", "Exp", "Act", "Title"
    ));
    for t in tasks {
        let project = t
            .project_id
            .and_then(|id| db.project(id))
            .map(|p| p.name.as_str())
            .unwrap_or("-");
        let owner = t
            .user_id
            .and_then(|id| db.user(id))
            .map(|u| u.display_name.as_str())
            .unwrap_or("-");
        out.push_str(&format!(
            "{:<5} {:<11} {:<12} {:<9} {:<14} {:<14} {:>7} {:>7}  {}\n",
            t.id,
            truncate(if t.date.is_empty() { "-" } else { t.date.as_str() }, 11),
            t.status.label(),
            t.priority.map(|p| p.label()).unwrap_or("-"),
            truncate(project, 14),
            truncate(owner, 14),
            t.expected_hours.map(format_hours).unwrap_or_else(|| "-".into()),
            t.actual_hours.map(format_hours).unwrap_or_else(|| "-".into()),
            t.title
        ));
    }
    out
}

pub fn render_projects(projects: &[Project], db: &Database) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<5} {:<20} {:<10} {:<9} {:<11} {:<11} {:<16} {:<14} {}\n",
        "ID", "Name", "Status", "Priority", "Start", "End", "Manager", "Team", "Members"
    ));
    for p in projects {
        let manager = p
            .manager_id
            .and_then(|id| db.user(id))
            .map(|u| u.display_name.as_str())
            .unwrap_or("-");
        let team = p
            .team_id
            .and_then(|id| db.team(id))
            .map(|t| t.name.as_str())
            .unwrap_or("-");
        out.push_str(&format!(
            "{:<5} {:<20} {:<10} {:<9} {:<11} {:<11} {:<16} {:<14} {}\n",
            p.id,
            truncate(&p.name, 20),
            p.status.label(),
            p.priority.map(|pr| pr.label()).unwrap_or("-"),
            p.start_date.map(|d| d.to_string()).unwrap_or_else(|| "-".into()),
            p.end_date.map(|d| d.to_string()).unwrap_or_else(|| "-".into()),
            truncate(manager, 16),
            truncate(team, 14),
            p.member_ids.len()
        ));
    }
    out
}

/// Team table with the lead's name and how many projects each team runs.
pub fn render_teams(teams: &[Team], db: &Database) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<5} {:<20} {:<18} {:>7} {:>8}  {}\n",
        "ID", "Name", "Lead", "Members", "Projects", "Description"
    ));
    for t in teams {
        let lead = t
            .lead_id
            .and_then(|id| db.user(id))
            .map(|u| u.display_name.as_str())
            .unwrap_or("-");
        let projects = db.projects.iter().filter(|p| p.team_id == Some(t.id)).count();
        out.push_str(&format!(
            "{:<5} {:<20} {:<18} {:>7} {:>8}  {}\n",
            t.id,
            truncate(&t.name, 20),
            truncate(lead, 18),
            t.member_ids.len(),
            projects,
            t.description.as_deref().unwrap_or("")
        ));
    }
    out
}

pub fn render_users(users: &[User]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<5} {:<20} {:<12} {:<16} {:>8}  {}\n",
        "ID", "Name", "Role", "Designation", "Workload", "Email"
    ));
    for u in users {
        out.push_str(&format!(
            "{:<5} {:<20} {:<12} {:<16} {:>8}  {}\n",
            u.id,
            truncate(&u.display_name, 20),
            u.role.label(),
            truncate(u.designation.as_deref().unwrap_or("Not Set"), 16),
            u.current_workload
                .map(|w| format!("{w}%"))
                .unwrap_or_else(|| "-".into()),
            u.email.as_deref().unwrap_or("-")
        ));
    }
    out
}

pub fn render_resources(resources: &[Resource], db: &Database) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<5} {:<6} {:<16} {:<24} {}\n",
        "ID", "Type", "Project", "Title", "Content"
    ));
    for r in resources {
        let project = db
            .project(r.project_id)
            .map(|p| p.name.as_str())
            .unwrap_or("Unknown");
        out.push_str(&format!(
            "{:<5} {:<6} {:<16} {:<24} {}\n",
            r.id,
            r.kind.label(),
            truncate(project, 16),
            truncate(&r.title, 24),
            truncate(&r.content, 48)
        ));
    }
    out
}

pub fn render_activities(activities: &[&Activity], db: &Database) -> String {
    let mut out = String::new();
    for a in activities {
        let who = a
            .performed_by
            .and_then(|id| db.user(id))
            .map(|u| u.display_name.as_str())
            .unwrap_or("system");
        let role = a.performed_by_role.map(|r| r.label()).unwrap_or("-");
        out.push_str(&format!(
            "{}  {:<7} {:<11} #{:<4} {:<24} by {} ({})\n",
            format_timestamp(a.at_utc),
            a.action.label(),
            a.entity_type,
            a.entity_id,
            truncate(&a.entity_name, 24),
            who,
            role
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Website", 10), "Website");
        assert_eq!(truncate("Marketing Campaign", 10), "Marketing…");
    }

    #[test]
    fn display_dates() {
        assert_eq!(display_date("2024-03-04"), "Mar 04");
        assert_eq!(display_date("soon"), "soon");
        assert_eq!(display_date(""), "-");
    }

    #[test]
    fn hours_formatting() {
        assert_eq!(format_hours(2.0), "2h");
        assert_eq!(format_hours(2.25), "2.3h");
        assert_eq!(format_variance(1.0), "+1h");
        assert_eq!(format_variance(-0.5), "-0.5h");
        assert_eq!(format_variance(0.0), "0h");
        assert_eq!(format_hours(-0.04), "0h");
        assert_eq!(format_variance(-0.01), "0h");
        assert_eq!(format_hours(-0.06), "-0.1h");
    }

    #[test]
    fn team_table_counts_projects() {
        let mut db = Database::default();
        db.users.push(User::new(1, "Ada", Role::TeamLeader));
        let mut team = Team::new(1, "Platform");
        team.lead_id = Some(1);
        team.member_ids = vec![1, 2];
        let mut p = Project::new(1, "Website");
        p.team_id = Some(1);
        db.projects.push(p);
        db.projects.push(Project::new(2, "Mobile"));

        let text = render_teams(&[team], &db);
        let row = text.lines().nth(1).unwrap();
        assert!(row.starts_with("1     Platform"));
        assert!(row.contains("Ada"));
        assert!(row.trim_end().ends_with("2        1"));
        assert!(render_projects(&db.projects, &db).contains("Platform"));
    }

    #[test]
    fn summary_mentions_rates() {
        let m = SummaryMetrics {
            total: 3,
            completed_count: 2,
            in_progress_count: 0,
            pending_count: 0,
            blocked_count: 1,
            completion_rate_percent: 67,
            total_expected_hours: 6.0,
            total_actual_hours: 7.0,
            time_variance_hours: 1.0,
            efficiency_rate_percent: 86,
        };
        let text = render_summary(&m);
        assert!(text.contains("2 (67%)"));
        assert!(text.contains("6h expected / 7h actual (+1h)"));
        assert!(text.contains("86%"));
    }
}
