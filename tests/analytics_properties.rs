//! Property-based tests for the task metrics aggregator
//!
//! These hold for any task collection:
//! - Status distributions account for every task
//! - Completion rates stay within 0..=100
//! - Daily trends are chronological, malformed dates last
//! - Rollups never list projects or people without tasks
//! - Efficiency never divides by zero
//! - Every function is repeatable on the same input

use project_dashboard::analytics::*;
use project_dashboard::entities::{Project, User};
use project_dashboard::fields::{BoardStatus, Priority, Role, StatusSet, TaskStatus};
use project_dashboard::task::{parse_task_date, BoardTask, DailyTask, Task};
use proptest::prelude::*;

const DATES: &[&str] = &[
    "2024-02-28",
    "2024-03-01",
    "2024-03-04",
    "2024-03-14",
    "2023-12-31",
    "",
    "next week",
    "2024-13-01",
];

fn hours() -> impl Strategy<Value = Option<f64>> {
    prop_oneof![Just(None), (0u32..40).prop_map(|h| Some(h as f64 / 4.0))]
}

fn task_of<S: StatusSet>(statuses: &'static [S]) -> impl Strategy<Value = Task<S>> {
    (
        0..statuses.len(),
        0..DATES.len(),
        hours(),
        hours(),
        proptest::option::of(1u64..5),
        proptest::option::of(1u64..5),
        proptest::option::of(0..Priority::ALL.len()),
    )
        .prop_map(move |(s, d, expected, actual, project, user, priority)| Task {
            project_id: project,
            user_id: user,
            expected_hours: expected,
            actual_hours: actual,
            priority: priority.map(|p| Priority::ALL[p]),
            ..Task::new(0, "generated", statuses[s], DATES[d])
        })
}

fn daily_tasks() -> impl Strategy<Value = Vec<DailyTask>> {
    prop::collection::vec(task_of(TaskStatus::ALL), 0..40).prop_map(|mut tasks| {
        for (i, t) in tasks.iter_mut().enumerate() {
            t.id = i as u64 + 1;
        }
        tasks
    })
}

fn board_tasks() -> impl Strategy<Value = Vec<BoardTask>> {
    prop::collection::vec(task_of(BoardStatus::ALL), 0..40)
}

fn projects() -> Vec<Project> {
    (1..=6).map(|id| Project::new(id, format!("project {id}"))).collect()
}

fn users() -> Vec<User> {
    (1..=6)
        .map(|id| User::new(id, format!("user {id}"), Role::Member))
        .collect()
}

proptest! {
    #[test]
    fn prop_status_distribution_counts_every_task(tasks in daily_tasks()) {
        let dist = compute_status_distribution(&tasks);
        prop_assert_eq!(dist.len(), TaskStatus::ALL.len());
        prop_assert_eq!(dist.iter().map(|c| c.count).sum::<usize>(), tasks.len());
    }

    #[test]
    fn prop_board_distribution_counts_every_item(items in board_tasks()) {
        let dist = compute_status_distribution(&items);
        let order: Vec<BoardStatus> = dist.iter().map(|c| c.status).collect();
        prop_assert_eq!(order, BoardStatus::ALL.to_vec());
        prop_assert_eq!(dist.iter().map(|c| c.count).sum::<usize>(), items.len());
    }

    #[test]
    fn prop_completion_rate_is_a_percentage(tasks in daily_tasks()) {
        let m = compute_summary_metrics(&tasks, &AnalyticsOptions::default());
        prop_assert!((0..=100).contains(&m.completion_rate_percent));
        if tasks.is_empty() {
            prop_assert_eq!(m.completion_rate_percent, 0);
        }
        prop_assert_eq!(
            m.completed_count + m.in_progress_count + m.pending_count + m.blocked_count,
            m.total
        );
    }

    #[test]
    fn prop_daily_trend_is_chronological(tasks in daily_tasks()) {
        let trend = compute_daily_trend(&tasks);
        for pair in trend.windows(2) {
            match (parse_task_date(&pair[0].date), parse_task_date(&pair[1].date)) {
                (Some(a), Some(b)) => prop_assert!(a <= b),
                (Some(_), None) => {}
                (None, Some(_)) => prop_assert!(false, "malformed date sorted before a valid one"),
                (None, None) => prop_assert!(pair[0].date < pair[1].date),
            }
        }
        prop_assert_eq!(trend.iter().map(|b| b.total).sum::<usize>(), tasks.len());
    }

    #[test]
    fn prop_rollups_omit_idle_dimensions(tasks in daily_tasks()) {
        let options = AnalyticsOptions::default();
        for row in compute_project_rollups(&tasks, &projects()) {
            prop_assert!(row.total_tasks > 0);
            prop_assert!(tasks.iter().any(|t| t.project_id == Some(row.project_id)));
        }
        for row in compute_user_rollups(&tasks, &users(), &options) {
            prop_assert!(row.total_tasks > 0);
            prop_assert!(tasks.iter().any(|t| t.user_id == Some(row.user_id)));
        }
    }

    #[test]
    fn prop_zero_actual_hours_never_divide(mut tasks in daily_tasks()) {
        for t in &mut tasks {
            t.actual_hours = t.actual_hours.map(|_| 0.0);
        }
        let options = AnalyticsOptions::default();
        prop_assert_eq!(compute_summary_metrics(&tasks, &options).efficiency_rate_percent, 0);
        for row in compute_user_rollups(&tasks, &users(), &options) {
            prop_assert_eq!(row.efficiency_rate_percent, 0);
        }
        let series = compute_variance_series(&compute_daily_trend(&tasks), &options);
        for day in series {
            prop_assert_eq!(day.efficiency_rate_percent, 0);
        }
    }

    #[test]
    fn prop_functions_are_repeatable(tasks in daily_tasks()) {
        let options = AnalyticsOptions::default();
        let before = tasks.clone();
        prop_assert_eq!(
            compute_summary_metrics(&tasks, &options),
            compute_summary_metrics(&tasks, &options)
        );
        prop_assert_eq!(compute_daily_trend(&tasks), compute_daily_trend(&tasks));
        prop_assert_eq!(
            compute_project_rollups(&tasks, &projects()),
            compute_project_rollups(&tasks, &projects())
        );
        let today = chrono::NaiveDate::from_ymd_opt(2024, 3, 14).unwrap();
        let filter = TaskFilter::for_project(Some(2), project_dashboard::fields::DateRange::ThisMonth);
        prop_assert_eq!(
            filter_tasks(&tasks, &filter, today, &options),
            filter_tasks(&tasks, &filter, today, &options)
        );
        prop_assert_eq!(tasks, before);
    }
}
