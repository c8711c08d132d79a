//! Task metrics aggregation.
//!
//! Everything in this module is a pure function of its arguments: filter a task
//! collection, group it by status, date, project or person, and reduce each group to
//! counts, effort sums and ratios. Nothing here performs I/O or keeps state between
//! calls, and nothing fails. Missing hours count as zero in sums, a zero divisor yields
//! the configured fallback instead of a division, and unparseable dates are kept in
//! the trend under their literal key.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use tracing::debug;

use crate::entities::{Project, User};
use crate::fields::*;
use crate::task::{parse_task_date, Task};

/// Knobs that change how ratios and ranges are computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalyticsOptions {
    /// Efficiency reported when the actual effort is zero.
    pub zero_actual: ZeroActualEfficiency,
    /// First day of [`DateRange::ThisWeek`].
    pub week_start: WeekStart,
}

/// Selection applied before aggregation. Unset fields match everything.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskFilter<S> {
    pub project_id: Option<u64>,
    pub user_id: Option<u64>,
    pub status: Option<S>,
    pub priority: Option<Priority>,
    /// Case-insensitive substring of title, description or expected outcome.
    pub search: Option<String>,
    pub range: DateRange,
}

impl<S> Default for TaskFilter<S> {
    fn default() -> Self {
        TaskFilter {
            project_id: None,
            user_id: None,
            status: None,
            priority: None,
            search: None,
            range: DateRange::All,
        }
    }
}

impl<S> TaskFilter<S> {
    pub fn for_project(project_id: Option<u64>, range: DateRange) -> Self {
        TaskFilter {
            project_id,
            range,
            ..TaskFilter::default()
        }
    }
}

/// Headline numbers for a task collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryMetrics {
    pub total: usize,
    pub completed_count: usize,
    pub in_progress_count: usize,
    pub pending_count: usize,
    pub blocked_count: usize,
    pub completion_rate_percent: i64,
    pub total_expected_hours: f64,
    pub total_actual_hours: f64,
    /// Actual minus expected; positive means the work overran.
    pub time_variance_hours: f64,
    pub efficiency_rate_percent: i64,
}

/// Number of tasks in one status category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusCount<S> {
    pub status: S,
    pub label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriorityCount {
    pub priority: Priority,
    pub count: usize,
}

/// Per-day totals keyed by the literal task date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyBucket {
    pub date: String,
    pub total: usize,
    pub completed_count: usize,
    pub in_progress_count: usize,
    pub pending_count: usize,
    pub blocked_count: usize,
    pub total_expected_hours: f64,
    pub total_actual_hours: f64,
}

/// A daily bucket with its effort variance and efficiency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VarianceBucket {
    #[serde(flatten)]
    pub day: DailyBucket,
    pub variance_hours: f64,
    pub efficiency_rate_percent: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectRollup {
    pub project_id: u64,
    pub display_name: String,
    pub total_tasks: usize,
    pub completed_count: usize,
    pub completion_rate_percent: i64,
    pub total_expected_hours: f64,
    pub total_actual_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRollup {
    pub user_id: u64,
    pub display_name: String,
    pub designation: Option<String>,
    pub total_tasks: usize,
    pub completed_count: usize,
    pub completion_rate_percent: i64,
    pub total_expected_hours: f64,
    pub total_actual_hours: f64,
    pub efficiency_rate_percent: i64,
}

/// Every view of one filtered task collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsReport<S> {
    pub summary: SummaryMetrics,
    pub status_distribution: Vec<StatusCount<S>>,
    pub daily_trend: Vec<VarianceBucket>,
    pub projects: Vec<ProjectRollup>,
    pub users: Vec<UserRollup>,
}

/// Running counts for one group of tasks.
#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    total: usize,
    completed: usize,
    in_progress: usize,
    pending: usize,
    blocked: usize,
    expected: f64,
    actual: f64,
}

impl Tally {
    fn add<S: StatusSet>(&mut self, task: &Task<S>) {
        self.total += 1;
        match task.phase() {
            Phase::Done => self.completed += 1,
            Phase::Active => self.in_progress += 1,
            Phase::NotStarted => self.pending += 1,
            Phase::Blocked => self.blocked += 1,
        }
        self.expected += task.expected();
        self.actual += task.actual();
    }

    fn of<'a, S: StatusSet + 'a>(tasks: impl IntoIterator<Item = &'a Task<S>>) -> Self {
        let mut tally = Tally::default();
        for t in tasks {
            tally.add(t);
        }
        tally
    }

    fn completion_rate(&self) -> i64 {
        percent(self.completed as f64, self.total as f64)
    }
}

/// `part / whole * 100`, rounded; 0 when `whole` is zero.
pub fn percent(part: f64, whole: f64) -> i64 {
    if whole > 0.0 {
        (part / whole * 100.0).round() as i64
    } else {
        0
    }
}

/// Expected over actual effort as a rounded percentage. Only divides when `actual`
/// is positive; otherwise reports the configured fallback.
pub fn efficiency_percent(expected: f64, actual: f64, fallback: ZeroActualEfficiency) -> i64 {
    if actual > 0.0 {
        (expected / actual * 100.0).round() as i64
    } else {
        fallback.percent()
    }
}

/// First date included by `range`, or `None` for [`DateRange::All`].
pub fn range_start(range: DateRange, today: NaiveDate, week_start: WeekStart) -> Option<NaiveDate> {
    match range {
        DateRange::Today => Some(today),
        DateRange::ThisWeek => {
            let offset = match week_start {
                WeekStart::Monday => today.weekday().num_days_from_monday(),
                WeekStart::Sunday => today.weekday().num_days_from_sunday(),
            };
            Some(today - Duration::days(offset as i64))
        }
        DateRange::ThisMonth => today.with_day(1),
        DateRange::LastQuarter => (today - Duration::days(90)).with_day(1),
        DateRange::All => None,
    }
}

/// Whether a literal task date falls inside `range`, ending today inclusive.
///
/// Dates that do not parse cannot be placed in any bounded range, so they only pass
/// [`DateRange::All`].
pub fn date_in_range(date: &str, range: DateRange, today: NaiveDate, week_start: WeekStart) -> bool {
    let Some(start) = range_start(range, today, week_start) else {
        return true;
    };
    match parse_task_date(date) {
        Some(d) => d >= start && d <= today,
        None => false,
    }
}

/// Select the tasks matching `filter`. The input is left untouched.
pub fn filter_tasks<S: StatusSet>(
    tasks: &[Task<S>],
    filter: &TaskFilter<S>,
    today: NaiveDate,
    options: &AnalyticsOptions,
) -> Vec<Task<S>> {
    let needle = filter
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    tasks
        .iter()
        .filter(|t| {
            if let Some(p) = filter.project_id {
                if t.project_id != Some(p) {
                    return false;
                }
            }
            if let Some(u) = filter.user_id {
                if t.user_id != Some(u) {
                    return false;
                }
            }
            if let Some(s) = filter.status {
                if t.status != s {
                    return false;
                }
            }
            if let Some(p) = filter.priority {
                if t.priority != Some(p) {
                    return false;
                }
            }
            if let Some(ref n) = needle {
                let hit = |field: Option<&str>| {
                    field.is_some_and(|f| f.to_lowercase().contains(n.as_str()))
                };
                if !hit(Some(t.title.as_str()))
                    && !hit(t.description.as_deref())
                    && !hit(t.expected_outcome.as_deref())
                {
                    return false;
                }
            }
            date_in_range(&t.date, filter.range, today, options.week_start)
        })
        .cloned()
        .collect()
}

pub fn compute_summary_metrics<S: StatusSet>(
    tasks: &[Task<S>],
    options: &AnalyticsOptions,
) -> SummaryMetrics {
    let tally = Tally::of(tasks);
    SummaryMetrics {
        total: tally.total,
        completed_count: tally.completed,
        in_progress_count: tally.in_progress,
        pending_count: tally.pending,
        blocked_count: tally.blocked,
        completion_rate_percent: tally.completion_rate(),
        total_expected_hours: tally.expected,
        total_actual_hours: tally.actual,
        time_variance_hours: tally.actual - tally.expected,
        efficiency_rate_percent: efficiency_percent(tally.expected, tally.actual, options.zero_actual),
    }
}

/// Count tasks for every member of `S`, in enumeration order, zeros included.
pub fn compute_status_distribution<S: StatusSet>(tasks: &[Task<S>]) -> Vec<StatusCount<S>> {
    S::ALL
        .iter()
        .map(|&status| StatusCount {
            status,
            label: status.label(),
            count: tasks.iter().filter(|t| t.status == status).count(),
        })
        .collect()
}

/// Count tasks per priority level. Tasks without a priority are not counted.
pub fn compute_priority_distribution<S: StatusSet>(tasks: &[Task<S>]) -> Vec<PriorityCount> {
    Priority::ALL
        .iter()
        .map(|&priority| PriorityCount {
            priority,
            count: tasks.iter().filter(|t| t.priority == Some(priority)).count(),
        })
        .collect()
}

// Valid dates sort first, chronologically; malformed keys follow.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum DayKey {
    Valid(NaiveDate),
    Malformed,
}

/// Group tasks by their literal date, ordered chronologically.
pub fn compute_daily_trend<S: StatusSet>(tasks: &[Task<S>]) -> Vec<DailyBucket> {
    let mut days: BTreeMap<(DayKey, &str), Tally> = BTreeMap::new();
    for t in tasks {
        let key = match t.calendar_date() {
            Some(d) => DayKey::Valid(d),
            None => {
                debug!(task = t.id, date = %t.date, "task date does not parse; bucketing last");
                DayKey::Malformed
            }
        };
        days.entry((key, t.date.as_str())).or_default().add(t);
    }

    days.into_iter()
        .map(|((_, date), tally)| DailyBucket {
            date: date.to_string(),
            total: tally.total,
            completed_count: tally.completed,
            in_progress_count: tally.in_progress,
            pending_count: tally.pending,
            blocked_count: tally.blocked,
            total_expected_hours: tally.expected,
            total_actual_hours: tally.actual,
        })
        .collect()
}

/// Add variance and efficiency to each day of a trend.
pub fn compute_variance_series(
    trend: &[DailyBucket],
    options: &AnalyticsOptions,
) -> Vec<VarianceBucket> {
    trend
        .iter()
        .map(|day| VarianceBucket {
            variance_hours: day.total_actual_hours - day.total_expected_hours,
            efficiency_rate_percent: efficiency_percent(
                day.total_expected_hours,
                day.total_actual_hours,
                options.zero_actual,
            ),
            day: day.clone(),
        })
        .collect()
}

fn tally_by<S: StatusSet>(
    tasks: &[Task<S>],
    key: impl Fn(&Task<S>) -> Option<u64>,
) -> HashMap<u64, Tally> {
    let mut groups: HashMap<u64, Tally> = HashMap::new();
    for t in tasks {
        if let Some(k) = key(t) {
            groups.entry(k).or_default().add(t);
        }
    }
    groups
}

/// Roll tasks up per project, in the order of `projects`. Projects without tasks are
/// left out, as are tasks pointing at projects not in the table.
pub fn compute_project_rollups<S: StatusSet>(
    tasks: &[Task<S>],
    projects: &[Project],
) -> Vec<ProjectRollup> {
    let groups = tally_by(tasks, |t| t.project_id);
    projects
        .iter()
        .filter_map(|p| {
            let tally = groups.get(&p.id)?;
            Some(ProjectRollup {
                project_id: p.id,
                display_name: p.name.clone(),
                total_tasks: tally.total,
                completed_count: tally.completed,
                completion_rate_percent: tally.completion_rate(),
                total_expected_hours: tally.expected,
                total_actual_hours: tally.actual,
            })
        })
        .collect()
}

/// Roll tasks up per person, in the order of `users`. People without tasks are left
/// out.
pub fn compute_user_rollups<S: StatusSet>(
    tasks: &[Task<S>],
    users: &[User],
    options: &AnalyticsOptions,
) -> Vec<UserRollup> {
    let groups = tally_by(tasks, |t| t.user_id);
    users
        .iter()
        .filter_map(|u| {
            let tally = groups.get(&u.id)?;
            Some(UserRollup {
                user_id: u.id,
                display_name: u.display_name.clone(),
                designation: u.designation.clone(),
                total_tasks: tally.total,
                completed_count: tally.completed,
                completion_rate_percent: tally.completion_rate(),
                total_expected_hours: tally.expected,
                total_actual_hours: tally.actual,
                efficiency_rate_percent: efficiency_percent(
                    tally.expected,
                    tally.actual,
                    options.zero_actual,
                ),
            })
        })
        .collect()
}

/// Filter once, then compute every view over the result.
pub fn build_report<S: StatusSet>(
    tasks: &[Task<S>],
    projects: &[Project],
    users: &[User],
    filter: &TaskFilter<S>,
    today: NaiveDate,
    options: &AnalyticsOptions,
) -> AnalyticsReport<S> {
    let selected = filter_tasks(tasks, filter, today, options);
    let trend = compute_daily_trend(&selected);
    AnalyticsReport {
        summary: compute_summary_metrics(&selected, options),
        status_distribution: compute_status_distribution(&selected),
        daily_trend: compute_variance_series(&trend, options),
        projects: compute_project_rollups(&selected, projects),
        users: compute_user_rollups(&selected, users, options),
    }
}

/// Mean of the team's current workload percentages, 0 for an empty team.
pub fn average_workload(users: &[User]) -> i64 {
    if users.is_empty() {
        return 0;
    }
    let sum: u64 = users
        .iter()
        .map(|u| u64::from(u.current_workload.unwrap_or(0)))
        .sum();
    (sum as f64 / users.len() as f64).round() as i64
}

/// Tasks marked High or Critical.
pub fn high_priority_count<S: StatusSet>(tasks: &[Task<S>]) -> usize {
    tasks
        .iter()
        .filter(|t| matches!(t.priority, Some(Priority::High | Priority::Critical)))
        .count()
}

/// The `count` most recently touched tasks, newest first.
pub fn recent_tasks<S: StatusSet>(tasks: &[Task<S>], count: usize) -> Vec<&Task<S>> {
    let mut sorted: Vec<&Task<S>> = tasks.iter().collect();
    sorted.sort_by_key(|t| {
        let touched = if t.updated_at_utc != 0 {
            t.updated_at_utc
        } else {
            t.created_at_utc
        };
        (std::cmp::Reverse(touched), t.id)
    });
    sorted.truncate(count);
    sorted
}
