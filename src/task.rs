//! Task data structure and related functionality.
//!
//! A `Task` is a single dated work item with optional effort estimates. The record is
//! generic over its status enumeration so the same shape carries both daily work-log
//! entries and project board items.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::fields::*;

/// A dated work item with effort tracking.
///
/// `date` is kept as the literal string the record was created with; analytics group on
/// it verbatim and only parse it when a calendar comparison is needed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task<S> {
    pub id: u64,
    #[serde(alias = "task")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub project_id: Option<u64>,
    #[serde(default)]
    pub user_id: Option<u64>,
    #[serde(alias = "task_status")]
    pub status: S,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub date: String,
    #[serde(default, alias = "expected_time", deserialize_with = "lenient_hours")]
    pub expected_hours: Option<f64>,
    #[serde(default, alias = "actual_time_taken", deserialize_with = "lenient_hours")]
    pub actual_hours: Option<f64>,
    #[serde(default)]
    pub expected_outcome: Option<String>,
    #[serde(default)]
    pub created_at_utc: i64,
    #[serde(default)]
    pub updated_at_utc: i64,
}

/// Entry in a person's daily work log.
pub type DailyTask = Task<TaskStatus>;

/// Item on a project board.
pub type BoardTask = Task<BoardStatus>;

impl<S: StatusSet> Task<S> {
    /// Create a task with the required fields; everything else starts empty.
    pub fn new(id: u64, title: impl Into<String>, status: S, date: impl Into<String>) -> Self {
        Task {
            id,
            title: title.into(),
            description: None,
            project_id: None,
            user_id: None,
            status,
            priority: None,
            date: date.into(),
            expected_hours: None,
            actual_hours: None,
            expected_outcome: None,
            created_at_utc: 0,
            updated_at_utc: 0,
        }
    }

    /// Expected effort, absent counted as zero.
    pub fn expected(&self) -> f64 {
        self.expected_hours.unwrap_or(0.0)
    }

    /// Actual effort, absent counted as zero.
    pub fn actual(&self) -> f64 {
        self.actual_hours.unwrap_or(0.0)
    }

    /// The task date as a calendar date, if it is a valid `YYYY-MM-DD` string.
    pub fn calendar_date(&self) -> Option<NaiveDate> {
        parse_task_date(&self.date)
    }

    pub fn phase(&self) -> Phase {
        self.status.phase()
    }
}

/// Parse a literal task date. Only the ISO `YYYY-MM-DD` form is recognised.
pub fn parse_task_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawHours {
    Number(f64),
    Text(String),
    Other(serde::de::IgnoredAny),
}

/// Accept hours as a number or numeric string. Anything else, including negative or
/// non-finite values, becomes `None` instead of failing the whole record.
fn lenient_hours<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawHours>::deserialize(deserializer)?;
    let hours = match raw {
        Some(RawHours::Number(n)) => Some(n),
        Some(RawHours::Text(s)) => s.trim().parse::<f64>().ok(),
        Some(RawHours::Other(_)) | None => None,
    };
    Ok(hours.filter(|h| h.is_finite() && *h >= 0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hours_accept_numbers_and_numeric_strings() {
        let json = r#"{"id":1,"title":"a","status":"completed","date":"2024-03-01",
                       "expected_hours":"2.5","actual_hours":3}"#;
        let t: DailyTask = serde_json::from_str(json).unwrap();
        assert_eq!(t.expected_hours, Some(2.5));
        assert_eq!(t.actual_hours, Some(3.0));
    }

    #[test]
    fn malformed_hours_degrade_to_absent() {
        let json = r#"{"id":1,"title":"a","status":"pending","date":"2024-03-01",
                       "expected_hours":"soon","actual_hours":[1,2]}"#;
        let t: DailyTask = serde_json::from_str(json).unwrap();
        assert_eq!(t.expected_hours, None);
        assert_eq!(t.actual_hours, None);
        assert_eq!(t.expected(), 0.0);
    }

    #[test]
    fn negative_hours_are_dropped() {
        let json = r#"{"id":1,"title":"a","status":"pending","expected_hours":-4}"#;
        let t: DailyTask = serde_json::from_str(json).unwrap();
        assert_eq!(t.expected_hours, None);
        assert_eq!(t.date, "");
    }

    #[test]
    fn accepts_work_log_field_names() {
        let json = r#"{"id":7,"task":"Write report","task_status":"In Progress",
                       "date":"2024-03-02","expected_time":1,"actual_time_taken":2}"#;
        let t: DailyTask = serde_json::from_str(json).unwrap();
        assert_eq!(t.title, "Write report");
        assert_eq!(t.status, TaskStatus::InProgress);
        assert_eq!(t.actual(), 2.0);
    }

    #[test]
    fn calendar_date_rejects_garbage() {
        let t = DailyTask::new(1, "x", TaskStatus::Pending, "not a date");
        assert_eq!(t.calendar_date(), None);
        let t = DailyTask::new(1, "x", TaskStatus::Pending, "2024-02-29");
        assert_eq!(t.calendar_date(), NaiveDate::from_ymd_opt(2024, 2, 29));
    }
}
