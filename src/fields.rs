//! Enumerations and field types for tasks, projects and people.
//!
//! This module defines the closed value sets used across the dashboard: the two task
//! status enumerations, priorities, roles, project and resource categories, and the
//! named date ranges used to scope analytics.

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Coarse lifecycle phase shared by every status enumeration.
///
/// Trend series count tasks per phase so that different status sets can feed the
/// same per-day buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    NotStarted,
    Active,
    Done,
    Blocked,
}

/// A closed status enumeration the aggregator can be parameterized over.
pub trait StatusSet: Copy + Eq + fmt::Debug + 'static {
    /// Every member, in display order.
    const ALL: &'static [Self];

    /// What a task carrying this status set is called in listings and history.
    const TASK_KIND: &'static str;

    /// Human readable label ("In Progress").
    fn label(self) -> &'static str;

    /// Phase this status counts towards.
    fn phase(self) -> Phase;
}

/// Status of a daily work-log task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[serde(alias = "Pending")]
    Pending,
    #[serde(alias = "In Progress", alias = "InProgress")]
    InProgress,
    #[serde(alias = "Completed")]
    Completed,
    #[serde(alias = "Blocked")]
    Blocked,
}

impl StatusSet for TaskStatus {
    const ALL: &'static [Self] = &[
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::Blocked,
    ];
    const TASK_KIND: &'static str = "daily task";

    fn label(self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
            TaskStatus::Blocked => "Blocked",
        }
    }

    fn phase(self) -> Phase {
        match self {
            TaskStatus::Pending => Phase::NotStarted,
            TaskStatus::InProgress => Phase::Active,
            TaskStatus::Completed => Phase::Done,
            TaskStatus::Blocked => Phase::Blocked,
        }
    }
}

/// Status of a project board item.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum BoardStatus {
    #[serde(alias = "Backlog")]
    Backlog,
    #[serde(alias = "In Progress", alias = "InProgress")]
    InProgress,
    #[serde(alias = "Review")]
    Review,
    #[serde(alias = "Completed")]
    Completed,
}

impl StatusSet for BoardStatus {
    const ALL: &'static [Self] = &[
        BoardStatus::Backlog,
        BoardStatus::InProgress,
        BoardStatus::Review,
        BoardStatus::Completed,
    ];
    const TASK_KIND: &'static str = "board task";

    fn label(self) -> &'static str {
        match self {
            BoardStatus::Backlog => "Backlog",
            BoardStatus::InProgress => "In Progress",
            BoardStatus::Review => "Review",
            BoardStatus::Completed => "Completed",
        }
    }

    // Review still has work outstanding, so it counts as active.
    fn phase(self) -> Phase {
        match self {
            BoardStatus::Backlog => Phase::NotStarted,
            BoardStatus::InProgress | BoardStatus::Review => Phase::Active,
            BoardStatus::Completed => Phase::Done,
        }
    }
}

/// Priority classification for task importance.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    #[serde(alias = "Low")]
    Low,
    #[serde(alias = "Medium")]
    Medium,
    #[serde(alias = "High")]
    High,
    #[serde(alias = "Critical")]
    Critical,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Critical,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
            Priority::Critical => "Critical",
        }
    }
}

/// Role of a person using the dashboard.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    #[serde(alias = "team-leader")]
    TeamLeader,
    #[default]
    #[serde(alias = "team_member")]
    Member,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::TeamLeader => "team leader",
            Role::Member => "member",
        }
    }
}

/// Lifecycle status of a project.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    #[default]
    #[serde(alias = "Planning")]
    Planning,
    #[serde(alias = "Active")]
    Active,
    #[serde(alias = "On Hold")]
    OnHold,
    #[serde(alias = "Completed")]
    Completed,
}

impl ProjectStatus {
    pub fn label(self) -> &'static str {
        match self {
            ProjectStatus::Planning => "Planning",
            ProjectStatus::Active => "Active",
            ProjectStatus::OnHold => "On Hold",
            ProjectStatus::Completed => "Completed",
        }
    }
}

/// Kind of project resource.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    #[serde(alias = "Note")]
    Note,
    #[serde(alias = "File")]
    File,
    #[serde(alias = "Link")]
    Link,
}

impl ResourceKind {
    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::Note => "Note",
            ResourceKind::File => "File",
            ResourceKind::Link => "Link",
        }
    }
}

/// Named date ranges for scoping analytics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DateRange {
    Today,
    ThisWeek,
    #[default]
    ThisMonth,
    LastQuarter,
    All,
}

/// First day of the week used by [`DateRange::ThisWeek`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum WeekStart {
    #[default]
    Monday,
    Sunday,
}

/// Efficiency reported when no actual effort has been logged.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ZeroActualEfficiency {
    /// Report 0%.
    #[default]
    Zero,
    /// Report 100%, treating "nothing spent" as on budget.
    Full,
}

impl ZeroActualEfficiency {
    pub fn percent(self) -> i64 {
        match self {
            ZeroActualEfficiency::Zero => 0,
            ZeroActualEfficiency::Full => 100,
        }
    }
}

/// Analytics views available from the CLI.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum View {
    Overview,
    Projects,
    Members,
    Trend,
}

/// Available sorting keys for entity listings.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum SortKey {
    Id,
    Date,
    Name,
    Priority,
}

/// Kind of change recorded in the activity history.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    Create,
    Update,
    Delete,
}

impl ActionKind {
    pub fn label(self) -> &'static str {
        match self {
            ActionKind::Create => "Create",
            ActionKind::Update => "Update",
            ActionKind::Delete => "Delete",
        }
    }
}
