//! Projects, teams, people, resources and the activity log.
//!
//! These are the dimension records the dashboard stores next to tasks. Analytics only
//! read their ids and display names.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::fields::*;

/// A project that tasks and resources are filed under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default, alias = "project_manager_id")]
    pub manager_id: Option<u64>,
    #[serde(default, alias = "assigned_members")]
    pub member_ids: Vec<u64>,
    /// Team the project is run by.
    #[serde(default)]
    pub team_id: Option<u64>,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub created_at_utc: i64,
    #[serde(default)]
    pub updated_at_utc: i64,
}

impl Project {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Project {
            id,
            name: name.into(),
            description: None,
            status: ProjectStatus::default(),
            priority: None,
            start_date: None,
            end_date: None,
            manager_id: None,
            member_ids: Vec::new(),
            team_id: None,
            budget: None,
            created_at_utc: 0,
            updated_at_utc: 0,
        }
    }
}

/// A standing group of people that projects can be assigned to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "team_lead_id")]
    pub lead_id: Option<u64>,
    #[serde(default, alias = "members")]
    pub member_ids: Vec<u64>,
    #[serde(default)]
    pub created_at_utc: i64,
    #[serde(default)]
    pub updated_at_utc: i64,
}

impl Team {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Team {
            id,
            name: name.into(),
            description: None,
            lead_id: None,
            member_ids: Vec::new(),
            created_at_utc: 0,
            updated_at_utc: 0,
        }
    }

    /// Lead and members, without duplicates.
    pub fn people(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self
            .lead_id
            .into_iter()
            .chain(self.member_ids.iter().copied())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

/// A person on the team. Also the identity used for role checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    #[serde(alias = "full_name")]
    pub display_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub designation: Option<String>,
    /// Current workload as a percentage of capacity.
    #[serde(default)]
    pub current_workload: Option<u32>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub hire_date: Option<NaiveDate>,
    #[serde(default)]
    pub created_at_utc: i64,
}

impl User {
    pub fn new(id: u64, display_name: impl Into<String>, role: Role) -> Self {
        User {
            id,
            display_name: display_name.into(),
            email: None,
            role,
            designation: None,
            current_workload: None,
            skills: Vec::new(),
            hire_date: None,
            created_at_utc: 0,
        }
    }
}

/// A note, file reference or link attached to a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: u64,
    pub project_id: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", alias = "kind")]
    pub kind: ResourceKind,
    /// Note body, file path or URL depending on `kind`.
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub created_at_utc: i64,
}

/// One entry in the change history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: u64,
    pub entity_type: String,
    pub entity_id: u64,
    pub entity_name: String,
    pub action: ActionKind,
    #[serde(default)]
    pub performed_by: Option<u64>,
    #[serde(default)]
    pub performed_by_role: Option<Role>,
    pub at_utc: i64,
}
