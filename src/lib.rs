//! # PMD - Project Dashboard CLI
//!
//! A command-line team dashboard: daily work logs, project boards, people, and the effort
//! metrics computed over them.
//!
//! ## Key Features
//!
//! - **Two task collections**: dated daily work-log entries (Pending, In Progress, Completed,
//!   Blocked) and project board items (Backlog, In Progress, Review, Completed)
//! - **Effort analytics**: completion and efficiency rates, status distributions, per-day
//!   trends with time variance, per-project and per-member rollups
//! - **Date ranges**: today, this week, this month, last quarter, or everything
//! - **Roles**: admins, team leaders and members, each seeing the slice of data they own
//! - **Local File Storage**: one JSON file with CSV export and an activity history
//!
//! ## Quick Start
//!
//! ```bash
//! # Add a project and a person
//! pmd project add "Website" --status active
//! pmd user add "Ada Lovelace" --designation "Frontend"
//!
//! # Log today's work
//! pmd task add "Fix navigation" --project 1 --user 1 --expected 2 --actual 2.5
//!
//! # Metrics for this month, per member
//! pmd analytics --range this-month --view members
//!
//! # Export the same slice to CSV
//! pmd export --range this-month
//! ```
//!
//! ## Key Commands
//!
//! - `pmd task add|list|update|delete` - Daily work log
//! - `pmd board add|list|move|delete` - Project board items
//! - `pmd project|team|user|resource ...` - Projects, teams, people and attachments
//! - `pmd analytics` - Summary, distribution, trend and rollup views
//! - `pmd dashboard` - Board overview with team workload
//! - `pmd export` - CSV for reporting
//! - `pmd history` - Recent changes
//!
//! Data is stored locally in `~/.pmd/dashboard.json`. Settings are read from
//! `~/.pmd/dashboard.toml` and `PMD_` environment variables.

pub mod access;
pub mod analytics;
pub mod cli;
pub mod cmd;
pub mod db;
pub mod entities;
pub mod error;
pub mod export;
pub mod fields;
pub mod report;
pub mod settings;
pub mod task;
