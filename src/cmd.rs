//! Command implementations for the CLI interface.
//!
//! Every handler works on an open [`Context`]. Role checks happen here, mutations go
//! through a [`Session`] so they land in the activity history, and the database is
//! saved once the change has been applied.

use std::cmp::Reverse;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::{Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use serde::Serialize;
use tracing::{debug, info};

use crate::access::{project_managers, scope_daily_tasks, visible_projects, Viewer};
use crate::analytics::*;
use crate::db::*;
use crate::entities::{Activity, Project, Resource, Team, User};
use crate::error::{DashboardError, Result};
use crate::export::tasks_to_csv;
use crate::fields::*;
use crate::report::*;
use crate::settings::Settings;
use crate::task::{BoardTask, DailyTask, Task};

#[derive(Subcommand)]
pub enum Commands {
    /// Manage daily work-log tasks.
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },

    /// Manage project board items.
    Board {
        #[command(subcommand)]
        action: BoardAction,
    },

    /// Manage projects.
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },

    /// Manage teams that run projects.
    Team {
        #[command(subcommand)]
        action: TeamAction,
    },

    /// Manage team members.
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Manage notes, files and links attached to projects.
    Resource {
        #[command(subcommand)]
        action: ResourceAction,
    },

    /// Show task metrics for a date range.
    Analytics {
        /// Only tasks in this project.
        #[arg(long)]
        project: Option<u64>,
        /// Date range (defaults to the configured range).
        #[arg(long, value_enum)]
        range: Option<DateRange>,
        /// Only tasks owned by this member (leaders and admins).
        #[arg(long)]
        member: Option<u64>,
        /// Compute over project board items instead of daily tasks.
        #[arg(long)]
        board: bool,
        /// Which part of the report to print.
        #[arg(long, value_enum, default_value_t = View::Overview)]
        view: View,
        /// Print the full report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Board overview for one project, or every project.
    Dashboard {
        #[arg(long)]
        project: Option<u64>,
    },

    /// Export daily tasks to CSV.
    Export {
        /// Output file path, or "-" for stdout (default: analytics_<range>_<date>.csv)
        #[arg(long, short)]
        output: Option<PathBuf>,
        #[arg(long)]
        project: Option<u64>,
        #[arg(long, value_enum)]
        range: Option<DateRange>,
        #[arg(long)]
        member: Option<u64>,
    },

    /// Show recent changes, newest first.
    History {
        /// Only entries for this record kind, e.g. "project" or "daily task".
        #[arg(long)]
        kind: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum TaskAction {
    /// Log a daily task.
    Add {
        title: String,
        #[arg(long)]
        project: Option<u64>,
        /// Owner; defaults to the acting user.
        #[arg(long)]
        user: Option<u64>,
        #[arg(long, value_enum, default_value_t = TaskStatus::Pending)]
        status: TaskStatus,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        /// Work date as YYYY-MM-DD (default: today).
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Expected effort in hours.
        #[arg(long, value_parser = parse_hours)]
        expected: Option<f64>,
        /// Actual effort in hours.
        #[arg(long, value_parser = parse_hours)]
        actual: Option<f64>,
        #[arg(long)]
        desc: Option<String>,
        /// What the task should produce.
        #[arg(long)]
        outcome: Option<String>,
    },

    /// List daily tasks with optional filters.
    List {
        #[arg(long)]
        project: Option<u64>,
        #[arg(long)]
        member: Option<u64>,
        #[arg(long, value_enum)]
        status: Option<TaskStatus>,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        /// Case-insensitive match on title, description and outcome.
        #[arg(long)]
        search: Option<String>,
        #[arg(long, value_enum, default_value_t = DateRange::All)]
        range: DateRange,
        /// Sort key, prefix with '-' for descending: id | date | name | priority.
        #[arg(long, allow_hyphen_values = true)]
        sort: Option<SortSpec>,
        /// Limit number of rows printed.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Update fields on a daily task.
    Update {
        id: u64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        desc: Option<String>,
        #[arg(long, conflicts_with = "clear_project")]
        project: Option<u64>,
        #[arg(long)]
        clear_project: bool,
        #[arg(long, value_enum)]
        status: Option<TaskStatus>,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, value_parser = parse_hours)]
        expected: Option<f64>,
        #[arg(long, value_parser = parse_hours)]
        actual: Option<f64>,
        #[arg(long)]
        outcome: Option<String>,
    },

    /// Delete a daily task.
    Delete { id: u64 },
}

#[derive(Subcommand)]
pub enum BoardAction {
    /// Add an item to a project board.
    Add {
        title: String,
        #[arg(long)]
        project: u64,
        #[arg(long, value_enum, default_value_t = BoardStatus::Backlog)]
        status: BoardStatus,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        #[arg(long)]
        assignee: Option<u64>,
        /// Due date as YYYY-MM-DD.
        #[arg(long)]
        due: Option<NaiveDate>,
        #[arg(long, value_parser = parse_hours)]
        estimate: Option<f64>,
        #[arg(long)]
        desc: Option<String>,
    },

    /// List board items.
    List {
        #[arg(long)]
        project: Option<u64>,
        #[arg(long, value_enum)]
        status: Option<BoardStatus>,
        #[arg(long)]
        assignee: Option<u64>,
        #[arg(long, allow_hyphen_values = true)]
        sort: Option<SortSpec>,
    },

    /// Move an item to another column.
    Move {
        id: u64,
        #[arg(value_enum)]
        status: BoardStatus,
    },

    /// Delete a board item.
    Delete { id: u64 },
}

#[derive(Subcommand)]
pub enum ProjectAction {
    /// Create a project.
    Add {
        name: String,
        #[arg(long)]
        desc: Option<String>,
        #[arg(long, value_enum, default_value_t = ProjectStatus::Planning)]
        status: ProjectStatus,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Manager user ID; must be an admin or team leader.
        #[arg(long)]
        manager: Option<u64>,
        /// Member user IDs. May be repeated. Accepts comma-separated.
        #[arg(long = "member")]
        members: Vec<String>,
        /// Team that runs the project.
        #[arg(long)]
        team: Option<u64>,
        #[arg(long)]
        budget: Option<f64>,
    },

    /// List projects.
    List {
        #[arg(long, value_enum)]
        status: Option<ProjectStatus>,
        #[arg(long, allow_hyphen_values = true)]
        sort: Option<SortSpec>,
    },

    /// Update fields on a project.
    Update {
        id: u64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        desc: Option<String>,
        #[arg(long, value_enum)]
        status: Option<ProjectStatus>,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(long)]
        manager: Option<u64>,
        /// Add members. May be repeated and comma-separated.
        #[arg(long = "add-member")]
        add_members: Vec<String>,
        /// Remove members. May be repeated and comma-separated.
        #[arg(long = "rm-member")]
        rm_members: Vec<String>,
        #[arg(long, conflicts_with = "clear_team")]
        team: Option<u64>,
        #[arg(long)]
        clear_team: bool,
        #[arg(long)]
        budget: Option<f64>,
    },

    /// Delete a project. Its tasks are kept but unassigned; its resources are removed.
    Delete { id: u64 },
}

#[derive(Subcommand)]
pub enum TeamAction {
    /// Create a team.
    Add {
        name: String,
        #[arg(long)]
        desc: Option<String>,
        #[arg(long)]
        lead: Option<u64>,
        /// Member user IDs. May be repeated. Accepts comma-separated.
        #[arg(long = "member")]
        members: Vec<String>,
    },

    /// List teams.
    List {
        #[arg(long, allow_hyphen_values = true)]
        sort: Option<SortSpec>,
    },

    /// Update a team.
    Update {
        id: u64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        desc: Option<String>,
        #[arg(long)]
        lead: Option<u64>,
        #[arg(long = "add-member")]
        add_members: Vec<String>,
        #[arg(long = "rm-member")]
        rm_members: Vec<String>,
    },

    /// Delete a team. Its projects are kept without a team.
    Delete { id: u64 },
}

#[derive(Subcommand)]
pub enum UserAction {
    /// Add a team member.
    Add {
        name: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long, value_enum, default_value_t = Role::Member)]
        role: Role,
        #[arg(long)]
        designation: Option<String>,
        /// Current workload in percent.
        #[arg(long, value_parser = clap::value_parser!(u32).range(0..=100))]
        workload: Option<u32>,
        /// Skills. May be repeated. Accepts comma-separated.
        #[arg(long = "skill")]
        skills: Vec<String>,
        #[arg(long)]
        hired: Option<NaiveDate>,
    },

    /// List team members.
    List {
        #[arg(long, value_enum)]
        role: Option<Role>,
        #[arg(long, allow_hyphen_values = true)]
        sort: Option<SortSpec>,
    },

    /// Update a team member. People may edit their own profile; only admins change roles.
    Update {
        id: u64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long, value_enum)]
        role: Option<Role>,
        #[arg(long)]
        designation: Option<String>,
        #[arg(long, value_parser = clap::value_parser!(u32).range(0..=100))]
        workload: Option<u32>,
        /// Replace the skill list. May be repeated and comma-separated.
        #[arg(long = "skill")]
        skills: Vec<String>,
        #[arg(long)]
        hired: Option<NaiveDate>,
    },

    /// Delete a team member. Their tasks are kept but unassigned.
    Delete { id: u64 },
}

#[derive(Subcommand)]
pub enum ResourceAction {
    /// Attach a note, file or link to a project.
    Add {
        title: String,
        #[arg(long)]
        project: u64,
        #[arg(long, value_enum, default_value_t = ResourceKind::Note)]
        kind: ResourceKind,
        /// Note text or link URL.
        #[arg(long)]
        content: Option<String>,
        /// File to reference (for --kind file).
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long)]
        desc: Option<String>,
    },

    /// List resources.
    List {
        #[arg(long)]
        project: Option<u64>,
    },

    /// Delete a resource.
    Delete { id: u64 },
}

/// Everything a command needs: the open database, settings and who is asking.
pub struct Context {
    pub db: Database,
    pub db_path: PathBuf,
    pub settings: Settings,
    pub viewer: Viewer,
    pub today: NaiveDate,
}

impl Context {
    fn session(&mut self) -> Session<'_> {
        Session::new(&mut self.db, self.viewer)
    }

    fn save(&self) -> Result<()> {
        self.db.save(&self.db_path)
    }

    fn options(&self) -> AnalyticsOptions {
        self.settings.analytics.options()
    }
}

/// Run one command against `ctx`.
pub fn run(ctx: &mut Context, command: Commands) -> Result<()> {
    match command {
        Commands::Task { action } => cmd_task(ctx, action),
        Commands::Board { action } => cmd_board(ctx, action),
        Commands::Project { action } => cmd_project(ctx, action),
        Commands::Team { action } => cmd_team(ctx, action),
        Commands::User { action } => cmd_user(ctx, action),
        Commands::Resource { action } => cmd_resource(ctx, action),
        Commands::Analytics {
            project,
            range,
            member,
            board,
            view,
            json,
        } => cmd_analytics(ctx, project, range, member, board, view, json),
        Commands::Dashboard { project } => cmd_dashboard(ctx, project),
        Commands::Export {
            output,
            project,
            range,
            member,
        } => cmd_export(ctx, output, project, range, member),
        Commands::History { kind, limit } => cmd_history(ctx, kind, limit),
        Commands::Completions { shell } => {
            cmd_completions(shell);
            Ok(())
        }
    }
}

/// Parse a non-negative number of hours.
fn parse_hours(s: &str) -> std::result::Result<f64, String> {
    let hours: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("'{s}' is not a number of hours"))?;
    if hours.is_finite() && hours >= 0.0 {
        Ok(hours)
    } else {
        Err(format!("hours must be zero or more, got {s}"))
    }
}

/// Parse comma-separated user IDs.
fn parse_ids(inputs: &[String]) -> Result<Vec<u64>> {
    split_list(inputs)
        .iter()
        .map(|s| {
            s.parse::<u64>()
                .map_err(|_| DashboardError::Invalid(format!("'{s}' is not a user ID")))
        })
        .collect()
}

fn forbidden(viewer: &Viewer, action: &'static str) -> DashboardError {
    DashboardError::Forbidden {
        role: viewer.role,
        action,
    }
}

fn check_project(db: &Database, id: Option<u64>) -> Result<()> {
    match id {
        Some(id) if db.project(id).is_none() => Err(DashboardError::NotFound {
            kind: "project",
            id,
        }),
        _ => Ok(()),
    }
}

fn check_user(db: &Database, id: Option<u64>) -> Result<()> {
    match id {
        Some(id) if db.user(id).is_none() => Err(DashboardError::NotFound { kind: "user", id }),
        _ => Ok(()),
    }
}

fn check_team(db: &Database, id: Option<u64>) -> Result<()> {
    match id {
        Some(id) if db.team(id).is_none() => Err(DashboardError::NotFound { kind: "team", id }),
        _ => Ok(()),
    }
}

/// Only admins and team leaders can manage a project.
fn check_manager(db: &Database, id: Option<u64>) -> Result<()> {
    check_user(db, id)?;
    match id {
        Some(id) if !project_managers(&db.users).iter().any(|u| u.id == id) => Err(
            DashboardError::Invalid(format!("user {id} is not an admin or team leader")),
        ),
        _ => Ok(()),
    }
}

fn check_dates(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<()> {
    match (start, end) {
        (Some(s), Some(e)) if e < s => Err(DashboardError::Invalid(format!(
            "end date {e} is before start date {s}"
        ))),
        _ => Ok(()),
    }
}

fn task_owner<S: StatusSet>(tasks: &[Task<S>], id: u64) -> Result<Option<u64>> {
    tasks
        .iter()
        .find(|t| t.id == id)
        .map(|t| t.user_id)
        .ok_or(DashboardError::NotFound {
            kind: S::TASK_KIND,
            id,
        })
}

/// Handle daily task commands.
pub fn cmd_task(ctx: &mut Context, action: TaskAction) -> Result<()> {
    match action {
        TaskAction::Add {
            title,
            project,
            user,
            status,
            priority,
            date,
            expected,
            actual,
            desc,
            outcome,
        } => {
            let owner = user.or(ctx.viewer.user_id);
            if !ctx.viewer.can_edit_task(owner) {
                return Err(forbidden(&ctx.viewer, "log tasks for someone else"));
            }
            check_project(&ctx.db, project)?;
            check_user(&ctx.db, owner)?;
            let date = date.unwrap_or(ctx.today).to_string();
            let task = DailyTask {
                project_id: project,
                user_id: owner,
                priority,
                expected_hours: expected,
                actual_hours: actual,
                description: desc,
                expected_outcome: outcome,
                ..DailyTask::new(0, title, status, date)
            };
            let created = ctx.session().create(task)?;
            ctx.save()?;
            println!("Added daily task {}", created.id);
        }

        TaskAction::List {
            project,
            member,
            status,
            priority,
            search,
            range,
            sort,
            limit,
        } => {
            let visible = scope_daily_tasks(&ctx.db.daily_tasks, &ctx.viewer, member);
            let filter = TaskFilter {
                project_id: project,
                user_id: None,
                status,
                priority,
                search,
                range,
            };
            let mut tasks = filter_tasks(&visible, &filter, ctx.today, &ctx.options());
            if let Some(spec) = sort {
                sort_records(&mut tasks, spec);
            }
            if let Some(n) = limit {
                tasks.truncate(n);
            }
            if tasks.is_empty() {
                println!("No daily tasks found matching the criteria.");
                return Ok(());
            }
            let rows: Vec<&DailyTask> = tasks.iter().collect();
            print!("{}", render_tasks(&rows, &ctx.db));
        }

        TaskAction::Update {
            id,
            title,
            desc,
            project,
            clear_project,
            status,
            priority,
            date,
            expected,
            actual,
            outcome,
        } => {
            let owner = task_owner(&ctx.db.daily_tasks, id)?;
            if !ctx.viewer.can_edit_task(owner) {
                return Err(forbidden(&ctx.viewer, "edit someone else's task"));
            }
            check_project(&ctx.db, project)?;
            let mut session = ctx.session();
            EntityStore::<DailyTask>::update(&mut session, id, |t| {
                if let Some(v) = title {
                    t.title = v;
                }
                if desc.is_some() {
                    t.description = desc;
                }
                if clear_project {
                    t.project_id = None;
                } else if project.is_some() {
                    t.project_id = project;
                }
                if let Some(s) = status {
                    t.status = s;
                }
                if priority.is_some() {
                    t.priority = priority;
                }
                if let Some(d) = date {
                    t.date = d.to_string();
                }
                if expected.is_some() {
                    t.expected_hours = expected;
                }
                if actual.is_some() {
                    t.actual_hours = actual;
                }
                if outcome.is_some() {
                    t.expected_outcome = outcome;
                }
            })?;
            ctx.save()?;
            println!("Updated daily task {id}");
        }

        TaskAction::Delete { id } => {
            let owner = task_owner(&ctx.db.daily_tasks, id)?;
            if !ctx.viewer.can_edit_task(owner) {
                return Err(forbidden(&ctx.viewer, "delete someone else's task"));
            }
            let removed = EntityStore::<DailyTask>::delete(&mut ctx.session(), id)?;
            ctx.save()?;
            println!("Deleted daily task {} ({})", removed.id, removed.title);
        }
    }
    Ok(())
}

/// Handle project board commands.
pub fn cmd_board(ctx: &mut Context, action: BoardAction) -> Result<()> {
    match action {
        BoardAction::Add {
            title,
            project,
            status,
            priority,
            assignee,
            due,
            estimate,
            desc,
        } => {
            ctx.viewer.require_manage("add board items")?;
            check_project(&ctx.db, Some(project))?;
            check_user(&ctx.db, assignee)?;
            let item = BoardTask {
                project_id: Some(project),
                user_id: assignee,
                priority,
                expected_hours: estimate,
                description: desc,
                ..BoardTask::new(0, title, status, due.map(|d| d.to_string()).unwrap_or_default())
            };
            let created = ctx.session().create(item)?;
            ctx.save()?;
            println!("Added board item {}", created.id);
        }

        BoardAction::List {
            project,
            status,
            assignee,
            sort,
        } => {
            let filter = TaskFilter {
                project_id: project,
                user_id: assignee,
                status,
                ..TaskFilter::default()
            };
            let mut items = filter_tasks(&ctx.db.board_tasks, &filter, ctx.today, &ctx.options());
            if let Some(spec) = sort {
                sort_records(&mut items, spec);
            }
            if items.is_empty() {
                println!("No board items found matching the criteria.");
                return Ok(());
            }
            let rows: Vec<&BoardTask> = items.iter().collect();
            print!("{}", render_tasks(&rows, &ctx.db));
        }

        BoardAction::Move { id, status } => {
            let owner = task_owner(&ctx.db.board_tasks, id)?;
            if !ctx.viewer.can_edit_task(owner) {
                return Err(forbidden(&ctx.viewer, "move someone else's board item"));
            }
            let moved =
                EntityStore::<BoardTask>::update(&mut ctx.session(), id, |t| t.status = status)?;
            ctx.save()?;
            println!("Moved board item {} to {}", moved.id, status.label());
        }

        BoardAction::Delete { id } => {
            ctx.viewer.require_manage("delete board items")?;
            let removed = EntityStore::<BoardTask>::delete(&mut ctx.session(), id)?;
            ctx.save()?;
            println!("Deleted board item {} ({})", removed.id, removed.title);
        }
    }
    Ok(())
}

/// Handle project commands.
pub fn cmd_project(ctx: &mut Context, action: ProjectAction) -> Result<()> {
    match action {
        ProjectAction::Add {
            name,
            desc,
            status,
            priority,
            start,
            end,
            manager,
            members,
            team,
            budget,
        } => {
            ctx.viewer.require_manage("create projects")?;
            check_dates(start, end)?;
            check_manager(&ctx.db, manager)?;
            check_team(&ctx.db, team)?;
            let member_ids = parse_ids(&members)?;
            for &m in &member_ids {
                check_user(&ctx.db, Some(m))?;
            }
            let project = Project {
                description: desc,
                status,
                priority,
                start_date: start,
                end_date: end,
                manager_id: manager,
                member_ids,
                team_id: team,
                budget,
                ..Project::new(0, name)
            };
            let created = ctx.session().create(project)?;
            ctx.save()?;
            println!("Added project {}", created.id);
        }

        ProjectAction::List { status, sort } => {
            let mut projects: Vec<Project> = visible_projects(&ctx.db.projects, &ctx.viewer)
                .into_iter()
                .filter(|p| status.map_or(true, |s| p.status == s))
                .cloned()
                .collect();
            if let Some(spec) = sort {
                sort_records(&mut projects, spec);
            }
            if projects.is_empty() {
                println!("No projects found.");
                return Ok(());
            }
            print!("{}", render_projects(&projects, &ctx.db));
        }

        ProjectAction::Update {
            id,
            name,
            desc,
            status,
            priority,
            start,
            end,
            manager,
            add_members,
            rm_members,
            team,
            clear_team,
            budget,
        } => {
            ctx.viewer.require_manage("edit projects")?;
            let current = ctx.db.project(id).ok_or(DashboardError::NotFound {
                kind: "project",
                id,
            })?;
            check_dates(start.or(current.start_date), end.or(current.end_date))?;
            check_manager(&ctx.db, manager)?;
            check_team(&ctx.db, team)?;
            let added = parse_ids(&add_members)?;
            for &m in &added {
                check_user(&ctx.db, Some(m))?;
            }
            let removed = parse_ids(&rm_members)?;
            EntityStore::<Project>::update(&mut ctx.session(), id, |p| {
                if let Some(v) = name {
                    p.name = v;
                }
                if desc.is_some() {
                    p.description = desc;
                }
                if let Some(s) = status {
                    p.status = s;
                }
                if priority.is_some() {
                    p.priority = priority;
                }
                if start.is_some() {
                    p.start_date = start;
                }
                if end.is_some() {
                    p.end_date = end;
                }
                if manager.is_some() {
                    p.manager_id = manager;
                }
                for m in added {
                    if !p.member_ids.contains(&m) {
                        p.member_ids.push(m);
                    }
                }
                p.member_ids.retain(|m| !removed.contains(m));
                if clear_team {
                    p.team_id = None;
                } else if team.is_some() {
                    p.team_id = team;
                }
                if budget.is_some() {
                    p.budget = budget;
                }
            })?;
            ctx.save()?;
            println!("Updated project {id}");
        }

        ProjectAction::Delete { id } => {
            ctx.viewer.require_manage("delete projects")?;
            let removed = EntityStore::<Project>::delete(&mut ctx.session(), id)?;
            ctx.save()?;
            println!("Deleted project {} ({})", removed.id, removed.name);
        }
    }
    Ok(())
}

/// Handle team commands.
pub fn cmd_team(ctx: &mut Context, action: TeamAction) -> Result<()> {
    match action {
        TeamAction::Add {
            name,
            desc,
            lead,
            members,
        } => {
            ctx.viewer.require_manage("create teams")?;
            check_user(&ctx.db, lead)?;
            let member_ids = parse_ids(&members)?;
            for &m in &member_ids {
                check_user(&ctx.db, Some(m))?;
            }
            let team = Team {
                description: desc,
                lead_id: lead,
                member_ids,
                ..Team::new(0, name)
            };
            let created = ctx.session().create(team)?;
            ctx.save()?;
            println!("Added team {}", created.id);
        }

        TeamAction::List { sort } => {
            let mut teams = ctx.db.teams.clone();
            if let Some(spec) = sort {
                sort_records(&mut teams, spec);
            }
            if teams.is_empty() {
                println!("No teams found.");
                return Ok(());
            }
            print!("{}", render_teams(&teams, &ctx.db));
        }

        TeamAction::Update {
            id,
            name,
            desc,
            lead,
            add_members,
            rm_members,
        } => {
            ctx.viewer.require_manage("edit teams")?;
            check_user(&ctx.db, lead)?;
            let added = parse_ids(&add_members)?;
            for &m in &added {
                check_user(&ctx.db, Some(m))?;
            }
            let removed = parse_ids(&rm_members)?;
            EntityStore::<Team>::update(&mut ctx.session(), id, |t| {
                if let Some(v) = name {
                    t.name = v;
                }
                if desc.is_some() {
                    t.description = desc;
                }
                if lead.is_some() {
                    t.lead_id = lead;
                }
                for m in added {
                    if !t.member_ids.contains(&m) {
                        t.member_ids.push(m);
                    }
                }
                t.member_ids.retain(|m| !removed.contains(m));
            })?;
            ctx.save()?;
            println!("Updated team {id}");
        }

        TeamAction::Delete { id } => {
            ctx.viewer.require_manage("delete teams")?;
            let removed = EntityStore::<Team>::delete(&mut ctx.session(), id)?;
            ctx.save()?;
            println!("Deleted team {} ({})", removed.id, removed.name);
        }
    }
    Ok(())
}

/// Handle team member commands.
pub fn cmd_user(ctx: &mut Context, action: UserAction) -> Result<()> {
    match action {
        UserAction::Add {
            name,
            email,
            role,
            designation,
            workload,
            skills,
            hired,
        } => {
            ctx.viewer.require_admin("add users")?;
            let user = User {
                email,
                designation,
                current_workload: workload,
                skills: split_list(&skills),
                hire_date: hired,
                ..User::new(0, name, role)
            };
            let created = ctx.session().create(user)?;
            ctx.save()?;
            println!("Added user {}", created.id);
        }

        UserAction::List { role, sort } => {
            let mut users: Vec<User> = ctx
                .db
                .users
                .iter()
                .filter(|u| role.map_or(true, |r| u.role == r))
                .cloned()
                .collect();
            if let Some(spec) = sort {
                sort_records(&mut users, spec);
            }
            if users.is_empty() {
                println!("No users found.");
                return Ok(());
            }
            print!("{}", render_users(&users));
        }

        UserAction::Update {
            id,
            name,
            email,
            role,
            designation,
            workload,
            skills,
            hired,
        } => {
            if ctx.viewer.user_id != Some(id) {
                ctx.viewer.require_admin("edit other people's profiles")?;
            }
            if role.is_some() {
                ctx.viewer.require_admin("change roles")?;
            }
            let skills = split_list(&skills);
            EntityStore::<User>::update(&mut ctx.session(), id, |u| {
                if let Some(v) = name {
                    u.display_name = v;
                }
                if email.is_some() {
                    u.email = email;
                }
                if let Some(r) = role {
                    u.role = r;
                }
                if designation.is_some() {
                    u.designation = designation;
                }
                if workload.is_some() {
                    u.current_workload = workload;
                }
                if !skills.is_empty() {
                    u.skills = skills;
                }
                if hired.is_some() {
                    u.hire_date = hired;
                }
            })?;
            ctx.save()?;
            println!("Updated user {id}");
        }

        UserAction::Delete { id } => {
            ctx.viewer.require_admin("delete users")?;
            if ctx.viewer.user_id == Some(id) {
                return Err(DashboardError::Invalid("you cannot delete yourself".into()));
            }
            let removed = EntityStore::<User>::delete(&mut ctx.session(), id)?;
            ctx.save()?;
            println!("Deleted user {} ({})", removed.id, removed.display_name);
        }
    }
    Ok(())
}

/// Handle project resource commands.
pub fn cmd_resource(ctx: &mut Context, action: ResourceAction) -> Result<()> {
    match action {
        ResourceAction::Add {
            title,
            project,
            kind,
            content,
            file,
            desc,
        } => {
            check_project(&ctx.db, Some(project))?;
            let (content, file_name, file_size) = match (kind, file, content) {
                (ResourceKind::File, Some(path), _) => {
                    let meta = fs::metadata(&path).map_err(|e| DashboardError::io(&path, e))?;
                    let name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned());
                    (path.display().to_string(), name, Some(meta.len()))
                }
                (ResourceKind::File, None, _) => {
                    return Err(DashboardError::Invalid(
                        "--file is required for file resources".into(),
                    ))
                }
                (_, _, Some(text)) if !text.trim().is_empty() => (text, None, None),
                _ => {
                    return Err(DashboardError::Invalid(
                        "--content is required for notes and links".into(),
                    ))
                }
            };
            let resource = Resource {
                id: 0,
                project_id: project,
                title,
                description: desc,
                kind,
                content,
                file_name,
                file_size,
                created_at_utc: 0,
            };
            let created = ctx.session().create(resource)?;
            ctx.save()?;
            println!("Added resource {}", created.id);
        }

        ResourceAction::List { project } => {
            check_project(&ctx.db, project)?;
            let resources: Vec<Resource> = ctx
                .db
                .resources
                .iter()
                .filter(|r| project.map_or(true, |p| r.project_id == p))
                .cloned()
                .collect();
            if resources.is_empty() {
                println!("No resources found.");
                return Ok(());
            }
            print!("{}", render_resources(&resources, &ctx.db));
        }

        ResourceAction::Delete { id } => {
            ctx.viewer.require_manage("delete resources")?;
            let removed = EntityStore::<Resource>::delete(&mut ctx.session(), id)?;
            ctx.save()?;
            println!("Deleted resource {} ({})", removed.id, removed.title);
        }
    }
    Ok(())
}

fn print_report<S>(report: &AnalyticsReport<S>, view: View, json: bool) -> Result<()>
where
    S: StatusSet + Serialize,
{
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    if report.summary.total == 0 {
        println!("No tasks in the selected range.");
        return Ok(());
    }
    match view {
        View::Overview => {
            print!("{}", render_summary(&report.summary));
            println!();
            print!("{}", render_status_distribution(&report.status_distribution));
        }
        View::Projects => print!("{}", render_project_rollups(&report.projects)),
        View::Members => print!("{}", render_user_rollups(&report.users)),
        View::Trend => print!("{}", render_trend(&report.daily_trend)),
    }
    Ok(())
}

/// Compute and print analytics over daily tasks, or board items with `board`.
pub fn cmd_analytics(
    ctx: &Context,
    project: Option<u64>,
    range: Option<DateRange>,
    member: Option<u64>,
    board: bool,
    view: View,
    json: bool,
) -> Result<()> {
    check_project(&ctx.db, project)?;
    let range = range.unwrap_or(ctx.settings.analytics.default_range);
    let options = ctx.options();
    debug!(?range, ?project, ?member, board, "computing analytics");

    if board {
        let mut filter = TaskFilter::<BoardStatus>::for_project(project, range);
        filter.user_id = member;
        let report = build_report(
            &ctx.db.board_tasks,
            &ctx.db.projects,
            &ctx.db.users,
            &filter,
            ctx.today,
            &options,
        );
        print_report(&report, view, json)
    } else {
        let visible = scope_daily_tasks(&ctx.db.daily_tasks, &ctx.viewer, member);
        let filter = TaskFilter::<TaskStatus>::for_project(project, range);
        let report = build_report(
            &visible,
            &ctx.db.projects,
            &ctx.db.users,
            &filter,
            ctx.today,
            &options,
        );
        print_report(&report, view, json)
    }
}

/// Print the board overview: headline numbers, distributions, team load and recent items.
pub fn cmd_dashboard(ctx: &Context, project: Option<u64>) -> Result<()> {
    check_project(&ctx.db, project)?;
    let options = ctx.options();
    let filter = TaskFilter::<BoardStatus>::for_project(project, DateRange::All);
    let items = filter_tasks(&ctx.db.board_tasks, &filter, ctx.today, &options);

    let selected = project.and_then(|id| ctx.db.project(id));
    let heading = selected.map_or_else(|| "All projects".to_string(), |p| p.name.clone());
    let team = selected.and_then(|p| p.team_id).and_then(|id| ctx.db.team(id));
    let people = dashboard_people(&ctx.db, selected);

    println!("{heading}");
    println!("{}", "=".repeat(heading.chars().count()));
    if let Some(t) = team {
        let lead = t
            .lead_id
            .and_then(|id| ctx.db.user(id))
            .map_or("no lead", |u| u.display_name.as_str());
        println!("Run by         {} ({lead})", t.name);
    }
    if items.is_empty() {
        println!("No board items yet.");
    } else {
        print!("{}", render_summary(&compute_summary_metrics(&items, &options)));
        println!("High priority  {}", high_priority_count(&items));
        println!();
        print!("{}", render_status_distribution(&compute_status_distribution(&items)));
        println!();
        print!("{}", render_priority_distribution(&compute_priority_distribution(&items)));
    }
    println!();
    println!(
        "Team           {} people, {}% average workload",
        people.len(),
        average_workload(&people)
    );

    let recent = recent_tasks(&items, ctx.settings.analytics.recent_limit);
    if !recent.is_empty() {
        println!();
        println!("Recently updated");
        print!("{}", render_tasks(&recent, &ctx.db));
    }
    Ok(())
}

/// Everyone working on `project`: its manager, members and the people of its team.
/// Without a project, every user.
fn dashboard_people(db: &Database, project: Option<&Project>) -> Vec<User> {
    let Some(p) = project else {
        return db.users.clone();
    };
    let team = p.team_id.and_then(|id| db.team(id));
    db.users
        .iter()
        .filter(|u| {
            p.member_ids.contains(&u.id)
                || p.manager_id == Some(u.id)
                || team.is_some_and(|t| t.people().contains(&u.id))
        })
        .cloned()
        .collect()
}

fn range_name(range: DateRange) -> String {
    range
        .to_possible_value()
        .map(|v| v.get_name().to_string())
        .unwrap_or_default()
}

/// Export the filtered daily tasks to CSV.
pub fn cmd_export(
    ctx: &Context,
    output: Option<PathBuf>,
    project: Option<u64>,
    range: Option<DateRange>,
    member: Option<u64>,
) -> Result<()> {
    check_project(&ctx.db, project)?;
    let range = range.unwrap_or(ctx.settings.analytics.default_range);
    let visible = scope_daily_tasks(&ctx.db.daily_tasks, &ctx.viewer, member);
    let filter = TaskFilter::<TaskStatus>::for_project(project, range);
    let tasks = filter_tasks(&visible, &filter, ctx.today, &ctx.options());
    let csv = tasks_to_csv(&tasks, &ctx.db.projects, &ctx.db.users);

    let path = output.unwrap_or_else(|| {
        PathBuf::from(format!("analytics_{}_{}.csv", range_name(range), ctx.today))
    });
    if path == Path::new("-") {
        print!("{csv}");
        return Ok(());
    }
    fs::write(&path, csv).map_err(|e| DashboardError::io(&path, e))?;
    info!(path = %path.display(), rows = tasks.len(), "exported");
    println!("Exported {} task(s) to {}", tasks.len(), path.display());
    Ok(())
}

/// Print the activity history, newest first.
pub fn cmd_history(ctx: &Context, kind: Option<String>, limit: usize) -> Result<()> {
    ctx.viewer.require_manage("view the activity history")?;
    let mut entries: Vec<&Activity> = ctx
        .db
        .activities
        .iter()
        .filter(|a| {
            kind.as_deref()
                .map_or(true, |k| a.entity_type.eq_ignore_ascii_case(k.trim()))
        })
        .collect();
    entries.sort_by_key(|a| Reverse((a.at_utc, a.id)));
    entries.truncate(limit);
    if entries.is_empty() {
        println!("No activity recorded.");
        return Ok(());
    }
    print!("{}", render_activities(&entries, &ctx.db));
    Ok(())
}

/// Write a completion script for `shell` to stdout.
pub fn cmd_completions(shell: Shell) {
    use crate::cli::Cli;
    use clap::CommandFactory;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}
