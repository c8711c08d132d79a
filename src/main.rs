use anyhow::{Context as _, Result};
use chrono::Local;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use project_dashboard::access::Viewer;
use project_dashboard::cli::Cli;
use project_dashboard::cmd::{self, Commands, Context};
use project_dashboard::db::{Database, DB_FILE_NAME};
use project_dashboard::error::DashboardError;
use project_dashboard::settings::{default_data_dir, Settings};

fn main() -> Result<()> {
    // Logs go to stderr so command output can be piped.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Completions don't need a database
    if let Commands::Completions { shell } = &cli.command {
        cmd::cmd_completions(*shell);
        return Ok(());
    }

    let home_dir = default_data_dir();
    let settings =
        Settings::load(cli.config.as_deref(), &home_dir).context("failed to load settings")?;
    let db_path = match cli.db {
        Some(path) => path,
        None => settings.data_dir(&home_dir).join(DB_FILE_NAME),
    };
    let db = Database::load(&db_path)
        .with_context(|| format!("failed to open database {}", db_path.display()))?;

    let viewer = match cli.as_user {
        Some(id) => db
            .user(id)
            .map(Viewer::from_user)
            .ok_or(DashboardError::NotFound { kind: "user", id })?,
        None => Viewer::admin(),
    };
    debug!(db = %db_path.display(), ?viewer, "starting");

    let mut ctx = Context {
        db,
        db_path,
        settings,
        viewer,
        today: Local::now().date_naive(),
    };
    cmd::run(&mut ctx, cli.command)?;
    Ok(())
}
