use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// File-backed team dashboard: tasks, projects, people and the metrics over them.
/// Storage defaults to ~/.pmd/dashboard.json or a path passed via --db.
#[derive(Parser)]
#[command(name = "pmd", version, about = "Team task dashboard CLI")]
pub struct Cli {
    /// Path to the JSON database file.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Act as this user ID. Without it commands run with admin rights.
    #[arg(long = "as", global = true, value_name = "USER_ID")]
    pub as_user: Option<u64>,

    /// Path to a TOML settings file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["pmd", "task", "list", "--as", "3", "--db", "x.json"]).unwrap();
        assert_eq!(cli.as_user, Some(3));
        assert_eq!(cli.db, Some(PathBuf::from("x.json")));
    }
}
