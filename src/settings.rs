//! Dashboard configuration.
//!
//! Settings come from an optional TOML file (`~/.pmd/dashboard.toml` unless `--config`
//! names another) layered under `PMD_` environment variables, e.g.
//! `PMD_ANALYTICS__WEEK_STARTS_ON=sunday`. Every key has a default, so an absent file
//! is not an error.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analytics::AnalyticsOptions;
use crate::error::Result;
use crate::fields::*;

pub const CONFIG_FILE_NAME: &str = "dashboard.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub storage: StorageSettings,
    pub analytics: AnalyticsSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Directory holding the database file. Defaults to `~/.pmd`.
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsSettings {
    pub zero_actual_efficiency: ZeroActualEfficiency,
    pub week_starts_on: WeekStart,
    pub default_range: DateRange,
    /// Rows shown in the dashboard's recent-activity list.
    pub recent_limit: usize,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        AnalyticsSettings {
            zero_actual_efficiency: ZeroActualEfficiency::default(),
            week_starts_on: WeekStart::default(),
            default_range: DateRange::default(),
            recent_limit: 7,
        }
    }
}

impl AnalyticsSettings {
    pub fn options(&self) -> AnalyticsOptions {
        AnalyticsOptions {
            zero_actual: self.zero_actual_efficiency,
            week_start: self.week_starts_on,
        }
    }
}

impl Settings {
    /// Load settings. An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>, default_dir: &Path) -> Result<Self> {
        let mut builder = config::Config::builder();
        match path {
            Some(p) => {
                debug!(path = %p.display(), "loading settings");
                builder = builder.add_source(config::File::from(p).required(true));
            }
            None => {
                let p = default_dir.join(CONFIG_FILE_NAME);
                builder = builder.add_source(config::File::from(p).required(false));
            }
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix("PMD")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Directory for the database, falling back to `fallback`.
    pub fn data_dir(&self, fallback: &Path) -> PathBuf {
        self.storage
            .dir
            .clone()
            .unwrap_or_else(|| fallback.to_path_buf())
    }
}

/// `~/.pmd`, or `./.pmd` when no home directory is set.
pub fn default_data_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".pmd")
}
