//! Error type for storage, configuration and command failures.
//!
//! Analytics never produce errors; everything here comes from the edges of the
//! program.

use std::path::PathBuf;

use thiserror::Error;

use crate::fields::Role;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("could not access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse database {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Serialize(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: u64 },

    #[error("a {} may not {action}", role.label())]
    Forbidden { role: Role, action: &'static str },

    #[error("{0}")]
    Invalid(String),
}

impl DashboardError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DashboardError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
