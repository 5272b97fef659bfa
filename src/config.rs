//! Where a space's exported tables live, resolved from flags or environment.

use std::path::{Path, PathBuf};

use clap::Args;

use crate::error::{MigrateError, Result};
use crate::report::REPORT_FILE;

pub const ASSEMBLA_DIR: &str = "assembla";
pub const JIRA_DIR: &str = "jira";
pub const USERS_FILE: &str = "users.csv";
pub const LOCK_FILE: &str = ".report.lock";

/// Flags shared by every command that reads a space export.
#[derive(Args, Debug, Clone)]
pub struct SpaceArgs {
    /// Assembla space name
    #[arg(long, env = "ASSEMBLA_SPACE")]
    pub space: Option<String>,

    /// Root directory holding the exported CSV dumps
    #[arg(long, env = "MIGRANT_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,
}

/// Lower-case, with spaces, slashes and underscores turned into hyphens.
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| match c {
            ' ' | '/' | '_' => '-',
            other => other,
        })
        .collect()
}

/// Directory layout for one space: `<data>/assembla/<space>` and `<data>/jira`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    data_dir: PathBuf,
    space: String,
}

impl Layout {
    pub fn new(data_dir: impl Into<PathBuf>, space: Option<&str>) -> Result<Self> {
        let space = space
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(MigrateError::SpaceNotConfigured)?;
        Ok(Self {
            data_dir: data_dir.into(),
            space: space.to_string(),
        })
    }

    pub fn from_args(args: &SpaceArgs) -> Result<Self> {
        Self::new(&args.data_dir, args.space.as_deref())
    }

    pub fn space(&self) -> &str {
        &self.space
    }

    pub fn space_dir(&self) -> PathBuf {
        self.data_dir
            .join(ASSEMBLA_DIR)
            .join(normalize_name(&self.space))
    }

    pub fn jira_dir(&self) -> PathBuf {
        self.data_dir.join(JIRA_DIR)
    }

    pub fn table_path(&self, file_name: &str) -> PathBuf {
        self.space_dir().join(file_name)
    }

    pub fn users_path(&self) -> PathBuf {
        self.table_path(USERS_FILE)
    }

    /// The report sits next to the users file it was seeded from.
    pub fn report_path(&self) -> PathBuf {
        report_path_for(&self.users_path())
    }

    /// Fail early with a clear message when the space was never exported.
    pub fn require_space_dir(&self) -> Result<PathBuf> {
        let dir = self.space_dir();
        if !dir.is_dir() {
            return Err(MigrateError::SpaceDirMissing(dir.display().to_string()));
        }
        Ok(dir)
    }
}

pub fn report_path_for(users_path: &Path) -> PathBuf {
    users_path.with_file_name(REPORT_FILE)
}
