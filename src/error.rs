use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrateError {
    #[error("no space configured (set ASSEMBLA_SPACE or pass --space)")]
    SpaceNotConfigured,

    #[error("space directory '{0}' does not exist (export the space first)")]
    SpaceDirMissing(String),

    #[error("{path}: row {row} has no user id")]
    MissingUserId { path: String, row: usize },

    #[error("{path}: {message}")]
    MalformedTable { path: String, message: String },

    #[error("invalid tracked sources: {0}")]
    InvalidSources(String),

    #[error("locked by another process: {0}")]
    Locked(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl MigrateError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::SpaceNotConfigured => "space_not_configured",
            Self::SpaceDirMissing(_) => "space_dir_missing",
            Self::MissingUserId { .. } => "missing_user_id",
            Self::MalformedTable { .. } => "malformed_table",
            Self::InvalidSources(_) => "invalid_sources",
            Self::Locked(_) => "locked",
            Self::Io(_) => "io_error",
            Self::Csv(_) => "csv_error",
            Self::Json(_) => "json_error",
            Self::Yaml(_) => "yaml_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, MigrateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_snake_case_and_stable() {
        let err = MigrateError::MissingUserId {
            path: "users.csv".into(),
            row: 3,
        };
        assert_eq!(err.code(), "missing_user_id");
        assert_eq!(err.to_string(), "users.csv: row 3 has no user id");
    }

    #[test]
    fn io_errors_convert_with_their_own_code() {
        let err = MigrateError::from(std::io::Error::other("disk full"));
        assert_eq!(err.code(), "io_error");
        assert_eq!(err.to_string(), "io error: disk full");
    }
}
