use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MigrateError, Result};

/// One row of an exported table, keyed by normalized header name.
///
/// Fields keep their header order. Empty cells are stored as `None` so that
/// callers never have to tell "missing column" apart from "blank value".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, Option<String>)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`, replacing an existing value in place.
    pub fn insert(&mut self, key: impl Into<String>, value: Option<String>) {
        let key = key.into();
        let value = value.filter(|v| !v.is_empty());
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, Some(value.into()));
        self
    }

    /// Non-empty value of `key`, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }
}

/// A person known to the export, or a placeholder standing in for one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserRecord {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl UserRecord {
    /// Build a user from a `users.csv` row. Returns `None` when the row has no id.
    pub fn from_record(record: &Record) -> Option<Self> {
        let id = record.get("id")?.to_string();
        let field = |key: &str| record.get(key).map(str::to_string);
        Some(Self {
            id,
            login: field("login"),
            name: field("name"),
            picture: field("picture"),
            email: field("email"),
            organization: field("organization"),
            phone: field("phone"),
        })
    }

    /// Placeholder for an id referenced by some table but absent from `users.csv`.
    pub fn placeholder(id: impl Into<String>, seq: u32) -> Self {
        Self {
            id: id.into(),
            login: Some(format!("unknown-{seq}")),
            name: Some(format!("Unknown #{seq}")),
            ..Self::default()
        }
    }

    /// Display columns in report order, after `count`.
    pub fn columns(&self) -> [Option<&str>; 7] {
        [
            Some(self.id.as_str()),
            self.login.as_deref(),
            self.name.as_deref(),
            self.picture.as_deref(),
            self.email.as_deref(),
            self.organization.as_deref(),
            self.phone.as_deref(),
        ]
    }
}

/// Composite key naming one user-reference column of one exported table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SourceField {
    pub source: String,
    pub field: String,
}

impl SourceField {
    pub fn new(source: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            field: field.into(),
        }
    }
}

impl fmt::Display for SourceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.field)
    }
}

/// An exported table and the columns in it that hold user ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrackedSource {
    pub name: String,
    pub fields: Vec<String>,
}

impl TrackedSource {
    pub fn new(name: &str, fields: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.csv", self.name)
    }

    pub fn keys(&self) -> impl Iterator<Item = SourceField> + '_ {
        self.fields
            .iter()
            .map(|field| SourceField::new(&self.name, field))
    }
}

/// The ordered set of tracked sources for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Tracking {
    pub sources: Vec<TrackedSource>,
}

impl Default for Tracking {
    fn default() -> Self {
        Self {
            sources: vec![
                TrackedSource::new("documents", &["created_by"]),
                TrackedSource::new("milestones", &["created_by"]),
                TrackedSource::new("ticket-attachments", &["created_by"]),
                TrackedSource::new("ticket-comments", &["user_id"]),
                TrackedSource::new("tickets", &["assigned_to_id", "reporter_id"]),
                TrackedSource::new("user-roles", &["user_id", "invited_by_id"]),
                TrackedSource::new("wiki-pages", &["user_id"]),
            ],
        }
    }
}

impl Tracking {
    /// Load a YAML override, or the built-in Assembla layout when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = fs::read_to_string(path)?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Err(MigrateError::InvalidSources("configuration is empty".into()));
        }
        let tracking: Self = serde_yaml::from_str(raw)?;
        tracking.validate()?;
        Ok(tracking)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            return Err(MigrateError::InvalidSources(
                "at least one source is required".into(),
            ));
        }
        let mut seen = HashSet::new();
        for source in &self.sources {
            if source.name.trim().is_empty() {
                return Err(MigrateError::InvalidSources(
                    "source names cannot be empty".into(),
                ));
            }
            if source.fields.is_empty() {
                return Err(MigrateError::InvalidSources(format!(
                    "source '{}' lists no fields",
                    source.name
                )));
            }
            for key in source.keys() {
                if key.field.trim().is_empty() {
                    return Err(MigrateError::InvalidSources(format!(
                        "source '{}' has an empty field name",
                        source.name
                    )));
                }
                if !seen.insert(key.clone()) {
                    return Err(MigrateError::InvalidSources(format!(
                        "'{key}' is listed more than once"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Every (source, field) pair in configuration order.
    pub fn columns(&self) -> Vec<SourceField> {
        self.sources.iter().flat_map(TrackedSource::keys).collect()
    }
}
