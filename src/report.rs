use std::cmp::Reverse;
use std::path::Path;

use crate::error::Result;
use crate::model::SourceField;
use crate::registry::{ActivityEntry, UserRegistry};
use crate::tabular;

pub const REPORT_FILE: &str = "report-users.csv";

const USER_COLUMNS: [&str; 8] = [
    "count",
    "id",
    "login",
    "name",
    "picture",
    "email",
    "organization",
    "phone",
];

/// Entries by descending count; equal counts fall back to ascending id.
pub fn rank(registry: &UserRegistry) -> Vec<&ActivityEntry> {
    let mut ranked: Vec<&ActivityEntry> = registry.entries().iter().collect();
    ranked.sort_by(|a, b| {
        Reverse(a.count())
            .cmp(&Reverse(b.count()))
            .then_with(|| a.id().cmp(b.id()))
    });
    ranked
}

/// The flattened report: one row per user, reference lists reduced to lengths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserReport {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl UserReport {
    pub fn build(registry: &UserRegistry, columns: &[SourceField]) -> Self {
        let header = USER_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(columns.iter().map(ToString::to_string))
            .collect();

        let rows = rank(registry)
            .into_iter()
            .map(|entry| {
                let mut row = Vec::with_capacity(USER_COLUMNS.len() + columns.len());
                row.push(entry.count().to_string());
                row.extend(
                    entry
                        .user()
                        .columns()
                        .into_iter()
                        .map(|value| value.unwrap_or_default().to_string()),
                );
                row.extend(
                    columns
                        .iter()
                        .map(|key| entry.references(key).len().to_string()),
                );
                row
            })
            .collect();

        Self { header, rows }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        tabular::write_table(path, &self.header, &self.rows)
    }
}
