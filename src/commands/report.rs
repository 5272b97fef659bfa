use std::path::Path;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::{LOCK_FILE, Layout, SpaceArgs};
use crate::error::Result;
use crate::indexer::{ActivityIndexer, SourceStats};
use crate::lock::RunLock;
use crate::model::{Record, Tracking};
use crate::output::{self, Format};
use crate::registry::UserRegistry;
use crate::report::{self, UserReport};
use crate::tabular;

#[derive(Debug, Clone, Serialize)]
pub struct RankedUser {
    pub count: usize,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub placeholder: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub space: String,
    pub report: String,
    pub users: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub duplicates: Vec<String>,
    pub placeholders: u32,
    pub references: usize,
    pub sources: Vec<SourceStats>,
    pub ranking: Vec<RankedUser>,
    pub generated_at: DateTime<Utc>,
}

pub fn run(space: &SpaceArgs, sources: Option<&Path>, format: Format) -> Result<()> {
    let layout = Layout::from_args(space)?;
    let tracking = Tracking::load(sources)?;
    let summary = generate(&layout, &tracking, format)?;
    output::print_report(&summary, format)
}

/// Seed from `users.csv`, index every tracked table, then write the ranked report.
///
/// Every input is read before the report file is touched, so a fatal input
/// error leaves any previous report in place.
pub fn generate(layout: &Layout, tracking: &Tracking, format: Format) -> Result<ReportSummary> {
    let dir = layout.require_space_dir()?;
    let lock = RunLock::acquire(&dir.join(LOCK_FILE))?;

    let users_path = layout.users_path();
    let users = tabular::read_records(&users_path)?;
    output::progress(
        format,
        format!("{}: found {} users", layout.space(), users.len()),
    );

    let mut registry = UserRegistry::new();
    let seeded = registry.seed(&users_path.display().to_string(), &users)?;

    let mut tables: Vec<Vec<Rc<Record>>> = Vec::with_capacity(tracking.sources.len());
    for source in &tracking.sources {
        let path = layout.table_path(&source.file_name());
        output::progress(format, path.display());
        let records = tabular::read_records(&path)?;
        tables.push(records.into_iter().map(Rc::new).collect());
    }

    let mut indexer = ActivityIndexer::new(&mut registry);
    let mut stats = Vec::with_capacity(tables.len());
    for (source, records) in tracking.sources.iter().zip(&tables) {
        let source_stats = indexer.index(source, records);
        output::print_source_stats(&source_stats, format);
        stats.push(source_stats);
    }

    let report_path = layout.report_path();
    UserReport::build(&registry, &tracking.columns()).write(&report_path)?;
    lock.release()?;

    let ranking = report::rank(&registry)
        .into_iter()
        .map(|entry| RankedUser {
            count: entry.count(),
            id: entry.id().to_string(),
            login: entry.user().login.clone(),
            placeholder: entry.is_placeholder(),
        })
        .collect();

    Ok(ReportSummary {
        space: layout.space().to_string(),
        report: report_path.display().to_string(),
        users: seeded.registered,
        duplicates: seeded.duplicates,
        placeholders: registry.placeholders(),
        references: stats.iter().map(|s| s.references).sum(),
        sources: stats,
        ranking,
        generated_at: Utc::now(),
    })
}
