use std::rc::Rc;

use serde::Serialize;
use tracing::info;

use crate::model::{Record, TrackedSource};
use crate::registry::UserRegistry;

/// Tallies for one tracked source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceStats {
    pub source: String,
    pub rows: usize,
    pub references: usize,
    pub skipped_empty: usize,
    pub placeholders: u32,
}

/// Walks tracked sources and attributes each user reference to its entry.
///
/// Holds the registry mutably for its whole lifetime, so nothing else can
/// touch the id map while a scan is in progress.
pub struct ActivityIndexer<'a> {
    registry: &'a mut UserRegistry,
}

impl<'a> ActivityIndexer<'a> {
    pub fn new(registry: &'a mut UserRegistry) -> Self {
        Self { registry }
    }

    /// Index every configured field of every row of `source`.
    ///
    /// Blank references are skipped. Each non-blank one adds the row to the
    /// user's list for that field, even when the same row already counted
    /// toward the same user through another field.
    pub fn index(&mut self, source: &TrackedSource, records: &[Rc<Record>]) -> SourceStats {
        let placeholders_before = self.registry.placeholders();
        let mut stats = SourceStats {
            source: source.name.clone(),
            rows: records.len(),
            ..SourceStats::default()
        };

        for row in records {
            for key in source.keys() {
                let Some(user_id) = row.get(&key.field) else {
                    stats.skipped_empty += 1;
                    continue;
                };
                self.registry
                    .resolve_or_create(user_id)
                    .record(key, Rc::clone(row));
                stats.references += 1;
            }
        }

        stats.placeholders = self.registry.placeholders() - placeholders_before;
        info!(
            source = %source.name,
            rows = stats.rows,
            references = stats.references,
            placeholders = stats.placeholders,
            "indexed source"
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SourceField;

    fn rows(records: Vec<Record>) -> Vec<Rc<Record>> {
        records.into_iter().map(Rc::new).collect()
    }

    fn seeded() -> UserRegistry {
        let mut registry = UserRegistry::new();
        registry
            .seed("users.csv", &[Record::new().with("id", "1").with("login", "alice")])
            .unwrap();
        registry
    }

    fn tickets() -> TrackedSource {
        TrackedSource::new("tickets", &["assigned_to_id", "reporter_id"])
    }

    #[test]
    fn known_and_unknown_references_are_both_counted() {
        let mut registry = seeded();
        let records = rows(vec![
            Record::new()
                .with("assigned_to_id", "1")
                .with("reporter_id", "2"),
        ]);

        let stats = ActivityIndexer::new(&mut registry).index(&tickets(), &records);
        assert_eq!(stats.references, 2);
        assert_eq!(stats.placeholders, 1);

        let alice = registry.get("1").unwrap();
        assert_eq!(alice.count(), 1);
        assert_eq!(
            alice
                .references(&SourceField::new("tickets", "assigned_to_id"))
                .len(),
            1
        );

        let unknown = registry.get("2").unwrap();
        assert_eq!(unknown.count(), 1);
        assert_eq!(unknown.user().login.as_deref(), Some("unknown-1"));
        assert_eq!(
            unknown
                .references(&SourceField::new("tickets", "reporter_id"))
                .len(),
            1
        );
    }

    #[test]
    fn blank_references_contribute_nothing() {
        let mut registry = seeded();
        let mut blank = Record::new().with("assigned_to_id", "1");
        blank.insert("reporter_id", Some(String::new()));
        let records = rows(vec![blank, Record::new().with("title", "no refs")]);

        let stats = ActivityIndexer::new(&mut registry).index(&tickets(), &records);
        assert_eq!(stats.references, 1);
        assert_eq!(stats.skipped_empty, 3);
        assert_eq!(stats.placeholders, 0);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("1").unwrap().count(), 1);
    }

    #[test]
    fn same_user_in_two_fields_of_one_row_counts_twice() {
        let mut registry = seeded();
        let records = rows(vec![
            Record::new()
                .with("assigned_to_id", "1")
                .with("reporter_id", "1"),
        ]);

        ActivityIndexer::new(&mut registry).index(&tickets(), &records);

        let alice = registry.get("1").unwrap();
        assert_eq!(alice.count(), 2);
        let assigned = alice.references(&SourceField::new("tickets", "assigned_to_id"));
        let reported = alice.references(&SourceField::new("tickets", "reporter_id"));
        assert_eq!(assigned.len(), 1);
        assert_eq!(reported.len(), 1);
        assert!(Rc::ptr_eq(&assigned[0], &records[0]));
        assert!(Rc::ptr_eq(&reported[0], &records[0]));
    }

    #[test]
    fn references_keep_scan_order() {
        let mut registry = seeded();
        let records = rows(vec![
            Record::new().with("number", "10").with("reporter_id", "1"),
            Record::new().with("number", "11").with("reporter_id", "1"),
        ]);

        ActivityIndexer::new(&mut registry).index(&tickets(), &records);

        let numbers: Vec<&str> = registry
            .get("1")
            .unwrap()
            .references(&SourceField::new("tickets", "reporter_id"))
            .iter()
            .filter_map(|row| row.get("number"))
            .collect();
        assert_eq!(numbers, vec!["10", "11"]);
    }

    #[test]
    fn totals_match_non_blank_references() {
        let mut registry = seeded();
        let tracking = crate::model::Tracking::default();
        let tickets = rows(vec![
            Record::new().with("assigned_to_id", "1").with("reporter_id", "4"),
            Record::new().with("reporter_id", "5"),
            Record::new().with("assigned_to_id", "4").with("reporter_id", "1"),
        ]);
        let roles = rows(vec![
            Record::new().with("user_id", "5").with("invited_by_id", "1"),
            Record::new().with("user_id", "1"),
        ]);

        let mut indexer = ActivityIndexer::new(&mut registry);
        let mut references = 0;
        for source in &tracking.sources {
            let records = match source.name.as_str() {
                "tickets" => tickets.clone(),
                "user-roles" => roles.clone(),
                _ => Vec::new(),
            };
            references += indexer.index(source, &records).references;
        }
        assert_eq!(references, 8);

        let columns = tracking.columns();
        let total: usize = registry.entries().iter().map(|e| e.count()).sum();
        assert_eq!(total, references);
        for entry in registry.entries() {
            let listed: usize = columns.iter().map(|k| entry.references(k).len()).sum();
            assert_eq!(entry.count(), listed, "entry {}", entry.id());
        }
    }

    #[test]
    fn placeholder_numbers_continue_across_sources() {
        let mut registry = UserRegistry::new();
        let comments = TrackedSource::new("ticket-comments", &["user_id"]);
        let wiki = TrackedSource::new("wiki-pages", &["user_id"]);

        let mut indexer = ActivityIndexer::new(&mut registry);
        indexer.index(&comments, &rows(vec![Record::new().with("user_id", "a")]));
        let stats = indexer.index(
            &wiki,
            &rows(vec![
                Record::new().with("user_id", "a"),
                Record::new().with("user_id", "b"),
            ]),
        );
        assert_eq!(stats.placeholders, 1);

        assert_eq!(
            registry.get("a").unwrap().user().login.as_deref(),
            Some("unknown-1")
        );
        assert_eq!(
            registry.get("b").unwrap().user().login.as_deref(),
            Some("unknown-2")
        );
        assert_eq!(registry.get("a").unwrap().count(), 2);
    }
}
