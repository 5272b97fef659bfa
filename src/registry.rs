use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::error::{MigrateError, Result};
use crate::model::{Record, SourceField, UserRecord};

/// Per-user activity: the user plus every row that referenced them, grouped
/// by the (source, field) the reference came through.
#[derive(Debug, Clone)]
pub struct ActivityEntry {
    user: UserRecord,
    placeholder: bool,
    count: usize,
    by_source: HashMap<SourceField, Vec<Rc<Record>>>,
}

impl ActivityEntry {
    fn new(user: UserRecord, placeholder: bool) -> Self {
        Self {
            user,
            placeholder,
            count: 0,
            by_source: HashMap::new(),
        }
    }

    pub fn user(&self) -> &UserRecord {
        &self.user
    }

    pub fn id(&self) -> &str {
        &self.user.id
    }

    /// Total references across all tracked fields.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    /// Rows that referenced this user through `key`, in scan order.
    pub fn references(&self, key: &SourceField) -> &[Rc<Record>] {
        self.by_source.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// The only way `count` moves, so it always equals the sum of the lists.
    pub(crate) fn record(&mut self, key: SourceField, row: Rc<Record>) {
        self.by_source.entry(key).or_default().push(row);
        self.count += 1;
    }
}

/// Known users plus placeholders created for ids nothing else accounts for.
///
/// Owns the unknown-user sequence, so each registry numbers its placeholders
/// from 1 independently of any other run.
#[derive(Debug, Default)]
pub struct UserRegistry {
    entries: Vec<ActivityEntry>,
    by_id: HashMap<String, usize>,
    unknowns: u32,
}

/// What seeding did with the canonical user rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedOutcome {
    pub registered: usize,
    pub duplicates: Vec<String>,
}

impl UserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every canonical user. `origin` names the file in errors.
    ///
    /// A row without an id is fatal. A repeated id keeps the first row.
    pub fn seed(&mut self, origin: &str, records: &[Record]) -> Result<SeedOutcome> {
        let mut outcome = SeedOutcome::default();
        for (index, record) in records.iter().enumerate() {
            let user = UserRecord::from_record(record).ok_or_else(|| MigrateError::MissingUserId {
                path: origin.to_string(),
                row: index + 1,
            })?;

            if self.by_id.contains_key(&user.id) {
                warn!(id = %user.id, login = ?user.login, "duplicate user id, keeping first");
                outcome.duplicates.push(user.id);
                continue;
            }

            debug!(id = %user.id, login = ?user.login, "registered user");
            self.insert(ActivityEntry::new(user, false));
            outcome.registered += 1;
        }
        Ok(outcome)
    }

    /// Entry for `user_id`, creating a numbered placeholder on first sight.
    ///
    /// `user_id` must be non-empty; callers skip blank references.
    pub fn resolve_or_create(&mut self, user_id: &str) -> &mut ActivityEntry {
        debug_assert!(!user_id.is_empty());
        let index = match self.by_id.get(user_id) {
            Some(&index) => index,
            None => {
                self.unknowns += 1;
                let user = UserRecord::placeholder(user_id, self.unknowns);
                debug!(id = %user_id, seq = self.unknowns, "created placeholder user");
                self.insert(ActivityEntry::new(user, true))
            }
        };
        &mut self.entries[index]
    }

    fn insert(&mut self, entry: ActivityEntry) -> usize {
        let index = self.entries.len();
        self.by_id.insert(entry.user.id.clone(), index);
        self.entries.push(entry);
        index
    }

    pub fn get(&self, user_id: &str) -> Option<&ActivityEntry> {
        self.by_id.get(user_id).map(|&index| &self.entries[index])
    }

    /// Entries in registration order.
    pub fn entries(&self) -> &[ActivityEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of placeholders created so far.
    pub fn placeholders(&self) -> u32 {
        self.unknowns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_row(id: &str, login: &str) -> Record {
        Record::new().with("id", id).with("login", login)
    }

    #[test]
    fn seed_registers_each_user_with_zero_count() {
        let mut registry = UserRegistry::new();
        let outcome = registry
            .seed("users.csv", &[user_row("1", "alice"), user_row("2", "bob")])
            .unwrap();

        assert_eq!(outcome.registered, 2);
        assert!(outcome.duplicates.is_empty());
        assert_eq!(registry.len(), 2);
        let alice = registry.get("1").unwrap();
        assert_eq!(alice.count(), 0);
        assert_eq!(alice.user().login.as_deref(), Some("alice"));
        assert!(!alice.is_placeholder());
    }

    #[test]
    fn seed_keeps_first_of_duplicate_ids() {
        let mut registry = UserRegistry::new();
        let outcome = registry
            .seed("users.csv", &[user_row("1", "alice"), user_row("1", "impostor")])
            .unwrap();

        assert_eq!(outcome.registered, 1);
        assert_eq!(outcome.duplicates, vec!["1".to_string()]);
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.get("1").unwrap().user().login.as_deref(),
            Some("alice")
        );
    }

    #[test]
    fn seed_fails_on_row_without_id() {
        let mut registry = UserRegistry::new();
        let rows = [user_row("1", "alice"), Record::new().with("login", "ghost")];
        let err = registry.seed("users.csv", &rows).unwrap_err();

        let MigrateError::MissingUserId { path, row } = err else {
            panic!("expected missing user id error");
        };
        assert_eq!(path, "users.csv");
        assert_eq!(row, 2);
    }

    #[test]
    fn resolve_reuses_known_users() {
        let mut registry = UserRegistry::new();
        registry.seed("users.csv", &[user_row("1", "alice")]).unwrap();

        let entry = registry.resolve_or_create("1");
        assert_eq!(entry.user().login.as_deref(), Some("alice"));
        assert_eq!(registry.placeholders(), 0);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn resolve_numbers_placeholders_in_first_seen_order() {
        let mut registry = UserRegistry::new();
        registry.resolve_or_create("x");
        registry.resolve_or_create("y");
        registry.resolve_or_create("x");

        assert_eq!(registry.placeholders(), 2);
        let x = registry.get("x").unwrap();
        assert!(x.is_placeholder());
        assert_eq!(x.user().login.as_deref(), Some("unknown-1"));
        assert_eq!(x.user().name.as_deref(), Some("Unknown #1"));
        let y = registry.get("y").unwrap();
        assert_eq!(y.user().login.as_deref(), Some("unknown-2"));
    }

    #[test]
    fn placeholder_numbering_is_per_registry() {
        let mut first = UserRegistry::new();
        first.resolve_or_create("a");
        first.resolve_or_create("b");

        let mut second = UserRegistry::new();
        let entry = second.resolve_or_create("b");
        assert_eq!(entry.user().login.as_deref(), Some("unknown-1"));
    }

    #[test]
    fn record_keeps_count_equal_to_reference_total() {
        let mut registry = UserRegistry::new();
        let row = Rc::new(Record::new().with("reporter_id", "9"));
        let key_a = SourceField::new("tickets", "reporter_id");
        let key_b = SourceField::new("tickets", "assigned_to_id");

        let entry = registry.resolve_or_create("9");
        entry.record(key_a.clone(), Rc::clone(&row));
        entry.record(key_a.clone(), Rc::clone(&row));
        entry.record(key_b.clone(), Rc::clone(&row));

        let entry = registry.get("9").unwrap();
        assert_eq!(entry.count(), 3);
        assert_eq!(entry.references(&key_a).len(), 2);
        assert_eq!(entry.references(&key_b).len(), 1);
        assert!(Rc::ptr_eq(&entry.references(&key_b)[0], &row));
        assert!(entry.references(&SourceField::new("wiki-pages", "user_id")).is_empty());
    }
}
