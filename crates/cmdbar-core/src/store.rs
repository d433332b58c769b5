use crate::config::get_db_file_path;
use crate::error::{CmdbarError, Result};
use crate::models::Snippet;
use crate::storage::{load_snippets, save_snippets};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::warn;
use uuid::Uuid;

/// Change notification sent to store subscribers.
///
/// Every successful mutation emits exactly one event; failed or no-op
/// mutations emit nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    Added(Uuid),
    Updated(Uuid),
    Deleted(Uuid),
}

type Listener = Box<dyn Fn(StoreEvent)>;

/// The snippet collection and its persistence.
///
/// Constructed once at startup and passed by reference to every consumer.
/// All mutation is expected to happen on a single thread; persistence is a
/// whole-collection rewrite on every change.
pub struct SnippetStore {
    path: PathBuf,
    snippets: Vec<Snippet>,
    categories: BTreeSet<String>,
    listeners: Vec<Listener>,
}

impl SnippetStore {
    /// Open the store backed by the given database file.
    ///
    /// A missing file starts an empty collection. An unreadable or
    /// unparseable file also starts empty, with a warning; the corrupt
    /// content is left on disk until the next successful persist.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let snippets = match load_snippets(&path) {
            Ok(snippets) => snippets,
            Err(CmdbarError::DatabaseNotFound(_)) => vec![],
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load snippet database, starting empty");
                vec![]
            }
        };

        let mut store = Self {
            path,
            snippets,
            categories: BTreeSet::new(),
            listeners: Vec::new(),
        };
        store.rebuild_categories();
        store
    }

    /// Open the store at the default database location
    pub fn open_default() -> Self {
        Self::open(get_db_file_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snippets(&self) -> &[Snippet] {
        &self.snippets
    }

    pub fn is_empty(&self) -> bool {
        self.snippets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.snippets.len()
    }

    pub fn get(&self, id: Uuid) -> Option<&Snippet> {
        self.snippets.iter().find(|s| s.id == id)
    }

    /// Distinct category names, sorted
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(String::as_str)
    }

    /// Linear substring scan over all snippets
    pub fn filter(&self, query: &str) -> Vec<&Snippet> {
        self.snippets.iter().filter(|s| s.matches(query)).collect()
    }

    /// Register a change listener. Listeners live as long as the store.
    pub fn subscribe(&mut self, listener: impl Fn(StoreEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Append a snippet and persist the collection
    pub fn add(&mut self, snippet: Snippet) -> Result<()> {
        let id = snippet.id;
        if !snippet.category.is_empty() {
            self.categories.insert(snippet.category.clone());
        }
        self.snippets.push(snippet);
        self.persist()?;
        self.notify(StoreEvent::Added(id));
        Ok(())
    }

    /// Remove the snippet with the given id.
    ///
    /// Returns `false` without persisting or notifying when no snippet
    /// matches.
    pub fn delete(&mut self, id: Uuid) -> Result<bool> {
        let Some(pos) = self.snippets.iter().position(|s| s.id == id) else {
            return Ok(false);
        };

        self.snippets.remove(pos);
        self.rebuild_categories();
        self.persist()?;
        self.notify(StoreEvent::Deleted(id));
        Ok(true)
    }

    /// Edit a snippet in place, refreshing its modification timestamp.
    ///
    /// Returns `false` without persisting or notifying when no snippet
    /// matches.
    pub fn update(&mut self, id: Uuid, f: impl FnOnce(&mut Snippet)) -> Result<bool> {
        let Some(snippet) = self.snippets.iter_mut().find(|s| s.id == id) else {
            return Ok(false);
        };

        f(snippet);
        snippet.touch();
        self.rebuild_categories();
        self.persist()?;
        self.notify(StoreEvent::Updated(id));
        Ok(true)
    }

    fn persist(&self) -> Result<()> {
        save_snippets(&self.path, &self.snippets)
    }

    fn rebuild_categories(&mut self) {
        self.categories = self
            .snippets
            .iter()
            .filter(|s| !s.category.is_empty())
            .map(|s| s.category.clone())
            .collect();
    }

    fn notify(&self, event: StoreEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::fs;
    use std::rc::Rc;
    use tempfile::tempdir;

    fn snippet(name: &str, category: &str) -> Snippet {
        Snippet::new(
            name.to_string(),
            String::new(),
            category.to_string(),
            vec![format!("echo {}", name)],
            vec![],
        )
    }

    #[test]
    fn add_then_delete_restores_prior_state() {
        let dir = tempdir().unwrap();
        let mut store = SnippetStore::open(dir.path().join("db.json"));
        store.add(snippet("base", "ops")).unwrap();
        let before: Vec<Uuid> = store.snippets().iter().map(|s| s.id).collect();

        let extra = snippet("extra", "build");
        let id = extra.id;
        store.add(extra).unwrap();
        assert!(store.delete(id).unwrap());

        let after: Vec<Uuid> = store.snippets().iter().map(|s| s.id).collect();
        assert_eq!(before, after);
        assert!(!store.categories().any(|c| c == "build"));
    }

    #[test]
    fn order_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.json");

        let s1 = snippet("first", "ops");
        let s2 = snippet("second", "ops");
        let ids = [s1.id, s2.id];
        {
            let mut store = SnippetStore::open(&path);
            store.add(s1).unwrap();
            store.add(s2).unwrap();
        }

        let reopened = SnippetStore::open(&path);
        let loaded: Vec<Uuid> = reopened.snippets().iter().map(|s| s.id).collect();
        assert_eq!(loaded, ids);
        assert_eq!(reopened.snippets()[0].name, "first");
    }

    #[test]
    fn categories_are_deduplicated_and_pruned() {
        let dir = tempdir().unwrap();
        let mut store = SnippetStore::open(dir.path().join("db.json"));
        store.add(snippet("a", "ops")).unwrap();
        store.add(snippet("b", "ops")).unwrap();
        let build = snippet("c", "build");
        let build_id = build.id;
        store.add(build).unwrap();

        let cats: Vec<&str> = store.categories().collect();
        assert_eq!(cats, ["build", "ops"]);

        store.delete(build_id).unwrap();
        let cats: Vec<&str> = store.categories().collect();
        assert_eq!(cats, ["ops"]);
    }

    #[test]
    fn empty_category_never_enters_the_set() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.json");
        let mut store = SnippetStore::open(&path);
        store.add(snippet("uncategorized", "")).unwrap();
        store.add(snippet("labelled", "ops")).unwrap();

        let cats: Vec<&str> = store.categories().collect();
        assert_eq!(cats, ["ops"]);

        let reopened = SnippetStore::open(&path);
        let cats: Vec<&str> = reopened.categories().collect();
        assert_eq!(cats, ["ops"]);
    }

    #[test]
    fn delete_unknown_id_is_a_noop() {
        let dir = tempdir().unwrap();
        let mut store = SnippetStore::open(dir.path().join("db.json"));
        store.add(snippet("only", "ops")).unwrap();

        assert!(!store.delete(Uuid::new_v4()).unwrap());
        assert_eq!(store.len(), 1);
        assert_eq!(store.categories().count(), 1);
    }

    #[test]
    fn corrupted_database_starts_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.json");
        fs::write(&path, "{not json at all").unwrap();

        let store = SnippetStore::open(&path);
        assert!(store.is_empty());
        assert_eq!(store.categories().count(), 0);
    }

    #[test]
    fn update_refreshes_last_modified_and_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.json");
        let mut store = SnippetStore::open(&path);

        let s = snippet("editable", "ops");
        let id = s.id;
        let created = s.date_created;
        store.add(s).unwrap();

        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(store
            .update(id, |s| s.commands.push("echo more".to_string()))
            .unwrap());

        let snippet = store.get(id).unwrap();
        assert!(snippet.last_modified > created);
        assert_eq!(snippet.commands.len(), 2);

        let reopened = SnippetStore::open(&path);
        assert_eq!(reopened.get(id).unwrap().commands.len(), 2);
    }

    #[test]
    fn each_mutation_notifies_exactly_once() {
        let dir = tempdir().unwrap();
        let mut store = SnippetStore::open(dir.path().join("db.json"));
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        store.subscribe(move |event| sink.borrow_mut().push(event));

        let s = snippet("watched", "ops");
        let id = s.id;
        store.add(s).unwrap();
        store.update(id, |s| s.description = "edited".to_string()).unwrap();
        store.delete(id).unwrap();
        store.delete(id).unwrap(); // no-op, no event

        assert_eq!(
            *events.borrow(),
            vec![
                StoreEvent::Added(id),
                StoreEvent::Updated(id),
                StoreEvent::Deleted(id),
            ]
        );
    }

    #[test]
    fn filter_scans_all_fields() {
        let dir = tempdir().unwrap();
        let mut store = SnippetStore::open(dir.path().join("db.json"));
        store.add(snippet("alpha", "ops")).unwrap();
        store.add(snippet("beta", "build")).unwrap();

        assert_eq!(store.filter("alpha").len(), 1);
        assert_eq!(store.filter("echo").len(), 2);
        assert_eq!(store.filter("").len(), 2);
        assert!(store.filter("missing").is_empty());
    }
}
