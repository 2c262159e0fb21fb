//! Query registry: routes commits to the observers that depend on them.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Weak};

/// Unique identifier for a registered query.
pub type QueryId = u64;

struct Entry<O: ?Sized> {
    entity: String,
    observer: Weak<O>,
}

/// Tracks observers by the entity they read.
///
/// Only weak references are held, so the registry never keeps an observer
/// alive. Lookups return observers in registration order.
pub struct QueryRegistry<O: ?Sized> {
    queries: BTreeMap<QueryId, Entry<O>>,
    next_id: QueryId,
}

impl<O: ?Sized> Default for QueryRegistry<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: ?Sized> QueryRegistry<O> {
    pub fn new() -> Self {
        Self {
            queries: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Registers an observer of `entity` and returns its id.
    pub fn register(&mut self, entity: impl Into<String>, observer: &Arc<O>) -> QueryId {
        let id = self.next_id;
        self.next_id += 1;
        self.queries.insert(
            id,
            Entry {
                entity: entity.into(),
                observer: Arc::downgrade(observer),
            },
        );
        id
    }

    /// Returns true if the query was found and removed.
    pub fn unregister(&mut self, id: QueryId) -> bool {
        self.queries.remove(&id).is_some()
    }

    /// Live observers of any of the `changed` entities.
    pub fn observers_of(&self, changed: &BTreeSet<String>) -> Vec<(QueryId, Arc<O>)> {
        self.queries
            .iter()
            .filter(|(_, e)| changed.contains(&e.entity))
            .filter_map(|(id, e)| e.observer.upgrade().map(|o| (*id, o)))
            .collect()
    }

    /// Every live observer.
    pub fn observers(&self) -> Vec<(QueryId, Arc<O>)> {
        self.queries
            .iter()
            .filter_map(|(id, e)| e.observer.upgrade().map(|o| (*id, o)))
            .collect()
    }

    /// Number of registered queries, including ones whose observer is gone.
    pub fn query_count(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Number of live observers of `entity`.
    pub fn queries_for_entity(&self, entity: &str) -> usize {
        self.queries
            .values()
            .filter(|e| e.entity == entity && e.observer.strong_count() > 0)
            .count()
    }

    /// Drops entries whose observer is gone.
    pub fn cleanup(&mut self) {
        self.queries.retain(|_, e| e.observer.strong_count() > 0);
    }

    pub fn clear(&mut self) {
        self.queries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Named: Send + Sync {
        fn name(&self) -> &str;
    }

    struct Listener(&'static str);

    impl Named for Listener {
        fn name(&self) -> &str {
            self.0
        }
    }

    fn listener(name: &'static str) -> Arc<dyn Named> {
        Arc::new(Listener(name))
    }

    fn changed(entities: &[&str]) -> BTreeSet<String> {
        entities.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_register_and_route() {
        let mut registry: QueryRegistry<dyn Named> = QueryRegistry::new();
        let a = listener("a");
        let b = listener("b");
        let c = listener("c");
        registry.register("Person", &a);
        registry.register("Tag", &b);
        registry.register("Person", &c);

        let names: Vec<_> = registry
            .observers_of(&changed(&["Person"]))
            .iter()
            .map(|(_, o)| o.name().to_string())
            .collect();
        assert_eq!(names, vec!["a", "c"]);
        assert_eq!(registry.queries_for_entity("Tag"), 1);
        assert_eq!(registry.observers().len(), 3);
    }

    #[test]
    fn test_weak_entries_are_skipped() {
        let mut registry: QueryRegistry<dyn Named> = QueryRegistry::new();
        let a = listener("a");
        {
            let gone = listener("gone");
            registry.register("Person", &gone);
        }
        registry.register("Person", &a);

        assert_eq!(registry.query_count(), 2);
        assert_eq!(registry.observers_of(&changed(&["Person"])).len(), 1);
        registry.cleanup();
        assert_eq!(registry.query_count(), 1);
    }

    #[test]
    fn test_unregister() {
        let mut registry: QueryRegistry<dyn Named> = QueryRegistry::new();
        let a = listener("a");
        let id = registry.register("Person", &a);
        assert!(registry.unregister(id));
        assert!(!registry.unregister(id));
        assert!(registry.is_empty());
    }
}
