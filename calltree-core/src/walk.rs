//! Tree Walker: the recursive core that turns "who calls X" queries into
//! a nested call tree under cycle detection, blacklisting, and depth
//! bounds. See `spec.md` §4.5.

use std::collections::HashMap;

use tracing::trace;

use crate::backend::TagDatabase;
use crate::config::{BlacklistSet, WalkConfig};
use crate::model::Site;
use crate::tree::{Edge, Forest, Sentinel, Tree};

/// Drives `expand` over one loaded database, holding the traversal cache
/// that makes cycle detection and memoized "already visited" sentinels
/// possible. A fresh `Walker` is needed per database instance; it is not
/// meant to outlive the walk it was built for.
pub struct Walker<'db> {
    db: &'db dyn TagDatabase,
    max_depth: i64,
    blacklist: BlacklistSet,
    show_position: bool,
    /// Symbols already expanded in this walk, in the database's internal
    /// key space. Presence alone drives cycle detection; the stored
    /// caller list exists for parity with the walker's own bookkeeping,
    /// not because later code reads it back.
    cache: HashMap<String, Vec<String>>,
}

impl<'db> Walker<'db> {
    pub fn new(db: &'db dyn TagDatabase, blacklist: BlacklistSet, max_depth: i64, show_position: bool) -> Self {
        Self { db, max_depth, blacklist, show_position, cache: HashMap::new() }
    }

    /// Walk every configured root and assemble the resulting forest.
    pub fn run(db: &'db dyn TagDatabase, config: &WalkConfig) -> crate::error::Result<Forest> {
        let blacklist = BlacklistSet::compile(&config.blacklist)?;
        let mut walker = Walker::new(db, blacklist, config.resolved_max_depth(), config.show_position);
        let trees = config
            .roots
            .iter()
            .map(|root| {
                let encoded = db.encode(root);
                let tree = walker.expand(&encoded, 0);
                (root.clone(), tree)
            })
            .collect();
        Ok(Forest(trees))
    }

    /// Recursively resolve the callers of `symbol` (in the database's
    /// internal key space) into a `Tree`.
    pub fn expand(&mut self, symbol: &str, depth: i64) -> Tree {
        if self.max_depth != -1 && depth >= self.max_depth {
            return Tree::Leaf(Sentinel::ReachMaxDepth);
        }

        let decoded_self = self.db.decode(symbol);
        if self.blacklist.matches(&decoded_self) {
            return Tree::Leaf(Sentinel::Blacklisted);
        }

        if self.cache.contains_key(symbol) {
            return Tree::Leaf(Sentinel::Traversed);
        }

        let sites = self.db.references(symbol);
        if sites.is_empty() {
            return Tree::Leaf(Sentinel::NoReference);
        }

        // Last-write-wins: later reference sites overwrite the
        // representative position recorded for a caller seen earlier.
        let mut callers: HashMap<String, Site> = HashMap::new();
        for site in &sites {
            for caller in self.db.resolve_caller(site) {
                callers.insert(caller, site.clone());
            }
        }

        if callers.is_empty() {
            return Tree::Leaf(Sentinel::NoReference);
        }

        trace!(symbol = %decoded_self, depth, callers = callers.len(), "expanding callers");

        self.cache.insert(symbol.to_string(), callers.keys().cloned().collect());

        let mut ordered: Vec<(String, Site)> = callers.into_iter().collect();
        ordered.sort_by(|(a, _), (b, _)| self.db.decode(a).cmp(&self.db.decode(b)));

        let entries = ordered
            .into_iter()
            .map(|(caller, site)| {
                let decoded_caller = self.db.decode(&caller);
                let subtree = self.expand(&caller, depth + 1);
                let edge = if self.show_position {
                    Edge::Positioned { callee: format!("{},{}", site.file, site.line), caller: subtree }
                } else {
                    Edge::Plain(subtree)
                };
                (decoded_caller, edge)
            })
            .collect();

        Tree::Branch(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap as Map;

    /// A tiny in-memory database for exercising the walker in isolation,
    /// independent of either backend's loading machinery.
    struct FakeDb {
        references: Map<String, Vec<Site>>,
        callers: Map<(String, u32), Vec<String>>,
        calls: RefCell<u32>,
    }

    impl TagDatabase for FakeDb {
        fn references(&self, symbol: &str) -> Vec<Site> {
            *self.calls.borrow_mut() += 1;
            self.references.get(symbol).cloned().unwrap_or_default()
        }

        fn resolve_caller(&self, site: &Site) -> Vec<String> {
            self.callers.get(&(site.file.clone(), site.line)).cloned().unwrap_or_default()
        }
    }

    fn scenario_b() -> FakeDb {
        // foo -> bar -> foo, a direct cycle.
        let mut references = Map::new();
        references.insert("bar".to_string(), vec![Site::new("a.c", 2)]);
        references.insert("foo".to_string(), vec![Site::new("a.c", 6)]);
        let mut callers = Map::new();
        callers.insert(("a.c".to_string(), 2), vec!["foo".to_string()]);
        callers.insert(("a.c".to_string(), 6), vec!["bar".to_string()]);
        FakeDb { references, callers, calls: RefCell::new(0) }
    }

    #[test]
    fn cycle_terminates_with_traversed_leaf() {
        let db = scenario_b();
        let mut walker = Walker::new(&db, BlacklistSet::default(), -1, false);
        let tree = walker.expand("foo", 0);
        let Tree::Branch(entries) = tree else { panic!("expected branch") };
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, "bar");
        let Edge::Plain(Tree::Branch(inner)) = &entries[0].1 else { panic!("expected nested branch") };
        assert_eq!(inner.len(), 1);
        assert_eq!(inner[0].0, "foo");
        assert!(matches!(inner[0].1, Edge::Plain(Tree::Leaf(Sentinel::Traversed))));
    }

    #[test]
    fn leaf_symbol_with_no_references_is_no_reference() {
        let db = FakeDb { references: Map::new(), callers: Map::new(), calls: RefCell::new(0) };
        let mut walker = Walker::new(&db, BlacklistSet::default(), -1, false);
        assert_eq!(walker.expand("orphan", 0), Tree::Leaf(Sentinel::NoReference));
    }

    #[test]
    fn blacklisted_symbol_never_expands_references() {
        let db = scenario_b();
        let blacklist = BlacklistSet::compile(&["foo".to_string()]).unwrap();
        let mut walker = Walker::new(&db, blacklist, -1, false);
        assert_eq!(walker.expand("foo", 0), Tree::Leaf(Sentinel::Blacklisted));
        assert_eq!(*db.calls.borrow(), 0);
    }

    #[test]
    fn depth_bound_cuts_off_before_resolving_references() {
        let db = scenario_b();
        let mut walker = Walker::new(&db, BlacklistSet::default(), 1, false);
        let tree = walker.expand("foo", 0);
        let Tree::Branch(entries) = tree else { panic!("expected branch") };
        assert!(matches!(entries[0].1, Edge::Plain(Tree::Leaf(Sentinel::ReachMaxDepth))));
    }

    #[test]
    fn show_position_decorates_each_edge_with_callee_site() {
        let db = scenario_b();
        let mut walker = Walker::new(&db, BlacklistSet::default(), 1, true);
        let tree = walker.expand("foo", 0);
        let Tree::Branch(entries) = tree else { panic!("expected branch") };
        let Edge::Positioned { callee, .. } = &entries[0].1 else { panic!("expected positioned edge") };
        assert_eq!(callee, "a.c,6");
    }
}
