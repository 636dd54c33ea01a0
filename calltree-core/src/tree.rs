//! The shape the tree walker produces: a nested map of callers terminated
//! by sentinel leaves, plus a forest of named roots.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// Why a branch of the walk stopped instead of expanding further.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentinel {
    /// `symbol` was already expanded earlier in this walk (cycle or
    /// diamond dependency).
    Traversed,
    /// `symbol` has no recorded reference sites.
    NoReference,
    /// `symbol`'s decoded name matched a blacklist pattern.
    Blacklisted,
    /// The walk reached its configured depth bound.
    ReachMaxDepth,
}

impl Sentinel {
    pub fn as_str(self) -> &'static str {
        match self {
            Sentinel::Traversed => "@Traversed",
            Sentinel::NoReference => "@NoReference",
            Sentinel::Blacklisted => "@Blacklisted",
            Sentinel::ReachMaxDepth => "@ReachMaxDepth",
        }
    }
}

impl Serialize for Sentinel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A node of the call tree: either a terminal sentinel, or a branch
/// mapping each caller name to its own subtree.
///
/// `Branch` keeps callers as an ordered `Vec` rather than a `HashMap` so
/// the deterministic ordering the walker establishes (sorted by decoded
/// name, see `spec.md` §5) survives to serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tree {
    Leaf(Sentinel),
    Branch(Vec<(String, Edge)>),
}

/// One child entry of a `Branch`: the caller's subtree, optionally
/// decorated with the reference site that justified the edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edge {
    Plain(Tree),
    Positioned { callee: String, caller: Tree },
}

impl Serialize for Tree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Tree::Leaf(sentinel) => sentinel.serialize(serializer),
            Tree::Branch(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (name, edge) in entries {
                    map.serialize_entry(name, edge)?;
                }
                map.end()
            }
        }
    }
}

impl Serialize for Edge {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Edge::Plain(tree) => tree.serialize(serializer),
            Edge::Positioned { callee, caller } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("callee", callee)?;
                map.serialize_entry("caller", caller)?;
                map.end()
            }
        }
    }
}

/// The top-level result of a walk over every configured root symbol:
/// `root name -> tree`, in the order the roots were configured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Forest(pub Vec<(String, Tree)>);

impl Serialize for Forest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (root, tree) in &self.0 {
            map.serialize_entry(root, tree)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_branch_preserving_insertion_order_not_alphabetical() {
        let tree = Tree::Branch(vec![
            ("zeta".to_string(), Edge::Plain(Tree::Leaf(Sentinel::NoReference))),
            ("alpha".to_string(), Edge::Plain(Tree::Leaf(Sentinel::Traversed))),
        ]);
        let json = serde_json::to_string(&tree).unwrap();
        assert_eq!(json, r#"{"zeta":"@NoReference","alpha":"@Traversed"}"#);
    }

    #[test]
    fn serializes_positioned_edge_with_callee_and_caller() {
        let edge = Edge::Positioned {
            callee: "a.c,12".to_string(),
            caller: Tree::Leaf(Sentinel::NoReference),
        };
        let json = serde_json::to_string(&edge).unwrap();
        assert_eq!(json, r#"{"callee":"a.c,12","caller":"@NoReference"}"#);
    }

    #[test]
    fn forest_serializes_roots_in_configured_order() {
        let forest = Forest(vec![
            ("b".to_string(), Tree::Leaf(Sentinel::NoReference)),
            ("a".to_string(), Tree::Leaf(Sentinel::Blacklisted)),
        ]);
        let json = serde_json::to_string(&forest).unwrap();
        assert_eq!(json, r#"{"b":"@NoReference","a":"@Blacklisted"}"#);
    }
}
