//! The capability set the tree walker needs from a loaded tag database.
//!
//! Keeping this trait tiny is what lets the walker stay backend-agnostic:
//! it never sees SQLite rows or cscope prefix bytes, only symbols and
//! sites. See `spec.md` §9: "Two backends, one interface."

use crate::model::Site;

/// A loaded, indexed tag database ready to answer caller-resolution
/// queries. Implemented by [`crate::cscope::CscopeDatabase`] and
/// [`crate::global::GlobalDatabase`].
pub trait TagDatabase {
    /// All recorded reference sites for `symbol`, in the database's own
    /// insertion/result order. Duplicates (a symbol referenced twice on
    /// one line) are preserved. `symbol` is in the database's internal key
    /// space — see [`TagDatabase::encode`].
    fn references(&self, symbol: &str) -> Vec<Site>;

    /// The function/macro symbols whose extent lexically contains `site`.
    /// Empty when no enclosing definition could be identified.
    fn resolve_caller(&self, site: &Site) -> Vec<String>;

    /// Map a symbol from the database's internal key space to its display
    /// form. Identity for backends that store symbols uncompressed.
    fn decode(&self, symbol: &str) -> String {
        symbol.to_string()
    }

    /// Map a user-supplied root symbol name into the database's internal
    /// key space, so it can be looked up the same way reference-derived
    /// symbols are. Identity for backends that store symbols uncompressed.
    fn encode(&self, symbol: &str) -> String {
        symbol.to_string()
    }
}
