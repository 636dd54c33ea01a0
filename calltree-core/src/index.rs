//! Index Builder: turns per-symbol definition/extent lists into per-file,
//! line-sorted indexes the resolvers can query in `O(log n)`.

use std::collections::BTreeMap;
use std::collections::HashMap;

use crate::model::{Extent, Line};

/// Per-file index of definition extents, keyed by end line.
///
/// Built once from a flat list of extents (all of the same
/// [`crate::model::ExtentKind`]) and treated as read-only afterward.
#[derive(Debug, Default)]
pub struct ExtentIndex {
    by_file: HashMap<String, BTreeMap<Line, Vec<(Line, String)>>>,
}

impl ExtentIndex {
    /// Build an index over `extents`, grouping by file and then by end
    /// line. The value at each end line is `(start_line, symbol)` so the
    /// resolver can recover the full extent and check containment.
    pub fn build<'a>(extents: impl IntoIterator<Item = &'a Extent>) -> Self {
        let mut by_file: HashMap<String, BTreeMap<Line, Vec<(Line, String)>>> = HashMap::new();
        for extent in extents {
            by_file
                .entry(extent.file.clone())
                .or_default()
                .entry(extent.end_line)
                .or_default()
                .push((extent.start_line, extent.symbol.clone()));
        }
        Self { by_file }
    }

    /// Symbols whose extent covers `line` in `file`.
    ///
    /// Finds the smallest end line `>= line` (the Rust standard library's
    /// `BTreeMap::range` is the idiomatic equivalent of the historical
    /// "`GREATER_OR_EQUAL`-mode binary search" described for this lookup:
    /// both return the first qualifying key in `O(log n)`, but neither
    /// needs reimplementing by hand), then keeps only the entries whose
    /// start line also covers `line`.
    pub fn resolve(&self, file: &str, line: Line) -> Vec<&str> {
        let Some(ends) = self.by_file.get(file) else {
            return Vec::new();
        };
        let Some((_, entries)) = ends.range(line..).next() else {
            return Vec::new();
        };
        entries
            .iter()
            .filter(|(start, _)| *start <= line)
            .map(|(_, symbol)| symbol.as_str())
            .collect()
    }
}

/// Group `(line, symbol)` pairs into a per-line multimap, sorted by line.
///
/// Used by the Global backend to build its definition tables directly from
/// decoded `GTAGS` rows.
pub fn group_by_line(pairs: impl IntoIterator<Item = (Line, String)>) -> BTreeMap<Line, Vec<String>> {
    let mut map: BTreeMap<Line, Vec<String>> = BTreeMap::new();
    for (line, symbol) in pairs {
        map.entry(line).or_default().push(symbol);
    }
    map
}

/// Greatest key `<= line` in a per-file line multimap, as built by
/// [`group_by_line`]. Returns `None` when every key is greater than
/// `line` — the corrected behavior from `spec.md` §4.2.1 (the original
/// tool's binary search saturated at index 0 on a miss and silently
/// treated that as a hit).
pub fn nearest_at_or_before(map: &BTreeMap<Line, Vec<String>>, line: Line) -> Option<(Line, &[String])> {
    map.range(..=line).next_back().map(|(&l, syms)| (l, syms.as_slice()))
}
