//! Shared data model: reference sites and definition extents.
//!
//! Both backends (Cscope and Global) produce these same shapes; only how
//! they're populated differs.

use serde::{Deserialize, Serialize};

/// A 1-based source line number.
pub type Line = u32;

/// A `(file, line)` pair at which a symbol name appears in source.
///
/// `file` is opaque: the Cscope backend stores the filename as it appears
/// in `cscope.out`, the Global backend stores the numeric file symbol from
/// `GTAGS`/`GRTAGS` (resolved to a path only for the macro-continuation
/// check). Callers should not assume either shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Site {
    pub file: String,
    pub line: Line,
}

impl Site {
    pub fn new(file: impl Into<String>, line: Line) -> Self {
        Self { file: file.into(), line }
    }
}

/// What kind of source-level construct a definition extent covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExtentKind {
    Function,
    Macro,
    /// Type/class/struct/typedef/enum/mark definitions: single-line, never
    /// indexed for caller resolution (no "type end" marker exists), but
    /// still part of the data model per the definition of `Extent`.
    Type,
}

/// A definition occurrence: `(file, start_line, end_line, symbol, kind)`.
///
/// Invariant: `start_line <= end_line`. Within one file, extents of the
/// same kind do not overlap for distinct symbols beyond nesting introduced
/// by the source — the tag databases this crate reads never emit nested
/// function definitions for C.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extent {
    pub file: String,
    pub start_line: Line,
    pub end_line: Line,
    pub symbol: String,
    pub kind: ExtentKind,
}

impl Extent {
    pub fn contains(&self, line: Line) -> bool {
        self.start_line <= line && line <= self.end_line
    }
}
