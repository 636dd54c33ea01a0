//! Cscope DB Loader: decodes the classic `cscope.out` cross-reference
//! stream and answers caller-resolution queries over it.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, trace};

use crate::backend::TagDatabase;
use crate::digram;
use crate::error::{CallTreeError, Result};
use crate::index::ExtentIndex;
use crate::latin1;
use crate::model::{Extent, ExtentKind, Line, Site};

const DEFAULT_FILENAME: &str = "main.c";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Normal,
    Empty,
    Define,
}

/// One currently-open `$`/`#` extent, awaiting its matching `}`/`)`.
///
/// cscope never emits nested function definitions for C, so a single
/// pending slot per kind is enough — see `spec.md` §3.
struct Pending {
    file: String,
    start_line: Line,
    symbol: String,
}

/// Raw output of parsing a `cscope.out` stream, before indexing.
#[derive(Debug, Default)]
pub struct CscopeData {
    /// `symbol -> file -> ordered list of reference lines` (duplicates
    /// preserved).
    pub references: HashMap<String, HashMap<String, Vec<Line>>>,
    pub function_extents: Vec<Extent>,
    pub macro_extents: Vec<Extent>,
    /// Type/class/struct/typedef/enum/mark definitions. Never indexed for
    /// resolution (no "end" marker exists for these), kept for
    /// completeness of the data model.
    pub other_defs: Vec<Extent>,
}

fn add_ref(refs: &mut HashMap<String, HashMap<String, Vec<Line>>>, file: &str, line: Line, symbol: &str) {
    refs.entry(symbol.to_string())
        .or_default()
        .entry(file.to_string())
        .or_default()
        .push(line);
}

/// Identifier-start character class used for bare reference lines inside
/// macro bodies: `[\w\x80\xff]` in the original tool — a word character,
/// or literally the bytes `0x80`/`0xFF` (not a range; faithfully
/// reproduced here).
fn is_ident_start(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || matches!(c as u32, 0x80 | 0xFF)
}

/// Parse a `cscope.out` stream (already ISO-8859-1 decoded, see
/// [`crate::latin1`]) into its raw definitions and references.
///
/// Malformed or truncated lines never abort the parse; unrecognized prefix
/// bytes are silently ignored for forward compatibility with format
/// extensions, per `spec.md` §4.1.3.
pub fn parse(content: &str) -> CscopeData {
    let mut data = CscopeData::default();
    let mut state = State::Normal;
    let mut cur_file = DEFAULT_FILENAME.to_string();
    let mut cur_line: Line = 0;
    let mut cur_function: Option<Pending> = None;
    let mut cur_macro: Option<Pending> = None;

    for line in content.split('\n') {
        if state != State::Define && line.is_empty() {
            state = State::Empty;
            continue;
        }
        if line.is_empty() || line.starts_with(' ') {
            continue;
        }

        if state == State::Empty {
            let mut chars = line.chars();
            if chars.next().is_some_and(|c| c.is_ascii_digit()) {
                if let Some(n) = line.split(' ').next().and_then(|tok| tok.parse::<Line>().ok()) {
                    cur_line = n;
                }
                state = State::Normal;
                continue;
            }
        }

        if let Some(rest) = line.strip_prefix('\t') {
            let mut chars = rest.chars();
            let Some(head) = chars.next() else { continue };
            let tail: String = chars.collect();

            match head {
                '`' => {
                    add_ref(&mut data.references, &cur_file, cur_line, &tail);
                }
                '#' if state != State::Define => {
                    state = State::Define;
                    cur_macro = Some(Pending { file: cur_file.clone(), start_line: cur_line, symbol: tail });
                }
                ')' if state == State::Define => {
                    state = State::Normal;
                    if let Some(p) = cur_macro.take() {
                        data.macro_extents.push(Extent {
                            file: p.file,
                            start_line: p.start_line,
                            end_line: cur_line,
                            symbol: p.symbol,
                            kind: ExtentKind::Macro,
                        });
                    }
                }
                '$' => {
                    cur_function = Some(Pending { file: cur_file.clone(), start_line: cur_line, symbol: tail });
                }
                '}' => {
                    if let Some(p) = cur_function.take() {
                        data.function_extents.push(Extent {
                            file: p.file,
                            start_line: p.start_line,
                            end_line: cur_line,
                            symbol: p.symbol,
                            kind: ExtentKind::Function,
                        });
                    }
                }
                'c' | 's' | 't' | 'e' | 'm' => {
                    data.other_defs.push(Extent {
                        file: cur_file.clone(),
                        start_line: cur_line,
                        end_line: cur_line,
                        symbol: tail,
                        kind: ExtentKind::Type,
                    });
                }
                '@' => {
                    cur_file = tail;
                    cur_line = 1;
                }
                other => {
                    trace!(prefix = %other, "ignoring unrecognized cscope prefix byte");
                }
            }
            continue;
        }

        // Bare identifier line: a reference that appears without a tab
        // prefix, typically an identifier used inside a macro body.
        if line.chars().next().is_some_and(is_ident_start) {
            add_ref(&mut data.references, &cur_file, cur_line, line);
        }
    }

    data
}

/// A loaded and indexed Cscope tag database.
#[derive(Debug)]
pub struct CscopeDatabase {
    references: HashMap<String, HashMap<String, Vec<Line>>>,
    macro_index: ExtentIndex,
    function_index: ExtentIndex,
}

impl CscopeDatabase {
    /// Load and index `cscope.out` at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CallTreeError::CscopeNotFound(path.to_path_buf()));
        }
        let bytes = std::fs::read(path).map_err(|source| CallTreeError::Io { path: path.to_path_buf(), source })?;
        let content = latin1::decode(&bytes);
        debug!(bytes = bytes.len(), "decoded cscope.out as ISO-8859-1");
        Ok(Self::from_data(parse(&content)))
    }

    /// Build a database directly from already-parsed data (used by tests
    /// and by [`CscopeDatabase::load`]).
    pub fn from_data(data: CscopeData) -> Self {
        Self {
            references: data.references,
            macro_index: ExtentIndex::build(&data.macro_extents),
            function_index: ExtentIndex::build(&data.function_extents),
        }
    }
}

impl TagDatabase for CscopeDatabase {
    fn references(&self, symbol: &str) -> Vec<Site> {
        let Some(by_file) = self.references.get(symbol) else {
            return Vec::new();
        };
        by_file
            .iter()
            .flat_map(|(file, lines)| lines.iter().map(move |&line| Site::new(file.clone(), line)))
            .collect()
    }

    fn resolve_caller(&self, site: &Site) -> Vec<String> {
        let macro_hit = self.macro_index.resolve(&site.file, site.line);
        if !macro_hit.is_empty() {
            return macro_hit.into_iter().map(str::to_owned).collect();
        }
        self.function_index.resolve(&site.file, site.line).into_iter().map(str::to_owned).collect()
    }

    fn decode(&self, symbol: &str) -> String {
        digram::decode(symbol)
    }

    fn encode(&self, symbol: &str) -> String {
        digram::encode(symbol)
    }
}
