//! Global DB Loader: reads the SQLite-backed `GTAGS`/`GRTAGS`/`GPATH`
//! tables produced by the GNU Global family of tools.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use rusqlite::Connection;
use tracing::{debug, warn};

use crate::backend::TagDatabase;
use crate::error::{CallTreeError, Result};
use crate::index::{group_by_line, nearest_at_or_before};
use crate::model::{Line, Site};

static MACRO_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#\s*@d\s+@n").expect("static pattern is valid"));

/// Decode a delta-compressed line-number list: `n1,n2-k,n3,…`.
///
/// A bare token `n` adds `n` to the running line number. A token `n-k` adds
/// `n`, then emits `k` further consecutive lines one apart. Per the
/// documented law, `"5,3-2,4"` decodes to `[5, 8, 9, 10, 14]`.
pub fn decode_line_deltas(raw: &str) -> Vec<Line> {
    let mut out = Vec::new();
    let mut last: Line = 0;
    for token in raw.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        if let Some((n, k)) = token.split_once('-') {
            let Ok(n) = n.parse::<Line>() else { continue };
            let Ok(k) = k.parse::<Line>() else { continue };
            last += n;
            out.push(last);
            for _ in 0..k {
                last += 1;
                out.push(last);
            }
        } else if let Ok(n) = token.parse::<Line>() {
            last += n;
            out.push(last);
        }
    }
    out
}

fn open_db(dir: &Path, filename: &'static str) -> Result<Connection> {
    let path = dir.join(filename);
    if !path.exists() {
        return Err(CallTreeError::GlobalFileNotFound(filename, dir.to_path_buf()));
    }
    Connection::open(&path).map_err(CallTreeError::from)
}

/// Raw rows read out of the three Global tables, before indexing.
#[derive(Debug, Default)]
struct GlobalData {
    /// `symbol -> [(file_symbol, line)]`, all definitions.
    all_defs: HashMap<String, Vec<(String, Line)>>,
    /// `symbol -> [(file_symbol, line)]`, non-macro definitions only.
    function_defs: HashMap<String, Vec<(String, Line)>>,
    /// `(file_symbol, line) -> is this a macro definition`.
    macro_at: std::collections::HashSet<(String, Line)>,
    /// `symbol -> [(file_symbol, line)]`, references (post delta-decode).
    references: HashMap<String, Vec<(String, Line)>>,
    /// `file_symbol -> filesystem path`.
    paths: HashMap<String, PathBuf>,
}

fn load_gtags(conn: &Connection, data: &mut GlobalData) -> Result<()> {
    // The real `db` table's value columns carry no stable names; index
    // positionally, as the original does (`symbol.info.split(' ')`).
    let mut stmt = conn.prepare("SELECT * FROM db")?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let key: String = row.get(0)?;
        let file_symbol: String = row.get(1)?;
        let info: String = row.get(2)?;
        // Only the first two fields are delimiters for fixed metadata;
        // the third field is the definition line, the fourth is the rest
        // of the line verbatim, carrying the internal whitespace the
        // macro regex matches against.
        let fields: Vec<&str> = info.splitn(4, ' ').collect();
        let Some(line_field) = fields.get(2) else { continue };
        let Ok(line) = line_field.parse::<Line>() else { continue };
        let is_macro = fields.get(3).is_some_and(|source_line| MACRO_LINE.is_match(source_line));

        data.all_defs.entry(key.clone()).or_default().push((file_symbol.clone(), line));
        if is_macro {
            data.macro_at.insert((file_symbol.clone(), line));
        } else {
            data.function_defs.entry(key).or_default().push((file_symbol, line));
        }
    }
    Ok(())
}

fn load_grtags(conn: &Connection, data: &mut GlobalData) -> Result<()> {
    let mut stmt = conn.prepare("SELECT * FROM db")?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let key: String = row.get(0)?;
        let file_symbol: String = row.get(1)?;
        let info: String = row.get(2)?;
        let Some(delta_field) = info.split_whitespace().nth(2) else { continue };
        for line in decode_line_deltas(delta_field) {
            data.references.entry(key.clone()).or_default().push((file_symbol.clone(), line));
        }
    }
    Ok(())
}

fn load_gpath(conn: &Connection, data: &mut GlobalData) -> Result<()> {
    let mut stmt = conn.prepare("SELECT * FROM db")?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let key: String = row.get(0)?;
        let path: String = row.get(1)?;
        if data.paths.insert(key.clone(), PathBuf::from(path)).is_some() {
            warn!(file_symbol = %key, "duplicate GPATH key, overwriting");
        }
    }
    Ok(())
}

/// A loaded and indexed GNU Global tag database.
#[derive(Debug)]
pub struct GlobalDatabase {
    references: HashMap<String, Vec<(String, Line)>>,
    all_defs_by_file: HashMap<String, BTreeMap<Line, Vec<String>>>,
    function_defs_by_file: HashMap<String, BTreeMap<Line, Vec<String>>>,
    macro_at: std::collections::HashSet<(String, Line)>,
    paths: HashMap<String, PathBuf>,
}

impl GlobalDatabase {
    /// Load `GTAGS`, `GRTAGS` and `GPATH` from `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        let gtags = open_db(dir, "GTAGS")?;
        let grtags = open_db(dir, "GRTAGS")?;
        let gpath = open_db(dir, "GPATH")?;

        let mut data = GlobalData::default();
        load_gtags(&gtags, &mut data)?;
        load_grtags(&grtags, &mut data)?;
        load_gpath(&gpath, &mut data)?;
        debug!(
            symbols = data.all_defs.len(),
            references = data.references.len(),
            files = data.paths.len(),
            "loaded global tag database"
        );

        Ok(Self::from_data(data))
    }

    fn from_data(data: GlobalData) -> Self {
        let all_defs_by_file = by_file_index(&data.all_defs);
        let function_defs_by_file = by_file_index(&data.function_defs);
        Self {
            references: data.references,
            all_defs_by_file,
            function_defs_by_file,
            macro_at: data.macro_at,
            paths: data.paths,
        }
    }

    /// Does `file_symbol`'s source, read forward from `start_line`, stay in
    /// an unbroken backslash-continuation run through `line`?
    ///
    /// Fails closed (returns `false`) on a missing file, an I/O error, or
    /// non-UTF-8 content — the contract is "cannot verify", not "assume
    /// yes".
    fn in_macro_continuation(&self, file_symbol: &str, start_line: Line, line: Line) -> bool {
        if start_line >= line {
            return start_line == line;
        }
        let Some(path) = self.paths.get(file_symbol) else {
            return false;
        };
        let Ok(content) = std::fs::read_to_string(path) else {
            warn!(path = %path.display(), "cannot open source file for macro continuation check");
            return false;
        };
        let mut cur = start_line;
        for text_line in content.lines().skip(start_line as usize - 1) {
            if cur >= line {
                return true;
            }
            if !text_line.trim_end_matches('\r').ends_with('\\') {
                return false;
            }
            cur += 1;
        }
        cur >= line
    }
}

fn by_file_index(defs: &HashMap<String, Vec<(String, Line)>>) -> HashMap<String, BTreeMap<Line, Vec<String>>> {
    let mut per_file: HashMap<String, Vec<(Line, String)>> = HashMap::new();
    for (symbol, occurrences) in defs {
        for (file_symbol, line) in occurrences {
            per_file.entry(file_symbol.clone()).or_default().push((*line, symbol.clone()));
        }
    }
    per_file.into_iter().map(|(file, pairs)| (file, group_by_line(pairs))).collect()
}

impl TagDatabase for GlobalDatabase {
    fn references(&self, symbol: &str) -> Vec<Site> {
        let Some(occurrences) = self.references.get(symbol) else {
            return Vec::new();
        };
        occurrences.iter().map(|(file, line)| Site::new(file.clone(), *line)).collect()
    }

    fn resolve_caller(&self, site: &Site) -> Vec<String> {
        let Some(all) = self.all_defs_by_file.get(&site.file) else {
            return Vec::new();
        };
        if let Some((def_line, symbols)) = nearest_at_or_before(all, site.line) {
            let macros: Vec<String> = symbols
                .iter()
                .filter(|symbol| self.macro_at.contains(&(site.file.clone(), def_line)))
                .filter(|_| self.in_macro_continuation(&site.file, def_line, site.line))
                .cloned()
                .collect();
            if !macros.is_empty() {
                return macros;
            }
        }

        let Some(functions) = self.function_defs_by_file.get(&site.file) else {
            return Vec::new();
        };
        nearest_at_or_before(functions, site.line).map(|(_, symbols)| symbols.to_vec()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_decoding_law() {
        assert_eq!(decode_line_deltas("5,3-2,4"), vec![5, 8, 9, 10, 14]);
    }

    #[test]
    fn delta_decoding_is_monotone() {
        let decoded = decode_line_deltas("1,2-3,10-0,1");
        assert!(decoded.windows(2).all(|w| w[0] < w[1]));
    }

    fn make_conn() -> Connection {
        Connection::open_in_memory().unwrap()
    }

    fn build_database() -> GlobalDatabase {
        let gtags = make_conn();
        gtags.execute("CREATE TABLE db (key TEXT, file_symbol TEXT, info TEXT)", []).unwrap();
        gtags.execute("INSERT INTO db VALUES ('main', '1', 'x y 10 void main ( ) {')", []).unwrap();
        gtags.execute("INSERT INTO db VALUES ('LOG', '1', 'x y 20 #  @d   @n')", []).unwrap();

        let grtags = make_conn();
        grtags.execute("CREATE TABLE db (key TEXT, file_symbol TEXT, info TEXT)", []).unwrap();
        grtags.execute("INSERT INTO db VALUES ('LOG', '1', '1 x 25')", []).unwrap();

        let gpath = make_conn();
        gpath.execute("CREATE TABLE db (key TEXT, path TEXT)", []).unwrap();

        let mut data = GlobalData::default();
        load_gtags(&gtags, &mut data).unwrap();
        load_grtags(&grtags, &mut data).unwrap();
        load_gpath(&gpath, &mut data).unwrap();
        GlobalDatabase::from_data(data)
    }

    #[test]
    fn classifies_macro_definitions_by_source_line_shape() {
        let db = build_database();
        assert!(db.macro_at.contains(&("1".to_string(), 20)));
        assert!(!db.macro_at.contains(&("1".to_string(), 10)));
    }

    #[test]
    fn caller_resolution_without_source_file_fails_closed_for_multiline_macro() {
        let db = build_database();
        let sites = db.references("LOG");
        assert_eq!(sites, vec![Site::new("1", 25)]);
        // No GPATH entry for file_symbol "1": the continuation check cannot
        // open the real source, so it fails closed even though def_line 20
        // is the nearest preceding definition.
        assert!(db.resolve_caller(&sites[0]).is_empty());
    }

    #[test]
    fn caller_resolution_verifies_macro_continuation_against_real_file() {
        let dir = tempfile::tempdir().unwrap();
        let src_path = dir.path().join("a.c");
        std::fs::write(&src_path, "line1\n#define LOG(x) \\\n  do { sink(x); } \\\n  while (0)\nline5\n").unwrap();

        let gtags = make_conn();
        gtags.execute("CREATE TABLE db (key TEXT, file_symbol TEXT, info TEXT)", []).unwrap();
        gtags.execute("INSERT INTO db VALUES ('LOG', '1', 'x y 2 #  @d   @n')", []).unwrap();

        let grtags = make_conn();
        grtags.execute("CREATE TABLE db (key TEXT, file_symbol TEXT, info TEXT)", []).unwrap();
        grtags.execute("INSERT INTO db VALUES ('LOG', '1', '1 x 4')", []).unwrap();

        let gpath = make_conn();
        gpath.execute("CREATE TABLE db (key TEXT, path TEXT)", []).unwrap();
        gpath
            .execute("INSERT INTO db VALUES ('1', ?1)", [src_path.to_str().unwrap()])
            .unwrap();

        let mut data = GlobalData::default();
        load_gtags(&gtags, &mut data).unwrap();
        load_grtags(&grtags, &mut data).unwrap();
        load_gpath(&gpath, &mut data).unwrap();
        let db = GlobalDatabase::from_data(data);

        let sites = db.references("LOG");
        assert_eq!(sites, vec![Site::new("1", 4)]);
        let callers = db.resolve_caller(&sites[0]);
        assert_eq!(callers, vec!["LOG".to_string()]);
    }
}
