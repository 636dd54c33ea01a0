//! Error types for the call-tree engine.
//!
//! Per the resolution-engine's error taxonomy: only the two database loaders
//! (and, transitively, the blacklist regex compiler) can fail. Everything
//! downstream — index building, caller resolution, the tree walk — is total
//! and degrades to a sentinel `Tree` leaf rather than propagating an error.

/// Errors that can occur while loading a tag database or compiling a walk
/// configuration. The walker itself never returns this type.
#[derive(thiserror::Error, Debug)]
pub enum CallTreeError {
    /// `cscope.out` does not exist at the configured path.
    #[error("cannot find cscope.out at {0}")]
    CscopeNotFound(std::path::PathBuf),

    /// One or more of `GTAGS`, `GRTAGS`, `GPATH` is missing from the
    /// configured directory.
    #[error("cannot find {0} under {1}")]
    GlobalFileNotFound(&'static str, std::path::PathBuf),

    /// Underlying SQLite error while reading a Global tag database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// I/O error reading `cscope.out` or a Global tag database file.
    #[error("io error reading {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A blacklist pattern failed to compile as a regular expression.
    #[error("invalid blacklist pattern {pattern:?}: {source}")]
    Blacklist {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Convenience alias for `Result<T, CallTreeError>`.
pub type Result<T> = std::result::Result<T, CallTreeError>;
