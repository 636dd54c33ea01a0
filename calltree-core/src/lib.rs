//! Reverse call-tree engine over cscope and GNU Global tag databases.
//!
//! Given one or more root symbols, this crate answers "who (transitively)
//! calls this?" by decoding a tag database, indexing definition extents,
//! and recursively resolving caller sites into a nested tree of sentinel
//! leaves and branch maps. It does not parse command lines, render HTML,
//! or pretty-print output — those are a caller's concern.

pub mod backend;
pub mod config;
pub mod cscope;
pub mod digram;
pub mod error;
pub mod global;
pub mod index;
pub mod latin1;
pub mod model;
pub mod tree;
pub mod walk;

pub use backend::TagDatabase;
pub use config::{Backend, BlacklistSet, MaxDepthCeiling, WalkConfig};
pub use error::{CallTreeError, Result};
pub use tree::{Edge, Forest, Sentinel, Tree};
pub use walk::Walker;
