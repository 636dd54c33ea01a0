//! Walk configuration: which backend and roots to use, the depth bound,
//! and the compiled blacklist.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{CallTreeError, Result};

/// Which tag database backend to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Cscope,
    Global,
}

/// Historical depth-bound ceilings carried over from two generations of
/// the original tool; callers pick one when a raw configured depth needs
/// clamping. See `spec.md` §4.5 and §REDESIGN FLAGS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaxDepthCeiling {
    /// The original cscope-era ceiling.
    Legacy900,
    /// The later Global-era ceiling.
    Legacy999,
}

impl MaxDepthCeiling {
    fn ceiling(self) -> i64 {
        match self {
            MaxDepthCeiling::Legacy900 => 900,
            MaxDepthCeiling::Legacy999 => 999,
        }
    }
}

/// Clamp a user-configured `max_depth` into `[1, ceiling]`. `-1` disables
/// the bound entirely and is passed through unchanged.
pub fn clamp_max_depth(max_depth: i64, ceiling: MaxDepthCeiling) -> i64 {
    if max_depth == -1 {
        return -1;
    }
    max_depth.clamp(1, ceiling.ceiling())
}

/// A compiled, start-anchored blacklist: a symbol's decoded name is
/// blacklisted when any pattern matches at position 0 (mirrors `re.match`
/// semantics rather than `re.search`).
#[derive(Debug, Default)]
pub struct BlacklistSet {
    patterns: Vec<Regex>,
}

impl BlacklistSet {
    /// Compile each raw pattern, anchoring it to the start of the string.
    pub fn compile(patterns: &[String]) -> Result<Self> {
        let compiled = patterns
            .iter()
            .map(|pattern| {
                Regex::new(&format!("^(?:{pattern})")).map_err(|source| CallTreeError::Blacklist {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<Regex>>>()?;
        Ok(Self { patterns: compiled })
    }

    pub fn matches(&self, name: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(name))
    }
}

/// Full configuration for one invocation of the walker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkConfig {
    pub backend: Backend,
    pub roots: Vec<String>,
    pub max_depth: i64,
    pub depth_ceiling: MaxDepthCeiling,
    pub blacklist: Vec<String>,
    pub show_position: bool,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Cscope,
            roots: Vec::new(),
            max_depth: -1,
            depth_ceiling: MaxDepthCeiling::Legacy999,
            blacklist: Vec::new(),
            show_position: false,
        }
    }
}

impl WalkConfig {
    pub fn resolved_max_depth(&self) -> i64 {
        clamp_max_depth(self.max_depth, self.depth_ceiling)
    }
}
