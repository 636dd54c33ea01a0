use std::path::PathBuf;

use anyhow::Context;
use calltree_core::config::{Backend, MaxDepthCeiling, WalkConfig};
use calltree_core::{cscope, global, TagDatabase, Walker};
use clap::Parser;

/// Print the reverse call tree for one or more root symbols.
///
/// This binary is intentionally thin: it loads a tag database, runs the
/// walker, and writes the resulting tree as JSON to stdout. Argument
/// parsing, output rendering, and pretty-printing beyond `serde_json`'s
/// own formatting are someone else's job.
#[derive(Parser, Debug)]
#[command(name = "calltree", version, about)]
struct Cli {
    /// Which tag database to load.
    #[arg(long, value_enum)]
    backend: CliBackend,

    /// For `--backend cscope`, the path to `cscope.out`.
    /// For `--backend global`, the directory containing `GTAGS`/`GRTAGS`/`GPATH`.
    #[arg(long)]
    path: PathBuf,

    /// Root symbols to walk.
    #[arg(required = true)]
    roots: Vec<String>,

    /// Maximum recursion depth; -1 disables the bound.
    #[arg(long, default_value_t = -1)]
    max_depth: i64,

    /// Which historical depth ceiling to clamp `--max-depth` into.
    #[arg(long, value_enum, default_value = "legacy999")]
    depth_ceiling: CliDepthCeiling,

    /// Blacklist pattern (anchored at the start of the decoded symbol
    /// name); may be given multiple times.
    #[arg(long = "blacklist")]
    blacklist: Vec<String>,

    /// Decorate each edge with the reference site that justified it.
    #[arg(long)]
    show_position: bool,

    /// Increase verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Copy, Clone, Debug, clap::ValueEnum)]
enum CliBackend {
    Cscope,
    Global,
}

#[derive(Copy, Clone, Debug, clap::ValueEnum)]
enum CliDepthCeiling {
    Legacy900,
    Legacy999,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    let config = WalkConfig {
        backend: match cli.backend {
            CliBackend::Cscope => Backend::Cscope,
            CliBackend::Global => Backend::Global,
        },
        roots: cli.roots,
        max_depth: cli.max_depth,
        depth_ceiling: match cli.depth_ceiling {
            CliDepthCeiling::Legacy900 => MaxDepthCeiling::Legacy900,
            CliDepthCeiling::Legacy999 => MaxDepthCeiling::Legacy999,
        },
        blacklist: cli.blacklist,
        show_position: cli.show_position,
    };

    let forest = match cli.backend {
        CliBackend::Cscope => {
            let db = cscope::CscopeDatabase::load(&cli.path).context("loading cscope.out")?;
            let db: &dyn TagDatabase = &db;
            Walker::run(db, &config)?
        }
        CliBackend::Global => {
            let db = global::GlobalDatabase::load(&cli.path).context("loading GTAGS/GRTAGS/GPATH")?;
            let db: &dyn TagDatabase = &db;
            Walker::run(db, &config)?
        }
    };

    println!("{}", serde_json::to_string(&forest)?);
    Ok(())
}
