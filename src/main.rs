//! # Artefact catalog CLI (`artefacts`)
//!
//! The `artefacts` binary is the interface to the artefact catalog: it
//! creates the database, indexes the data store, and queries the result.
//!
//! ## Usage
//!
//! ```bash
//! artefacts --config ./config/artefacts.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `artefacts init` | Create the SQLite database and run schema migrations |
//! | `artefacts index` | Scan the data store and reconcile the catalog |
//! | `artefacts list` | List artefacts in catalog order |
//! | `artefacts search "<query>"` | Search names, descriptions and keywords |
//! | `artefacts get <id>` | Show one artefact |
//! | `artefacts count` | Count artefacts |
//! | `artefacts root` | Print the normalized data-store root |
//! | `artefacts export` | Dump the catalog as JSON |
//! | `artefacts stats` | Catalog summary |

use artefact_index::models::{ArtefactFilter, Language};
use artefact_index::query_cmd::ListOptions;
use artefact_index::{config, export, index_cmd, migrate, query_cmd, stats};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Geospatial artefact catalog.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/artefacts.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "artefacts",
    about = "Index and search geospatial artefacts in a file-system data store",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/artefacts.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Paging and output flags shared by `list` and `search`.
#[derive(Args)]
struct PageArgs {
    /// Maximum number of results (clamped to `search.max_limit`).
    #[arg(long)]
    limit: Option<i64>,

    /// Number of results to skip.
    #[arg(long, default_value_t = 0)]
    offset: i64,

    /// `all`, `only-base-maps` or `only-data`.
    #[arg(long, default_value = "all")]
    filter: ArtefactFilter,

    /// Print JSON instead of text.
    #[arg(long)]
    json: bool,
}

impl From<PageArgs> for ListOptions {
    fn from(args: PageArgs) -> Self {
        ListOptions {
            limit: args.limit,
            offset: args.offset,
            filter: args.filter,
            json: args.json,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Safe to run repeatedly.
    Init,

    /// Scan the data store and bring the catalog in line with it.
    ///
    /// New and changed manifests are written, artefacts whose directory no
    /// longer holds a valid manifest are removed.
    Index {
        /// Keep running, re-indexing every `index.interval_secs` until Ctrl-C.
        #[arg(long)]
        watch: bool,
    },

    /// List artefacts ordered by display name.
    List {
        #[command(flatten)]
        page: PageArgs,
    },

    /// Search artefact names, descriptions and keywords.
    Search {
        /// Free-text query.
        query: String,

        /// Language to search in (`en` or `fr`).
        #[arg(long, default_value = "en")]
        lang: Language,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Show one artefact by id.
    Get {
        /// Artefact id (SHA-256 of its directory path).
        id: String,

        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Count artefacts.
    Count {
        /// `all`, `only-base-maps` or `only-data`.
        #[arg(long, default_value = "all")]
        filter: ArtefactFilter,
    },

    /// Print the normalized data-store root.
    Root,

    /// Export the catalog as JSON.
    Export {
        /// Output file. Prints to stdout when omitted.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Show catalog statistics.
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Index { watch } => {
            if watch {
                index_cmd::run_index_watch(&cfg).await?;
            } else {
                index_cmd::run_index(&cfg).await?;
            }
        }
        Commands::List { page } => {
            query_cmd::run_list(&cfg, page.into()).await?;
        }
        Commands::Search { query, lang, page } => {
            query_cmd::run_search(&cfg, &query, lang, page.into()).await?;
        }
        Commands::Get { id, json } => {
            query_cmd::run_get(&cfg, &id, json).await?;
        }
        Commands::Count { filter } => {
            query_cmd::run_count(&cfg, filter).await?;
        }
        Commands::Root => {
            query_cmd::run_root(&cfg)?;
        }
        Commands::Export { output } => {
            export::run_export(&cfg, output.as_deref()).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
    }

    Ok(())
}
