use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use marquee_core::{BuildConfig, BuildOutcome, Corpus, CorpusConfig, IndexStore, Resolution};
use tracing_subscriber::{EnvFilter, fmt};

use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "marquee-indexer")]
#[command(about = "Build and query the title index of a multistream wiki dump", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the title store from a `offset:id:title` index file (plain or .bz2)
    Build {
        /// Multistream index file
        #[arg(long)]
        index_source: PathBuf,
        /// Output store directory; left untouched if it already exists
        #[arg(long)]
        store: PathBuf,
        /// Rows per committed batch
        #[arg(long, default_value_t = marquee_core::config::DEFAULT_BATCH_SIZE)]
        batch_size: usize,
    },
    /// Print the archive offset recorded for an exact title
    Lookup {
        #[arg(long)]
        store: PathBuf,
        label: String,
    },
    /// Titles matching a phrase or phrase prefix
    Search {
        #[arg(long)]
        store: PathBuf,
        query: String,
        #[arg(short, long, default_value_t = marquee_core::config::DEFAULT_SEARCH_LIMIT)]
        k: usize,
    },
    /// Resolve a title (following redirects) and print its parsed record as JSON
    Extract {
        #[arg(long)]
        archive: PathBuf,
        #[arg(long)]
        store: PathBuf,
        label: String,
        #[arg(long, default_value_t = marquee_core::config::DEFAULT_MAX_REDIRECT_DEPTH)]
        max_depth: usize,
        /// Print the raw markup instead of the parsed record
        #[arg(long, default_value_t = false)]
        raw: bool,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { index_source, store, batch_size } => build(index_source, store, batch_size),
        Commands::Lookup { store, label } => lookup(store, &label),
        Commands::Search { store, query, k } => search(store, &query, k),
        Commands::Extract { archive, store, label, max_depth, raw } => extract(archive, store, &label, max_depth, raw),
    }
}

fn build(index_source: PathBuf, store: PathBuf, batch_size: usize) -> Result<()> {
    if !index_source.is_file() {
        bail!("index source {} not found", index_source.display());
    }
    match IndexStore::build(&index_source, &store, &BuildConfig { batch_size })? {
        BuildOutcome::Built { entries } => println!("built {} with {entries} titles", store.display()),
        BuildOutcome::Existing => println!("{} already exists; remove it to rebuild", store.display()),
    }
    Ok(())
}

fn lookup(store: PathBuf, label: &str) -> Result<()> {
    let store = IndexStore::open(store)?;
    match store.entry(label)? {
        Some(entry) => println!("{}", serde_json::json!({ "label": entry.label, "offset": entry.offset, "doc_id": entry.doc_id })),
        None => {
            tracing::info!(label, "title not indexed");
            println!("null");
        }
    }
    Ok(())
}

fn search(store: PathBuf, query: &str, k: usize) -> Result<()> {
    let store = IndexStore::open(store)?;
    for label in store.search_labels(query, k)? {
        println!("{label}");
    }
    Ok(())
}

fn extract(archive: PathBuf, store: PathBuf, label: &str, max_depth: usize, raw: bool) -> Result<()> {
    let corpus = Corpus::open(CorpusConfig::new(archive, store).with_max_redirect_depth(max_depth))?;
    if raw {
        match corpus.resolve(label) {
            Resolution::Resolved { markup, label } => {
                tracing::info!(%label, bytes = markup.len(), "resolved");
                println!("{markup}");
            }
            Resolution::Unavailable { requested, last_tried, reason } => {
                bail!("{requested} unavailable ({reason}, last tried {last_tried})")
            }
        }
        return Ok(());
    }
    let record = corpus.extract(label);
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}
