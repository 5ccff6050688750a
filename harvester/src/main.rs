mod classify;
mod scores;
mod worklist;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use classify::{Classifier, ClassifierConfig};
use marquee_core::wikitext::{lead_paragraph, needs_remote_score, parse_record};
use marquee_core::{Category, Classification, Corpus, CorpusConfig, ParsedRecord, Resolution};
use scores::{ScoreLookup, ScoreLookupConfig};
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use time::format_description::well_known::Rfc3339;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "marquee-harvester")]
#[command(about = "Build a film worklist from the dump and harvest records to JSONL")]
struct Cli {
    /// Multistream .xml.bz2 dump
    #[arg(long, global = true, default_value = "./data/enwiki-pages-articles-multistream.xml.bz2")]
    archive: PathBuf,
    /// Title store built by marquee-indexer
    #[arg(long, global = true, default_value = "./data/store")]
    store: PathBuf,
    /// Redirect hops followed before a title is reported unavailable
    #[arg(long, global = true, default_value_t = marquee_core::config::DEFAULT_MAX_REDIRECT_DEPTH)]
    max_depth: usize,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect film titles from the yearly "List of American films" pages
    Worklist {
        #[arg(long, default_value = "./data/movie_list.txt")]
        output: PathBuf,
        #[arg(long, default_value_t = 1900)]
        from_year: i32,
        #[arg(long, default_value_t = 2024)]
        to_year: i32,
    },
    /// Extract one JSON record per worklist title
    Extract {
        /// Titles, one per line
        #[arg(long, default_value = "./data/movie_list.txt")]
        titles: PathBuf,
        #[arg(long, default_value = "./data/movies.jsonl")]
        output: PathBuf,
        /// Titles processed at once; output keeps worklist order
        #[arg(long, default_value_t = 4)]
        concurrency: usize,
        /// Skip the language-model classification
        #[arg(long, default_value_t = false)]
        no_classify: bool,
        #[arg(long, default_value = classify::DEFAULT_ENDPOINT)]
        ollama_url: String,
        #[arg(long, default_value = classify::DEFAULT_MODEL)]
        model: String,
        /// Query Wikidata for scores the page only references
        #[arg(long, default_value_t = false)]
        remote_scores: bool,
        /// Request timeout seconds
        #[arg(long, default_value_t = 60)]
        timeout_secs: u64,
        #[arg(long, default_value = scores::DEFAULT_USER_AGENT)]
        user_agent: String,
    },
}

#[derive(Serialize)]
struct MovieRow {
    #[serde(flatten)]
    record: ParsedRecord,
    classification: Option<Category>,
    extracted_at: String,
}

struct Services {
    corpus: Corpus,
    classifier: Option<Classifier>,
    scores: Option<ScoreLookup>,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    let config = CorpusConfig::new(cli.archive, cli.store).with_max_redirect_depth(cli.max_depth);

    match cli.command {
        Commands::Worklist { output, from_year, to_year } => {
            let corpus = Corpus::open(config)?;
            tokio::task::spawn_blocking(move || build_worklist(&corpus, &output, from_year, to_year)).await?
        }
        Commands::Extract {
            titles,
            output,
            concurrency,
            no_classify,
            ollama_url,
            model,
            remote_scores,
            timeout_secs,
            user_agent,
        } => {
            let timeout = Duration::from_secs(timeout_secs);
            let classifier = if no_classify {
                None
            } else {
                Some(Classifier::new(ClassifierConfig { endpoint: ollama_url, model, timeout, ..ClassifierConfig::default() })?)
            };
            let scores = if remote_scores {
                Some(ScoreLookup::new(ScoreLookupConfig { user_agent, timeout, ..ScoreLookupConfig::default() })?)
            } else {
                None
            };
            let services = Arc::new(Services { corpus: Corpus::open(config)?, classifier, scores });
            harvest(services, &titles, &output, concurrency).await
        }
    }
}

fn create_parent(path: &std::path::Path) {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).ok();
    }
}

fn build_worklist(corpus: &Corpus, output: &std::path::Path, from_year: i32, to_year: i32) -> Result<()> {
    if from_year > to_year {
        bail!("--from-year {from_year} is after --to-year {to_year}");
    }
    create_parent(output);
    let mut out = BufWriter::new(File::create(output).with_context(|| format!("creating {}", output.display()))?);
    let mut seen = HashSet::new();
    let mut written = 0usize;

    for page in worklist::year_pages(from_year, to_year) {
        let Some(markup) = corpus.resolve(&page).markup().map(str::to_string) else {
            tracing::warn!(%page, "list page unavailable");
            continue;
        };
        let titles = worklist::titles_from_list_page(&markup);
        tracing::info!(%page, titles = titles.len(), "read list page");
        for title in titles {
            if seen.insert(title.clone()) {
                writeln!(out, "{title}")?;
                written += 1;
            }
        }
    }
    out.flush()?;
    tracing::info!(written, output = %output.display(), "worklist written");
    Ok(())
}

fn read_titles(path: &std::path::Path) -> Result<Vec<String>> {
    let file = File::open(path).with_context(|| format!("opening worklist {}", path.display()))?;
    let mut titles = Vec::new();
    for line in BufReader::new(file).lines() {
        let t = line?.trim().to_string();
        if t.is_empty() || t.starts_with('#') { continue; }
        titles.push(t);
    }
    Ok(titles)
}

async fn harvest(services: Arc<Services>, titles: &std::path::Path, output: &std::path::Path, concurrency: usize) -> Result<()> {
    let mut pending: VecDeque<String> = read_titles(titles)?.into();
    if pending.is_empty() { bail!("no titles in {}", titles.display()); }
    tracing::info!(titles = pending.len(), concurrency, output = %output.display(), "harvesting");

    create_parent(output);
    let mut out = BufWriter::new(File::create(output).with_context(|| format!("creating {}", output.display()))?);
    let mut inflight: VecDeque<(String, tokio::task::JoinHandle<Result<MovieRow>>)> = VecDeque::new();
    let mut emitted = 0usize;
    let mut failed = 0usize;

    loop {
        while inflight.len() < concurrency.max(1) {
            let Some(title) = pending.pop_front() else { break };
            let svc = services.clone();
            let t = title.clone();
            inflight.push_back((title, tokio::spawn(async move { harvest_one(&svc, &t).await })));
        }
        // Await the oldest job so rows come out in worklist order.
        let Some((title, handle)) = inflight.pop_front() else { break };
        match handle.await {
            Ok(Ok(row)) => {
                serde_json::to_writer(&mut out, &row)?;
                out.write_all(b"\n")?;
                emitted += 1;
                if emitted % 100 == 0 {
                    out.flush()?;
                    tracing::info!(emitted, remaining = pending.len() + inflight.len(), "progress");
                }
            }
            Ok(Err(e)) => {
                failed += 1;
                tracing::warn!(%title, error = %e, "harvest failed");
            }
            Err(e) => {
                failed += 1;
                tracing::warn!(%title, error = %e, "harvest task panicked");
            }
        }
    }
    out.flush()?;
    tracing::info!(emitted, failed, "done");
    Ok(())
}

async fn harvest_one(services: &Arc<Services>, title: &str) -> Result<MovieRow> {
    let svc = services.clone();
    let label = title.to_string();
    let (mut record, lead, remote) = tokio::task::spawn_blocking(move || match svc.corpus.resolve(&label) {
        Resolution::Resolved { markup, label } => {
            let record = parse_record(&markup, &label);
            (record, Some(lead_paragraph(&markup)), needs_remote_score(&markup))
        }
        Resolution::Unavailable { requested, last_tried, reason } => {
            tracing::info!(%requested, %last_tried, %reason, "page unavailable");
            (ParsedRecord::empty(&requested), None, false)
        }
    })
    .await?;

    if remote {
        if let Some(lookup) = &services.scores {
            if let Some(score) = lookup.rotten_tomatoes(&record.resolved_label).await {
                record.rotten_tomatoes = Some(score);
            }
        }
    }

    let mut classification = None;
    if let (Some(classifier), Some(prose)) = (&services.classifier, lead.filter(|p| !p.is_empty())) {
        match classifier.classify(&prose).await {
            Ok(Classification::Category(c)) => classification = Some(c),
            Ok(Classification::Unrecognized(token)) => {
                tracing::warn!(title, %token, "classifier answer not a category digit");
            }
            Err(e) => tracing::warn!(title, error = %e, "classifier unavailable"),
        }
    }

    let extracted_at = time::OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default();
    Ok(MovieRow { record, classification, extracted_at })
}
