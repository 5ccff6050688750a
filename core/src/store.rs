//! Label -> (offset, docId) table plus a positional term index over labels.
//!
//! Three sled trees live under `<store>/db`:
//! - `labels`: label bytes -> bincode [`StoredEntry`]
//! - `rows`: big-endian row id -> label bytes (insertion order)
//! - `terms`: folded token -> concatenated 12-byte postings, ascending by row

use crate::config::BuildConfig;
use crate::index::{IndexEntry, Posting, RowId, StoredEntry};
use crate::persist::{load_meta, now_rfc3339, save_meta, MetaFile, StorePaths, STORE_VERSION};
use crate::tokenizer::tokenize;
use anyhow::{bail, Context, Result};
use bzip2::read::MultiBzDecoder;
use lazy_static::lazy_static;
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::time::Duration;

const LABELS: &str = "labels";
const ROWS: &str = "rows";
const TERMS: &str = "terms";

/// sled releases its file lock shortly after the last handle drops.
const LOCK_RETRIES: u32 = 40;
const LOCK_BACKOFF: Duration = Duration::from_millis(50);

lazy_static! {
    // One sled handle per database directory, shared by every reader in the process.
    static ref OPEN_DBS: Mutex<HashMap<PathBuf, Weak<sled::Db>>> = Mutex::new(HashMap::new());
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    Built { entries: u64 },
    /// A store already existed at the target; nothing was written.
    Existing,
}

#[derive(Clone)]
pub struct IndexStore {
    paths: StorePaths,
    _db: Arc<sled::Db>,
    labels: sled::Tree,
    rows: sled::Tree,
    terms: sled::Tree,
}

impl IndexStore {
    /// Build a store from an `offset:docId:label` index source. Plain text, or
    /// bzip2 (multistream) when the path ends in `.bz2`.
    ///
    /// Skip-if-exists: when `store` is already present this logs and returns
    /// [`BuildOutcome::Existing`]. Single writer; do not run while anything
    /// else has the same store open.
    pub fn build<S: AsRef<Path>, P: AsRef<Path>>(source: S, store: P, config: &BuildConfig) -> Result<BuildOutcome> {
        let source = source.as_ref();
        let paths = StorePaths::new(store);
        if paths.exists() {
            tracing::info!(store = %paths.root.display(), "found existing index store, skipping build");
            return Ok(BuildOutcome::Existing);
        }
        tracing::info!(store = %paths.root.display(), source = %source.display(), "building index store");

        let mut reader = open_source(source)?;
        let db = shared_db(&paths.db())?;
        let labels = db.open_tree(LABELS)?;
        let rows = db.open_tree(ROWS)?;
        let terms = db.open_tree(TERMS)?;

        let batch_size = config.batch_size.max(1);
        let mut next_row: RowId = 0;
        let mut seen_lines = 0u64;
        let mut skipped = 0u64;
        let mut pending_labels = sled::Batch::default();
        let mut pending_rows = sled::Batch::default();
        let mut pending: HashSet<String> = HashSet::new();

        let mut raw = Vec::new();
        loop {
            raw.clear();
            if reader.read_until(b'\n', &mut raw)? == 0 { break; }
            let line = String::from_utf8_lossy(&raw);
            let Some(entry) = IndexEntry::parse_line(&line) else {
                if !line.trim().is_empty() { skipped += 1; }
                continue;
            };
            seen_lines += 1;
            if pending.contains(&entry.label) || labels.contains_key(entry.label.as_bytes())? {
                continue;
            }
            let stored = StoredEntry { offset: entry.offset, doc_id: entry.doc_id, row: next_row };
            pending_labels.insert(entry.label.as_bytes().to_vec(), bincode::serialize(&stored)?);
            pending_rows.insert(next_row.to_be_bytes().to_vec(), entry.label.as_bytes().to_vec());
            pending.insert(entry.label);
            next_row += 1;

            if pending.len() >= batch_size {
                labels.apply_batch(std::mem::take(&mut pending_labels))?;
                rows.apply_batch(std::mem::take(&mut pending_rows))?;
                pending.clear();
                tracing::info!(inserted = next_row, read = seen_lines, "inserted labels");
            }
        }
        if !pending.is_empty() {
            labels.apply_batch(pending_labels)?;
            rows.apply_batch(pending_rows)?;
        }
        if skipped > 0 {
            tracing::warn!(skipped, "skipped malformed index lines");
        }

        tracing::info!(rows = next_row, "populating label search index");
        populate_terms(&rows, &terms, batch_size)?;
        db.flush()?;

        save_meta(&paths, &MetaFile { num_entries: next_row, created_at: now_rfc3339(), version: STORE_VERSION })?;
        tracing::info!(entries = next_row, "index store build complete");
        Ok(BuildOutcome::Built { entries: next_row })
    }

    pub fn open<P: AsRef<Path>>(store: P) -> Result<Self> {
        let paths = StorePaths::new(store);
        if !paths.db().exists() {
            bail!("no index store at {}", paths.root.display());
        }
        let db = shared_db(&paths.db())?;
        if load_meta(&paths).is_err() {
            tracing::warn!(store = %paths.root.display(), "store has no meta.json; a build may have been interrupted");
        }
        Ok(Self {
            labels: db.open_tree(LABELS)?,
            rows: db.open_tree(ROWS)?,
            terms: db.open_tree(TERMS)?,
            paths,
            _db: db,
        })
    }

    pub fn root(&self) -> &Path { &self.paths.root }

    /// Number of label rows.
    pub fn len(&self) -> usize { self.labels.len() }

    pub fn is_empty(&self) -> bool { self.labels.is_empty() }

    /// Exact, case-sensitive label match.
    pub fn entry(&self, label: &str) -> Result<Option<IndexEntry>> {
        let Some(bytes) = self.labels.get(label.as_bytes())? else { return Ok(None) };
        let stored: StoredEntry = bincode::deserialize(&bytes)?;
        Ok(Some(IndexEntry { label: label.to_string(), offset: stored.offset, doc_id: stored.doc_id }))
    }

    pub fn lookup_offset(&self, label: &str) -> Result<Option<u64>> {
        Ok(self.entry(label)?.map(|e| e.offset))
    }

    /// Labels matching `query` as an exact phrase or a prefix phrase, in
    /// insertion order, at most `limit`.
    pub fn search_labels(&self, query: &str, limit: usize) -> Result<Vec<String>> {
        let expr = MatchExpr::exact_or_prefix(query);
        tracing::debug!(%expr, limit, "searching labels");
        let mut rows = BTreeSet::new();
        for phrase in &expr.phrases {
            rows.extend(self.phrase_rows(phrase)?);
        }
        let mut out = Vec::with_capacity(limit.min(rows.len()));
        for row in rows.into_iter().take(limit) {
            if let Some(label) = self.rows.get(row.to_be_bytes())? {
                out.push(String::from_utf8_lossy(&label).into_owned());
            }
        }
        Ok(out)
    }

    fn phrase_rows(&self, phrase: &PhraseQuery) -> Result<BTreeSet<RowId>> {
        let n = phrase.terms.len();
        if n == 0 { return Ok(BTreeSet::new()); }

        let mut lists: Vec<(u32, Vec<Posting>)> = Vec::with_capacity(n);
        for (i, term) in phrase.terms.iter().enumerate() {
            let postings = if phrase.prefix && i == n - 1 {
                self.prefix_postings(term)?
            } else {
                self.exact_postings(term)?
            };
            if postings.is_empty() { return Ok(BTreeSet::new()); }
            lists.push((i as u32, postings));
        }
        // Intersect from the rarest term; a candidate is (row, phrase start).
        lists.sort_by_key(|(_, p)| p.len());
        let mut starts: Option<HashSet<(RowId, u32)>> = None;
        for (offset, postings) in lists {
            let these = postings
                .into_iter()
                .filter(|p| p.position >= offset)
                .map(|p| (p.row, p.position - offset));
            let next: HashSet<(RowId, u32)> = match &starts {
                None => these.collect(),
                Some(prev) => these.filter(|s| prev.contains(s)).collect(),
            };
            let done = next.is_empty();
            starts = Some(next);
            if done { break; }
        }
        Ok(starts.unwrap_or_default().into_iter().map(|(row, _)| row).collect())
    }

    fn exact_postings(&self, term: &str) -> Result<Vec<Posting>> {
        Ok(match self.terms.get(term.as_bytes())? {
            Some(bytes) => Posting::decode_all(&bytes).collect(),
            None => Vec::new(),
        })
    }

    fn prefix_postings(&self, prefix: &str) -> Result<Vec<Posting>> {
        let mut out = Vec::new();
        for item in self.terms.scan_prefix(prefix.as_bytes()) {
            let (_, bytes) = item?;
            out.extend(Posting::decode_all(&bytes));
        }
        Ok(out)
    }
}

/// One quoted phrase of a search expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhraseQuery {
    pub text: String,
    pub terms: Vec<String>,
    pub prefix: bool,
}

impl PhraseQuery {
    fn new(text: &str, prefix: bool) -> Self {
        let terms = tokenize(text).into_iter().map(|(t, _)| t).collect();
        Self { text: text.to_string(), terms, prefix }
    }
}

impl fmt::Display for PhraseQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", escape_phrase(&self.text))?;
        if self.prefix { f.write_str("*")?; }
        Ok(())
    }
}

/// Disjunction of phrases. Query text only ever becomes a quoted phrase, so
/// operators or quotes typed by the caller are never interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchExpr {
    pub phrases: Vec<PhraseQuery>,
}

impl MatchExpr {
    pub fn exact_or_prefix(text: &str) -> Self {
        Self { phrases: vec![PhraseQuery::new(text, false), PhraseQuery::new(text, true)] }
    }
}

impl fmt::Display for MatchExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, p) in self.phrases.iter().enumerate() {
            if i > 0 { f.write_str(" OR ")?; }
            write!(f, "{p}")?;
        }
        Ok(())
    }
}

/// Double embedded quotes so the text stays one phrase literal.
pub fn escape_phrase(text: &str) -> String {
    text.replace('"', "\"\"")
}

/// Open (or join) the sled database at `path`. Handles opened in this
/// process share one `Db`; a lock still held by a closing handle or another
/// process is retried for a bounded time.
fn shared_db(path: &Path) -> Result<Arc<sled::Db>> {
    let key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let mut dbs = OPEN_DBS.lock();
    if let Some(db) = dbs.get(&key).and_then(Weak::upgrade) {
        return Ok(db);
    }
    let db = Arc::new(open_with_retry(path)?);
    dbs.retain(|_, w| w.strong_count() > 0);
    let key = path.canonicalize().unwrap_or(key);
    dbs.insert(key, Arc::downgrade(&db));
    Ok(db)
}

fn open_with_retry(path: &Path) -> Result<sled::Db> {
    let mut attempt = 0;
    loop {
        match sled::open(path) {
            Ok(db) => return Ok(db),
            Err(e) if attempt < LOCK_RETRIES && is_lock_contention(&e) => {
                attempt += 1;
                tracing::debug!(store = %path.display(), attempt, "store locked, retrying");
                std::thread::sleep(LOCK_BACKOFF);
            }
            Err(e) => return Err(e).with_context(|| format!("opening store at {}", path.display())),
        }
    }
}

fn is_lock_contention(e: &sled::Error) -> bool {
    match e {
        sled::Error::Io(err) => {
            err.kind() == io::ErrorKind::WouldBlock || err.to_string().contains("could not acquire lock")
        }
        _ => false,
    }
}

fn open_source(path: &Path) -> Result<Box<dyn BufRead>> {
    let f = File::open(path).with_context(|| format!("opening index source {}", path.display()))?;
    if path.extension().and_then(|e| e.to_str()) == Some("bz2") {
        Ok(Box::new(BufReader::new(MultiBzDecoder::new(f))))
    } else {
        Ok(Box::new(BufReader::new(f)))
    }
}

fn populate_terms(rows: &sled::Tree, terms: &sled::Tree, batch_size: usize) -> Result<()> {
    terms.set_merge_operator(concat_merge);
    let mut window: HashMap<String, Vec<u8>> = HashMap::new();
    let mut in_window = 0usize;
    for item in rows.iter() {
        let (key, label) = item?;
        let row = RowId::from_be_bytes(<[u8; 8]>::try_from(&key[..])?);
        for (term, pos) in tokenize(&String::from_utf8_lossy(&label)) {
            Posting { row, position: pos as u32 }.encode_into(window.entry(term).or_default());
        }
        in_window += 1;
        if in_window >= batch_size {
            flush_postings(terms, &mut window)?;
            in_window = 0;
        }
    }
    flush_postings(terms, &mut window)
}

fn flush_postings(terms: &sled::Tree, window: &mut HashMap<String, Vec<u8>>) -> Result<()> {
    for (term, bytes) in window.drain() {
        terms.merge(term.as_bytes(), bytes)?;
    }
    Ok(())
}

fn concat_merge(_key: &[u8], old: Option<&[u8]>, merged: &[u8]) -> Option<Vec<u8>> {
    let mut out = old.map(<[u8]>::to_vec).unwrap_or_default();
    out.extend_from_slice(merged);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expression_doubles_quotes() {
        let expr = MatchExpr::exact_or_prefix(r#"say "hi" OR x"#);
        assert_eq!(expr.to_string(), r#""say ""hi"" OR x" OR "say ""hi"" OR x"*"#);
        assert_eq!(expr.phrases[0].terms, vec!["say", "hi", "or", "x"]);
    }

    #[test]
    fn merge_appends() {
        assert_eq!(concat_merge(b"k", Some(b"ab"), b"c"), Some(b"abc".to_vec()));
        assert_eq!(concat_merge(b"k", None, b"c"), Some(b"c".to_vec()));
    }
}
