use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;
pub const DEFAULT_MAX_READS: usize = 40;
pub const DEFAULT_MAX_REDIRECT_DEPTH: usize = 3;
pub const DEFAULT_SEARCH_LIMIT: usize = 5;
pub const DEFAULT_BATCH_SIZE: usize = 10_000;

/// Bounds for decompressing one archive block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Compressed bytes read per iteration.
    pub chunk_size: usize,
    /// Read iterations before giving up on finding a page terminator.
    pub max_reads: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { chunk_size: DEFAULT_CHUNK_SIZE, max_reads: DEFAULT_MAX_READS }
    }
}

/// Everything a [`crate::Corpus`] needs to answer label requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusConfig {
    pub archive_path: PathBuf,
    pub store_path: PathBuf,
    #[serde(default = "default_max_redirect_depth")]
    pub max_redirect_depth: usize,
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

fn default_max_redirect_depth() -> usize { DEFAULT_MAX_REDIRECT_DEPTH }
fn default_search_limit() -> usize { DEFAULT_SEARCH_LIMIT }

impl CorpusConfig {
    pub fn new<A: Into<PathBuf>, S: Into<PathBuf>>(archive_path: A, store_path: S) -> Self {
        Self {
            archive_path: archive_path.into(),
            store_path: store_path.into(),
            max_redirect_depth: DEFAULT_MAX_REDIRECT_DEPTH,
            search_limit: DEFAULT_SEARCH_LIMIT,
            retrieval: RetrievalConfig::default(),
        }
    }

    pub fn with_max_redirect_depth(mut self, depth: usize) -> Self {
        self.max_redirect_depth = depth;
        self
    }
}

/// Tunables for the one-shot index build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Rows written per batch, also the flush window for search postings.
    pub batch_size: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self { batch_size: DEFAULT_BATCH_SIZE }
    }
}
