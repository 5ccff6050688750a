use crate::archive::fetch_block;
use crate::config::CorpusConfig;
use crate::page::select_document;
use crate::record::ParsedRecord;
use crate::store::IndexStore;
use crate::wikitext::parse_record;
use anyhow::Result;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::fmt;

lazy_static! {
    static ref REDIRECT_TARGET: Regex = Regex::new(r"(?i)#redirect\s*\[\[(.*?)\]\]").expect("valid regex");
}

/// Why a label could not be resolved to page markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    NotIndexed,
    RetrievalFailed,
    BrokenRedirect,
    RedirectLoopExceeded,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FailureReason::NotIndexed => "label not indexed",
            FailureReason::RetrievalFailed => "page not found at indexed offset",
            FailureReason::BrokenRedirect => "redirect target not indexed",
            FailureReason::RedirectLoopExceeded => "redirect depth exceeded",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Non-redirect markup and the label it was found under.
    Resolved { markup: String, label: String },
    Unavailable { requested: String, last_tried: String, reason: FailureReason },
}

impl Resolution {
    pub fn markup(&self) -> Option<&str> {
        match self {
            Resolution::Resolved { markup, .. } => Some(markup),
            Resolution::Unavailable { .. } => None,
        }
    }
}

/// True when the page is only a pointer to another label.
pub fn is_redirect(markup: &str) -> bool {
    markup.trim_start().get(..9).is_some_and(|head| head.eq_ignore_ascii_case("#redirect"))
}

/// Target label of a redirect page, without any `#section` suffix.
pub fn redirect_target(markup: &str) -> Option<String> {
    let caps = REDIRECT_TARGET.captures(markup)?;
    let target = caps[1].split('#').next().unwrap_or("").trim();
    (!target.is_empty()).then(|| target.to_string())
}

/// One dump plus its index store. Cheap to clone and safe to share across
/// threads; each retrieval opens its own archive handle.
#[derive(Clone)]
pub struct Corpus {
    config: CorpusConfig,
    store: IndexStore,
}

impl Corpus {
    pub fn open(config: CorpusConfig) -> Result<Self> {
        let store = IndexStore::open(&config.store_path)?;
        tracing::info!(
            store = %store.root().display(),
            archive = %config.archive_path.display(),
            labels = store.len(),
            "corpus opened"
        );
        Ok(Self { config, store })
    }

    pub fn config(&self) -> &CorpusConfig { &self.config }

    pub fn store(&self) -> &IndexStore { &self.store }

    /// Up to `search_limit` labels matching `query`.
    pub fn search(&self, query: &str) -> Result<Vec<String>> {
        self.store.search_labels(query, self.config.search_limit)
    }

    pub fn offset(&self, label: &str) -> Result<Option<u64>> {
        self.store.lookup_offset(label)
    }

    /// Markup stored under exactly `label`, redirects not followed. Lookup
    /// and decompression errors are logged and read as "not found".
    pub fn fetch_markup(&self, label: &str) -> Option<String> {
        let offset = match self.store.lookup_offset(label) {
            Ok(Some(offset)) => offset,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(label, error = %e, "index lookup failed");
                return None;
            }
        };
        let block = match fetch_block(&self.config.archive_path, offset, &self.config.retrieval) {
            Ok(block) => block,
            Err(e) => {
                tracing::warn!(label, offset, error = %e, "block retrieval failed");
                return None;
            }
        };
        let markup = select_document(&block.bytes, label);
        if markup.is_none() {
            tracing::debug!(label, offset, complete = block.complete, "page not in block");
        }
        markup
    }

    fn is_indexed(&self, label: &str) -> bool {
        matches!(self.store.lookup_offset(label), Ok(Some(_)))
    }

    /// Follow redirects from `label` for at most `max_redirect_depth` fetches.
    pub fn resolve(&self, label: &str) -> Resolution {
        let unavailable = |last: &str, reason| Resolution::Unavailable {
            requested: label.to_string(),
            last_tried: last.to_string(),
            reason,
        };

        let mut current = label.to_string();
        for _ in 0..self.config.max_redirect_depth {
            if !self.is_indexed(&current) {
                return unavailable(&current, FailureReason::NotIndexed);
            }
            let Some(markup) = self.fetch_markup(&current) else {
                return unavailable(&current, FailureReason::RetrievalFailed);
            };
            if !is_redirect(&markup) {
                return Resolution::Resolved { markup, label: current };
            }
            match redirect_target(&markup) {
                Some(target) if self.is_indexed(&target) => {
                    tracing::debug!(from = %current, to = %target, "following redirect");
                    current = target;
                }
                _ => return unavailable(&current, FailureReason::BrokenRedirect),
            }
        }
        tracing::warn!(requested = label, last = %current, depth = self.config.max_redirect_depth, "max redirect depth reached");
        unavailable(&current, FailureReason::RedirectLoopExceeded)
    }

    /// Resolve and parse. An unavailable page yields a record with every
    /// optional field absent.
    pub fn extract(&self, label: &str) -> ParsedRecord {
        match self.resolve(label) {
            Resolution::Resolved { markup, label: resolved } => parse_record(&markup, &resolved),
            Resolution::Unavailable { requested, last_tried, reason } => {
                tracing::info!(%requested, %last_tried, %reason, "page unavailable");
                ParsedRecord::empty(&requested)
            }
        }
    }
}
