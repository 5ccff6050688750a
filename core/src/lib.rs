//! Title index, compressed page retrieval and infobox extraction over a
//! multistream wiki dump.
//!
//! The read path runs label -> [`IndexStore`] offset -> [`archive::fetch_block`]
//! -> [`page::select_document`] -> [`Corpus::resolve`] (redirects) ->
//! [`wikitext::parse_record`].

pub mod archive;
pub mod classify;
pub mod config;
pub mod corpus;
pub mod index;
pub mod page;
pub mod persist;
pub mod record;
pub mod store;
pub mod tokenizer;
pub mod wikitext;

pub use classify::{Category, Classification};
pub use config::{BuildConfig, CorpusConfig, RetrievalConfig};
pub use corpus::{Corpus, FailureReason, Resolution};
pub use index::{IndexEntry, RowId};
pub use record::ParsedRecord;
pub use store::{BuildOutcome, IndexStore};
