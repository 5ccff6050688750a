use serde::{Deserialize, Serialize};

/// Insertion-ordered row number shared by the label table and the search postings.
pub type RowId = u64;

/// One line of the dump index: where a page's compressed block starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub label: String,
    pub offset: u64,
    pub doc_id: u64,
}

impl IndexEntry {
    /// Parse `offset:docId:label`. The label may itself contain colons.
    pub fn parse_line(line: &str) -> Option<Self> {
        let mut parts = line.trim().splitn(3, ':');
        let offset = parts.next()?.trim().parse().ok()?;
        let doc_id = parts.next()?.trim().parse().ok()?;
        let label = parts.next()?;
        if label.is_empty() { return None; }
        Some(Self { label: label.to_string(), offset, doc_id })
    }
}

/// Value stored under a label key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StoredEntry {
    pub offset: u64,
    pub doc_id: u64,
    pub row: RowId,
}

/// A token occurrence in one label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct Posting {
    pub row: RowId,
    pub position: u32,
}

pub(crate) const POSTING_WIDTH: usize = 12;

impl Posting {
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.row.to_be_bytes());
        buf.extend_from_slice(&self.position.to_be_bytes());
    }

    pub fn decode_all(bytes: &[u8]) -> impl Iterator<Item = Posting> + '_ {
        bytes.chunks_exact(POSTING_WIDTH).map(|c| {
            let mut row = [0u8; 8];
            let mut pos = [0u8; 4];
            row.copy_from_slice(&c[..8]);
            pos.copy_from_slice(&c[8..]);
            Posting { row: u64::from_be_bytes(row), position: u32::from_be_bytes(pos) }
        })
    }
}
