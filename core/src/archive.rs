use crate::config::RetrievalConfig;
use anyhow::{Context, Result};
use bzip2::{Decompress, Status};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// Raw terminator of one page record in the decompressed stream.
pub const PAGE_END: &[u8] = b"</page>";

const OUTPUT_STEP: usize = 256 * 1024;

/// Decompressed bytes starting at an archive offset. One block usually holds
/// several pages, so many labels share the same offset.
#[derive(Debug, Clone)]
pub struct Block {
    pub bytes: Vec<u8>,
    /// False when decompression stopped (read cap, end of file, end of
    /// stream) before any page terminator was seen; treat as possibly truncated.
    pub complete: bool,
    pub reads: usize,
}

/// Seek to `offset` and decompress fixed-size reads until the output holds a
/// page terminator, the compressed stream ends, or `max_reads` is exhausted.
/// Hitting the cap is not an error; whatever was decompressed is returned.
pub fn fetch_block<P: AsRef<Path>>(archive: P, offset: u64, config: &RetrievalConfig) -> Result<Block> {
    let archive = archive.as_ref();
    let mut file = File::open(archive).with_context(|| format!("opening archive {}", archive.display()))?;
    file.seek(SeekFrom::Start(offset))?;

    let mut decoder = Decompress::new(false);
    let mut chunk = vec![0u8; config.chunk_size.max(1)];
    let mut out: Vec<u8> = Vec::new();
    let mut reads = 0;
    let mut complete = false;
    let mut stream_done = false;

    while reads < config.max_reads && !stream_done {
        let n = file.read(&mut chunk)?;
        if n == 0 { break; }
        reads += 1;

        let scan_from = out.len().saturating_sub(PAGE_END.len() - 1);
        let mut consumed = 0usize;
        while consumed < n {
            out.reserve(OUTPUT_STEP);
            let before = decoder.total_in();
            let status = decoder
                .decompress_vec(&chunk[consumed..n], &mut out)
                .with_context(|| format!("corrupt bzip2 data at offset {offset}"))?;
            consumed += (decoder.total_in() - before) as usize;
            if status == Status::StreamEnd {
                stream_done = true;
                break;
            }
        }
        // Flush output the decoder is still holding for consumed input.
        while !stream_done {
            out.reserve(OUTPUT_STEP);
            let before = decoder.total_out();
            if decoder.decompress_vec(&[], &mut out)? == Status::StreamEnd {
                stream_done = true;
            }
            if decoder.total_out() == before { break; }
        }

        if contains(&out[scan_from..], PAGE_END) {
            complete = true;
            break;
        }
    }

    if !complete {
        complete = contains(&out, PAGE_END);
    }
    if !complete {
        tracing::debug!(offset, reads, bytes = out.len(), "block ended without a page terminator");
    }
    Ok(Block { bytes: out, complete, reads })
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bzip2::write::BzEncoder;
    use bzip2::Compression;
    use std::io::Write;

    fn compress(data: &[u8]) -> Vec<u8> {
        let mut enc = BzEncoder::new(Vec::new(), Compression::best());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    #[test]
    fn reads_only_the_stream_at_offset() {
        let first = compress(b"<page><title>A</title></page>");
        let second = compress(b"<page><title>B</title></page>");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dump.xml.bz2");
        let mut all = first.clone();
        all.extend_from_slice(&second);
        std::fs::write(&path, &all).unwrap();

        let block = fetch_block(&path, first.len() as u64, &RetrievalConfig::default()).unwrap();
        assert!(block.complete);
        assert_eq!(block.bytes, b"<page><title>B</title></page>");
    }

    #[test]
    fn read_cap_returns_partial_output() {
        let body: String = (0..20_000).map(|i| format!("line {i}\n")).collect();
        let data = compress(body.as_bytes());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dump.xml.bz2");
        std::fs::write(&path, &data).unwrap();

        let cfg = RetrievalConfig { chunk_size: 16, max_reads: 2 };
        let block = fetch_block(&path, 0, &cfg).unwrap();
        assert!(!block.complete);
        assert_eq!(block.reads, 2);
        assert!(block.bytes.len() < body.len());
    }

    #[test]
    fn missing_archive_is_an_error() {
        assert!(fetch_block("/nonexistent/dump.bz2", 0, &RetrievalConfig::default()).is_err());
    }
}
