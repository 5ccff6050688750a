#![allow(dead_code)]

use bzip2::write::BzEncoder;
use bzip2::Compression;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tempfile::{tempdir, TempDir};

pub struct Fixture {
    pub dir: TempDir,
    pub archive: PathBuf,
    pub index: PathBuf,
    pub store: PathBuf,
    /// Archive offset of each block, in the order given.
    pub offsets: Vec<u64>,
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

pub fn page_xml(title: &str, text: &str) -> String {
    format!(
        "  <page>\n    <title>{}</title>\n    <ns>0</ns>\n    <revision>\n      <text xml:space=\"preserve\">{}</text>\n    </revision>\n  </page>\n",
        escape(title),
        escape(text)
    )
}

fn compress(data: &[u8]) -> Vec<u8> {
    let mut enc = BzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
}

/// One independently compressed stream per block, concatenated.
pub fn write_archive(path: &std::path::Path, blocks: &[&[(&str, &str)]]) -> Vec<u64> {
    let mut out = Vec::new();
    let mut offsets = Vec::new();
    for block in blocks {
        offsets.push(out.len() as u64);
        let xml: String = block.iter().map(|(t, m)| page_xml(t, m)).collect();
        out.extend(compress(xml.as_bytes()));
    }
    fs::write(path, out).unwrap();
    offsets
}

/// Archive plus an `offset:id:title` index source covering every page.
pub fn fixture(blocks: &[&[(&str, &str)]]) -> Fixture {
    let dir = tempdir().unwrap();
    let archive = dir.path().join("pages-articles-multistream.xml.bz2");
    let index = dir.path().join("index.txt");
    let offsets = write_archive(&archive, blocks);

    let mut lines = String::new();
    let mut id = 1;
    for (block, offset) in blocks.iter().zip(&offsets) {
        for (title, _) in block.iter() {
            lines.push_str(&format!("{offset}:{id}:{title}\n"));
            id += 1;
        }
    }
    fs::write(&index, lines).unwrap();

    let store = dir.path().join("store");
    Fixture { dir, archive, index, store, offsets }
}

pub fn write_index(dir: &TempDir, lines: &[&str]) -> PathBuf {
    let path = dir.path().join("index.txt");
    fs::write(&path, lines.join("\n")).unwrap();
    path
}
