mod common;

use bzip2::write::BzEncoder;
use bzip2::Compression;
use common::write_index;
use marquee_core::{BuildConfig, BuildOutcome, IndexStore};
use std::io::Write;
use tempfile::tempdir;

const LINES: &[&str] = &[
    "600:12:Star Wars",
    "600:13:Star Trek: The Motion Picture",
    "1500:40:Starship Troopers",
    "1500:41:Alien",
    "2400:77:Category:1979 films",
];

#[test]
fn build_is_skip_if_exists() {
    let dir = tempdir().unwrap();
    let source = write_index(&dir, LINES);
    let store = dir.path().join("store");

    let first = IndexStore::build(&source, &store, &BuildConfig::default()).unwrap();
    assert_eq!(first, BuildOutcome::Built { entries: 5 });
    let rows_after_first = IndexStore::open(&store).unwrap().len();

    let second = IndexStore::build(&source, &store, &BuildConfig::default()).unwrap();
    assert_eq!(second, BuildOutcome::Existing);
    assert_eq!(IndexStore::open(&store).unwrap().len(), rows_after_first);
}

#[test]
fn lookup_returns_recorded_offsets() {
    let dir = tempdir().unwrap();
    let source = write_index(&dir, &["10:1:A", "10:2:B", "999:3:C"]);
    let store = dir.path().join("store");
    // A tiny batch size forces several commit points.
    IndexStore::build(&source, &store, &BuildConfig { batch_size: 2 }).unwrap();

    let s = IndexStore::open(&store).unwrap();
    assert_eq!(s.lookup_offset("A").unwrap(), Some(10));
    assert_eq!(s.lookup_offset("B").unwrap(), Some(10));
    assert_eq!(s.lookup_offset("C").unwrap(), Some(999));
    assert_eq!(s.lookup_offset("c").unwrap(), None);
    assert_eq!(s.entry("C").unwrap().unwrap().doc_id, 3);
}

#[test]
fn labels_may_contain_colons() {
    let dir = tempdir().unwrap();
    let source = write_index(&dir, LINES);
    let store = dir.path().join("store");
    IndexStore::build(&source, &store, &BuildConfig::default()).unwrap();

    let s = IndexStore::open(&store).unwrap();
    assert_eq!(s.lookup_offset("Star Trek: The Motion Picture").unwrap(), Some(600));
    assert_eq!(s.lookup_offset("Category:1979 films").unwrap(), Some(2400));
}

#[test]
fn malformed_lines_skipped_and_first_duplicate_wins() {
    let dir = tempdir().unwrap();
    let source = write_index(&dir, &["5:1:Alpha", "not a line", "x:2:Beta", "", "9:3:Alpha", "7:4:Gamma"]);
    let store = dir.path().join("store");

    let outcome = IndexStore::build(&source, &store, &BuildConfig::default()).unwrap();
    assert_eq!(outcome, BuildOutcome::Built { entries: 2 });
    let s = IndexStore::open(&store).unwrap();
    assert_eq!(s.lookup_offset("Alpha").unwrap(), Some(5));
    assert_eq!(s.lookup_offset("Beta").unwrap(), None);
}

#[test]
fn search_is_exact_or_prefix_phrase() {
    let dir = tempdir().unwrap();
    let source = write_index(&dir, LINES);
    let store = dir.path().join("store");
    IndexStore::build(&source, &store, &BuildConfig::default()).unwrap();
    let s = IndexStore::open(&store).unwrap();

    assert_eq!(
        s.search_labels("star", 10).unwrap(),
        vec!["Star Wars", "Star Trek: The Motion Picture", "Starship Troopers"]
    );
    assert_eq!(s.search_labels("star", 2).unwrap(), vec!["Star Wars", "Star Trek: The Motion Picture"]);
    assert_eq!(s.search_labels("trek the mot", 5).unwrap(), vec!["Star Trek: The Motion Picture"]);
    assert_eq!(s.search_labels("ALIEN", 5).unwrap(), vec!["Alien"]);
    // Words must be adjacent and in order.
    assert!(s.search_labels("wars star", 5).unwrap().is_empty());
}

#[test]
fn search_text_is_never_interpreted() {
    let dir = tempdir().unwrap();
    let source = write_index(&dir, LINES);
    let store = dir.path().join("store");
    IndexStore::build(&source, &store, &BuildConfig::default()).unwrap();
    let s = IndexStore::open(&store).unwrap();

    assert!(s.search_labels(r#"" OR alien OR ""#, 5).unwrap().is_empty());
    assert_eq!(s.search_labels(r#"star" wars"#, 5).unwrap(), vec!["Star Wars"]);
    assert!(s.search_labels("", 5).unwrap().is_empty());
}

#[test]
fn builds_from_bzip2_index_source() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("index.txt.bz2");
    let mut enc = BzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(LINES.join("\n").as_bytes()).unwrap();
    std::fs::write(&source, enc.finish().unwrap()).unwrap();
    let store = dir.path().join("store");

    IndexStore::build(&source, &store, &BuildConfig::default()).unwrap();
    let s = IndexStore::open(&store).unwrap();
    assert_eq!(s.len(), 5);
    assert_eq!(s.lookup_offset("Alien").unwrap(), Some(1500));
}

#[test]
fn opening_a_missing_store_fails() {
    let dir = tempdir().unwrap();
    assert!(IndexStore::open(dir.path().join("nope")).is_err());
}

#[test]
fn reopens_right_after_build() {
    let dir = tempdir().unwrap();
    let source = write_index(&dir, LINES);
    for i in 0..25 {
        let store = dir.path().join(format!("store-{i}"));
        IndexStore::build(&source, &store, &BuildConfig::default()).unwrap();
        let s = IndexStore::open(&store).unwrap();
        assert_eq!(s.lookup_offset("Alien").unwrap(), Some(1500));
    }
}

#[test]
fn independent_readers_share_a_store() {
    let dir = tempdir().unwrap();
    let source = write_index(&dir, LINES);
    let store = dir.path().join("store");
    IndexStore::build(&source, &store, &BuildConfig::default()).unwrap();

    let a = IndexStore::open(&store).unwrap();
    let b = IndexStore::open(&store).unwrap();
    assert_eq!(a.lookup_offset("Star Wars").unwrap(), Some(600));
    assert_eq!(b.lookup_offset("Starship Troopers").unwrap(), Some(1500));
    assert_eq!(a.search_labels("star", 10).unwrap(), b.search_labels("star", 10).unwrap());

    let reader = std::thread::spawn({
        let store = store.clone();
        move || IndexStore::open(&store).unwrap().lookup_offset("Alien").unwrap()
    });
    assert_eq!(reader.join().unwrap(), Some(1500));

    drop(a);
    drop(b);
    assert_eq!(IndexStore::open(&store).unwrap().len(), 5);
}
