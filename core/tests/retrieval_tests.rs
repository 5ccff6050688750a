mod common;

use common::{fixture, Fixture};
use marquee_core::archive::fetch_block;
use marquee_core::page::select_document;
use marquee_core::{BuildConfig, Corpus, CorpusConfig, FailureReason, IndexStore, Resolution, RetrievalConfig};

const ALPHA: &str = "{{Infobox film\n| name = Alpha\n| director = [[Jane Roe]]\n| budget = $10 million\n| released = {{Film date|2015|6|12}}\n}}\n'''''Alpha''''' is a 2015 [[horror film]] directed by [[Jane Roe]].\n";

fn corpus(depth: usize) -> (Fixture, Corpus) {
    let fx = fixture(&[
        &[("Alpha", ALPHA), ("Alpha (film)", "#REDIRECT [[Alpha]]"), ("Beta", "'''Beta''' is a 1999 film.")],
        &[
            ("R1", "#REDIRECT [[R2]]"),
            ("R2", "#REDIRECT [[R3]]"),
            ("R3", "#REDIRECT [[R4]]"),
            ("R4", "#redirect [[Alpha#Plot]]"),
            ("Loop A", "#REDIRECT [[Loop B]]"),
            ("Loop B", "#REDIRECT [[Loop A]]"),
            ("Broken", "#REDIRECT [[Nowhere]]"),
        ],
    ]);
    IndexStore::build(&fx.index, &fx.store, &BuildConfig::default()).unwrap();
    let config = CorpusConfig::new(&fx.archive, &fx.store).with_max_redirect_depth(depth);
    let corpus = Corpus::open(config).unwrap();
    (fx, corpus)
}

#[test]
fn round_trip_offsets() {
    let (fx, c) = corpus(3);
    assert_eq!(c.offset("Alpha").unwrap(), Some(fx.offsets[0]));
    assert_eq!(c.offset("Beta").unwrap(), Some(fx.offsets[0]));
    assert_eq!(c.offset("R1").unwrap(), Some(fx.offsets[1]));
}

#[test]
fn block_holds_every_page_at_shared_offset() {
    let (fx, _c) = corpus(3);
    let block = fetch_block(&fx.archive, fx.offsets[0], &RetrievalConfig::default()).unwrap();
    assert!(block.complete);
    assert_eq!(select_document(&block.bytes, "Beta").as_deref(), Some("'''Beta''' is a 1999 film."));
    assert!(select_document(&block.bytes, "R1").is_none());
}

#[test]
fn follows_a_redirect() {
    let (_fx, c) = corpus(3);
    match c.resolve("Alpha (film)") {
        Resolution::Resolved { markup, label } => {
            assert_eq!(label, "Alpha");
            assert!(markup.starts_with("{{Infobox film"));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn chain_longer_than_depth_is_unavailable() {
    let (_fx, c) = corpus(3);
    match c.resolve("R1") {
        Resolution::Unavailable { requested, reason, .. } => {
            assert_eq!(requested, "R1");
            assert_eq!(reason, FailureReason::RedirectLoopExceeded);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn deeper_limit_reaches_the_end_of_the_chain() {
    let (_fx, c) = corpus(5);
    let resolved = c.resolve("R1");
    assert!(matches!(resolved, Resolution::Resolved { ref label, .. } if label == "Alpha"));
}

#[test]
fn cycles_terminate() {
    let (_fx, c) = corpus(10);
    assert!(matches!(
        c.resolve("Loop A"),
        Resolution::Unavailable { reason: FailureReason::RedirectLoopExceeded, .. }
    ));
}

#[test]
fn broken_and_unknown_labels() {
    let (_fx, c) = corpus(3);
    assert_eq!(
        c.resolve("Broken"),
        Resolution::Unavailable {
            requested: "Broken".into(),
            last_tried: "Broken".into(),
            reason: FailureReason::BrokenRedirect,
        }
    );
    assert!(matches!(c.resolve("Gamma"), Resolution::Unavailable { reason: FailureReason::NotIndexed, .. }));
}

#[test]
fn stale_offset_is_a_retrieval_failure() {
    let fx = fixture(&[&[("Alpha", ALPHA)]]);
    std::fs::write(&fx.index, format!("{}:1:Alpha\n{}:2:Ghost\n", fx.offsets[0], fx.offsets[0])).unwrap();
    IndexStore::build(&fx.index, &fx.store, &BuildConfig::default()).unwrap();
    let c = Corpus::open(CorpusConfig::new(&fx.archive, &fx.store)).unwrap();

    assert!(matches!(c.resolve("Ghost"), Resolution::Unavailable { reason: FailureReason::RetrievalFailed, .. }));
    assert!(c.extract("Ghost").is_blank());
}

#[test]
fn extract_parses_resolved_page() {
    let (_fx, c) = corpus(3);
    let r = c.extract("Alpha (film)");
    assert_eq!(r.resolved_label, "Alpha");
    assert_eq!(r.title, "Alpha");
    assert_eq!(r.directors, vec!["Jane Roe"]);
    assert_eq!(r.budget_usd, Some(10_000_000));
    assert_eq!(r.release_date.as_deref(), Some("2015-06-12"));
    assert_eq!(r.genres, vec!["horror"]);

    let missing = c.extract("Gamma");
    assert_eq!(missing.resolved_label, "Gamma");
    assert!(missing.is_blank());
}

#[test]
fn search_uses_configured_limit() {
    let (_fx, c) = corpus(3);
    let hits = c.search("R").unwrap();
    assert_eq!(hits, vec!["R1", "R2", "R3", "R4"]);
}
