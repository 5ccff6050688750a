use marquee_core::wikitext::{
    genre::genres_from_sentence, lead_markup, parse_money, parse_record, release_date, template_fields, FieldMap,
    INFOBOX,
};

#[test]
fn currency_cases() {
    assert_eq!(parse_money("$10 million"), Some(10_000_000));
    assert_eq!(parse_money("6–7 million"), Some(6_500_000));
    assert_eq!(parse_money("€5 million"), None);
    assert_eq!(parse_money("$985,000–1 million"), Some(992_500));
}

#[test]
fn date_cases() {
    let tpl = template_fields("{{Infobox film\n| release date = {{film date|2015|6|12}}\n}}", INFOBOX);
    assert_eq!(release_date(&tpl, "").as_deref(), Some("2015-06-12"));
    assert_eq!(release_date(&FieldMap::default(), "Released June 12, 2015.").as_deref(), Some("2015-06-12"));
    assert_eq!(release_date(&FieldMap::default(), "Released in 2015").as_deref(), Some("2015-01-01"));
}

#[test]
fn genre_cases() {
    let s = "'''Alpha''' is a 2015 American [[horror film|horror]] film directed by [[John Doe]].";
    assert_eq!(genres_from_sentence(s), vec!["horror"]);
    let s = "'''Alpha''' is a [[drama film|drama]] film produced by [[Big Studio Pictures]].";
    assert_eq!(genres_from_sentence(s), vec!["drama"]);
}

#[test]
fn lead_isolation() {
    let text = "{{Infobox film\n| name = Alpha\n| budget = {{US$|5 million}}\n}}\n<!-- Do not change. -->\n[[Category:2015 films]]\n'''Alpha''' is a film.\nIt was well received.\n\n== Plot ==\nStuff.";
    assert_eq!(lead_markup(text), "'''Alpha''' is a film.\nIt was well received.");

    let text = "{{Infobox film\n| name = Alpha\n}}\n{| class=\"infobox\"\n|+ Credits\n|-\n! Role !! Name\n|}\n<!-- note -->\n'''Alpha''' is a film.\n\n== Cast ==";
    assert_eq!(lead_markup(text), "'''Alpha''' is a film.");
}

#[test]
fn no_infobox_gives_full_but_empty_record() {
    let r = parse_record("Some text without any template or facts", "Nothing");
    assert_eq!(r.resolved_label, "Nothing");
    assert_eq!(r.title, "Nothing");
    assert!(r.is_blank());
}

#[test]
fn unbalanced_infobox_falls_back_to_prose() {
    let markup = "{{Infobox film\n| name = Broken\n| budget = $3 million\n'''Broken''' is a 2001 [[comedy film]]. It runs 95 minutes.";
    let r = parse_record(markup, "Broken (film)");
    assert_eq!(r.budget_usd, None);
    assert_eq!(r.running_time_minutes, Some(95));
    assert_eq!(r.release_date.as_deref(), Some("2001-01-01"));
}
