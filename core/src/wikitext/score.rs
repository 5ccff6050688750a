//! Running time and review-aggregator scores.

use super::clean::{strip_comments, strip_refs, unlink};
use super::scan::{find_ci, FieldMap};
use lazy_static::lazy_static;
use regex::Regex;

pub const RUNTIME_KEYS: &[&str] = &["running time", "running_time", "runtime"];

lazy_static! {
    static ref MINUTES: Regex = Regex::new(r"(?i)([0-9]{2,3})\s*(?:minutes|min)").expect("valid regex");

    static ref RT_DATA: Regex =
        Regex::new(r"(?i)\{\{\s*(?:RT data|Rotten Tomatoes data)\s*\|\s*score\s*=\s*([0-9]{1,3})").expect("valid regex");
    static ref RT_DATA_BARE: Regex = Regex::new(r"(?i)\{\{(?:RT data|Rotten Tomatoes data)\|score").expect("valid regex");
    static ref RT_PROSE_TPL: Regex = Regex::new(r"(?i)\{\{\s*Rotten Tomatoes prose\|\s*([0-9]{1,3})").expect("valid regex");
    static ref PERCENT_SIGN: Regex = Regex::new(r"([0-9]{1,3})\s*%").expect("valid regex");
    static ref PERCENT_WORD: Regex = Regex::new(r"(?i)([0-9]{1,3})\s*(?:percent|per\s*cent)").expect("valid regex");
    static ref PERCENT_TPL: Regex =
        Regex::new(r"(?i)\{\{\s*(?:percent|percentage)\s*\|\s*([0-9]{1,3})").expect("valid regex");
    static ref RT_LOOSE_AFTER: Regex =
        Regex::new(r"(?is)Rotten Tomatoes.{0,800}?([0-9]{1,3})\s*%").expect("valid regex");
    static ref RT_LOOSE_BEFORE: Regex =
        Regex::new(r"(?is)([0-9]{1,3})\s*%.{0,800}?Rotten Tomatoes").expect("valid regex");

    static ref MC_TEMPLATE: Regex = Regex::new(r"(?i)\{\{Metacritic[^}]*?([0-9]{1,3})[^}]*\}\}").expect("valid regex");
    static ref MC_OUT_OF: Regex =
        Regex::new(r"(?is)Metacritic[^0-9]{0,200}?([0-9]{1,3})\s*out of\s*100").expect("valid regex");
    static ref MC_SLASH: Regex = Regex::new(r"(?i)Metacritic[^.0-9]{0,40}?([0-9]{1,3})\s*/\s*100").expect("valid regex");
    static ref MC_SCORE: Regex =
        Regex::new(r"(?i)Metacritic[^.0-9]{0,40}?score[^.0-9]{0,10}?([0-9]{1,3})").expect("valid regex");
    static ref MC_SCORE_OF: Regex =
        Regex::new(r"(?i)Metacritic[^.\n]{0,120}?score of ([0-9]{1,3}) out of 100").expect("valid regex");
}

/// Minutes from the running-time field, else the first "NN min" in the page.
pub fn running_time(fields: &FieldMap, markup: &str) -> Option<u32> {
    let raw = fields.first_present(RUNTIME_KEYS).unwrap_or("");
    [raw, markup]
        .into_iter()
        .filter(|s| !s.is_empty())
        .find_map(|s| MINUTES.captures(s))
        .and_then(|c| c[1].parse().ok())
        .filter(|m| *m > 0)
}

/// True when the page only references an externally stored Rotten Tomatoes
/// score, so a remote lookup is worth trying.
pub fn needs_remote_score(markup: &str) -> bool {
    RT_DATA_BARE.is_match(markup)
}

/// Rotten Tomatoes approval percentage found in the page itself.
pub fn rotten_tomatoes(markup: &str) -> Option<u8> {
    if let Some(v) = first_capture(&RT_DATA, markup).or_else(|| first_capture(&RT_PROSE_TPL, markup)) {
        return Some(v);
    }

    if let Some(idx) = find_ci(markup, "rotten tomatoes") {
        let window = around(markup, idx, 400, 800);
        let found = first_capture(&PERCENT_SIGN, window)
            .or_else(|| first_capture(&PERCENT_WORD, window))
            .or_else(|| first_capture(&PERCENT_TPL, window));
        if found.is_some() { return found; }
    }

    let prose = strip_comments(&unlink(&strip_refs(markup)));
    if let Some(idx) = find_ci(&prose, "rotten tomatoes") {
        if let Some(v) = first_capture(&PERCENT_SIGN, around(&prose, idx, 300, 800)) {
            return Some(v);
        }
    }
    first_capture(&RT_LOOSE_AFTER, &prose).or_else(|| first_capture(&RT_LOOSE_BEFORE, &prose))
}

/// Metacritic weighted average out of 100.
pub fn metacritic(markup: &str) -> Option<u8> {
    [&*MC_TEMPLATE, &*MC_OUT_OF, &*MC_SLASH, &*MC_SCORE, &*MC_SCORE_OF]
        .into_iter()
        .find_map(|re| first_capture(re, markup))
}

fn first_capture(re: &Regex, text: &str) -> Option<u8> {
    let n: u32 = re.captures(text)?.get(1)?.as_str().parse().ok()?;
    Some(n.min(100) as u8)
}

/// Slice of `text` from `before` bytes ahead of `idx` to `after` bytes past it,
/// widened to char boundaries.
fn around(text: &str, idx: usize, before: usize, after: usize) -> &str {
    let mut start = idx.saturating_sub(before);
    while !text.is_char_boundary(start) { start -= 1; }
    let mut end = idx.saturating_add(after).min(text.len());
    while !text.is_char_boundary(end) { end += 1; }
    &text[start..end]
}
