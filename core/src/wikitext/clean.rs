use super::scan::lead_markup;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref REF_PAIR: Regex = Regex::new(r"(?s)<ref[^>]*>.*?</ref>").expect("valid regex");
    static ref REF_SELF: Regex = Regex::new(r"<ref[^>]*/>").expect("valid regex");
    static ref COMMENT: Regex = Regex::new(r"(?s)<!--.*?-->").expect("valid regex");
    static ref FOOTNOTE_TPL: Regex =
        Regex::new(r"(?is)\{\{\s*(?:efn|refn|sfn|cn|citation needed)\b[^}]*\}\}").expect("valid regex");
    static ref UNWRAP_TPL: Regex = Regex::new(r"(?i)\{\{\s*(?:nowrap|nobr|small)\|([^{}]+?)\}\}").expect("valid regex");
    static ref LINK: Regex = Regex::new(r"\[\[(?:[^|\]]*\|)?([^\]]+)\]\]").expect("valid regex");
    static ref EXTERNAL_LINK: Regex = Regex::new(r"\[http\S+ ([^\]]+)\]").expect("valid regex");
    static ref TAG: Regex = Regex::new(r"<[^>]+>").expect("valid regex");
    static ref SPACES: Regex = Regex::new(r"\s+").expect("valid regex");
}

/// Drop `<ref>...</ref>` spans (content included) and self-closing refs.
pub fn strip_refs(text: &str) -> String {
    let s = REF_PAIR.replace_all(text, "");
    REF_SELF.replace_all(&s, "").into_owned()
}

pub fn strip_comments(text: &str) -> String {
    COMMENT.replace_all(text, "").into_owned()
}

pub fn strip_footnote_templates(text: &str) -> String {
    FOOTNOTE_TPL.replace_all(text, "").into_owned()
}

/// `[[target|label]]` -> `label`, `[[target]]` -> `target`.
pub fn unlink(text: &str) -> String {
    LINK.replace_all(text, "$1").into_owned()
}

pub fn strip_emphasis(text: &str) -> String {
    text.replace("'''", "").replace("''", "")
}

pub fn collapse_whitespace(text: &str) -> String {
    SPACES.replace_all(text, " ").trim().to_string()
}

/// Reduce a raw field value to plain text.
pub fn clean_value(value: &str) -> String {
    if value.is_empty() { return String::new(); }
    let s = strip_refs(value);
    let s = strip_comments(&s);
    let s = strip_footnote_templates(&s);
    let s = UNWRAP_TPL.replace_all(&s, "$1");
    let s = unlink(&s);
    let s = strip_emphasis(&s);
    let s = TAG.replace_all(&s, "");
    collapse_whitespace(&s)
}

/// Lead paragraph as prose: emphasis, links, comments, footnotes and refs removed.
pub fn lead_paragraph(markup: &str) -> String {
    let raw = lead_markup(markup);
    if raw.is_empty() { return String::new(); }
    let s = strip_emphasis(raw);
    let s = unlink(&s);
    let s = EXTERNAL_LINK.replace_all(&s, "$1");
    let s = strip_comments(&s);
    let s = strip_footnote_templates(&s);
    strip_refs(&s).trim().to_string()
}
