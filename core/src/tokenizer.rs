use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref RE: Regex = Regex::new(r"(?u)[\p{L}\p{N}]+").expect("valid regex");
}

/// Fold a label or query into search form: NFKD, combining marks dropped, lowercased.
pub fn fold(text: &str) -> String {
    text.nfkd().filter(|c| !is_combining_mark(*c)).collect::<String>().to_lowercase()
}

/// Tokenize text into (term, position). Positions are consecutive so phrase
/// matching can compare them directly; nothing is dropped or stemmed.
pub fn tokenize(text: &str) -> Vec<(String, usize)> {
    let folded = fold(text);
    RE.find_iter(&folded)
        .enumerate()
        .map(|(pos, m)| (m.as_str().to_string(), pos))
        .collect()
}
