use super::clean::collapse_whitespace;
use super::scan::{find_ci, lead_markup};
use super::sentence::first_sentence;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

lazy_static! {
    static ref LINK: Regex = Regex::new(r"\[\[([^\]|#]+)(?:#[^\]|]*)?(?:\|([^\]]+))?\]\]").expect("valid regex");
    static ref EDGE_QUOTES: Regex = Regex::new(r#"^["“”'’]+|["“”'’]+$"#).expect("valid regex");
}

/// Genre labels from the links of the lead's first sentence.
pub fn genres(markup: &str) -> Vec<String> {
    let sentence = first_sentence(lead_markup(markup));
    genres_from_sentence(&sentence)
}

/// A link is a candidate when its label has a lowercase-initial word or its
/// target/label looks like a genre or film page. Links after the pivot word
/// "film" must carry that marker themselves.
pub fn genres_from_sentence(sentence: &str) -> Vec<String> {
    if sentence.is_empty() { return Vec::new(); }
    let pivot = first_unlinked_film(sentence).or_else(|| find_ci(sentence, " film"));

    let mut out = Vec::new();
    let mut seen = HashSet::new();
    for caps in LINK.captures_iter(sentence) {
        let Some(whole) = caps.get(0) else { continue };
        let target = caps.get(1).map_or("", |m| m.as_str()).trim();
        let raw_label = caps.get(2).map_or(target, |m| m.as_str().trim());
        let label = collapse_whitespace(&raw_label.replace("'''", "").replace("''", ""));
        let label = EDGE_QUOTES.replace_all(&label, "").into_owned();
        if label.is_empty() { continue; }

        let label_lower = label.to_lowercase();
        let target_lower = target.to_lowercase();
        let has_lower_word = label.split_whitespace().any(|w| w.chars().next().is_some_and(char::is_lowercase));
        let marked = target_lower.contains("(genre") || target_lower.contains(" film") || label_lower.ends_with("film");
        if !(has_lower_word || marked) { continue; }

        if pivot.is_some_and(|p| whole.start() > p) {
            let carries_marker =
                label_lower.contains("film") || target_lower.contains(" film") || target_lower.contains("(genre");
            if !carries_marker { continue; }
        }

        let normalized = match label_lower.strip_suffix(" film") {
            Some(stem) => stem.trim().to_string(),
            None => label_lower,
        };
        if seen.insert(normalized.clone()) {
            out.push(normalized);
        }
    }
    out
}

/// Byte index of the first standalone "film" outside `[[...]]`.
fn first_unlinked_film(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        let rest = &bytes[i..];
        if rest.starts_with(b"[[") {
            depth += 1;
            i += 2;
            continue;
        }
        if rest.starts_with(b"]]") && depth > 0 {
            depth -= 1;
            i += 2;
            continue;
        }
        if depth == 0 && rest.len() >= 4 && rest[..4].eq_ignore_ascii_case(b"film") {
            let before = text[..i].chars().next_back().is_some_and(char::is_alphabetic);
            let after = text[i + 4..].chars().next().is_some_and(char::is_alphabetic);
            if !before && !after { return Some(i); }
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_lowercase_links_before_film() {
        let s = "'''Alpha''' is a 2015 [[Cinema of the United States|American]] [[horror film|horror]] film directed by [[John Doe]].";
        assert_eq!(genres_from_sentence(s), vec!["horror"]);
    }

    #[test]
    fn links_after_pivot_need_a_marker() {
        let s = "'''Alpha''' is a [[comedy film|comedy]] film starring [[the Rock|the rock band]] and a [[musical film]].";
        assert_eq!(genres_from_sentence(s), vec!["comedy", "musical"]);
    }

    #[test]
    fn dedupes_by_normalized_form() {
        let s = "A [[drama film|drama]] and [[Drama (genre)|drama]] film.";
        assert_eq!(genres_from_sentence(s), vec!["drama"]);
    }

    #[test]
    fn film_inside_a_link_is_not_the_pivot() {
        assert_eq!(first_unlinked_film("a [[horror film]] film"), Some(18));
        assert_eq!(first_unlinked_film("filmmaker"), None);
    }
}
