use super::clean::{strip_comments, strip_refs};
use lazy_static::lazy_static;
use std::collections::HashSet;

lazy_static! {
    static ref ABBREVIATIONS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "vs", "messrs",
            "u.s", "u.k", "u.s.a",
        ];
        words.iter().copied().collect()
    };
}

const CLOSERS: &[char] = &['"', '\'', '’', '”', ']', ')'];

/// First sentence of a paragraph, with refs and comments removed first.
///
/// `.`, `!` and `?` end a sentence unless the token before them is a known
/// abbreviation or a single letter (an initial). Closing quotes and brackets
/// right after the punctuation belong to the sentence.
pub fn first_sentence(text: &str) -> String {
    if text.is_empty() { return String::new(); }
    let cleaned = strip_comments(&strip_refs(text));

    for (i, ch) in cleaned.char_indices() {
        if !matches!(ch, '.' | '!' | '?') { continue; }
        let prev = previous_token(&cleaned[..i]).to_ascii_lowercase();
        let initial = prev.len() == 1 && prev.chars().all(|c| c.is_ascii_alphabetic());
        if initial || ABBREVIATIONS.contains(prev.as_str()) { continue; }

        let mut end = i + ch.len_utf8();
        for c in cleaned[end..].chars() {
            if !CLOSERS.contains(&c) { break; }
            end += c.len_utf8();
        }
        return cleaned[..end].trim().to_string();
    }
    cleaned.trim().to_string()
}

/// Trailing run of ASCII letters and dots.
fn previous_token(prefix: &str) -> &str {
    let start = prefix
        .char_indices()
        .rev()
        .find(|(_, c)| !(c.is_ascii_alphabetic() || *c == '.'))
        .map_or(0, |(p, c)| p + c.len_utf8());
    &prefix[start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_titles_and_initials() {
        let s = first_sentence("Dr. Strange met J. R. Smith in the U.S. capital. Then he left.");
        assert_eq!(s, "Dr. Strange met J. R. Smith in the U.S. capital.");
    }

    #[test]
    fn includes_trailing_closers() {
        assert_eq!(first_sentence("He said \"stop.\" She ran."), "He said \"stop.\"");
    }

    #[test]
    fn punctuation_inside_refs_and_comments_is_ignored() {
        let s = first_sentence("Alpha<ref>Cited. Source.</ref> is a film<!-- a. b. --> about bees. Next.");
        assert_eq!(s, "Alpha is a film about bees.");
    }

    #[test]
    fn no_boundary_returns_everything() {
        assert_eq!(first_sentence("  no terminator here "), "no terminator here");
    }
}
