//! Depth-counting scanners over raw markup bytes. All delimiters are ASCII,
//! so every index these return sits on a char boundary.

use std::collections::HashMap;

/// Index just past the `close` that balances the `open` at `start`, or
/// `None` when the text ends first. `bytes[start..]` must begin with `open`.
pub fn balanced_end(bytes: &[u8], start: usize, open: &[u8], close: &[u8]) -> Option<usize> {
    let mut depth = 1usize;
    let mut i = start + open.len();
    while i < bytes.len() {
        let rest = &bytes[i..];
        if rest.starts_with(open) {
            depth += 1;
            i += open.len();
        } else if rest.starts_with(close) {
            depth -= 1;
            i += close.len();
            if depth == 0 { return Some(i); }
        } else {
            i += 1;
        }
    }
    None
}

/// ASCII case-insensitive substring search. `needle` should be ASCII.
pub fn find_ci(haystack: &str, needle: &str) -> Option<usize> {
    let n = needle.as_bytes();
    if n.is_empty() { return Some(0); }
    haystack.as_bytes().windows(n.len()).position(|w| w.eq_ignore_ascii_case(n))
}

/// Lowercased field name -> raw value, from one template's `| key = value` lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    fields: HashMap<String, String>,
}

impl FieldMap {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Value of the first key that is present, even if empty.
    pub fn first_present(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|k| self.get(k))
    }

    pub fn first_non_empty(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().filter_map(|k| self.get(k)).find(|v| !v.is_empty())
    }

    pub fn len(&self) -> usize { self.fields.len() }

    pub fn is_empty(&self) -> bool { self.fields.is_empty() }
}

/// Fields of the first top-level `{{<name> ...}}` template, matched
/// case-insensitively. An unbalanced template yields an empty map.
///
/// Lines starting with `|` and containing `=` open a field; other non-blank
/// lines continue the current one (multi-line list values). A repeated key
/// keeps its first value, and the repeat's continuation lines are dropped.
pub fn template_fields(text: &str, name: &str) -> FieldMap {
    let mut map = FieldMap::default();
    let Some(start) = find_ci(text, &format!("{{{{{name}")) else { return map };
    let Some(end) = balanced_end(text.as_bytes(), start, b"{{", b"}}") else {
        tracing::debug!(template = name, "unbalanced template, ignoring fields");
        return map;
    };
    let body = &text[start + 2 + name.len()..end - 2];

    let mut current: Option<String> = None;
    for line in body.lines() {
        let stripped = line.trim_start();
        if stripped.starts_with('|') {
            let Some((key, value)) = stripped.split_once('=') else { continue };
            let key = key.trim_start_matches('|').trim().to_lowercase();
            if map.fields.contains_key(&key) {
                current = None;
                continue;
            }
            map.fields.insert(key.clone(), value.trim().to_string());
            current = Some(key);
            continue;
        }
        if stripped.is_empty() { continue; }
        if let Some(value) = current.as_ref().and_then(|k| map.fields.get_mut(k)) {
            value.push('\n');
            value.push_str(stripped);
        }
    }
    map
}

/// Raw markup of the lead paragraph: skips leading comments, tables,
/// templates and namespaced links (files, categories), then runs to the
/// first blank line.
pub fn lead_markup(text: &str) -> &str {
    let bytes = text.as_bytes();
    let len = bytes.len();
    let mut i = 0;
    while i < len {
        let rest = &bytes[i..];
        if rest.starts_with(b"<!--") {
            match text[i..].find("-->") {
                Some(off) => { i += off + 3; continue; }
                None => break,
            }
        }
        if rest.starts_with(b"{|") {
            match text[i..].find("|}") {
                Some(off) => { i += off + 2; continue; }
                None => break,
            }
        }
        if rest.starts_with(b"{{") {
            i = balanced_end(bytes, i, b"{{", b"}}").unwrap_or(len);
            continue;
        }
        if rest.starts_with(b"[[") {
            let window = &bytes[i + 2..(i + 12).min(len)];
            if window.contains(&b':') {
                i = balanced_end(bytes, i, b"[[", b"]]").unwrap_or(len);
                continue;
            }
        }
        if bytes[i] == b'\n' {
            i += 1;
            continue;
        }
        break;
    }
    let end = text[i..].find("\n\n").map_or(len, |off| i + off);
    text[i..end].trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    const INFOBOX: &str = "{{Infobox film\n| name = Alpha\n| director = {{Plainlist|\n* [[Jane Roe]]\n* John Doe\n}}\n| budget = $5 million<ref>{{cite web|title=x}}</ref>\n| name = Ignored\n  more ignored\n}}\n'''Alpha''' is a film.";

    #[test]
    fn balanced_end_tracks_nesting() {
        let s = b"{{a|{{b}}|c}}rest";
        assert_eq!(balanced_end(s, 0, b"{{", b"}}"), Some(13));
        assert_eq!(balanced_end(b"{{a|{{b}}", 0, b"{{", b"}}"), None);
    }

    #[test]
    fn fields_keep_continuations_and_first_value() {
        let f = template_fields(INFOBOX, "infobox film");
        assert_eq!(f.get("name"), Some("Alpha"));
        assert_eq!(f.get("director"), Some("{{Plainlist|\n* [[Jane Roe]]\n* John Doe\n}}"));
        assert!(f.get("budget").unwrap().starts_with("$5 million"));
        assert_eq!(f.len(), 3);
    }

    #[test]
    fn unbalanced_template_gives_empty_map() {
        let f = template_fields("{{Infobox film\n| name = A\n{{unclosed", "infobox film");
        assert!(f.is_empty());
        assert!(template_fields("no template here", "infobox film").is_empty());
    }

    #[test]
    fn lead_skips_structure_before_prose() {
        let text = "{{Short description|Film}}\n{{Infobox film\n| name = {{nowrap|Alpha}}\n}}\n<!-- hidden. -->\n[[File:Poster.jpg|thumb|A poster.]]\n'''Alpha''' is a [[horror film]].\nSecond line.\n\nNext paragraph.";
        assert_eq!(lead_markup(text), "'''Alpha''' is a [[horror film]].\nSecond line.");
    }

    #[test]
    fn lead_keeps_leading_article_links() {
        assert_eq!(lead_markup("[[Alpha]] is great.\n\nMore"), "[[Alpha]] is great.");
    }

    #[test]
    fn lead_skips_tables() {
        let text = "{| class=\"wikitable\"\n|-\n| x || y\n|}\n'''Alpha''' is a film.\n\nMore";
        assert_eq!(lead_markup(text), "'''Alpha''' is a film.");
    }
}
