use super::clean::clean_value;
use super::scan::FieldMap;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

lazy_static! {
    static ref LIST_TEMPLATE: Regex = Regex::new(r"(?i)\{\{\s*(?:plainlist|flatlist)\s*\|?").expect("valid regex");
    static ref SEPARATORS: Regex = Regex::new(r"[/,;]| and ").expect("valid regex");
}

/// Directors from `director`, falling back to `directed by`.
pub fn directors(fields: &FieldMap) -> Vec<String> {
    fields
        .first_non_empty(&["director", "directed by"])
        .map(split_people)
        .unwrap_or_default()
}

/// Split a people-list value into unique names, in first-seen order.
pub fn split_people(raw: &str) -> Vec<String> {
    let lower = raw.to_lowercase();
    let is_list = lower.contains("{{plainlist")
        || lower.contains("{{flatlist")
        || raw.contains('\n')
        || raw.trim_start().starts_with('*');

    let items: Vec<String> = if is_list {
        let body = LIST_TEMPLATE.replace_all(raw, "").replace("}}", "");
        body.lines()
            .map(|l| l.trim().trim_start_matches('*').trim().to_string())
            .filter(|l| !l.is_empty())
            .collect()
    } else {
        vec![raw.to_string()]
    };

    let mut out = Vec::new();
    let mut seen = HashSet::new();
    for item in items {
        let cleaned = clean_value(&item);
        for name in SEPARATORS.split(&cleaned) {
            let name = name.trim();
            if !name.is_empty() && seen.insert(name.to_string()) {
                out.push(name.to_string());
            }
        }
    }
    out
}
