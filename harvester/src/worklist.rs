//! Candidate film titles from the yearly "List of American films" pages.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

lazy_static! {
    // First table cell of a row: | ''[[Title (2001 film)|Title]]'' || ...
    static ref ROW_TITLE: Regex =
        Regex::new(r"(?m)^\|\s*''+\[\[([^|\]]+)(?:\|[^\]]*)?\]\]''+").expect("valid regex");
}

pub const DECADE_PAGE: &str = "List of American films of the 1890s";

/// List page labels: the 1890s page, then one page per year in `from..=to`.
pub fn year_pages(from: i32, to: i32) -> Vec<String> {
    std::iter::once(DECADE_PAGE.to_string())
        .chain((from..=to).map(|y| format!("List of American films of {y}")))
        .collect()
}

/// Linked titles opening table rows, unique, in page order.
pub fn titles_from_list_page(markup: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    ROW_TITLE
        .captures_iter(markup)
        .map(|c| c[1].trim().to_string())
        .filter(|t| !t.is_empty() && seen.insert(t.clone()))
        .collect()
}
