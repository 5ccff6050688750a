//! Dollar amounts from free-form budget / box office values.
//!
//! Priority: `{{US$|...}}` arguments, then bulleted items carrying a USD
//! marker, then (if a non-USD currency shows up) only an explicit `$`
//! amount, then a plain amount or range. No currency conversion is done.

use super::clean::strip_refs;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref USD_TEMPLATE: Regex = Regex::new(r"(?i)\{\{\s*US\$\s*\|([^|}]+)").expect("valid regex");
    static ref USD_ITEM: Regex = Regex::new(
        r"(?im)^\s*\*[^\n]*(?:\[\[(?:United States dollar|US dollar)[^\]]*\]\]|US\$|USD)[^\n]*"
    ).expect("valid regex");
    static ref NON_USD: Regex = Regex::new(concat!(
        r"(?i)[¥£€₹₩₽]",
        r"|\[\[(?:Japanese yen|Chinese yuan|British pound|Pound sterling|",
        r"Italian lira|French franc|German mark|Soviet ruble|Spanish peseta|Euro)[^\]]*\]\]",
        r"|\{\{\s*(?:JPY|CNY|EUR|GBP|INR|KRW|RUB|ITL|FRF|DEM|¥|£|€)[^}]*\}\}",
    )).expect("valid regex");
    static ref DOLLAR_AMOUNT: Regex =
        Regex::new(r"(?i)\$\s*[0-9][\d,.]*(?:\s*(?:million|billion|m|bn))?").expect("valid regex");
    static ref NBSP_TPL: Regex = Regex::new(r"(?i)\{\{\s*nbsp\s*(?:\|[^{}]*)?\}\}").expect("valid regex");
    static ref EFN_TPL: Regex = Regex::new(r"(?i)\{\{\s*efn[^{}]*\}\}").expect("valid regex");
    static ref SPACES: Regex = Regex::new(r"\s+").expect("valid regex");
    static ref RANGE: Regex = Regex::new(concat!(
        r"(?i)([$£€]?)\s*([0-9][\d,]*)(?:\.(\d+))?\s*(million|billion|m|bn)?",
        r"\s*-\s*([0-9][\d,]*)(?:\.(\d+))?\s*(million|billion|m|bn)?",
    )).expect("valid regex");
    static ref SINGLE: Regex =
        Regex::new(r"(?i)([$£€]?)\s*([0-9][\d,]*)(?:\.(\d+))?\s*(million|billion|m|bn)?").expect("valid regex");
}

/// Parse a money-like value to whole US dollars.
///
/// `"$10 million"` -> 10_000_000, `"6–7 million"` -> 6_500_000 (ranges
/// average their endpoints), `"€5 million"` -> `None`.
pub fn parse_money(text: &str) -> Option<u64> {
    if text.is_empty() { return None; }

    let tagged: Vec<u64> = USD_TEMPLATE
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .filter_map(|m| parse_money(m.as_str().trim()))
        .collect();
    if let Some(avg) = average(&tagged) { return Some(avg); }

    let items: Vec<u64> = USD_ITEM
        .find_iter(text)
        .filter_map(|m| parse_money(m.as_str().trim_start().trim_start_matches('*').trim()))
        .collect();
    if let Some(avg) = average(&items) { return Some(avg); }

    if NON_USD.is_match(text) {
        let amount = DOLLAR_AMOUNT.find(text).and_then(|m| parse_money(m.as_str()));
        if amount.is_none() {
            tracing::debug!(value = text, "non-USD amount without a dollar figure");
        }
        return amount;
    }

    parse_plain(text)
}

fn parse_plain(text: &str) -> Option<u64> {
    let cleaned = strip_refs(text)
        .replace('–', "-")
        .replace('—', "-")
        .replace('\u{a0}', " ")
        .replace("&nbsp;", " ");
    let cleaned = NBSP_TPL.replace_all(&cleaned, " ");
    let cleaned = EFN_TPL.replace_all(&cleaned, "");
    let cleaned = SPACES.replace_all(&cleaned, " ");
    let cleaned = cleaned.trim();

    if let Some(c) = RANGE.captures(cleaned) {
        let int1 = c.get(2).map_or("", |m| m.as_str());
        let int2 = c.get(5).map_or("", |m| m.as_str());
        let unit1 = c.get(4).map(|m| m.as_str());
        let unit2 = c.get(7).map(|m| m.as_str());
        let common = unit1.or(unit2);
        // A thousands separator means the endpoint is already fully expanded.
        let v1 = to_number(int1, c.get(3).map(|m| m.as_str()), unit1.or(if int1.contains(',') { None } else { common }));
        let v2 = to_number(int2, c.get(6).map(|m| m.as_str()), unit2.or(if int2.contains(',') { None } else { common }));
        if let (Some(a), Some(b)) = (v1, v2) {
            return Some(to_whole((a + b) / 2.0));
        }
    }

    let c = SINGLE.captures(cleaned)?;
    let unit = c.get(4).map(|m| m.as_str());
    to_number(c.get(2)?.as_str(), c.get(3).map(|m| m.as_str()), unit).map(to_whole)
}

fn to_number(int_part: &str, dec_part: Option<&str>, unit: Option<&str>) -> Option<f64> {
    let int_part = int_part.replace(',', "");
    let base: f64 = match dec_part {
        Some(d) if !d.is_empty() => format!("{int_part}.{d}").parse().ok()?,
        _ => int_part.parse().ok()?,
    };
    let multiplier = match unit.map(str::to_ascii_lowercase).as_deref() {
        Some("million") | Some("m") => 1_000_000.0,
        Some("billion") | Some("bn") => 1_000_000_000.0,
        _ => 1.0,
    };
    Some(base * multiplier)
}

fn average(values: &[u64]) -> Option<u64> {
    if values.is_empty() { return None; }
    let sum: f64 = values.iter().map(|v| *v as f64).sum();
    Some(to_whole(sum / values.len() as f64))
}

fn to_whole(v: f64) -> u64 {
    v.round_ties_even() as u64
}
