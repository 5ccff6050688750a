//! Heuristic field extraction from raw page markup.
//!
//! Every extractor returns `None` or an empty list for input it cannot read
//! with confidence; nothing here fails.

pub mod clean;
pub mod date;
pub mod genre;
pub mod money;
pub mod people;
pub mod scan;
pub mod score;
pub mod sentence;

pub use clean::{clean_value, lead_paragraph};
pub use date::release_date;
pub use genre::genres;
pub use money::parse_money;
pub use people::{directors, split_people};
pub use scan::{lead_markup, template_fields, FieldMap};
pub use score::{metacritic, needs_remote_score, rotten_tomatoes, running_time};
pub use sentence::first_sentence;

use crate::record::ParsedRecord;
use lazy_static::lazy_static;
use regex::Regex;

/// Name of the primary template fields are read from.
pub const INFOBOX: &str = "infobox film";

const BUDGET_KEYS: &[&str] = &["budget"];
const BOX_OFFICE_KEYS: &[&str] = &["box office", "box_office", "gross"];

lazy_static! {
    static ref LEAD_TITLE: Regex = Regex::new(r"^\s*'{2,5}\s*([^']+?)\s*'{2,5}").expect("valid regex");
}

/// Infobox `name`/`title`, else the bold or italic term opening the lead.
pub fn parse_title(fields: &FieldMap, markup: &str) -> Option<String> {
    for key in ["name", "title"] {
        let cleaned = fields.get(key).map(clean_value).unwrap_or_default();
        if !cleaned.is_empty() { return Some(cleaned); }
    }
    let caps = LEAD_TITLE.captures(lead_markup(markup))?;
    Some(clean_value(&caps[1])).filter(|t| !t.is_empty())
}

fn money_field(fields: &FieldMap, keys: &[&str]) -> Option<u64> {
    keys.iter().filter_map(|k| fields.get(k)).find_map(parse_money)
}

/// Extract every known fact from one page.
///
/// `resolved_label` is the label the markup was finally found under, and is
/// the title of last resort.
pub fn parse_record(markup: &str, resolved_label: &str) -> ParsedRecord {
    let fields = template_fields(markup, INFOBOX);
    if fields.is_empty() {
        tracing::debug!(label = resolved_label, "no infobox fields, scanning whole page");
    }

    ParsedRecord {
        resolved_label: resolved_label.to_string(),
        title: parse_title(&fields, markup).unwrap_or_else(|| resolved_label.to_string()),
        directors: directors(&fields),
        budget_usd: money_field(&fields, BUDGET_KEYS),
        box_office_usd: money_field(&fields, BOX_OFFICE_KEYS),
        release_date: release_date(&fields, markup),
        running_time_minutes: running_time(&fields, markup),
        genres: genres(markup),
        rotten_tomatoes: rotten_tomatoes(markup),
        metacritic: metacritic(markup),
    }
}
