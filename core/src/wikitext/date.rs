use super::clean::clean_value;
use super::scan::FieldMap;
use lazy_static::lazy_static;
use regex::Regex;

pub const RELEASE_KEYS: &[&str] = &["release date", "released", "release_date"];

lazy_static! {
    static ref DATE_TEMPLATE: Regex = Regex::new(
        r"(?i)\{\{(?:film date|film release|release date and age|release date|start date and age|start date)[^}]*\}\}"
    ).expect("valid regex");
    static ref ISO_EXACT: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid regex");
    static ref PROSE_DATE: Regex = Regex::new(
        r"(January|February|March|April|May|June|July|August|September|October|November|December)\s+(\d{1,2}),\s+(\d{4})"
    ).expect("valid regex");
    static ref ISO_ANY: Regex = Regex::new(r"\d{4}-\d{2}-\d{2}").expect("valid regex");
    static ref YEAR: Regex = Regex::new(r"\b(\d{4})\b").expect("valid regex");
}

pub fn month_number(name: &str) -> Option<u8> {
    let n = match name.to_ascii_lowercase().as_str() {
        "january" => 1,
        "february" => 2,
        "march" => 3,
        "april" => 4,
        "may" => 5,
        "june" => 6,
        "july" => 7,
        "august" => 8,
        "september" => 9,
        "october" => 10,
        "november" => 11,
        "december" => 12,
        _ => return None,
    };
    Some(n)
}

/// Turn the first date-like template (or the whole value) into `YYYY-MM-DD`
/// from its first numeric / month-name arguments; day defaults to `01`.
/// Falls back to the cleaned text when fewer than two parts are found.
pub fn normalize_date_template(text: &str) -> String {
    if text.is_empty() { return String::new(); }
    let candidate = DATE_TEMPLATE.find(text).map_or(text, |m| m.as_str());
    let mut nums: Vec<String> = Vec::new();
    for part in candidate.trim_matches(|c| c == '{' || c == '}').split('|') {
        let p = part.trim();
        if !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()) {
            nums.push(p.to_string());
        } else if let Some(m) = month_number(p) {
            nums.push(format!("{m:02}"));
        }
    }
    if nums.len() >= 2 {
        let day = nums.get(2).map_or_else(|| "01".to_string(), |d| zero_pad(d));
        return format!("{}-{}-{}", nums[0], zero_pad(&nums[1]), day);
    }
    clean_value(candidate)
}

fn zero_pad(s: &str) -> String {
    format!("{s:0>2}")
}

/// Release date as `YYYY-MM-DD`.
///
/// The first non-empty release field decides on its own: a result that is
/// not ISO-shaped is `None`, not a guess. Without such a field the whole
/// document is searched for "Month D, YYYY", an ISO date, then a bare year.
pub fn release_date(fields: &FieldMap, markup: &str) -> Option<String> {
    for key in RELEASE_KEYS {
        let Some(raw) = fields.get(key).filter(|v| !v.is_empty()) else { continue };
        let parsed = normalize_date_template(raw);
        if !parsed.is_empty() {
            return ISO_EXACT.is_match(&parsed).then_some(parsed);
        }
    }

    if let Some(c) = PROSE_DATE.captures(markup) {
        return calendar_date(&c[3], &c[1], &c[2]);
    }
    if let Some(m) = ISO_ANY.find(markup) {
        return Some(m.as_str().to_string());
    }
    YEAR.captures(markup).map(|c| format!("{}-01-01", &c[1]))
}

fn calendar_date(year: &str, month: &str, day: &str) -> Option<String> {
    let month = time::Month::try_from(month_number(month)?).ok()?;
    let date = time::Date::from_calendar_date(year.parse().ok()?, month, day.parse().ok()?).ok()?;
    Some(format!("{:04}-{:02}-{:02}", date.year(), u8::from(date.month()), date.day()))
}
