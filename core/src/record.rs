use serde::{Deserialize, Serialize};

/// Facts extracted from one page. Every optional field is `None` when the
/// markup did not yield a confident value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedRecord {
    pub resolved_label: String,
    pub title: String,
    pub directors: Vec<String>,
    pub budget_usd: Option<u64>,
    pub box_office_usd: Option<u64>,
    /// `YYYY-MM-DD`.
    pub release_date: Option<String>,
    pub running_time_minutes: Option<u32>,
    pub genres: Vec<String>,
    /// Rotten Tomatoes approval, 0..=100.
    pub rotten_tomatoes: Option<u8>,
    /// Metacritic weighted average, 0..=100.
    pub metacritic: Option<u8>,
}

impl ParsedRecord {
    /// A record for a label whose page could not be retrieved.
    pub fn empty(label: &str) -> Self {
        Self {
            resolved_label: label.to_string(),
            title: label.to_string(),
            ..Self::default()
        }
    }

    /// True when no field beyond the labels carries a value.
    pub fn is_blank(&self) -> bool {
        self.directors.is_empty()
            && self.genres.is_empty()
            && self.budget_usd.is_none()
            && self.box_office_usd.is_none()
            && self.release_date.is_none()
            && self.running_time_minutes.is_none()
            && self.rotten_tomatoes.is_none()
            && self.metacritic.is_none()
    }
}
