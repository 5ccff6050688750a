//! Origin categories a film can be classified into, and the mapping from a
//! language model's single-digit answer to them. The model call itself lives
//! with the callers that own a network client.

use serde::{Deserialize, Serialize};

/// Instruction sent ahead of the lead paragraph. Asks for one digit, 0-5.
pub const DEFAULT_PROMPT: &str = "\
Classify the film described below into exactly one category, using only the text given.
Answer with a single digit from 0 to 5 and nothing else.

Check the rules in order and stop at the first one that applies:

1 = Sequel or prequel in the same continuity. The text must say it is a sequel,
    prequel, follow-up or direct continuation of another film, or that it is set
    before or after the events of another film.
2 = Remake, reboot or reimagining. One of those words must appear.
3 = Entry in an existing franchise, universe or character property that is not
    a sequel, prequel or remake. The franchise must predate the film.
4 = Adapted from prior work: the text says based on or adapted from a novel,
    book, story, play, comic, article, memoir, biography, show or earlier script.
    Personal experiences, true events or real lives do not count as adaptation.
5 = Original story not derived from prior work. Includes films based on true
    events or real people, parodies and homages.
0 = Not enough information, or the text is not about a film.

Being the first part of a planned series does not by itself make a film 1 or 3.
";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Undetermined,
    Sequel,
    Remake,
    Franchise,
    Adapted,
    Original,
}

impl Category {
    pub fn from_digit(d: u8) -> Option<Self> {
        Some(match d {
            0 => Category::Undetermined,
            1 => Category::Sequel,
            2 => Category::Remake,
            3 => Category::Franchise,
            4 => Category::Adapted,
            5 => Category::Original,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Undetermined => "undetermined",
            Category::Sequel => "sequel",
            Category::Remake => "remake",
            Category::Franchise => "franchise",
            Category::Adapted => "adapted",
            Category::Original => "original",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of reading a model's first token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Category(Category),
    /// Anything that is not a single digit 0-5, kept for logging.
    Unrecognized(String),
}

impl Classification {
    pub fn from_first_token(token: &str) -> Self {
        let t = token.trim();
        let mut chars = t.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => c
                .to_digit(10)
                .and_then(|d| Category::from_digit(d as u8))
                .map_or_else(|| Classification::Unrecognized(t.to_string()), Classification::Category),
            _ => Classification::Unrecognized(t.to_string()),
        }
    }

    /// The category, with unrecognized answers treated as no answer.
    pub fn category(&self) -> Option<Category> {
        match self {
            Classification::Category(c) => Some(*c),
            Classification::Unrecognized(_) => None,
        }
    }
}
