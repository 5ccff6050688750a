//! Rotten Tomatoes scores from Wikidata, for pages that only carry an
//! `{{RT data|score}}` reference.

use anyhow::{Context, Result};
use serde_json::Value;
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_URL: &str = "https://en.wikipedia.org/w/api.php";
pub const DEFAULT_ENTITY_URL: &str = "https://www.wikidata.org/wiki/Special:EntityData";
pub const DEFAULT_USER_AGENT: &str = "marquee-harvester/0.1 (+https://example.com/bot)";

/// Review score (P444) claims qualified by reviewer (P447) = Rotten Tomatoes.
const REVIEW_SCORE: &str = "P444";
const REVIEWED_BY: &str = "P447";
const ROTTEN_TOMATOES: &str = "Q105584";

#[derive(Debug, Clone)]
pub struct ScoreLookupConfig {
    pub api_url: String,
    pub entity_url: String,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for ScoreLookupConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            entity_url: DEFAULT_ENTITY_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

pub struct ScoreLookup {
    client: reqwest::Client,
    config: ScoreLookupConfig,
}

impl ScoreLookup {
    pub fn new(config: ScoreLookupConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    /// Score for a page title, or `None` on any network or data-shape problem.
    pub async fn rotten_tomatoes(&self, title: &str) -> Option<u8> {
        match self.lookup(title).await {
            Ok(score) => score,
            Err(e) => {
                tracing::debug!(title, error = %e, "remote score lookup failed");
                None
            }
        }
    }

    async fn lookup(&self, title: &str) -> Result<Option<u8>> {
        let url = Url::parse_with_params(
            &self.config.api_url,
            &[("action", "query"), ("titles", title), ("prop", "pageprops"), ("format", "json"), ("redirects", "1")],
        )?;
        let pages: Value = self.client.get(url).send().await?.error_for_status()?.json().await?;
        let Some(qid) = wikibase_item(&pages) else { return Ok(None) };

        let url = format!("{}/{qid}.json", self.config.entity_url.trim_end_matches('/'));
        let entities: Value = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .with_context(|| format!("decoding {url}"))?;
        Ok(entities.get("entities").and_then(|e| e.get(&qid)).and_then(rt_score_from_entity))
    }
}

/// Wikidata item id from a `prop=pageprops` query response.
pub fn wikibase_item(response: &Value) -> Option<String> {
    let pages = response.get("query")?.get("pages")?.as_object()?;
    let page = pages.values().next()?;
    page.get("pageprops")?.get("wikibase_item")?.as_str().map(str::to_string)
}

/// First Rotten Tomatoes review score among an entity's claims. Values look
/// like `"84%"` or a bare number.
pub fn rt_score_from_entity(entity: &Value) -> Option<u8> {
    let claims = entity.get("claims")?.get(REVIEW_SCORE)?.as_array()?;
    claims.iter().find_map(|claim| {
        let snak = claim.get("mainsnak")?;
        if snak.get("snaktype")?.as_str()? != "value" { return None; }
        let by_rt = claim
            .get("qualifiers")
            .and_then(|q| q.get(REVIEWED_BY))
            .and_then(Value::as_array)
            .is_some_and(|quals| {
                quals.iter().any(|q| {
                    q.get("snaktype").and_then(Value::as_str) == Some("value")
                        && q.pointer("/datavalue/value/id").and_then(Value::as_str) == Some(ROTTEN_TOMATOES)
                })
            });
        if !by_rt { return None; }
        let value = snak.pointer("/datavalue/value")?;
        let numeric: f64 = match value {
            Value::String(s) => s.trim().trim_end_matches('%').parse().ok()?,
            Value::Number(n) => n.as_f64()?,
            _ => return None,
        };
        Some(numeric.round_ties_even().clamp(0.0, 100.0) as u8)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn claim(value: &str, reviewer: &str) -> Value {
        json!({
            "mainsnak": { "snaktype": "value", "datavalue": { "value": value } },
            "qualifiers": { "P447": [ { "snaktype": "value", "datavalue": { "value": { "id": reviewer } } } ] }
        })
    }

    #[test]
    fn picks_the_rotten_tomatoes_claim() {
        let entity = json!({ "claims": { "P444": [ claim("72/100", "Q150248"), claim("84%", "Q105584") ] } });
        assert_eq!(rt_score_from_entity(&entity), Some(84));
    }

    #[test]
    fn missing_or_odd_shapes_are_none() {
        assert_eq!(rt_score_from_entity(&json!({})), None);
        assert_eq!(rt_score_from_entity(&json!({ "claims": { "P444": [ claim("great", "Q105584") ] } })), None);
    }

    #[test]
    fn reads_wikibase_item() {
        let resp = json!({ "query": { "pages": { "123": { "title": "Alpha", "pageprops": { "wikibase_item": "Q42" } } } } });
        assert_eq!(wikibase_item(&resp).as_deref(), Some("Q42"));
        assert_eq!(wikibase_item(&json!({ "query": { "pages": { "-1": { "missing": "" } } } })), None);
    }
}
