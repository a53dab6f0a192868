//! Sefaria API client. Every request goes through a shared [`RateLimiter`].

use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::RemoteServiceError;
use crate::http::{join, read_json, session, transport};
use crate::rate_limit::RateLimiter;

pub const SERVICE: &str = "sefaria";
pub const DEFAULT_BASE_URL: &str = "https://www.sefaria.org";
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Calendar entry preferred by the daily text lookup.
const WEEKLY_PORTION: &str = "Parashat Hashavua";

/// A fetched passage. Never modified after it is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextResponse {
    pub reference: String,
    pub hebrew: Option<String>,
    pub english: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub reference: String,
    pub snippet: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarItem {
    pub title: String,
    pub display_value: Option<String>,
    pub reference: String,
}

#[derive(Deserialize)]
struct TextPayload {
    #[serde(rename = "ref")]
    reference: Option<String>,
    text: Option<Value>,
    he: Option<Value>,
    #[serde(default)]
    categories: Vec<String>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct RandomPayload {
    #[serde(rename = "ref")]
    reference: Option<String>,
}

#[derive(Deserialize)]
struct CalendarPayload {
    #[serde(default)]
    calendar_items: Vec<CalendarEntry>,
}

#[derive(Deserialize)]
struct CalendarEntry {
    title: LocalizedText,
    #[serde(rename = "displayValue")]
    display_value: Option<LocalizedText>,
    #[serde(rename = "ref")]
    reference: Option<String>,
}

#[derive(Deserialize)]
struct LocalizedText {
    en: Option<String>,
}

#[derive(Deserialize)]
struct IndexEntry {
    category: Option<String>,
}

pub struct Client {
    base_url: String,
    http: reqwest::Client,
    limiter: RateLimiter,
}

impl Client {
    pub fn new(base_url: impl Into<String>, min_interval: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            http: session(),
            limiter: RateLimiter::new(min_interval),
        }
    }

    /// Fetch a passage by reference. `Ok(None)` means Sefaria does not know it.
    pub async fn fetch(&self, reference: &str) -> Result<Option<TextResponse>, RemoteServiceError> {
        let path = format!("api/texts/{}", urlencoding::encode(reference.trim()));
        let payload: TextPayload = self.get(&path, &[("context", "0")]).await?;

        if let Some(error) = payload.error {
            info!("📭 Sefaria has no text for {reference:?}: {error}");
            return Ok(None);
        }

        let hebrew = payload.he.as_ref().and_then(flatten_text);
        let english = payload.text.as_ref().and_then(flatten_text);
        if hebrew.is_none() && english.is_none() {
            return Ok(None);
        }

        Ok(Some(TextResponse {
            reference: payload.reference.unwrap_or_else(|| reference.trim().to_string()),
            hebrew,
            english,
            category: payload.categories.into_iter().next(),
        }))
    }

    /// A random passage, optionally limited to a category.
    pub async fn random(&self, category: Option<&str>) -> Result<Option<TextResponse>, RemoteServiceError> {
        let query: Vec<(&str, &str)> = category.map(|c| vec![("categories", c)]).unwrap_or_default();
        let payload: RandomPayload = self.get("api/texts/random", &query).await?;

        match payload.reference {
            Some(reference) => {
                debug!("Random reference: {reference}");
                self.fetch(&reference).await
            }
            None => Ok(None),
        }
    }

    /// Full-text search, returning at most `limit` hits.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, RemoteServiceError> {
        self.limiter.acquire().await;

        let request = serde_json::json!({
            "query": query,
            "type": "text",
            "field": "naive_lemmatizer",
            "size": limit,
            "source_proj": true,
        });

        let response = self
            .http
            .post(join(&self.base_url, "api/search-wrapper"))
            .json(&request)
            .send()
            .await
            .map_err(transport(SERVICE))?;

        let body: Value = read_json(SERVICE, response).await?;
        Ok(parse_search_hits(&body).into_iter().take(limit).collect())
    }

    /// Today's learning schedule.
    pub async fn calendar(&self) -> Result<Vec<CalendarItem>, RemoteServiceError> {
        let payload: CalendarPayload = self.get("api/calendars", &[]).await?;

        Ok(payload
            .calendar_items
            .into_iter()
            .filter_map(|entry| {
                Some(CalendarItem {
                    title: entry.title.en?,
                    display_value: entry.display_value.and_then(|d| d.en),
                    reference: entry.reference?,
                })
            })
            .collect())
    }

    /// The weekly portion (or the first scheduled item) together with its text.
    pub async fn daily(&self) -> Result<Option<(CalendarItem, TextResponse)>, RemoteServiceError> {
        let items = self.calendar().await?;
        let Some(item) = items
            .iter()
            .find(|i| i.title == WEEKLY_PORTION)
            .or_else(|| items.first())
            .cloned()
        else {
            return Ok(None);
        };

        Ok(self.fetch(&item.reference).await?.map(|text| (item, text)))
    }

    /// Top-level library categories.
    pub async fn categories(&self) -> Result<Vec<String>, RemoteServiceError> {
        let entries: Vec<IndexEntry> = self.get("api/index", &[]).await?;
        Ok(entries.into_iter().filter_map(|e| e.category).collect())
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, RemoteServiceError> {
        self.limiter.acquire().await;

        let response = self
            .http
            .get(join(&self.base_url, path))
            .query(query)
            .send()
            .await
            .map_err(transport(SERVICE))?;

        read_json(SERVICE, response).await
    }
}

/// Sefaria returns a string for a single segment and (nested) arrays for ranges.
fn flatten_text(value: &Value) -> Option<String> {
    fn collect(value: &Value, out: &mut Vec<String>) {
        match value {
            Value::String(s) if !s.trim().is_empty() => out.push(s.trim().to_string()),
            Value::Array(items) => items.iter().for_each(|v| collect(v, out)),
            _ => {}
        }
    }

    let mut lines = Vec::new();
    collect(value, &mut lines);
    if lines.is_empty() { None } else { Some(lines.join("\n")) }
}

fn parse_search_hits(body: &Value) -> Vec<SearchHit> {
    let Some(hits) = body.pointer("/hits/hits").and_then(Value::as_array) else {
        return Vec::new();
    };

    hits.iter()
        .filter_map(|hit| {
            let source = hit.get("_source")?;
            let reference = source.get("ref")?.as_str()?.to_string();
            let highlighted = hit
                .get("highlight")
                .and_then(Value::as_object)
                .and_then(|fields| fields.values().find_map(|v| v.get(0)?.as_str()));
            let snippet = highlighted
                .or_else(|| source.get("exact").and_then(Value::as_str))
                .or_else(|| source.get("naive_lemmatizer").and_then(Value::as_str))
                .unwrap_or_default()
                .to_string();
            Some(SearchHit { reference, snippet })
        })
        .collect()
}
