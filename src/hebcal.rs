//! Hebcal calendar client: Shabbat times, holidays and Hebrew date conversion.

use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::RemoteServiceError;
use crate::http::{join, read_json, session, transport};
use crate::rate_limit::RateLimiter;

pub const SERVICE: &str = "hebcal";
pub const DEFAULT_BASE_URL: &str = "https://www.hebcal.com";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CalendarEvent {
    pub title: String,
    #[serde(default)]
    pub category: String,
    /// Hebcal sends either `YYYY-MM-DD` or a full RFC 3339 timestamp.
    #[serde(default)]
    pub date: String,
    pub hebrew: Option<String>,
}

impl CalendarEvent {
    pub fn day(&self) -> Option<NaiveDate> {
        self.date.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShabbatTimes {
    pub location: String,
    pub candle_lighting: Option<String>,
    pub havdalah: Option<String>,
    pub parasha: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HebrewDate {
    pub hebrew: String,
    #[serde(rename = "hy")]
    pub year: Option<i64>,
}

#[derive(Deserialize)]
struct EventsPayload {
    #[serde(default)]
    items: Vec<CalendarEvent>,
    location: Option<LocationPayload>,
}

#[derive(Deserialize)]
struct LocationPayload {
    title: Option<String>,
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

    /// This week's candle lighting and havdalah for a city. `Ok(None)` when
    /// Hebcal does not recognise the city.
    pub async fn shabbat(&self, city: &str) -> Result<Option<ShabbatTimes>, RemoteServiceError> {
        let payload: EventsPayload = self
            .get("shabbat", &[("cfg", "json"), ("geo", "city"), ("city", city), ("M", "on")])
            .await?;

        if payload.items.is_empty() {
            return Ok(None);
        }

        let mut times = ShabbatTimes {
            location: payload
                .location
                .and_then(|l| l.title)
                .unwrap_or_else(|| city.to_string()),
            candle_lighting: None,
            havdalah: None,
            parasha: None,
        };

        for item in payload.items {
            match item.category.as_str() {
                "candles" if times.candle_lighting.is_none() => times.candle_lighting = Some(item.title),
                "havdalah" => times.havdalah = Some(item.title),
                "parashat" => times.parasha = Some(item.title),
                _ => {}
            }
        }

        Ok(Some(times))
    }

    /// Major and minor holidays for a Gregorian year.
    pub async fn holidays(&self, year: i32) -> Result<Vec<CalendarEvent>, RemoteServiceError> {
        let year = year.to_string();
        let payload: EventsPayload = self
            .get(
                "hebcal",
                &[("v", "1"), ("cfg", "json"), ("maj", "on"), ("min", "on"), ("mod", "on"), ("year", year.as_str())],
            )
            .await?;
        Ok(payload.items)
    }

    /// Convert a Gregorian date to the Hebrew calendar.
    pub async fn hebrew_date(&self, date: NaiveDate) -> Result<HebrewDate, RemoteServiceError> {
        let (year, month, day) = (date.year().to_string(), date.month().to_string(), date.day().to_string());
        let converted: HebrewDate = self
            .get(
                "converter",
                &[("cfg", "json"), ("gy", year.as_str()), ("gm", month.as_str()), ("gd", day.as_str()), ("g2h", "1")],
            )
            .await?;

        if converted.hebrew.trim().is_empty() {
            return Err(RemoteServiceError::Empty { service: SERVICE });
        }
        Ok(converted)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, RemoteServiceError> {
        self.limiter.acquire().await;
        debug!("Hebcal request: {path}");

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

/// Up to `limit` events on or after `today`, looking only at the first
/// `window` entries. Falls back to the first `limit` entries when none qualify.
pub fn upcoming(events: &[CalendarEvent], today: NaiveDate, window: usize, limit: usize) -> Vec<CalendarEvent> {
    let upcoming: Vec<CalendarEvent> = events
        .iter()
        .take(window)
        .filter(|e| e.day().is_some_and(|d| d >= today))
        .take(limit)
        .cloned()
        .collect();

    if upcoming.is_empty() {
        events.iter().take(limit).cloned().collect()
    } else {
        upcoming
    }
}
