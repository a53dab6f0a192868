//! Hebcal flows: Shabbat times, holidays, Hebrew dates.

use chrono::NaiveDate;
use tracing::warn;

use super::Data;
use super::reply::{Reply, Tone};
use crate::hebcal::upcoming;

/// Holidays considered when looking for upcoming ones.
const HOLIDAY_WINDOW: usize = 20;
const HOLIDAY_DISPLAY_LIMIT: usize = 10;

pub async fn shabbat(data: &Data, location: &str) -> Reply {
    let times = match data.hebcal.shabbat(location).await {
        Ok(Some(times)) => times,
        Ok(None) => {
            return Reply::failure(
                "❌ Location Not Found",
                format!("Could not find Shabbat times for {location}. Try: New York, Jerusalem, London, etc."),
            );
        }
        Err(e) => {
            warn!("Shabbat times failed: {e}");
            return Reply::failure("❌ Error", "Could not retrieve Shabbat times.");
        }
    };

    let mut reply = Reply::new(Tone::Calendar, format!("🕯️ Shabbat Times - {}", times.location));
    if let Some(candles) = times.candle_lighting {
        reply = reply.field("🕯️ Candle Lighting", candles, true);
    }
    if let Some(havdalah) = times.havdalah {
        reply = reply.field("✨ Havdalah", havdalah, true);
    }
    if let Some(parasha) = times.parasha {
        reply = reply.field("📜 Torah Portion", parasha, false);
    }
    reply.footer("Times provided by Hebcal.com")
}

pub async fn holidays(data: &Data, year: i32, today: NaiveDate) -> Reply {
    let events = match data.hebcal.holidays(year).await {
        Ok(events) if !events.is_empty() => events,
        Ok(_) => return Reply::failure("❌ No Holidays Found", "Could not retrieve holiday information."),
        Err(e) => {
            warn!("Holiday list failed: {e}");
            return Reply::failure("❌ Error", "Could not retrieve holiday information.");
        }
    };

    let mut reply = Reply::new(Tone::Info, format!("📅 Jewish Holidays {year}"));
    for holiday in upcoming(&events, today, HOLIDAY_WINDOW, HOLIDAY_DISPLAY_LIMIT) {
        let mut value = format!("**Date:** {}", holiday.day().map(|d| d.to_string()).unwrap_or(holiday.date));
        if let Some(hebrew) = holiday.hebrew.filter(|h| !h.is_empty()) {
            value.push_str(&format!("\n**Hebrew:** {hebrew}"));
        }
        reply = reply.field(holiday.title, value, true);
    }
    reply.footer("Holiday data provided by Hebcal.com")
}

/// Hebrew date for `date`, titled by the caller ("Today's Hebrew Date", ...).
pub async fn hebrew_date(data: &Data, date: NaiveDate, title: &str) -> Reply {
    let converted = match data.hebcal.hebrew_date(date).await {
        Ok(converted) => converted,
        Err(e) => {
            warn!("Hebrew date conversion failed: {e}");
            return Reply::failure("❌ Conversion Failed", "Could not convert to Hebrew date.");
        }
    };

    let mut reply = Reply::new(Tone::Commentary, title)
        .field("Gregorian Date", date.format("%B %d, %Y").to_string(), false)
        .field("Hebrew Date", converted.hebrew, false);
    if let Some(year) = converted.year {
        reply = reply.field("Hebrew Year", year.to_string(), true);
    }
    reply.footer("Date conversion by Hebcal.com")
}
