//! Text-service flows: every function turns already-validated parameters into
//! replies. Remote failures become a fixed fallback reply and a log line.

use tracing::{info, warn};

use super::Data;
use super::params::Commentator;
use super::reply::{Reply, Tone};
use crate::error::RemoteServiceError;
use crate::format::{EMBED_DESCRIPTION_LIMIT, Language, format_passage, strip_markup, truncate};
use crate::sefaria::TextResponse;

pub const FETCH_FAILED: &str = "An error occurred while fetching the text.";
pub const SEARCH_FAILED: &str = "An error occurred while searching.";
pub const CATEGORIES_FAILED: &str = "An error occurred while fetching categories.";

const SEARCH_REQUEST_SIZE: usize = 20;
const SEARCH_DISPLAY_LIMIT: usize = 10;
const SNIPPET_LENGTH: usize = 100;
const CATEGORY_DISPLAY_LIMIT: usize = 20;
const MENU_SEARCH_INPUT: usize = 100;
const MENU_SEARCH_RESULTS: usize = 3;

fn remote_failure(operation: &str, error: &RemoteServiceError, message: &str) -> Reply {
    warn!("{operation} failed: {error}");
    Reply::failure("❌ Error", message)
}

/// Render a passage in the requested language.
pub fn passage(text: &TextResponse, language: Language) -> Reply {
    let body = format_passage(
        text.hebrew.as_deref(),
        text.english.as_deref(),
        language,
        EMBED_DESCRIPTION_LIMIT,
    );
    let footer = match &text.category {
        Some(category) => format!("{category} • Source: Sefaria.org"),
        None => "Source: Sefaria.org".to_string(),
    };

    Reply::new(Tone::Info, format!("📜 {}", text.reference))
        .description(body)
        .footer(footer)
}

/// `/text`: the passage, then the commentary when one was asked for.
pub async fn text(
    data: &Data,
    reference: &str,
    language: Language,
    commentary: Option<Commentator>,
) -> Vec<Reply> {
    let main = match data.sefaria.fetch(reference).await {
        Ok(Some(text)) => passage(&text, language),
        Ok(None) => {
            return vec![Reply::failure(
                "❌ Text Not Found",
                format!("Could not find text for reference: **{reference}**"),
            )];
        }
        Err(e) => return vec![remote_failure("Text lookup", &e, FETCH_FAILED)],
    };

    let mut replies = vec![main];
    if let Some(commentator) = commentary {
        let reply = match fetch_commentary(data, reference, commentator, language).await {
            Ok(Some(reply)) => reply,
            Ok(None) => Reply::new(Tone::Notice, "ℹ️ Commentary Unavailable")
                .description(format!("{commentator} commentary not available for {reference}"))
                .ephemeral(),
            Err(e) => remote_failure("Commentary lookup", &e, FETCH_FAILED),
        };
        replies.push(reply);
    }
    replies
}

async fn fetch_commentary(
    data: &Data,
    reference: &str,
    commentator: Commentator,
    language: Language,
) -> Result<Option<Reply>, RemoteServiceError> {
    let commentary_ref = commentator.reference_for(reference);
    info!("📖 Looking up {commentary_ref}");

    Ok(data.sefaria.fetch(&commentary_ref).await?.map(|text| {
        passage(&text, language)
            .retitle(format!("📖 {commentator} on {reference}"))
            .tone(Tone::Commentary)
    }))
}

/// `/commentary`: a commentator's remarks on a verse.
pub async fn commentary(
    data: &Data,
    reference: &str,
    commentator: Commentator,
    language: Language,
) -> Reply {
    match fetch_commentary(data, reference, commentator, language).await {
        Ok(Some(reply)) => reply,
        Ok(None) => Reply::failure(
            "❌ Commentary Not Found",
            format!("Could not find {commentator} commentary on {reference}"),
        ),
        Err(e) => remote_failure("Commentary lookup", &e, "An error occurred while fetching the commentary."),
    }
}

/// `/random`: a random passage, optionally within a category.
pub async fn random(data: &Data, language: Language, category: Option<&str>) -> Reply {
    match data.sefaria.random(category).await {
        Ok(Some(text)) => passage(&text, language),
        Ok(None) => Reply::failure(
            "❌ No Text Found",
            "Could not retrieve a random text at this time.",
        ),
        Err(e) => remote_failure("Random text", &e, FETCH_FAILED),
    }
}

/// `/search`: one hit shows the passage itself, several are listed.
pub async fn search(data: &Data, query: &str, language: Language) -> Reply {
    let hits = match data.sefaria.search(query, SEARCH_REQUEST_SIZE).await {
        Ok(hits) => hits,
        Err(e) => return remote_failure("Search", &e, SEARCH_FAILED),
    };

    if hits.is_empty() {
        return Reply::new(Tone::Notice, "🔍 No Results")
            .description(format!("No texts found for query: **{query}**"));
    }

    if let [hit] = hits.as_slice() {
        match data.sefaria.fetch(&hit.reference).await {
            Ok(Some(text)) => return passage(&text, language),
            Ok(None) => {}
            Err(e) => warn!("Fetching the only search hit failed, listing it instead: {e}"),
        }
    }

    let mut reply = Reply::new(Tone::Info, "🔍 Search Results")
        .description(format!("Found {} results for: **{query}**", hits.len()));
    for (i, hit) in hits.iter().take(SEARCH_DISPLAY_LIMIT).enumerate() {
        reply = reply.field(
            format!("{}. {}", i + 1, hit.reference),
            truncate(&strip_markup(&hit.snippet), SNIPPET_LENGTH),
            false,
        );
    }
    if hits.len() > SEARCH_DISPLAY_LIMIT {
        reply = reply.field(
            "📝 Note",
            format!("Showing first {SEARCH_DISPLAY_LIMIT} of {} results", hits.len()),
            false,
        );
    }
    reply
}

/// "Search Sefaria" message menu: a short, private search on a message's text.
pub async fn search_message(data: &Data, content: &str) -> Reply {
    let content = content.trim();
    if content.is_empty() {
        return Reply::failure("❌ Nothing to Search", "No searchable text found in this message.").ephemeral();
    }
    let query: String = content.chars().take(MENU_SEARCH_INPUT).collect();

    let hits = match data.sefaria.search(&query, MENU_SEARCH_RESULTS).await {
        Ok(hits) => hits,
        Err(e) => return remote_failure("Message search", &e, SEARCH_FAILED).ephemeral(),
    };

    let mut reply = if hits.is_empty() {
        Reply::new(Tone::Notice, "🔍 Sefaria Search Results").description(format!("No results found for: *{query}*"))
    } else {
        Reply::new(Tone::Info, "🔍 Sefaria Search Results").description(format!("Results for: *{query}*"))
    };
    for (i, hit) in hits.iter().take(MENU_SEARCH_RESULTS).enumerate() {
        let snippet = strip_markup(&hit.snippet);
        reply = reply.field(
            format!("{}. {}", i + 1, hit.reference),
            if snippet.is_empty() { "No text available".to_string() } else { truncate(&snippet, SNIPPET_LENGTH) },
            false,
        );
    }
    reply.footer("Use /search for more detailed searches").ephemeral()
}

/// `/daily`: today's Torah portion.
pub async fn daily(data: &Data) -> Reply {
    match data.sefaria.daily().await {
        Ok(Some((item, text))) => {
            let label = item.display_value.unwrap_or(item.title);
            passage(&text, Language::Both).retitle(format!("📅 Daily Text - {label} ({})", text.reference))
        }
        Ok(None) => Reply::failure("❌ No Daily Text", "Could not retrieve today's text."),
        Err(e) => remote_failure("Daily text", &e, "An error occurred while fetching the daily text."),
    }
}

/// `/categories`: the library's top-level categories.
pub async fn categories(data: &Data) -> Reply {
    let categories = match data.sefaria.categories().await {
        Ok(categories) if !categories.is_empty() => categories,
        Ok(_) => return Reply::failure("❌ No Categories", "Could not retrieve category list."),
        Err(e) => return remote_failure("Category list", &e, CATEGORIES_FAILED),
    };

    let listing = categories
        .iter()
        .take(CATEGORY_DISPLAY_LIMIT)
        .map(|c| format!("• {c}"))
        .collect::<Vec<_>>()
        .join("\n");

    let mut reply = Reply::new(Tone::Success, "📂 Available Text Categories")
        .description("Use these categories with the `/random` command")
        .field("Categories", listing, false);
    if categories.len() > CATEGORY_DISPLAY_LIMIT {
        reply = reply.field(
            "📝 Note",
            format!("Showing first {CATEGORY_DISPLAY_LIMIT} of {} categories", categories.len()),
            false,
        );
    }
    reply
}
