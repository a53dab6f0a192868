//! Slash commands and message context menus.
//!
//! Each command validates its parameters before deferring, so rejected input
//! gets a private message and never reaches a remote service.

use chrono::{Datelike, Local};
use poise::serenity_prelude as serenity;

use super::params::{self, Commentator};
use super::reply::{Reply, Tone};
use super::{CommandError, Context, calendar, conversation, lookup};
use crate::error::ValidationError;
use crate::format::Language;

async fn send(ctx: Context<'_>, reply: Reply) -> Result<(), CommandError> {
    ctx.send(reply.into_create_reply()).await?;
    Ok(())
}

async fn reject(ctx: Context<'_>, error: ValidationError) -> Result<(), CommandError> {
    tracing::info!("Rejected /{} input: {}", ctx.command().qualified_name, error);
    send(ctx, Reply::invalid(&error)).await
}

/// Get a random Jewish text quote
#[poise::command(slash_command)]
pub async fn random(
    ctx: Context<'_>,
    #[description = "Language preference (hebrew, english, or both)"] language: Option<String>,
    #[description = "Text category (torah, talmud, mishnah, etc.)"] category: Option<String>,
) -> Result<(), CommandError> {
    let parsed = Language::parse(language.as_deref())
        .and_then(|language| Ok((language, params::category(category.as_deref())?)));
    let (language, category) = match parsed {
        Ok(parsed) => parsed,
        Err(e) => return reject(ctx, e).await,
    };

    ctx.defer().await?;
    send(ctx, lookup::random(ctx.data(), language, category.as_deref()).await).await
}

/// Search for specific texts or passages
#[poise::command(slash_command)]
pub async fn search(
    ctx: Context<'_>,
    #[description = "Search term or text reference"] query: String,
    #[description = "Language preference (hebrew, english, or both)"] language: Option<String>,
) -> Result<(), CommandError> {
    let parsed = params::search_query(&query)
        .and_then(|query| Ok((query, Language::parse(language.as_deref())?)));
    let (query, language) = match parsed {
        Ok(parsed) => parsed,
        Err(e) => return reject(ctx, e).await,
    };

    ctx.defer().await?;
    send(ctx, lookup::search(ctx.data(), query, language).await).await
}

/// Get a specific text by reference with optional commentary
#[poise::command(slash_command)]
pub async fn text(
    ctx: Context<'_>,
    #[description = "Text reference (e.g., 'Genesis 1:1', 'Berakhot 2a')"] reference: String,
    #[description = "Language preference (hebrew, english, or both)"] language: Option<String>,
    #[description = "Include commentary (rashi, ibn_ezra, ramban, ralbag, sforno, radak, or none)"]
    commentary: Option<String>,
) -> Result<(), CommandError> {
    let parsed = params::reference(&reference).and_then(|reference| {
        Ok((
            reference,
            Language::parse(language.as_deref())?,
            Commentator::parse_optional(commentary.as_deref())?,
        ))
    });
    let (reference, language, commentary) = match parsed {
        Ok(parsed) => parsed,
        Err(e) => return reject(ctx, e).await,
    };

    ctx.defer().await?;
    for reply in lookup::text(ctx.data(), reference, language, commentary).await {
        send(ctx, reply).await?;
    }
    Ok(())
}

/// Get commentary (Rashi, Ibn Ezra, etc.) on a verse
#[poise::command(slash_command)]
pub async fn commentary(
    ctx: Context<'_>,
    #[description = "Bible verse reference (e.g., Genesis 1:1)"] reference: String,
    #[description = "Commentator (rashi, ibn_ezra, ramban, ralbag, sforno, radak)"] commentator: Option<String>,
    #[description = "Language preference (hebrew, english, or both)"] language: Option<String>,
) -> Result<(), CommandError> {
    let parsed = params::reference(&reference).and_then(|reference| {
        let commentator = match commentator.as_deref().map(str::trim) {
            None | Some("") => Commentator::Rashi,
            Some(name) => name.parse()?,
        };
        Ok((reference, commentator, Language::parse(language.as_deref())?))
    });
    let (reference, commentator, language) = match parsed {
        Ok(parsed) => parsed,
        Err(e) => return reject(ctx, e).await,
    };

    ctx.defer().await?;
    send(ctx, lookup::commentary(ctx.data(), reference, commentator, language).await).await
}

/// Get the daily Torah portion or study text
#[poise::command(slash_command)]
pub async fn daily(ctx: Context<'_>) -> Result<(), CommandError> {
    ctx.defer().await?;
    send(ctx, lookup::daily(ctx.data()).await).await
}

/// List available text categories
#[poise::command(slash_command)]
pub async fn categories(ctx: Context<'_>) -> Result<(), CommandError> {
    ctx.defer().await?;
    send(ctx, lookup::categories(ctx.data()).await).await
}

/// Get Shabbat candle lighting and havdalah times
#[poise::command(slash_command)]
pub async fn shabbat(
    ctx: Context<'_>,
    #[description = "City name (e.g., New York, Jerusalem, London)"] location: Option<String>,
) -> Result<(), CommandError> {
    let location = match params::location(location.as_deref()) {
        Ok(location) => location,
        Err(e) => return reject(ctx, e).await,
    };

    ctx.defer().await?;
    send(ctx, calendar::shabbat(ctx.data(), location).await).await
}

/// Get upcoming Jewish holidays
#[poise::command(slash_command)]
pub async fn holidays(
    ctx: Context<'_>,
    #[description = "Year (e.g., 2025). Defaults to current year"] year: Option<i32>,
) -> Result<(), CommandError> {
    let today = Local::now().date_naive();
    let year = match params::year(year, today.year()) {
        Ok(year) => year,
        Err(e) => return reject(ctx, e).await,
    };

    ctx.defer().await?;
    send(ctx, calendar::holidays(ctx.data(), year, today).await).await
}

/// Get today's Hebrew date
#[poise::command(slash_command, rename = "hebrewdate")]
pub async fn hebrew_date(ctx: Context<'_>) -> Result<(), CommandError> {
    ctx.defer().await?;
    let today = Local::now().date_naive();
    send(ctx, calendar::hebrew_date(ctx.data(), today, "📅 Today's Hebrew Date").await).await
}

/// Ask the AI study companion a question
#[poise::command(slash_command)]
pub async fn ask(
    ctx: Context<'_>,
    #[description = "Your question about Jewish texts"] question: String,
) -> Result<(), CommandError> {
    let question = match params::question(&question) {
        Ok(question) => question,
        Err(e) => return reject(ctx, e).await,
    };

    ctx.defer().await?;
    send(ctx, conversation::ask(ctx.data(), ctx.channel_id().get(), question).await).await
}

/// [ADMIN] Toggle auto-reply to @mentions on/off
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR",
    default_member_permissions = "ADMINISTRATOR"
)]
pub async fn autoreply(
    ctx: Context<'_>,
    #[description = "Enable or disable auto-reply (true/false)"] enabled: bool,
) -> Result<(), CommandError> {
    let Some(guild_id) = ctx.guild_id() else {
        return send(ctx, Reply::permission_denied()).await;
    };
    send(ctx, conversation::set_auto_reply(ctx.data(), guild_id.get(), enabled).await).await
}

/// Set the AI system prompt for this channel (admin only)
#[poise::command(
    slash_command,
    rename = "setprompt",
    required_permissions = "ADMINISTRATOR",
    default_member_permissions = "ADMINISTRATOR"
)]
pub async fn set_prompt(
    ctx: Context<'_>,
    #[description = "The new system prompt for the AI"] prompt: String,
) -> Result<(), CommandError> {
    let prompt = match params::instruction(&prompt) {
        Ok(prompt) => prompt,
        Err(e) => return reject(ctx, e).await,
    };
    send(ctx, conversation::set_instruction(ctx.data(), ctx.channel_id().get(), prompt).await).await
}

/// Show help information for Sefaria bot commands
#[poise::command(slash_command)]
pub async fn help(ctx: Context<'_>) -> Result<(), CommandError> {
    send(ctx, help_reply()).await
}

/// Search Sefaria for the text of a message
#[poise::command(context_menu_command = "Search Sefaria")]
pub async fn search_sefaria(
    ctx: Context<'_>,
    message: serenity::Message,
) -> Result<(), CommandError> {
    if message.content.trim().is_empty() {
        return send(ctx, lookup::search_message(ctx.data(), "").await).await;
    }
    ctx.defer_ephemeral().await?;
    send(ctx, lookup::search_message(ctx.data(), &message.content).await).await
}

/// Get the Hebrew date a message was sent
#[poise::command(context_menu_command = "Get Hebrew Date")]
pub async fn message_hebrew_date(
    ctx: Context<'_>,
    message: serenity::Message,
) -> Result<(), CommandError> {
    ctx.defer_ephemeral().await?;

    let sent_at = message.timestamp.unix_timestamp();
    let Some(date) = chrono::DateTime::from_timestamp(sent_at, 0).map(|dt| dt.date_naive()) else {
        return send(ctx, Reply::failure("❌ Error", "Could not read the message date.").ephemeral()).await;
    };

    let reply = calendar::hebrew_date(ctx.data(), date, "📅 Hebrew Date Information")
        .await
        .field("🕐 Time Sent", format!("<t:{sent_at}:f>"), false)
        .footer("Use /hebrewdate for today's Hebrew date")
        .ephemeral();
    send(ctx, reply).await
}

pub fn help_reply() -> Reply {
    Reply::new(Tone::Info, "📚 Sefaria Bot Help")
        .description("Access Jewish texts and wisdom from the Sefaria library")
        .field(
            "🎲 /random",
            "Get a random Jewish text quote\n`language`: hebrew, english, or both\n`category`: torah, talmud, mishnah, etc.",
            false,
        )
        .field(
            "🔍 /search",
            "Search for specific texts or passages\n`query`: Search term or text reference\n`language`: hebrew, english, or both",
            false,
        )
        .field(
            "📖 /text",
            "Get a specific text by reference\n`reference`: e.g., 'Genesis 1:1', 'Berakhot 2a'\n`language`: hebrew, english, or both\n`commentary`: rashi, ibn_ezra, ramban, ralbag, sforno, radak, or none",
            false,
        )
        .field("📅 /daily", "Get the daily Torah portion or study text", false)
        .field(
            "📖 /commentary",
            "Get commentary on a verse\n`reference`: e.g., 'Genesis 1:1'\n`commentator`: rashi, ibn_ezra, ramban, ralbag, sforno, radak\n`language`: hebrew, english, or both",
            false,
        )
        .field("📂 /categories", "List available text categories", false)
        .field(
            "🕯️ /shabbat",
            "Get Shabbat candle lighting and havdalah times\n`location`: e.g., 'New York', 'Jerusalem', 'London'",
            false,
        )
        .field("📅 /holidays", "Get upcoming Jewish holidays\n`year`: Optional year (defaults to current)", false)
        .field("📅 /hebrewdate", "Get today's Hebrew date conversion", false)
        .field("💬 /ask", "Ask the AI study companion a question (or just @mention the bot)", false)
        .field("🔧 /autoreply [ADMIN]", "Toggle auto-reply to @mentions on/off\n`enabled`: true or false", false)
        .field("📝 /setprompt [ADMIN]", "Set the AI instruction for this channel\n`prompt`: the new instruction", false)
        .field("ℹ️ Data Sources", "Texts: Sefaria.org • Calendar: Hebcal.com", false)
        .footer("Bot created with ❤️ for Torah study")
}
