//! Conversational flows: `/ask`, mention auto-replies, and their settings.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{info, warn};

use super::Data;
use super::reply::{Reply, Tone};
use crate::assistant::APOLOGY;
use crate::format::{EMBED_DESCRIPTION_LIMIT, MESSAGE_LIMIT, truncate};

pub const DISABLED: &str = "AI conversation is not configured for this bot.";

const PROMPT_PREVIEW_LENGTH: usize = 200;

static MENTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<@!?\d+>").unwrap());

/// Ask the assistant, substituting the apology on any failure.
async fn answer(data: &Data, channel_id: u64, text: &str, limit: usize) -> Option<String> {
    let assistant = data.assistant.as_ref()?;
    let reply = match assistant.converse(channel_id, text).await {
        Ok(reply) => reply,
        Err(e) => {
            warn!("Conversation in channel {channel_id} failed: {e}");
            APOLOGY.to_string()
        }
    };
    Some(truncate(&reply, limit))
}

/// `/ask`: one exchange with the assistant.
pub async fn ask(data: &Data, channel_id: u64, question: &str) -> Reply {
    match answer(data, channel_id, question, EMBED_DESCRIPTION_LIMIT).await {
        Some(text) => Reply::new(Tone::Info, "💬 Answer")
            .description(text)
            .field("Question", question, false),
        None => Reply::failure("❌ Unavailable", DISABLED).ephemeral(),
    }
}

/// Reply text for a message that mentioned the bot, or `None` when the bot
/// should stay quiet.
pub async fn mention_reply(data: &Data, guild_id: Option<u64>, channel_id: u64, content: &str) -> Option<String> {
    if data.assistant.is_none() {
        return None;
    }
    if let Some(guild_id) = guild_id
        && !data.auto_reply_enabled(guild_id).await
    {
        return None;
    }

    let text = strip_mentions(content);
    if text.is_empty() {
        return Some("Hi! Ask me anything about Jewish texts, or try /help.".to_string());
    }

    answer(data, channel_id, &text, MESSAGE_LIMIT).await
}

/// `/setprompt`: replace the current channel's instruction.
pub async fn set_instruction(data: &Data, channel_id: u64, instruction: &str) -> Reply {
    let Some(assistant) = data.assistant.as_ref() else {
        return Reply::failure("❌ Unavailable", DISABLED).ephemeral();
    };

    assistant.set_instruction(channel_id, instruction).await;

    let preview = if instruction.chars().count() > PROMPT_PREVIEW_LENGTH {
        let head: String = instruction.chars().take(PROMPT_PREVIEW_LENGTH).collect();
        format!("{head}...")
    } else {
        instruction.to_string()
    };

    Reply::new(Tone::Success, "✅ AI Prompt Updated")
        .description("The AI system prompt for this channel has been updated.")
        .field("New Prompt Preview", preview, false)
}

/// `/autoreply`: toggle mention replies for a guild.
pub async fn set_auto_reply(data: &Data, guild_id: u64, enabled: bool) -> Reply {
    data.set_auto_reply(guild_id, enabled).await;
    info!("🔧 Auto-reply {} for guild {guild_id}", if enabled { "enabled" } else { "disabled" });

    let (status, tone, note_name, note) = if enabled {
        (
            "enabled",
            Tone::Success,
            "ℹ️ How it works",
            "Bot will respond to @mentions with AI-powered conversations about Jewish texts.",
        )
    } else {
        (
            "disabled",
            Tone::Notice,
            "ℹ️ Note",
            "Bot will only respond to slash commands, not @mentions.",
        )
    };

    Reply::new(tone, "🔧 Auto-Reply Settings Updated")
        .description(format!("Auto-reply to @mentions has been **{status}** for this server."))
        .field(note_name, note, false)
}

pub fn strip_mentions(content: &str) -> String {
    MENTION.replace_all(content, "").trim().to_string()
}
