//! Embed replies, kept as plain data until they are sent so flows can be tested
//! without a Discord connection.

use poise::serenity_prelude as serenity;

use crate::error::ValidationError;
use crate::format::{EMBED_DESCRIPTION_LIMIT, EMBED_FIELD_LIMIT, EMBED_FOOTER_LIMIT, EMBED_TITLE_LIMIT, truncate};

/// Discord allows 25 fields per embed.
const MAX_FIELDS: usize = 25;

/// Embed colour by intent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tone {
    #[default]
    Info,
    Success,
    Notice,
    Failure,
    Commentary,
    Calendar,
}

impl Tone {
    fn colour(self) -> serenity::Colour {
        let rgb = match self {
            Self::Info => 0x3498db,
            Self::Success => 0x2ecc71,
            Self::Notice => 0xe67e22,
            Self::Failure => 0xe74c3c,
            Self::Commentary => 0x9b59b6,
            Self::Calendar => 0xf1c40f,
        };
        serenity::Colour::new(rgb)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    pub title: Option<String>,
    pub description: Option<String>,
    pub fields: Vec<Field>,
    pub footer: Option<String>,
    pub tone: Tone,
    pub ephemeral: bool,
}

impl Reply {
    pub fn new(tone: Tone, title: impl AsRef<str>) -> Self {
        Self {
            title: Some(truncate(title.as_ref(), EMBED_TITLE_LIMIT)),
            tone,
            ..Default::default()
        }
    }

    /// Red embed used when something went wrong on our side or remotely.
    pub fn failure(title: impl AsRef<str>, description: impl AsRef<str>) -> Self {
        Self::new(Tone::Failure, title).description(description)
    }

    /// Rejected input. Only the invoking user sees it.
    pub fn invalid(error: &ValidationError) -> Self {
        Self::failure("❌ Invalid Input", &error.message).ephemeral()
    }

    pub fn permission_denied() -> Self {
        Self::failure(
            "❌ Permission Denied",
            "Only server administrators can use this command.",
        )
        .ephemeral()
    }

    pub fn description(mut self, description: impl AsRef<str>) -> Self {
        self.description = Some(truncate(description.as_ref(), EMBED_DESCRIPTION_LIMIT));
        self
    }

    /// Add a field. Fields past Discord's limit are dropped.
    pub fn field(mut self, name: impl AsRef<str>, value: impl AsRef<str>, inline: bool) -> Self {
        if self.fields.len() < MAX_FIELDS {
            let value = value.as_ref().trim();
            self.fields.push(Field {
                name: truncate(name.as_ref(), EMBED_TITLE_LIMIT),
                // Discord rejects empty field values.
                value: if value.is_empty() {
                    "\u{200b}".to_string()
                } else {
                    truncate(value, EMBED_FIELD_LIMIT)
                },
                inline,
            });
        }
        self
    }

    pub fn footer(mut self, footer: impl AsRef<str>) -> Self {
        self.footer = Some(truncate(footer.as_ref(), EMBED_FOOTER_LIMIT));
        self
    }

    pub fn ephemeral(mut self) -> Self {
        self.ephemeral = true;
        self
    }

    pub fn retitle(mut self, title: impl AsRef<str>) -> Self {
        self.title = Some(truncate(title.as_ref(), EMBED_TITLE_LIMIT));
        self
    }

    pub fn tone(mut self, tone: Tone) -> Self {
        self.tone = tone;
        self
    }

    /// All visible text, for logging and assertions.
    pub fn text(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        parts.extend(self.title.as_deref());
        parts.extend(self.description.as_deref());
        for field in &self.fields {
            parts.push(&field.name);
            parts.push(&field.value);
        }
        parts.extend(self.footer.as_deref());
        parts.join("\n")
    }

    fn embed(&self) -> serenity::CreateEmbed {
        let mut embed = serenity::CreateEmbed::new().colour(self.tone.colour());
        if let Some(title) = &self.title {
            embed = embed.title(title);
        }
        if let Some(description) = &self.description {
            embed = embed.description(description);
        }
        embed = embed.fields(
            self.fields
                .iter()
                .map(|f| (f.name.clone(), f.value.clone(), f.inline)),
        );
        if let Some(footer) = &self.footer {
            embed = embed.footer(serenity::CreateEmbedFooter::new(footer));
        }
        embed
    }

    pub fn into_create_reply(self) -> poise::CreateReply {
        poise::CreateReply::default()
            .embed(self.embed())
            .ephemeral(self.ephemeral)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits_are_applied() {
        let reply = Reply::new(Tone::Info, "t".repeat(300))
            .description("d".repeat(5000))
            .field("name", "v".repeat(2000), false)
            .footer("f".repeat(3000));
        assert!(reply.title.as_ref().unwrap().chars().count() <= EMBED_TITLE_LIMIT);
        assert!(reply.description.as_ref().unwrap().chars().count() <= EMBED_DESCRIPTION_LIMIT);
        assert!(reply.fields[0].value.chars().count() <= EMBED_FIELD_LIMIT);
        assert!(reply.footer.as_ref().unwrap().chars().count() <= EMBED_FOOTER_LIMIT);
    }

    #[test]
    fn test_field_cap() {
        let reply = (0..30).fold(Reply::new(Tone::Info, "many"), |r, i| {
            r.field(i.to_string(), "x", true)
        });
        assert_eq!(reply.fields.len(), MAX_FIELDS);
    }

    #[test]
    fn test_empty_field_value_is_placeholder() {
        let reply = Reply::new(Tone::Info, "t").field("empty", "  ", false);
        assert_eq!(reply.fields[0].value, "\u{200b}");
    }

    #[test]
    fn test_invalid_is_ephemeral() {
        let reply = Reply::invalid(&ValidationError::new("nope"));
        assert!(reply.ephemeral);
        assert_eq!(reply.tone, Tone::Failure);
        assert!(reply.text().contains("nope"));
    }
}
