//! Discord side of the bot: shared state, the poise framework, and the
//! command flows behind it.

pub mod calendar;
pub mod commands;
pub mod conversation;
pub mod events;
pub mod lookup;
pub mod params;
pub mod reply;


use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::{assistant, hebcal, sefaria};
use reply::Reply;

pub type CommandError = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, CommandError>;

/// State shared by every command invocation and event.
pub struct Data {
    pub sefaria: sefaria::Client,
    pub hebcal: hebcal::Client,
    /// `None` when no API key is configured.
    pub assistant: Option<assistant::Client>,
    /// Per-guild mention auto-reply switch. Guilds not listed are enabled.
    auto_reply: RwLock<HashMap<u64, bool>>,
}

impl Data {
    pub fn new(config: &Config) -> Self {
        let assistant = config.openai_api_key.clone().map(|key| {
            assistant::Client::new(key, config.openai_base_url.clone(), config.openai_model.clone())
        });
        if assistant.is_none() {
            warn!("OPENAI_API_KEY not set, conversation features are disabled");
        }

        Self {
            sefaria: sefaria::Client::new(config.sefaria_base_url.clone(), config.min_interval),
            hebcal: hebcal::Client::new(config.hebcal_base_url.clone(), config.min_interval),
            assistant,
            auto_reply: RwLock::new(HashMap::new()),
        }
    }

    pub async fn auto_reply_enabled(&self, guild_id: u64) -> bool {
        self.auto_reply.read().await.get(&guild_id).copied().unwrap_or(true)
    }

    pub async fn set_auto_reply(&self, guild_id: u64, enabled: bool) {
        self.auto_reply.write().await.insert(guild_id, enabled);
    }
}

pub fn commands() -> Vec<poise::Command<Data, CommandError>> {
    vec![
        commands::random(),
        commands::search(),
        commands::text(),
        commands::daily(),
        commands::commentary(),
        commands::categories(),
        commands::shabbat(),
        commands::holidays(),
        commands::hebrew_date(),
        commands::ask(),
        commands::autoreply(),
        commands::set_prompt(),
        commands::help(),
        commands::search_sefaria(),
        commands::message_hebrew_date(),
    ]
}

/// Build the framework. Commands are registered globally once the gateway
/// reports ready.
pub fn framework(data: Data) -> poise::Framework<Data, CommandError> {
    poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: commands(),
            on_error: |error| Box::pin(on_error(error)),
            pre_command: |ctx| {
                Box::pin(async move {
                    info!(
                        "📥 /{} from {} in channel {}",
                        ctx.command().qualified_name,
                        ctx.author().name,
                        ctx.channel_id()
                    );
                })
            },
            post_command: |ctx| {
                Box::pin(async move {
                    info!("✅ /{} done", ctx.command().qualified_name);
                })
            },
            event_handler: |ctx, event, framework, data| Box::pin(events::handle(ctx, event, framework, data)),
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                info!("Registered {} application commands", framework.options().commands.len());
                Ok(data)
            })
        })
        .build()
}

async fn on_error(error: poise::FrameworkError<'_, Data, CommandError>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start the bot: {error}");
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("/{} failed: {error}", ctx.command().qualified_name);
            let reply = Reply::failure("❌ Error", "Something went wrong running that command.").ephemeral();
            if let Err(e) = ctx.send(reply.into_create_reply()).await {
                warn!("Could not report the failure to the user: {e}");
            }
        }
        poise::FrameworkError::MissingUserPermissions { ctx, .. } => {
            info!("{} lacks permissions for /{}", ctx.author().name, ctx.command().qualified_name);
            if let Err(e) = ctx.send(Reply::permission_denied().into_create_reply()).await {
                warn!("Could not report the missing permission: {e}");
            }
        }
        other => {
            if let Err(e) = poise::builtins::on_error(other).await {
                error!("Error while handling error: {e}");
            }
        }
    }
}
