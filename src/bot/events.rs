//! Gateway events outside of application commands.

use poise::serenity_prelude as serenity;
use tracing::{info, warn};

use super::{CommandError, Data, conversation};

pub async fn handle(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    framework: poise::FrameworkContext<'_, Data, CommandError>,
    data: &Data,
) -> Result<(), CommandError> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            info!(
                "🤖 {} is connected to {} guild(s)",
                data_about_bot.user.name,
                data_about_bot.guilds.len()
            );
            ctx.set_presence(
                Some(serenity::ActivityData::listening("Jewish wisdom | /help")),
                serenity::OnlineStatus::Online,
            );
        }
        serenity::FullEvent::Message { new_message } => {
            reply_to_mention(ctx, new_message, framework.bot_id, data).await;
        }
        _ => {}
    }
    Ok(())
}

/// Answer a message that @mentions the bot, unless the guild turned this off.
async fn reply_to_mention(ctx: &serenity::Context, message: &serenity::Message, bot_id: serenity::UserId, data: &Data) {
    if message.author.bot || !message.mentions_user_id(bot_id) {
        return;
    }

    let guild_id = message.guild_id.map(|g| g.get());
    let channel_id = message.channel_id.get();
    info!("💬 Mention from {} in channel {channel_id}", message.author.name);

    let typing = message.channel_id.start_typing(&ctx.http);
    let text = conversation::mention_reply(data, guild_id, channel_id, &message.content).await;
    typing.stop();

    let Some(text) = text else {
        return;
    };
    if let Err(e) = message.reply(ctx, text).await {
        warn!("Could not reply to mention in channel {channel_id}: {e}");
    }
}
