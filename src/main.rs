use std::sync::Arc;

use poise::serenity_prelude as serenity;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::prelude::*;

use sefaria_bot::Config;
use sefaria_bot::bot::{self, Data};
use sefaria_bot::health;

#[tokio::main]
async fn main() {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    // Setup logging
    if let Err(e) = std::fs::create_dir_all(&config.log_dir) {
        eprintln!("Cannot create log directory {}: {e}", config.log_dir.display());
        std::process::exit(1);
    }
    let log_file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.log_file())
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Cannot open log file {}: {e}", config.log_file().display());
            std::process::exit(1);
        }
    };
    let (non_blocking, _guard) = tracing_appender::non_blocking(log_file);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .init();

    info!("🚀 Starting sefaria-bot...");
    info!("Sefaria: {}, Hebcal: {}", config.sefaria_base_url, config.hebcal_base_url);
    info!("Text-service spacing: {:?}", config.min_interval);
    if config.conversation_enabled() {
        info!("Conversation enabled ({})", config.openai_model);
    }

    let framework = bot::framework(Data::new(&config));
    // Messages that mention the bot carry their content without the privileged intent.
    let intents = serenity::GatewayIntents::non_privileged();
    let mut client = match serenity::ClientBuilder::new(&config.discord_token, intents)
        .framework(framework)
        .await
    {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to create Discord client: {e}");
            std::process::exit(1);
        }
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);

    let health_task = config.port.map(|port| {
        tokio::spawn(async move {
            if let Err(e) = health::serve(port, shutdown_rx).await {
                error!("Liveness endpoint failed: {e}");
            }
        })
    });

    let shard_manager = Arc::clone(&client.shard_manager);
    let signal_tx = Arc::clone(&shutdown_tx);
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("🛑 Shutdown requested");
        signal_tx.send_replace(true);
        shard_manager.shutdown_all().await;
    });

    if let Err(e) = client.start().await {
        error!("Discord client stopped with an error: {e}");
    }

    info!("Closing HTTP sessions");
    shutdown_tx.send_replace(true);
    if let Some(task) = health_task
        && let Err(e) = task.await
    {
        warn!("Liveness task ended abnormally: {e}");
    }
    info!("👋 Bye");
}

async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
                return;
            }
            Err(e) => warn!("Cannot listen for SIGTERM: {e}"),
        }
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl-C: {e}");
    }
}
