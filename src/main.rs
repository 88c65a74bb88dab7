mod api;
mod gateway;

use clap::{Parser, Subcommand};
use focus_channels::max::MaxChannel;
use focus_core::{config, traits::Provider};
use focus_memory::ContextStore;
use focus_providers::lmstudio::LmStudioProvider;
use focus_providers::openrouter::OpenRouterProvider;
use focus_sync::SyncStore;
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "focushelper",
    version,
    about = "FocusHelper — Pomodoro focus assistant bot"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml", env = "FOCUSHELPER_CONFIG")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot, the reminder scheduler, and the sync API.
    Start,
    /// Run only the sync/forwarder HTTP service.
    Api,
    /// Check configuration and backend availability.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cfg.bot.log_level.clone())),
        )
        .init();

    match cli.command {
        Commands::Start => {
            let channel = build_channel(&cfg)?;

            let assistant: Arc<dyn Provider> =
                Arc::new(OpenRouterProvider::from_config(&cfg.assistant));
            let lm = Arc::new(LmStudioProvider::from_config(&cfg.lm));
            let contexts = Arc::new(ContextStore::new());
            let sync = Arc::new(SyncStore::new());
            let scheduler = Arc::new(gateway::ReminderScheduler::new(
                channel.clone(),
                &cfg.scheduler,
            ));

            // The sync API shares the store with the bot's handlers.
            if cfg.api.enabled {
                let api_cfg = cfg.api.clone();
                let state = api::ApiState::new(sync.clone(), lm.clone());
                tokio::spawn(async move {
                    api::serve(api_cfg, state).await;
                });
            }

            println!("FocusHelper — starting bot...");
            let gw = Arc::new(gateway::Gateway::new(
                channel,
                assistant,
                lm,
                contexts,
                scheduler,
                sync,
            ));
            gw.run().await?;
        }
        Commands::Api => {
            let lm = Arc::new(LmStudioProvider::from_config(&cfg.lm));
            let sync = Arc::new(SyncStore::new());
            let state = api::ApiState::new(sync, lm);
            api::serve(cfg.api.clone(), state).await;
        }
        Commands::Status => {
            println!("FocusHelper — Status Check\n");
            println!("Config: {}", cli.config);
            println!();

            match cfg.channel.max {
                Some(ref max) => println!(
                    "  max channel: {}",
                    if max.enabled && !max.bot_token.is_empty() {
                        "configured"
                    } else if max.enabled {
                        "enabled but missing bot_token"
                    } else {
                        "disabled"
                    }
                ),
                None => println!("  max channel: not configured"),
            }

            let assistant = OpenRouterProvider::from_config(&cfg.assistant);
            println!(
                "  openrouter: {} ({} model(s) in chain)",
                if assistant.is_available().await {
                    "available"
                } else {
                    "not available"
                },
                cfg.assistant.models.len()
            );

            let lm = LmStudioProvider::from_config(&cfg.lm);
            println!(
                "  lm backend: {} ({} @ {})",
                if lm.is_available().await {
                    "available"
                } else {
                    "not available"
                },
                cfg.lm.model,
                cfg.lm.base_url
            );

            println!(
                "  sync api: {} on {}:{}",
                if cfg.api.enabled { "enabled" } else { "disabled" },
                cfg.api.host,
                cfg.api.port
            );
            println!(
                "  reminders: daily at {:02}:{:02}",
                cfg.scheduler.reminder_hour, cfg.scheduler.reminder_minute
            );
        }
    }

    Ok(())
}

/// Build the configured messaging channel.
fn build_channel(cfg: &config::Config) -> anyhow::Result<Arc<MaxChannel>> {
    let Some(ref max) = cfg.channel.max else {
        anyhow::bail!("No channel configured. Add [channel.max] to config.toml.");
    };
    if !max.enabled {
        anyhow::bail!("Max channel is disabled in config.toml.");
    }
    if max.bot_token.is_empty() {
        anyhow::bail!(
            "Max channel is enabled but bot_token is empty. \
             Set it in config.toml or the BOT_TOKEN env var."
        );
    }
    Ok(Arc::new(MaxChannel::new(max.clone())))
}
