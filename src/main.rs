mod gateway;
mod stats;

use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;

use stride_channels::MaxChannel;
use stride_core::config;
use stride_core::traits::Extractor;
use stride_memory::{cache, ContextStore, DraftCache, KvCache, MemoryCache, Store};
use stride_nlp::OllamaExtractor;

use gateway::Gateway;

#[derive(Parser)]
#[command(name = "stride", version, about = "Stride — task and habit assistant bot")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot.
    Start,
    /// Check configuration and storage health.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Commands::Start => {
            let cfg = config::load(&cli.config)?;

            let store = Store::new(&cfg.memory).await?;

            let channel = Arc::new(MaxChannel::new(&cfg.max)?);
            let updates = channel.start();

            let extractor: Option<Arc<dyn Extractor>> = if cfg.nlp.enabled {
                Some(Arc::new(OllamaExtractor::new(&cfg.nlp)?))
            } else {
                tracing::info!("NLP disabled, free-text tasks will use the raw text as title");
                None
            };

            let kv: Arc<dyn KvCache> = Arc::new(MemoryCache::new());
            let context = ContextStore::new(
                kv.clone(),
                Duration::from_secs(cfg.cache.context_ttl_days * 24 * 3600),
            );
            let draft_ttl = Duration::from_secs(cfg.cache.draft_ttl_secs);
            let task_drafts = DraftCache::new(kv.clone(), cache::PENDING_TASK_PREFIX, draft_ttl);
            let habit_drafts = DraftCache::new(kv.clone(), cache::PENDING_HABIT_PREFIX, draft_ttl);

            let gateway = Arc::new(Gateway::new(
                channel,
                extractor,
                store,
                context,
                task_drafts,
                habit_drafts,
                cfg.sweeps.clone(),
            ));

            gateway.run(updates).await
        }
        Commands::Status => {
            let cfg = config::load(&cli.config)?;
            println!("config:     ok ({})", cli.config);
            println!(
                "max token:  {}",
                if cfg.max.resolve_token().is_some() { "set" } else { "MISSING" }
            );
            println!(
                "nlp:        {}",
                if cfg.nlp.enabled { cfg.nlp.model.as_str() } else { "disabled" }
            );
            match Store::new(&cfg.memory).await {
                Ok(store) => {
                    let chats = store.all_chat_ids().await?;
                    println!(
                        "storage:    ok ({}, {} chats)",
                        cfg.memory.db_path,
                        chats.len()
                    );
                }
                Err(e) => println!("storage:    ERROR: {e}"),
            }
            Ok(())
        }
    }
}
