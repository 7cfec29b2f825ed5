mod actions;
mod conditions;
mod config;
mod dates;
mod db;
mod engine;
mod error;
mod gateway;
mod gmail;
mod labels;
mod models;
mod rules;
mod store;
mod sync;

use crate::config::Config;
use crate::engine::RuleEngine;
use crate::gmail::GmailClient;
use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: gmail-rules [--fetch] [--dry-run] [--debug] [--limit N]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        println!("{}", USAGE);
        return Ok(());
    }
    let debug_logging = args.iter().any(|arg| arg == "--debug");
    let dry_run = args.iter().any(|arg| arg == "--dry-run");
    let fetch = args.iter().any(|arg| arg == "--fetch");

    let default_level = if debug_logging { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = Config::load()?;
    let limit = match args.iter().position(|arg| arg == "--limit") {
        Some(i) => args
            .get(i + 1)
            .and_then(|v| v.parse().ok())
            .with_context(|| format!("--limit expects a number\n{}", USAGE))?,
        None => config.rules_limit,
    };

    let db = db::Database::new(&config.database_url())
        .await
        .context("Failed to open database")?;
    db.run_migrations().await?;
    let db = Arc::new(db);

    let gmail = match (&config.access_token, dry_run) {
        (Some(token), false) => Some(Arc::new(GmailClient::with_access_token(token.clone())?)),
        (None, false) => {
            warn!("GMAIL_ACCESS_TOKEN not set, running rules in dry-run mode");
            None
        }
        (_, true) => None,
    };

    if fetch {
        match &gmail {
            Some(client) => {
                sync::fetch_and_store(
                    client.as_ref(),
                    db.as_ref(),
                    config.fetch_batch_size,
                    &config.default_labels,
                )
                .await?;
            }
            None => warn!("Skipping fetch: no Gmail access"),
        }
    }

    let mut engine = RuleEngine::new(db, &config.rules_file);
    if let Some(client) = gmail {
        engine = engine.with_gateway(client);
    }

    info!(rules = %config.rules_file.display(), limit, dry_run = engine.is_dry_run(), "Running rules");
    let total = engine.apply(limit).await?;
    println!("{}", total);

    Ok(())
}
