use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod api;

mod config;
use config::HooklineConfig;

mod cors;
mod events;
mod server;
mod store;

mod webhooks;
use webhooks::github::signing;

#[derive(Parser)]
#[command(version)]
struct Opts {
    /// Configuration file for hookline
    #[arg(short, long, env = "HOOKLINE_CONFIG")]
    config: Option<PathBuf>,

    /// Secret shared with GitHub, overrides the configuration file
    #[arg(long, env = "WEBHOOK_SECRET", hide_env_values = true)]
    webhook_secret: Option<String>,

    /// PostgreSQL connection string, overrides the configuration file
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print the X-Hub-Signature-256 header GitHub would send for a payload, then exit
    Sign {
        /// File containing the exact request body
        payload: PathBuf,
    },
}

#[rocket::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let opts = Opts::parse();
    let config = HooklineConfig::load(opts.config.as_deref())?
        .with_overrides(opts.webhook_secret, opts.database_url);

    if let Some(Command::Sign { payload }) = opts.command {
        let secret = signing::effective_secret(config.webhook_secret.as_deref())
            .context("no webhook secret configured, deliveries don't need a signature")?;
        let body = fs::read(&payload)
            .with_context(|| format!("couldn't read {}", payload.display()))?;
        println!("{}", signing::sign(&body, secret));
        return Ok(());
    }

    if signing::effective_secret(config.webhook_secret.as_deref()).is_none() {
        warn!("no webhook secret configured, signatures won't be verified: do not run this in production");
    }

    let store = store::connect(config.database_url.as_deref(), config.store_timeout())
        .await
        .context("couldn't open event store")?;

    info!("serving the latest {} events", config.events_limit);
    let rocket = server::build(&config, store);
    rocket.launch().await.map_err(|err| anyhow::anyhow!(err))?;

    Ok(())
}
