use std::path::PathBuf;
use std::sync::Arc;

use ai_client::OpenAi;
use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use discord_client::DiscordClient;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use moodscan_common::Config;
use moodscan_scout::{
    classifier::SentimentClassifier,
    scanner::{ScanSettings, Scanner},
    status::{LogPublisher, StatusRouter, WebhookPublisher},
};

#[derive(Parser)]
#[command(name = "moodscan", about = "Periodic sentiment scan of Discord channels")]
struct Cli {
    /// Load environment variables from this file instead of ./.env
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Run a single scan immediately and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.env_file {
        Some(ref path) => {
            dotenvy::from_path(path)?;
        }
        None => {
            dotenvy::dotenv().ok();
        }
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("moodscan=info".parse()?))
        .init();

    info!("moodscan starting...");

    let config = Config::from_env()?;
    config.log_redacted();

    let discord = Arc::new(DiscordClient::new(config.discord_token.clone()));

    let mut ai = OpenAi::new(&config.openai_api_key, &config.classifier_model);
    if let Some(ref url) = config.openai_base_url {
        ai = ai.with_base_url(url);
    }
    let classifier = SentimentClassifier::new(ai, config.max_output_tokens, config.classify_timeout);

    // Status goes to the log, plus a Discord webhook if configured
    let mut router = StatusRouter::new().with("log", LogPublisher);
    match config.status_webhook_url {
        Some(ref url) => {
            info!("Status webhook enabled");
            router = router.with("webhook", WebhookPublisher::new(discord.clone(), url.clone()));
        }
        None => info!("No STATUS_WEBHOOK_URL set, status goes to the log only"),
    }

    // A single scan looks back one interval; the loop starts its window now
    let now = Utc::now();
    let start = if cli.once {
        now - chrono::Duration::from_std(config.scan_interval)?
    } else {
        now
    };

    let mut scanner = Scanner::new(
        ScanSettings::from_config(&config),
        discord,
        Arc::new(classifier),
        Arc::new(router),
        start,
    )?;

    if cli.once {
        let outcome = scanner.run_once().await;
        info!(%outcome, "moodscan finished");
        return Ok(());
    }

    scanner.run(shutdown_signal()).await;
    info!(stats = %scanner.stats(), "moodscan stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C, running until killed");
        std::future::pending::<()>().await;
    }
}
