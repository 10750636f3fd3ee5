mod bootstrap;

use anyhow::Result;
use chrono::Utc;
use liwa_core::config::{AppConfig, LoadOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

fn init_logging(config: &AppConfig) {
    use liwa_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let mut app = bootstrap::bootstrap_with_config(config).await?;

    tracing::info!(event_name = "server_started", "liwa reservation agent started");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    stdout.write_all(b"> ").await?;
    stdout.flush().await?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    stdout.write_all(b"> ").await?;
                    stdout.flush().await?;
                    continue;
                }

                let today = Utc::now().date_naive();
                match app.orchestrator.handle_turn(trimmed, today).await {
                    Ok(reply) => {
                        stdout.write_all(reply.as_bytes()).await?;
                        stdout.write_all(b"\n> ").await?;
                        stdout.flush().await?;
                    }
                    Err(error) => {
                        tracing::error!(event_name = "turn_failed", error = %error);
                        stdout
                            .write_all(b"Something went wrong on our side. Please try again.\n> ")
                            .await?;
                        stdout.flush().await?;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    tracing::info!(event_name = "server_stopping", "liwa reservation agent stopping");
    app.db_pool.close().await;

    Ok(())
}
