use anyhow::{Context, Result};
use reelscopy_rs::{logging::CaptionLogFormatter, ConfigManager, ReelsCopyApp};
use std::env;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const API_KEY_VARS: [&str; 3] = ["GEMINI_API_KEY", "GOOGLE_API_KEY", "API_KEY"];

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reelscopy_rs=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .event_format(CaptionLogFormatter::new()),
        )
        .init();

    info!("🚀 reelscopy-rs starting up!");
    info!("{}", "=".repeat(50));

    // Load configuration
    let config_manager = ConfigManager::load()?;
    config_manager.start_watching();
    let config = config_manager.get();
    info!("✅ Configuration loaded");
    info!("   Model: {}", config.gemini.model);
    info!("   Timeout: {:?}", config.request_timeout());
    info!("   Clipboard: {}", config.clipboard_enabled);

    let api_key = read_api_key()?;
    let app = ReelsCopyApp::new(config_manager, api_key)?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    #[cfg(unix)]
    {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("Failed to set up SIGTERM handler")?;

        tokio::spawn(async move {
            tokio::select! {
                _ = signal::ctrl_c() => {
                    info!("Received SIGINT (Ctrl+C)");
                }
                _ = sigterm.recv() => {
                    info!("Received SIGTERM");
                }
            }

            let _ = shutdown_tx.send(());
        });
    }

    #[cfg(not(unix))]
    {
        tokio::spawn(async move {
            if signal::ctrl_c().await.is_ok() {
                info!("Received SIGINT (Ctrl+C)");
            }
            let _ = shutdown_tx.send(());
        });
    }

    let outcome = tokio::select! {
        result = app.run() => result,
        _ = shutdown_rx => {
            info!("Shutdown signal received");
            Ok(())
        }
    };

    if let Err(e) = &outcome {
        error!("App error: {:#}", e);
    }

    info!("👋 Shutdown complete");

    outcome
}

fn read_api_key() -> Result<String> {
    API_KEY_VARS
        .iter()
        .find_map(|name| {
            env::var(name)
                .ok()
                .filter(|value| !value.trim().is_empty())
        })
        .with_context(|| format!("Set one of {} to reach Gemini", API_KEY_VARS.join(", ")))
}
