//! # Axiom Focus - event replay driver
//!
//! Feeds a scripted sequence of window manager notifications through the
//! focus core and reports the resulting focus state. Useful for reproducing
//! focus bugs from recorded event logs without a running display server.

use anyhow::{Context, Result};
use axiom_focus::{AxiomFocusConfig, FocusManager, LoggingBackend, SharedFocus, WmEvent};
use clap::Parser;
use log::{debug, error, info};
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(name = "axiom-focus")]
#[command(about = "Replay window manager events through the Axiom focus core")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "~/.config/axiom/focus.toml")]
    config: String,

    /// JSON file holding an array of events to replay
    #[arg(short, long)]
    script: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Print the final focus state as JSON
    #[arg(long)]
    dump: bool,
}

fn build_info() -> String {
    format!(
        "{} ({} built {}, {})",
        axiom_focus::VERSION,
        option_env!("GIT_COMMIT").unwrap_or("unknown"),
        env!("BUILD_DATE"),
        env!("TARGET_TRIPLE")
    )
}

/// Feed events to the focus core one at a time, holding the lock for each
async fn pump(shared: SharedFocus<LoggingBackend>, mut rx: mpsc::Receiver<WmEvent>) -> usize {
    let mut handled = 0;
    while let Some(event) = rx.recv().await {
        let shutdown = event.is_shutdown();
        shared.lock().handle_event(event);
        handled += 1;
        if shutdown {
            break;
        }
    }
    handled
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match AxiomFocusConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration ({:#}), using defaults", e);
            AxiomFocusConfig::default()
        }
    };

    // Initialize logging
    let filter = if cli.debug { "debug" } else { config.log_filter() };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    info!("🎯 Starting Axiom focus core");
    info!("📄 Version: {}", build_info());
    debug!("Configuration: {:?}", config);

    let events = match &cli.script {
        Some(path) => {
            let json = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read event script: {}", path))?;
            axiom_focus::events::load_script(&json)?
        }
        None => {
            info!("📝 No event script given, nothing to replay");
            Vec::new()
        }
    };
    info!("📜 Replaying {} events", events.len());

    let shared = FocusManager::new(LoggingBackend::new(), config).into_shared();
    let (tx, rx) = mpsc::channel(64);

    let producer = tokio::spawn(async move {
        for event in events {
            if tx.send(event).await.is_err() {
                break;
            }
        }
    });
    let handled = pump(Arc::clone(&shared), rx).await;
    if let Err(e) = producer.await {
        error!("❌ Event producer failed: {}", e);
    }

    let manager = shared.lock();
    info!(
        "✅ Processed {} events, focus owner: {:?}, server focus: {:?}",
        handled,
        manager.get_focus(),
        manager.backend().server_focus()
    );

    if cli.dump {
        let json = serde_json::to_string_pretty(&manager.snapshot())
            .context("Failed to serialize focus state")?;
        println!("{}", json);
    }

    info!("👋 Axiom focus core shutting down");
    Ok(())
}
