//! MCU Mirror - live Mackie Control session state
//!
//! Connects to an MCU-speaking MIDI port, decodes the protocol, and keeps a
//! queryable mixer session aggregate current.

use anyhow::Result;
use clap::Parser;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mcu_mirror::config::AppConfig;
use mcu_mirror::events::EventBus;
use mcu_mirror::feed::SnapshotFeed;
use mcu_mirror::mcu::McuDecoder;
use mcu_mirror::service::run_decode_loop;
use mcu_mirror::sniffer;
use mcu_mirror::state::{ConnectionStatus, SessionMeta, SessionStore};
use mcu_mirror::surface::SurfaceDriver;

/// MCU Mirror - decode Mackie Control traffic into live mixer state
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Run in sniffer mode
    #[arg(long)]
    sniffer: bool,

    /// Port pattern for sniffer mode (name substring or index)
    #[arg(long)]
    port: Option<String>,

    /// List available MIDI ports
    #[arg(long)]
    list_ports: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    init_logging(&args.log_level)?;

    if args.list_ports {
        sniffer::list_ports_formatted();
        return Ok(());
    }

    if args.sniffer {
        sniffer::run_cli_sniffer(args.port.as_deref()).await?;
        return Ok(());
    }

    info!("Starting MCU Mirror...");
    info!("Configuration file: {}", args.config);

    let config = AppConfig::load_or_default(&args.config).await?;

    run_app(config).await?;

    info!("MCU Mirror shutdown complete");
    Ok(())
}

async fn run_app(config: AppConfig) -> Result<()> {
    let store = SessionStore::with_limits(
        config.meters.clip_threshold,
        config.health.stale_after_ms,
    );
    let decoder = McuDecoder::new(store.clone(), config.profile, config.sysex);
    let bus = EventBus::default();

    let mut driver = SurfaceDriver::new(&config);
    driver.connect()?;
    store.touch_meta(SessionMeta::ConnectionStatus(ConnectionStatus::Connected));

    let events_rx = driver
        .take_event_receiver()
        .ok_or_else(|| anyhow::anyhow!("Event receiver already taken"))?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Log decoded events as they flow
    let mut log_rx = bus.subscribe();
    let log_task = tokio::spawn(async move {
        while let Ok(event) = log_rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => info!("{}", json),
                Err(e) => warn!("Failed to serialize event: {}", e),
            }
        }
    });

    let feed = SnapshotFeed::new(store.clone());
    let feed_task = feed.spawn(config.feed.interval_ms);

    let decode_task = tokio::spawn(run_decode_loop(
        events_rx,
        decoder,
        bus.clone(),
        shutdown_rx,
    ));

    info!("Decoding MCU traffic; press Ctrl+C to stop");
    shutdown_signal().await;

    store.touch_meta(SessionMeta::ConnectionStatus(ConnectionStatus::Disconnected));
    let _ = shutdown_tx.send(true);
    decode_task.await?;
    feed_task.abort();
    log_task.abort();
    driver.disconnect();

    Ok(())
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .init();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to install CTRL+C signal handler: {}", e);
    } else {
        info!("Shutdown signal received");
    }
}
