//! Tracker Client – follows vehicles over the realtime channel.
//!
//! This binary:
//! 1. Reads configuration from `tracker.conf`
//! 2. Builds an in-memory page (detail view and/or dashboard cards)
//! 3. Keeps a websocket to the server open, re-joining after every drop
//! 4. Reads commands from stdin (`join`, `shutdown`, `audio`, `show`, ...)
//!
//! Everything runs on one thread; events are applied strictly in order.

use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use tracker_client::api::ApiClient;
use tracker_client::channel::{ChannelStatus, EventChannel};
use tracker_client::command::Command;
use tracker_client::page::Page;
use tracker_common::config::{self, Config};
use tracker_common::protocol::OutboundFrame;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // ── load config ──────────────────────────────────────────────────
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| Config::default_path().to_string());
    let config = config::load(&PathBuf::from(&config_path)).context("Config load failed")?;

    info!("Tracker Client starting (ws={})", config.ws_url);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Cannot build runtime")?;
    let local = tokio::task::LocalSet::new();
    let result = local.block_on(&runtime, run(config));

    // The stdin reader sits in a blocking thread; don't wait for it.
    drop(local);
    runtime.shutdown_timeout(Duration::from_millis(200));

    info!("Tracker Client stopped");
    result
}

async fn run(config: Config) -> Result<()> {
    let page = Rc::new(Page::new(&config));
    let api = ApiClient::new(&config)?;
    let cancel = CancellationToken::new();

    // ── ctrl-c ───────────────────────────────────────────────────────
    let ctrlc_cancel = cancel.clone();
    ctrlc::set_handler(move || {
        info!("Shutdown signal received");
        ctrlc_cancel.cancel();
    })
    .context("Cannot set Ctrl-C handler")?;

    // ── event channel ────────────────────────────────────────────────
    if let Some(vehicle) = config.vehicle_id.clone() {
        // Sent by the channel once connected.
        page.join(vehicle);
    }
    let (out_tx, out_rx) = mpsc::unbounded_channel::<OutboundFrame>();
    let channel = EventChannel::new(config.ws_url.clone(), config.reconnect_delay());
    let status = channel.status();
    let channel_task =
        tokio::task::spawn_local(channel.run(page.clone(), out_rx, cancel.clone()));

    // ── stdin commands ───────────────────────────────────────────────
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => line,
        };
        match line {
            Ok(Some(line)) if line.trim().is_empty() => continue,
            Ok(Some(line)) => match Command::parse(&line) {
                Ok(Command::Quit) => break,
                Ok(cmd) => execute(cmd, &page, &api, &out_tx, &status).await,
                Err(e) => warn!("{e}"),
            },
            // stdin closed: keep following events until ctrl-c.
            Ok(None) => {
                cancel.cancelled().await;
                break;
            }
            Err(e) => {
                warn!("Cannot read stdin: {e}");
                cancel.cancelled().await;
                break;
            }
        }
    }

    cancel.cancel();
    channel_task.await.context("Event channel task failed")?;
    Ok(())
}

async fn execute(
    cmd: Command,
    page: &Page,
    api: &ApiClient,
    out_tx: &mpsc::UnboundedSender<OutboundFrame>,
    status: &watch::Receiver<ChannelStatus>,
) {
    match cmd {
        Command::Join(vehicle) => {
            let frame = page.join(vehicle);
            if status.borrow().connected {
                out_tx.send(frame).ok();
            }
        }
        Command::Shutdown(vehicle) => match api.toggle_shutdown(&vehicle).await {
            Ok(resp) => page.apply_shutdown_response(&vehicle, &resp),
            Err(e) => {
                warn!("Shutdown toggle for {vehicle} failed: {e:#}");
                page.notify_error(&format!("{e:#}"));
            }
        },
        Command::Audio(vehicle) => match api.toggle_audio(&vehicle).await {
            Ok(resp) => page.apply_audio_response(&vehicle, &resp),
            Err(e) => {
                warn!("Audio toggle for {vehicle} failed: {e:#}");
                page.notify_error(&format!("{e:#}"));
            }
        },
        Command::Status => {
            let s = status.borrow().clone();
            let current = page
                .current()
                .map_or_else(|| "none".to_string(), |v| v.to_string());
            println!(
                "connected={} attempts={} connections={} viewing={current}",
                s.connected, s.attempts, s.connections
            );
        }
        Command::Show => print!("{}", page.render()),
        Command::Quit => {}
    }
}
