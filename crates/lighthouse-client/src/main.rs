//! Lighthouse demo client.
//!
//! Connects to a Lighthouse server, logs every input event the web interface
//! streams back, and paints the whole display in a new colour once per second
//! until Ctrl+C is pressed.
//!
//! ```text
//! main()
//!  ├─ connect_websocket()      -- one WebSocket, shared by every request
//!  ├─ stream task              -- STREAM of the user's model, logged
//!  └─ paint loop               -- PUT of a solid frame every second
//! ```
//!
//! Credentials come from the command line or the environment:
//!
//! ```text
//! LIGHTHOUSE_USERNAME=alice LIGHTHOUSE_TOKEN=API-TOK_... lighthouse-demo
//! ```

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use futures_util::StreamExt;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use lighthouse_client::domain::config::DEFAULT_URL;
use lighthouse_client::{connect_websocket, ClientConfig, Lighthouse};
use lighthouse_core::{Authentication, Color, Frame};

/// Colours the paint loop cycles through.
const PALETTE: [Color; 6] = [
    Color::RED,
    Color::YELLOW,
    Color::GREEN,
    Color::CYAN,
    Color::BLUE,
    Color::MAGENTA,
];

const PAINT_INTERVAL: Duration = Duration::from_secs(1);

// ── CLI ───────────────────────────────────────────────────────────────────────

/// Paints the Lighthouse display and logs input events.
#[derive(Debug, Parser)]
#[command(
    name = "lighthouse-demo",
    about = "Paints a Lighthouse model and logs the input events streamed back",
    version
)]
struct Cli {
    /// Lighthouse user name.
    #[arg(short, long, env = "LIGHTHOUSE_USERNAME")]
    username: String,

    /// API token of the user (shown on the Lighthouse web interface).
    #[arg(short, long, env = "LIGHTHOUSE_TOKEN", hide_env_values = true)]
    token: String,

    /// WebSocket URL of the server.
    #[arg(long, default_value = DEFAULT_URL, env = "LIGHTHOUSE_URL")]
    url: String,
}

impl Cli {
    fn into_client_config(self) -> ClientConfig {
        ClientConfig::new(Authentication::new(self.username, self.token)).with_url(self.url)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_client_config();
    let url = config.url.clone();

    info!("connecting to {url}");
    let lighthouse = connect_websocket(config)
        .await
        .with_context(|| format!("failed to connect to {url}"))?;
    info!("connected as {}", lighthouse.authentication().username);

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("failed to listen for Ctrl+C: {e}");
                return;
            }
            info!("Ctrl+C received, stopping");
            running.store(false, Ordering::SeqCst);
        });
    }

    let stream_task = tokio::spawn(log_input_events(lighthouse.clone()));

    paint(&lighthouse, &running).await;

    stream_task.abort();
    info!("lighthouse-demo stopped");
    Ok(())
}

// ── Tasks ─────────────────────────────────────────────────────────────────────

/// Puts a solid frame every [`PAINT_INTERVAL`] until `running` is cleared.
async fn paint(lighthouse: &Lighthouse, running: &AtomicBool) {
    for color in PALETTE.iter().cycle() {
        if !running.load(Ordering::SeqCst) {
            break;
        }
        match lighthouse.put_model(Frame::fill(*color)).await {
            Ok(_) => debug!("painted {color:?}"),
            Err(e) => warn!("PUT failed: {e}"),
        }
        tokio::time::sleep(PAINT_INTERVAL).await;
    }
}

/// Logs every message streamed for the user's model.
async fn log_input_events(lighthouse: Lighthouse) {
    let mut stream = match lighthouse.stream_model().await {
        Ok(stream) => stream,
        Err(e) => {
            warn!("STREAM failed: {e}");
            return;
        }
    };
    info!("streaming model (request {})", stream.request_id());

    while let Some(msg) = stream.next().await {
        if let Err(e) = msg.check() {
            warn!("stream error: {e}");
            continue;
        }
        match msg.payload.as_input_event() {
            Some(event) => info!("input event: {event:?}"),
            None => debug!("stream message without input event: {:?}", msg.payload),
        }
    }
    info!("model stream ended");
}

// ── Tests ─────────────────────────────────────────────────────────────────────
