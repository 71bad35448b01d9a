//! MVN recorder entry point.
//!
//! Wires the UDP receiver to the application state and runs until Ctrl-C.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config            -- CLI path → platform file → defaults
//!  └─ MvnReceiver::start     -- blocking UDP loop on its own thread
//!       └─ handler: blocking_send into a tokio mpsc channel
//!  └─ async event loop       -- statistics, character directory,
//!       │                       optional JSONL session file
//!       └─ ctrl_c            -- stop receiver, log summary, finalize
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use mvn_recorder::application::characters::CharacterDirectory;
use mvn_recorder::application::stats::MessageStats;
use mvn_recorder::infrastructure::network::receiver::MvnReceiver;
use mvn_recorder::infrastructure::network::sink::DecodedFrame;
use mvn_recorder::infrastructure::storage::config;
use mvn_recorder::infrastructure::storage::session::SessionWriter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging.  Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("MVN recorder starting");

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let cfg = config::load_config(config_path.as_deref())
        .context("failed to load configuration")?;
    let receiver_config = cfg.receiver_config();

    // Bridge from the receive thread into this async loop.  `blocking_send`
    // is the right call on a plain OS thread; the error case means this loop
    // is gone, which only happens during shutdown.
    let (tx, mut rx) =
        tokio::sync::mpsc::channel::<DecodedFrame>(cfg.recorder.queue_capacity.max(1));
    let mut receiver = MvnReceiver::with_handler(receiver_config, move |frame: DecodedFrame| {
        let _ = tx.blocking_send(frame);
    });
    receiver.start().context("failed to start receiver")?;

    let bound = receiver
        .local_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|| format!("{}:{}", cfg.network.bind_address, cfg.network.listen_port));

    let mut session = if cfg.recorder.save_frames {
        let writer = SessionWriter::open(Path::new(&cfg.recorder.output_dir), &bound)
            .context("failed to open session file")?;
        Some(writer)
    } else {
        None
    };

    let mut stats = MessageStats::new();
    let mut directory = CharacterDirectory::new();

    info!("MVN recorder ready.  Press Ctrl-C to exit.");

    loop {
        tokio::select! {
            maybe_frame = rx.recv() => {
                // None means every sender is gone, i.e. the receiver was
                // torn down; nothing more will arrive.
                let Some(frame) = maybe_frame else { break };
                stats.record(frame.kind);
                directory.observe(frame.header.character_id, &frame.message);
                if let Some(writer) = session.as_mut() {
                    if let Err(e) = writer.append_frame(&frame.header, frame.kind, &frame.message) {
                        error!("failed to record frame: {e}");
                    }
                }
            }
            result = tokio::signal::ctrl_c() => {
                match result {
                    Ok(()) => info!("shutdown signal received"),
                    Err(e) => error!("failed to listen for shutdown signal: {e}"),
                }
                break;
            }
        }
    }

    receiver.stop();

    info!(
        frames = stats.total(),
        characters = directory.len(),
        "reception summary: {}",
        stats.describe()
    );
    for id in directory.ids() {
        info!(character_id = id, name = %directory.display_name(id), "character seen");
    }

    if let Some(writer) = session.take() {
        match writer.finalize(&stats, &directory.ids()) {
            Ok(path) => info!(path = %path.display(), "session saved"),
            Err(e) => error!("failed to finalize session file: {e}"),
        }
    }

    info!("MVN recorder stopped");
    Ok(())
}
