//! UDP receiver for the MVN network stream.
//!
//! Binds a `std::net::UdpSocket` to the configured endpoint and runs the
//! receive loop on a dedicated OS thread.  Every datagram goes through the
//! same pipeline:
//!
//! ```text
//! recv_from
//!   └─ decode_header          -- 24-byte MXTP header
//!   └─ continuity check       -- sample-counter diagnostics (log only)
//!   └─ ReassemblyTracker      -- buffers fragments, emits complete payloads
//!   └─ decode_payload         -- kind-specific typed decode
//!   └─ DispatchSink           -- handler callback or bounded queue
//! ```
//!
//! Per-datagram failures are logged and the loop moves on; a malformed
//! packet never takes the receiver down.
//!
//! # Why a blocking thread instead of async? (for beginners)
//!
//! The stream is a firehose of small datagrams (up to 240 per second per
//! character).  A plain blocking `recv_from` with a read timeout is the
//! simplest loop that can observe a shutdown flag, needs no runtime, and
//! keeps decode latency flat.  Async buys nothing here because there is
//! exactly one socket.
//!
//! # Read timeout
//!
//! The socket is given a read timeout so the loop wakes periodically even
//! when no data arrives.  Each wake-up re-checks the `running` flag and
//! sweeps stale reassembly entries, which is what makes `stop()` and
//! fragment eviction work.

use std::collections::{HashMap, HashSet};
use std::net::{IpAddr, SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use mvn_core::protocol::messages::{DEFAULT_PORT, MAX_DATAGRAM_SIZE};
use mvn_core::protocol::reassembly::DEFAULT_STALENESS_WINDOW;
use mvn_core::{decode_header, decode_payload, MessageKind, MvnError, ReassemblyTracker};

use super::sink::{DecodedFrame, DispatchSink, FrameHandler, FrameQueue};

// ── Errors ────────────────────────────────────────────────────────────────────

/// Error type for receiver lifecycle operations.
#[derive(Debug, Error)]
pub enum ReceiverError {
    /// The configured bind address is not a valid IP address.
    #[error("invalid bind address {addr:?}: {source}")]
    InvalidBindAddress {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },

    /// The UDP socket could not be bound.
    #[error("failed to bind UDP socket on {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The socket was bound but could not be configured.
    #[error("failed to configure UDP socket: {source}")]
    SocketConfigFailed {
        #[source]
        source: std::io::Error,
    },

    /// The receive thread could not be spawned.
    #[error("failed to spawn receive thread: {source}")]
    ThreadSpawnFailed {
        #[source]
        source: std::io::Error,
    },

    /// `start()` was called while the receiver was already running.
    #[error("receiver is already running")]
    AlreadyRunning,
}

// ── Configuration ─────────────────────────────────────────────────────────────

/// Runtime settings for one receiver instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiverConfig {
    /// IP address to bind to.  `"0.0.0.0"` binds all interfaces.
    pub bind_address: String,
    /// UDP port to listen on.  Port 0 requests an ephemeral port.
    pub port: u16,
    /// Size of the receive buffer handed to `recv_from`.
    pub receive_buffer_bytes: usize,
    /// Socket read timeout; bounds how quickly `stop()` is observed.
    pub socket_timeout: Duration,
    /// How long an incomplete fragment set may sit before eviction.
    pub staleness_window: Duration,
    /// Capacity of the frame queue in queue mode.
    pub queue_capacity: usize,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        ReceiverConfig {
            bind_address: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            receive_buffer_bytes: MAX_DATAGRAM_SIZE,
            socket_timeout: Duration::from_secs(1),
            staleness_window: DEFAULT_STALENESS_WINDOW,
            queue_capacity: 1000,
        }
    }
}

// ── Receiver ──────────────────────────────────────────────────────────────────

/// UDP stream receiver.
///
/// Construct with [`MvnReceiver::with_handler`] (callback mode) or
/// [`MvnReceiver::with_queue`] (queue mode), then drive the lifecycle with
/// [`start`](MvnReceiver::start) and [`stop`](MvnReceiver::stop).  The
/// dispatch mode is fixed for the lifetime of the instance.
pub struct MvnReceiver {
    config: ReceiverConfig,
    sink: DispatchSink,
    queue: Option<Arc<FrameQueue>>,
    running: Arc<AtomicBool>,
    worker: Option<std::thread::JoinHandle<()>>,
    exit_rx: Option<mpsc::Receiver<()>>,
    local_addr: Option<SocketAddr>,
}

impl MvnReceiver {
    /// Creates a callback-mode receiver.  `handler` is invoked on the
    /// receive thread for every decoded frame.
    pub fn with_handler<H>(config: ReceiverConfig, handler: H) -> Self
    where
        H: FrameHandler + 'static,
    {
        let handler: Arc<Mutex<dyn FrameHandler>> = Arc::new(Mutex::new(handler));
        Self::from_parts(config, DispatchSink::Handler(handler), None)
    }

    /// Creates a queue-mode receiver.  Decoded frames are buffered in a
    /// bounded queue drained with [`next_frame`](MvnReceiver::next_frame).
    pub fn with_queue(config: ReceiverConfig) -> Self {
        let queue = Arc::new(FrameQueue::new(config.queue_capacity));
        Self::from_parts(config, DispatchSink::Queue(Arc::clone(&queue)), Some(queue))
    }

    fn from_parts(
        config: ReceiverConfig,
        sink: DispatchSink,
        queue: Option<Arc<FrameQueue>>,
    ) -> Self {
        MvnReceiver {
            config,
            sink,
            queue,
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
            exit_rx: None,
            local_addr: None,
        }
    }

    /// Binds the socket and starts the receive thread.
    ///
    /// # Errors
    ///
    /// Returns [`ReceiverError::AlreadyRunning`] on a second `start`,
    /// [`ReceiverError::InvalidBindAddress`] / [`ReceiverError::BindFailed`]
    /// when the endpoint cannot be bound, and
    /// [`ReceiverError::ThreadSpawnFailed`] when the OS refuses the thread.
    pub fn start(&mut self) -> Result<(), ReceiverError> {
        if self.running.load(Ordering::Relaxed) {
            return Err(ReceiverError::AlreadyRunning);
        }

        let ip: IpAddr =
            self.config
                .bind_address
                .parse()
                .map_err(|source| ReceiverError::InvalidBindAddress {
                    addr: self.config.bind_address.clone(),
                    source,
                })?;
        let addr = SocketAddr::new(ip, self.config.port);

        let socket =
            UdpSocket::bind(addr).map_err(|source| ReceiverError::BindFailed { addr, source })?;
        socket
            .set_read_timeout(Some(self.config.socket_timeout))
            .map_err(|source| ReceiverError::SocketConfigFailed { source })?;
        let local = socket
            .local_addr()
            .map_err(|source| ReceiverError::SocketConfigFailed { source })?;

        self.running.store(true, Ordering::Relaxed);
        let (exit_tx, exit_rx) = mpsc::channel();
        let running = Arc::clone(&self.running);
        let sink = self.sink.clone();
        let staleness_window = self.config.staleness_window;
        let buffer_bytes = self.config.receive_buffer_bytes;

        let worker = match std::thread::Builder::new()
            .name("mvn-receiver".to_string())
            .spawn(move || {
                run_receive_loop(socket, buffer_bytes, staleness_window, running, sink, exit_tx)
            }) {
            Ok(handle) => handle,
            Err(source) => {
                self.running.store(false, Ordering::Relaxed);
                return Err(ReceiverError::ThreadSpawnFailed { source });
            }
        };

        self.worker = Some(worker);
        self.exit_rx = Some(exit_rx);
        self.local_addr = Some(local);
        info!(addr = %local, "receiver listening");
        Ok(())
    }

    /// Signals the receive thread to stop and waits for it with a bounded
    /// timeout.  A thread that fails to stop in time is reported with a
    /// warning and detached; queued frames are discarded either way.
    pub fn stop(&mut self) {
        if !self.running.swap(false, Ordering::Relaxed) {
            return;
        }

        // The loop notices the cleared flag at its next read timeout, so
        // give it one full timeout plus margin before declaring it stuck.
        let join_timeout = self.config.socket_timeout + Duration::from_millis(500);
        if let Some(exit_rx) = self.exit_rx.take() {
            match exit_rx.recv_timeout(join_timeout) {
                Ok(()) => {
                    if let Some(worker) = self.worker.take() {
                        let _ = worker.join();
                    }
                }
                Err(_) => {
                    warn!(
                        timeout_ms = join_timeout.as_millis() as u64,
                        "receive thread did not stop within the join timeout; detaching"
                    );
                    self.worker.take();
                }
            }
        }

        if let Some(queue) = &self.queue {
            queue.clear();
        }
        self.local_addr = None;
        info!("receiver stopped");
    }

    /// Whether the receive thread is currently running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// The bound socket address, available between `start()` and `stop()`.
    /// A port-0 bind reports the ephemeral port the OS assigned.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Queue mode: waits up to `timeout` for the next frame.  Always `None`
    /// in callback mode.
    pub fn next_frame(&self, timeout: Duration) -> Option<DecodedFrame> {
        self.queue.as_ref().and_then(|queue| queue.pop_timeout(timeout))
    }

    /// Queue mode: number of frames waiting.  Always 0 in callback mode.
    pub fn queue_depth(&self) -> usize {
        self.queue.as_ref().map_or(0, |queue| queue.len())
    }

    /// Queue mode: discards all waiting frames.  No-op in callback mode.
    pub fn clear_queue(&self) {
        if let Some(queue) = &self.queue {
            queue.clear();
        }
    }
}

impl Drop for MvnReceiver {
    fn drop(&mut self) {
        self.stop();
    }
}

// ── Receive loop ──────────────────────────────────────────────────────────────

fn run_receive_loop(
    socket: UdpSocket,
    buffer_bytes: usize,
    staleness_window: Duration,
    running: Arc<AtomicBool>,
    sink: DispatchSink,
    exit_tx: mpsc::Sender<()>,
) {
    let mut buffer = vec![0u8; buffer_bytes];
    let mut tracker = ReassemblyTracker::new(staleness_window);
    let mut last_counters: HashMap<u8, u32> = HashMap::new();
    let mut seen_characters: HashSet<u8> = HashSet::new();
    let mut frames_dispatched: u64 = 0;

    while running.load(Ordering::Relaxed) {
        tracker.evict_stale();

        match socket.recv_from(&mut buffer) {
            Ok((len, peer)) => {
                match process_datagram(
                    &buffer[..len],
                    peer,
                    &mut tracker,
                    &mut last_counters,
                    &mut seen_characters,
                ) {
                    Ok(Some(frame)) => {
                        debug!(
                            kind = ?frame.kind,
                            sample_counter = frame.header.sample_counter,
                            character_id = frame.header.character_id,
                            "dispatching frame"
                        );
                        frames_dispatched += 1;
                        sink.dispatch(frame);
                    }
                    Ok(None) => {}
                    Err(e) => error!(peer = %peer, error = %e, "failed to process datagram"),
                }
            }
            Err(e) if is_timeout_error(&e) => continue,
            Err(e) => {
                error!("socket receive error: {e}");
                // Back off briefly so a persistent fault cannot spin the CPU.
                if running.load(Ordering::Relaxed) {
                    std::thread::sleep(Duration::from_millis(100));
                }
            }
        }
    }

    info!(
        frames_dispatched,
        characters = seen_characters.len(),
        "receive loop stopped"
    );
    let _ = exit_tx.send(());
}

/// Runs one datagram through header decode, reassembly, and payload decode.
///
/// Returns `Ok(Some(frame))` when the datagram completed a message,
/// `Ok(None)` when it was buffered as a partial fragment or dropped as a
/// deprecated kind, and `Err` for anything malformed.
fn process_datagram(
    bytes: &[u8],
    peer: SocketAddr,
    tracker: &mut ReassemblyTracker,
    last_counters: &mut HashMap<u8, u32>,
    seen_characters: &mut HashSet<u8>,
) -> Result<Option<DecodedFrame>, MvnError> {
    let (header, header_len) = decode_header(bytes)?;

    if seen_characters.insert(header.character_id) {
        info!(character_id = header.character_id, peer = %peer, "character connected");
    }

    // Continuity diagnostics only.  Datagrams are never reordered or
    // dropped on the strength of the counter.
    match last_counters.get(&header.character_id) {
        Some(&last) if header.sample_counter < last => {
            debug!(
                character_id = header.character_id,
                last,
                current = header.sample_counter,
                "sample counter decreased; new recording started"
            );
        }
        Some(&last) => {
            let missed = header.sample_counter.saturating_sub(last).saturating_sub(1);
            if missed > 0 {
                debug!(
                    character_id = header.character_id,
                    missed, "gap in sample counters"
                );
            }
        }
        None => {}
    }
    last_counters.insert(header.character_id, header.sample_counter);

    let Some(payload) = tracker.submit(&header, &bytes[header_len..])? else {
        return Ok(None);
    };

    let Some(kind) = header.kind() else {
        if MessageKind::is_deprecated_code(header.kind_code()) {
            debug!(code = header.kind_code(), "dropping deprecated message kind");
            return Ok(None);
        }
        return Err(MvnError::Protocol {
            reason: format!("unsupported message kind code {:?}", header.kind_code()),
        });
    };

    let message = decode_payload(kind, &payload, header.item_count)?;
    Ok(Some(DecodedFrame {
        kind,
        header,
        message,
    }))
}

/// Classifies the `recv_from` errors produced by an expired read timeout.
/// Unix reports `WouldBlock`; Windows reports `TimedOut`.
fn is_timeout_error(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
    )
}

// ── Tests ─────────────────────────────────────────────────────────────────────
