//! Frame dispatch: the hand-off between the receive thread and the consumer.
//!
//! A receiver is constructed in one of two dispatch modes, fixed for its
//! lifetime:
//!
//! - **Callback mode** – the caller supplies a [`FrameHandler`]; the receive
//!   thread invokes it inline for every decoded frame.  Handlers must return
//!   promptly: while a handler runs, no further datagrams are read from the
//!   socket.
//!
//! - **Queue mode** – decoded frames land in a bounded [`FrameQueue`] and a
//!   consumer thread drains them with [`FrameQueue::pop_timeout`].  When the
//!   queue is full the *oldest* frame is dropped in favour of the newest, so
//!   a stalled consumer sees the most recent motion rather than a stale
//!   backlog.
//!
//! # Why `Mutex<VecDeque>` + `Condvar`? (for beginners)
//!
//! The receive thread is a plain OS thread (blocking UDP reads), so the
//! queue must work without an async runtime.  `Condvar::wait_timeout` gives
//! the consumer a timed block that wakes as soon as the producer pushes,
//! which is exactly the `pop_timeout` contract.  Tokio channels would force
//! the consumer onto the runtime; std primitives keep both sides free.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::warn;

use mvn_core::{MessageKind, MvnHeader, MvnMessage};

// ── Decoded frame ─────────────────────────────────────────────────────────────

/// A fully decoded datagram: header plus typed payload.
///
/// This is the unit handed to a [`FrameHandler`] or pushed onto a
/// [`FrameQueue`].  `kind` duplicates `header.kind()` so consumers can match
/// on it without re-parsing the id string.
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    pub kind: MessageKind,
    pub header: MvnHeader,
    pub message: MvnMessage,
}

// ── Frame handler trait ───────────────────────────────────────────────────────

/// Callback invoked on the receive thread for every decoded frame.
///
/// Implemented automatically for any `FnMut(DecodedFrame) + Send` closure,
/// so the common case is just:
///
/// ```ignore
/// let receiver = MvnReceiver::with_handler(config, |frame| {
///     println!("{:?}", frame.kind);
/// });
/// ```
pub trait FrameHandler: Send {
    fn handle_frame(&mut self, frame: DecodedFrame);
}

impl<F> FrameHandler for F
where
    F: FnMut(DecodedFrame) + Send,
{
    fn handle_frame(&mut self, frame: DecodedFrame) {
        self(frame)
    }
}

// ── Bounded frame queue ───────────────────────────────────────────────────────

/// Bounded FIFO of decoded frames shared between the receive thread and a
/// consumer.
///
/// Overflow policy: when the queue already holds `capacity` frames, `push`
/// drops the oldest frame (with a warning) and appends the new one.
pub struct FrameQueue {
    inner: Mutex<VecDeque<DecodedFrame>>,
    available: Condvar,
    capacity: usize,
}

impl FrameQueue {
    /// Creates a queue holding at most `capacity` frames.  A capacity of 0
    /// is treated as 1.
    pub fn new(capacity: usize) -> Self {
        FrameQueue {
            inner: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
            capacity: capacity.max(1),
        }
    }

    /// Appends a frame, dropping the oldest one first if the queue is full.
    pub fn push(&self, frame: DecodedFrame) {
        let mut queue = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if queue.len() >= self.capacity {
            if let Some(dropped) = queue.pop_front() {
                warn!(
                    sample_counter = dropped.header.sample_counter,
                    capacity = self.capacity,
                    "frame queue full; dropping oldest frame"
                );
            }
        }
        queue.push_back(frame);
        drop(queue);
        self.available.notify_one();
    }

    /// Waits up to `timeout` for a frame.  Returns `None` if the queue is
    /// still empty when the timeout elapses.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<DecodedFrame> {
        let deadline = Instant::now() + timeout;
        let mut queue = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if let Some(frame) = queue.pop_front() {
                return Some(frame);
            }
            let remaining = deadline.checked_duration_since(Instant::now())?;
            let (guard, wait) = self
                .available
                .wait_timeout(queue, remaining)
                .unwrap_or_else(PoisonError::into_inner);
            queue = guard;
            if wait.timed_out() {
                // One last check: the producer may have pushed between the
                // timeout firing and the lock being reacquired.
                return queue.pop_front();
            }
        }
    }

    /// Number of frames currently buffered.
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Discards all buffered frames.
    pub fn clear(&self) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

// ── Dispatch sink ─────────────────────────────────────────────────────────────

/// Where the receive thread sends decoded frames.  Chosen at receiver
/// construction and never changed afterwards.
#[derive(Clone)]
pub(crate) enum DispatchSink {
    Handler(Arc<Mutex<dyn FrameHandler>>),
    Queue(Arc<FrameQueue>),
}

impl DispatchSink {
    pub(crate) fn dispatch(&self, frame: DecodedFrame) {
        match self {
            DispatchSink::Handler(handler) => handler
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .handle_frame(frame),
            DispatchSink::Queue(queue) => queue.push(frame),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
