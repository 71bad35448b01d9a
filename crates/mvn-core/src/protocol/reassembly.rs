//! Reassembly of messages split across multiple UDP datagrams.
//!
//! Large payloads (scale info, full-skeleton poses with fingers) arrive as
//! up to 128 fragments sharing one (sample counter, character id) key. The
//! tracker buffers fragments in index order and hands back the concatenated
//! payload once every index up to the final one has landed, regardless of
//! arrival order. Entries that never complete are evicted after a staleness
//! window; the owning receive loop is expected to call [`ReassemblyTracker::evict_stale`]
//! on every iteration.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::MvnError;
use crate::protocol::messages::MvnHeader;

/// How long a partial message may sit untouched before eviction.
pub const DEFAULT_STALENESS_WINDOW: Duration = Duration::from_secs(1);

/// Buffered fragments of one in-flight message.
#[derive(Debug)]
struct PendingMessage {
    /// Slot per fragment index; grows as higher indexes arrive.
    fragments: Vec<Option<Vec<u8>>>,
    /// Set once the final-flagged fragment has been seen.
    final_index: Option<u8>,
    last_touch: Instant,
}

impl PendingMessage {
    fn new() -> Self {
        PendingMessage {
            fragments: Vec::new(),
            final_index: None,
            last_touch: Instant::now(),
        }
    }

    fn store(&mut self, index: u8, payload: &[u8]) {
        let index = index as usize;
        if self.fragments.len() <= index {
            self.fragments.resize_with(index + 1, || None);
        }
        self.fragments[index] = Some(payload.to_vec());
        self.last_touch = Instant::now();
    }

    /// Complete when the final index is known and no slot up to it is empty.
    fn is_complete(&self) -> bool {
        match self.final_index {
            Some(final_index) => {
                let final_index = final_index as usize;
                self.fragments.len() > final_index
                    && self.fragments[..=final_index].iter().all(Option::is_some)
            }
            None => false,
        }
    }
}

/// Reorders and concatenates fragmented messages.
///
/// Keyed by (sample counter, character id). Memory is bounded: at most 128
/// slots per key, and stale keys are dropped by [`Self::evict_stale`].
#[derive(Debug)]
pub struct ReassemblyTracker {
    pending: HashMap<(u32, u8), PendingMessage>,
    staleness_window: Duration,
}

impl Default for ReassemblyTracker {
    fn default() -> Self {
        ReassemblyTracker::new(DEFAULT_STALENESS_WINDOW)
    }
}

impl ReassemblyTracker {
    pub fn new(staleness_window: Duration) -> Self {
        ReassemblyTracker {
            pending: HashMap::new(),
            staleness_window,
        }
    }

    /// Feeds one datagram's payload into the tracker.
    ///
    /// Returns `Ok(Some(payload))` when this arrival completes its message,
    /// `Ok(None)` when the fragment was buffered. Unfragmented datagrams
    /// (final flag, index 0, nothing buffered for the key) pass straight
    /// through.
    ///
    /// A final fragment arriving while earlier indexes are still missing is
    /// reported as a datagram error, but its payload is retained so a
    /// late-arriving fragment can still complete the message.
    ///
    /// # Errors
    ///
    /// Returns [`MvnError::Datagram`] on size shortfalls against the header's
    /// payload size and on fragment sequencing faults.
    pub fn submit(
        &mut self,
        header: &MvnHeader,
        payload: &[u8],
    ) -> Result<Option<Vec<u8>>, MvnError> {
        let key = (header.sample_counter, header.character_id);
        let index = header.fragment_index();
        let is_final = header.is_final_fragment();

        if is_final && index == 0 && !self.pending.contains_key(&key) {
            if payload.len() < header.payload_size as usize {
                return Err(MvnError::Datagram {
                    fragment_index: index,
                    sample_counter: header.sample_counter,
                    reason: format!(
                        "payload size mismatch: expected {}, got {}",
                        header.payload_size,
                        payload.len()
                    ),
                });
            }
            return Ok(Some(payload.to_vec()));
        }

        let had_entry = self.pending.contains_key(&key);
        let entry = self.pending.entry(key).or_insert_with(PendingMessage::new);

        if let Some(final_index) = entry.final_index {
            if index > final_index {
                return Err(MvnError::Datagram {
                    fragment_index: index,
                    sample_counter: header.sample_counter,
                    reason: format!("fragment index {index} beyond final index {final_index}"),
                });
            }
        }

        entry.store(index, payload);
        if is_final {
            entry.final_index = Some(index);
            if entry.fragments.len() > index as usize + 1 {
                // Fragments beyond the final index make the sequence
                // unrecoverable; drop the whole entry.
                self.pending.remove(&key);
                return Err(MvnError::Datagram {
                    fragment_index: index,
                    sample_counter: header.sample_counter,
                    reason: "fragments stored beyond the final index".to_string(),
                });
            }
        }

        if entry.is_complete() {
            if let Some(finished) = self.pending.remove(&key) {
                let mut combined = Vec::new();
                for fragment in finished.fragments.into_iter().flatten() {
                    combined.extend_from_slice(&fragment);
                }
                if combined.len() < header.payload_size as usize {
                    return Err(MvnError::Datagram {
                        fragment_index: index,
                        sample_counter: header.sample_counter,
                        reason: format!(
                            "combined payload size mismatch: expected {}, got {}",
                            header.payload_size,
                            combined.len()
                        ),
                    });
                }
                debug!(
                    sample_counter = header.sample_counter,
                    character_id = header.character_id,
                    bytes = combined.len(),
                    "reassembled fragmented message"
                );
                return Ok(Some(combined));
            }
        }

        if is_final {
            let reason = if had_entry {
                "incomplete fragment sequence"
            } else {
                "missing partial datagrams"
            };
            return Err(MvnError::Datagram {
                fragment_index: index,
                sample_counter: header.sample_counter,
                reason: reason.to_string(),
            });
        }

        debug!(
            fragment_index = index,
            sample_counter = header.sample_counter,
            character_id = header.character_id,
            "buffered partial datagram"
        );
        Ok(None)
    }

    /// Drops entries untouched for longer than the staleness window and
    /// returns how many were removed.
    pub fn evict_stale(&mut self) -> usize {
        let window = self.staleness_window;
        let before = self.pending.len();
        self.pending.retain(|key, entry| {
            let stale = entry.last_touch.elapsed() > window;
            if stale {
                warn!(
                    sample_counter = key.0,
                    character_id = key.1,
                    "evicting stale partial message"
                );
            }
            !stale
        });
        before - self.pending.len()
    }

    /// Number of messages currently awaiting fragments.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Discards all pending fragments.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
