//! Per-kind reception statistics.

use std::collections::BTreeMap;

use serde::Serialize;

use mvn_core::MessageKind;

/// Counters for every dispatched frame, broken down by message kind.
///
/// Embedded in the JSONL `session_summary` record and logged in the
/// shutdown summary.
#[derive(Debug, Default, Clone, Serialize)]
pub struct MessageStats {
    counts: BTreeMap<MessageKind, u64>,
    total: u64,
}

impl MessageStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one dispatched frame of `kind`.
    pub fn record(&mut self, kind: MessageKind) {
        *self.counts.entry(kind).or_insert(0) += 1;
        self.total += 1;
    }

    /// Frames seen of a specific kind.
    pub fn count(&self, kind: MessageKind) -> u64 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    /// Frames seen across all kinds.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// The per-kind breakdown, ordered by kind code.
    pub fn by_kind(&self) -> &BTreeMap<MessageKind, u64> {
        &self.counts
    }

    /// One-line breakdown for log output, e.g.
    /// `"PoseQuaternion(02)=480, MetaData(12)=2"`.
    pub fn describe(&self) -> String {
        if self.counts.is_empty() {
            return "no frames received".to_string();
        }
        self.counts
            .iter()
            .map(|(kind, count)| format!("{kind:?}({})={count}", kind.code()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
