//! Application layer for the recorder.
//!
//! These modules hold the in-memory state the recorder builds up from the
//! decoded stream.  They depend only on `mvn_core` types; socket handling
//! and file I/O stay in `infrastructure`, which feeds frames in from the
//! outside.
//!
//! # Sub-modules
//!
//! - **`characters`** – Directory of every character seen on the stream,
//!   enriched with the display name, xmid, and color from metadata frames
//!   and the segment dimensions from scale-info frames.
//!
//! - **`stats`** – Per-kind frame counters for the shutdown summary and the
//!   session-summary record.

pub mod characters;
pub mod stats;
