//! File-system storage for the recorder application.
//!
//! # Sub-modules
//!
//! - **`config`** – TOML configuration: schema types with serde defaults
//!   and the platform-path lookup.
//!
//! - **`session`** – JSONL session files: one line per record, written
//!   append-only so partial files survive a crash.

pub mod config;
pub mod session;
