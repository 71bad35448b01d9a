//! JSONL session persistence.
//!
//! When `save_frames` is enabled, each run writes one
//! `session_<uuid>.jsonl` file under the configured output directory.  The
//! file is a sequence of JSON objects, one per line, discriminated by a
//! `record` field:
//!
//! ```text
//! {"record":"session_info", "session_id":…, "started_unix_ms":…, …}
//! {"record":"frame", "elapsed_ms":…, "kind":"02", "message":{…}}
//! {"record":"frame", …}
//! {"record":"session_summary", "duration_ms":…, "frames_by_kind":{…}, …}
//! ```
//!
//! JSONL keeps the writer append-only: a crash mid-run loses at most the
//! buffered tail, and everything before it is still parseable line by line.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use serde::Serialize;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use mvn_core::{MessageKind, MvnHeader, MvnMessage};

use crate::application::stats::MessageStats;

/// Error type for session file operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A file system I/O error occurred.
    #[error("I/O error on session file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A record could not be serialized to JSON.
    #[error("failed to serialize session record: {0}")]
    Serialize(#[from] serde_json::Error),
}

// ── Record schema ─────────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(tag = "record", rename_all = "snake_case")]
enum SessionRecord<'a> {
    SessionInfo {
        session_id: Uuid,
        started_unix_ms: u64,
        endpoint: &'a str,
        version: &'static str,
    },
    Frame {
        elapsed_ms: u64,
        kind: &'static str,
        character_id: u8,
        sample_counter: u32,
        time_code: u32,
        message: &'a MvnMessage,
    },
    SessionSummary {
        session_id: Uuid,
        duration_ms: u64,
        total_frames: u64,
        frames_by_kind: &'a BTreeMap<MessageKind, u64>,
        characters: &'a [u8],
    },
}

// ── Session writer ────────────────────────────────────────────────────────────

/// Append-only writer for one recording session.
///
/// Created by [`SessionWriter::open`], which writes the `session_info`
/// header line; closed by [`SessionWriter::finalize`], which writes the
/// `session_summary` line and flushes.
pub struct SessionWriter {
    path: PathBuf,
    file: BufWriter<File>,
    session_id: Uuid,
    started: Instant,
}

impl SessionWriter {
    /// Creates the output directory and the session file, and writes the
    /// `session_info` record.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Io`] when the directory or file cannot be
    /// created.
    pub fn open(output_dir: &Path, endpoint: &str) -> Result<SessionWriter, SessionError> {
        std::fs::create_dir_all(output_dir).map_err(|source| SessionError::Io {
            path: output_dir.to_path_buf(),
            source,
        })?;

        let session_id = Uuid::new_v4();
        let path = output_dir.join(format!("session_{session_id}.jsonl"));
        let file = File::create(&path).map_err(|source| SessionError::Io {
            path: path.clone(),
            source,
        })?;

        let mut writer = SessionWriter {
            path,
            file: BufWriter::new(file),
            session_id,
            started: Instant::now(),
        };
        let info = SessionRecord::SessionInfo {
            session_id,
            started_unix_ms: unix_ms(),
            endpoint,
            version: env!("CARGO_PKG_VERSION"),
        };
        writer.write_record(&info)?;

        info!(path = %writer.path.display(), %session_id, "session file opened");
        Ok(writer)
    }

    /// Appends one `frame` record.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Io`] or [`SessionError::Serialize`] when the
    /// line cannot be written.
    pub fn append_frame(
        &mut self,
        header: &MvnHeader,
        kind: MessageKind,
        message: &MvnMessage,
    ) -> Result<(), SessionError> {
        let record = SessionRecord::Frame {
            elapsed_ms: self.started.elapsed().as_millis() as u64,
            kind: kind.code(),
            character_id: header.character_id,
            sample_counter: header.sample_counter,
            time_code: header.time_code,
            message,
        };
        self.write_record(&record)
    }

    /// Writes the `session_summary` record, flushes, and closes the file.
    /// Returns the path of the finished session file.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Io`] or [`SessionError::Serialize`] when the
    /// summary cannot be written.
    pub fn finalize(
        mut self,
        stats: &MessageStats,
        characters: &[u8],
    ) -> Result<PathBuf, SessionError> {
        let record = SessionRecord::SessionSummary {
            session_id: self.session_id,
            duration_ms: self.started.elapsed().as_millis() as u64,
            total_frames: stats.total(),
            frames_by_kind: stats.by_kind(),
            characters,
        };
        self.write_record(&record)?;
        self.file.flush().map_err(|source| SessionError::Io {
            path: self.path.clone(),
            source,
        })?;

        info!(
            path = %self.path.display(),
            frames = stats.total(),
            "session file closed"
        );
        Ok(self.path)
    }

    /// Path of the session file being written.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    fn write_record(&mut self, record: &SessionRecord<'_>) -> Result<(), SessionError> {
        let line = serde_json::to_string(record)?;
        writeln!(self.file, "{line}").map_err(|source| SessionError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// Milliseconds since the Unix epoch; 0 if the clock predates it.
fn unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use mvn_core::{CenterOfMass, Vector3};

    fn temp_session_dir() -> PathBuf {
        std::env::temp_dir().join(format!("mvn_session_test_{}", Uuid::new_v4()))
    }

    fn make_header(sample_counter: u32) -> MvnHeader {
        MvnHeader {
            id_string: "MXTP24".to_string(),
            sample_counter,
            fragment_control: 0x80,
            item_count: 1,
            time_code: 1234,
            character_id: 0,
            body_segment_count: 23,
            prop_count: 0,
            finger_segment_count: 0,
            payload_size: 12,
        }
    }

    fn com_message() -> MvnMessage {
        MvnMessage::CenterOfMass(CenterOfMass {
            position: Vector3::new(0.1, 0.2, 0.3),
        })
    }

    fn read_lines(path: &Path) -> Vec<serde_json::Value> {
        std::fs::read_to_string(path)
            .expect("read session file")
            .lines()
            .map(|line| serde_json::from_str(line).expect("parse JSONL line"))
            .collect()
    }

    #[test]
    fn test_open_creates_directory_and_writes_session_info() {
        // Arrange: the nested directory does not exist yet.
        let dir = temp_session_dir().join("nested");

        // Act
        let writer = SessionWriter::open(&dir, "0.0.0.0:9763").expect("open session");
        let path = writer.path().to_path_buf();
        drop(writer);

        // Assert
        let lines = read_lines(&path);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["record"], "session_info");
        assert_eq!(lines[0]["endpoint"], "0.0.0.0:9763");
        assert_eq!(lines[0]["version"], env!("CARGO_PKG_VERSION"));

        std::fs::remove_dir_all(dir.parent().expect("parent")).ok();
    }

    #[test]
    fn test_append_frame_writes_one_parseable_line() {
        let dir = temp_session_dir();
        let mut writer = SessionWriter::open(&dir, "127.0.0.1:9763").expect("open session");

        writer
            .append_frame(&make_header(42), MessageKind::CenterOfMass, &com_message())
            .expect("append frame");
        let path = writer.path().to_path_buf();
        drop(writer);

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["record"], "frame");
        assert_eq!(lines[1]["kind"], "24");
        assert_eq!(lines[1]["sample_counter"], 42);
        assert!(lines[1]["message"].is_object());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_finalize_appends_summary_with_stats_and_characters() {
        let dir = temp_session_dir();
        let mut writer = SessionWriter::open(&dir, "127.0.0.1:9763").expect("open session");
        writer
            .append_frame(&make_header(1), MessageKind::CenterOfMass, &com_message())
            .expect("append frame");

        let mut stats = MessageStats::new();
        stats.record(MessageKind::CenterOfMass);
        let path = writer.finalize(&stats, &[0, 1]).expect("finalize");

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 3);
        let summary = &lines[2];
        assert_eq!(summary["record"], "session_summary");
        assert_eq!(summary["total_frames"], 1);
        assert_eq!(summary["frames_by_kind"]["CenterOfMass"], 1);
        assert_eq!(summary["characters"], serde_json::json!([0, 1]));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_session_ids_differ_between_sessions() {
        let dir = temp_session_dir();
        let first = SessionWriter::open(&dir, "127.0.0.1:9763").expect("open first");
        let second = SessionWriter::open(&dir, "127.0.0.1:9763").expect("open second");

        assert_ne!(first.session_id(), second.session_id());
        assert_ne!(first.path(), second.path());

        std::fs::remove_dir_all(&dir).ok();
    }
}
