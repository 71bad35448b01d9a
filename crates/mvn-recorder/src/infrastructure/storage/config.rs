//! TOML-based configuration for the recorder application.
//!
//! Reads `AppConfig` from the platform-appropriate config file:
//! - Windows:  `%APPDATA%\MvnRecorder\config.toml`
//! - Linux:    `~/.config/mvn-recorder/config.toml`
//! - macOS:    `~/Library/Application Support/MvnRecorder/config.toml`
//!
//! An explicit path given on the command line takes precedence over the
//! platform location.  Every field carries a serde default, so an empty
//! file (or no file at all) yields a fully usable configuration listening
//! on the conventional stream port.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use mvn_core::protocol::messages::{DEFAULT_PORT, MAX_DATAGRAM_SIZE};

use crate::infrastructure::network::receiver::ReceiverConfig;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level recorder configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub recorder: RecorderConfig,
}

/// Socket and reassembly settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkConfig {
    /// IP address to bind the receive socket to.  `"0.0.0.0"` binds all
    /// interfaces.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// UDP port the streaming host sends to.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    /// Receive buffer size in bytes; one maximum-size datagram.
    #[serde(default = "default_receive_buffer_bytes")]
    pub receive_buffer_bytes: usize,
    /// Socket read timeout in milliseconds.
    #[serde(default = "default_socket_timeout_ms")]
    pub socket_timeout_ms: u64,
    /// How long an incomplete fragment set is kept, in milliseconds.
    #[serde(default = "default_reassembly_timeout_ms")]
    pub reassembly_timeout_ms: u64,
}

/// Frame handling and session persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecorderConfig {
    /// Capacity of the frame queue between the receive thread and the
    /// application loop.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Whether decoded frames are written to a JSONL session file.
    #[serde(default)]
    pub save_frames: bool,
    /// Directory session files are created in.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}
fn default_listen_port() -> u16 {
    DEFAULT_PORT
}
fn default_receive_buffer_bytes() -> usize {
    MAX_DATAGRAM_SIZE
}
fn default_socket_timeout_ms() -> u64 {
    1000
}
fn default_reassembly_timeout_ms() -> u64 {
    1000
}
fn default_queue_capacity() -> usize {
    1000
}
fn default_output_dir() -> String {
    "sessions".to_string()
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            listen_port: default_listen_port(),
            receive_buffer_bytes: default_receive_buffer_bytes(),
            socket_timeout_ms: default_socket_timeout_ms(),
            reassembly_timeout_ms: default_reassembly_timeout_ms(),
        }
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            save_frames: false,
            output_dir: default_output_dir(),
        }
    }
}

impl AppConfig {
    /// Projects the file-level settings onto the receiver's runtime config.
    pub fn receiver_config(&self) -> ReceiverConfig {
        ReceiverConfig {
            bind_address: self.network.bind_address.clone(),
            port: self.network.listen_port,
            receive_buffer_bytes: self.network.receive_buffer_bytes,
            socket_timeout: Duration::from_millis(self.network.socket_timeout_ms),
            staleness_window: Duration::from_millis(self.network.reassembly_timeout_ms),
            queue_capacity: self.recorder.queue_capacity,
        }
    }
}

// ── Config loading ────────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot
/// be determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads the configuration, trying `explicit_path` first, then the platform
/// config file, then the compiled-in defaults.
///
/// An explicit path must exist and parse; the platform file is optional and
/// silently falls back to defaults when absent (including on platforms with
/// no resolvable config directory).
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found"
/// on the platform path, and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(explicit_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let path = match explicit_path {
        Some(path) => path.to_path_buf(),
        None => match config_file_path() {
            Ok(path) => path,
            Err(ConfigError::NoPlatformConfigDir) => return Ok(AppConfig::default()),
            Err(e) => return Err(e),
        },
    };

    match std::fs::read_to_string(&path) {
        Ok(content) => {
            let cfg: AppConfig = toml::from_str(&content)?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && explicit_path.is_none() => {
            Ok(AppConfig::default())
        }
        Err(e) => Err(ConfigError::Io { path, source: e }),
    }
}

/// Resolves the platform config base directory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        // %APPDATA% e.g. C:\Users\<user>\AppData\Roaming
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("MvnRecorder"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("mvn-recorder"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("MvnRecorder")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
