//! Infrastructure layer for the recorder application.
//!
//! Contains OS-facing adapters: the UDP receive socket and its worker
//! thread, file-system configuration, and JSONL session storage.
//!
//! **Dependency rule**: this layer may depend on `application` and `mvn_core`,
//! but MUST NOT be imported by the `application` layer.

pub mod network;
pub mod storage;
