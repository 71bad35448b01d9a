//! Error taxonomy shared by the codec, the reassembly tracker, and the
//! segment registry.
//!
//! Everything that can go wrong while turning raw datagrams into typed
//! messages is one of four shapes: bytes that do not parse, a stream that is
//! not speaking this protocol, a fragment sequence that cannot be stitched
//! back together, or a segment identifier with no known name.

use thiserror::Error;

/// Errors produced while decoding or reassembling MVN stream data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MvnError {
    /// Malformed bytes for a specific data kind at a byte offset.
    #[error("parse error in {data_kind} at offset {offset}: {reason}")]
    Parse {
        /// Which decoder was running ("header", "quaternion pose", ...).
        data_kind: &'static str,
        /// Byte offset into the buffer being decoded when the fault was hit.
        offset: usize,
        reason: String,
    },

    /// The stream is not speaking the MXTP protocol (bad id string,
    /// unsupported message kind).
    #[error("protocol error: {reason}")]
    Protocol { reason: String },

    /// Fragment sequencing or size faults during datagram reassembly.
    #[error("datagram error for sample {sample_counter}, fragment {fragment_index}: {reason}")]
    Datagram {
        fragment_index: u8,
        sample_counter: u32,
        reason: String,
    },

    /// A segment identifier that no static table or fallback rule can name.
    #[error("unknown segment id {segment_id} in {data_kind}")]
    Segment {
        segment_id: u32,
        /// Which decoder rejected the id.
        data_kind: &'static str,
    },
}

impl MvnError {
    /// Shorthand for a [`MvnError::Parse`] with a formatted reason.
    pub(crate) fn parse(data_kind: &'static str, offset: usize, reason: impl Into<String>) -> Self {
        MvnError::Parse {
            data_kind,
            offset,
            reason: reason.into(),
        }
    }

    /// Shorthand for a [`MvnError::Protocol`].
    pub(crate) fn protocol(reason: impl Into<String>) -> Self {
        MvnError::Protocol {
            reason: reason.into(),
        }
    }
}
