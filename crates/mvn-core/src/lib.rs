//! # mvn-core
//!
//! Shared library for receiving Xsens MVN network streams: the datagram
//! codec, fragment reassembly, and skeleton segment name tables.
//!
//! This crate is used by the recorder application and by any consumer that
//! wants decoded motion frames. It has zero dependencies on sockets or
//! threads; feeding it bytes and draining typed messages is the caller's
//! job.
//!
//! # Stream overview (for beginners)
//!
//! An MVN Analyze/Animate host broadcasts motion capture data as UDP
//! datagrams, by convention on port 9763.  Every datagram starts with a
//! 24-byte header whose id string (`MXTP` + a 2-char code) says what the
//! payload holds: segment poses in one of three coordinate conventions,
//! point positions, joint angles, kinematics, character metadata, scaling
//! information, or a wall-clock time code.  Payloads too large for one
//! datagram are split into up to 128 indexed fragments that must be
//! reassembled before decoding.
//!
//! This crate defines:
//!
//! - **`protocol`** – The wire format.  [`protocol::decode_header`] splits
//!   off the header, [`protocol::ReassemblyTracker`] recombines fragmented
//!   messages, and [`protocol::decode_payload`] turns a complete payload
//!   into a typed [`MvnMessage`].
//!
//! - **`segments`** – Static name tables for the default skeleton (body,
//!   props, fingers) and the Unity variant, plus the resolution rules that
//!   map wire segment ids to names.
//!
//! # Example
//!
//! ```rust
//! use mvn_core::protocol::{decode_header, decode_payload};
//!
//! // A center-of-mass datagram: header + three big-endian floats.
//! let mut datagram = Vec::new();
//! datagram.extend_from_slice(b"MXTP24");
//! datagram.extend_from_slice(&100u32.to_be_bytes()); // sample counter
//! datagram.push(0x80); // final fragment, index 0
//! datagram.push(1); // item count
//! datagram.extend_from_slice(&[0u8; 8]); // time code + ids + counts
//! datagram.extend_from_slice(&[0u8; 2]); // reserved
//! datagram.extend_from_slice(&12u16.to_be_bytes()); // payload size
//! for component in [0.0f32, 0.1, 0.95] {
//!     datagram.extend_from_slice(&component.to_be_bytes());
//! }
//!
//! let (header, consumed) = decode_header(&datagram).unwrap();
//! let kind = header.kind().unwrap();
//! let message = decode_payload(kind, &datagram[consumed..], header.item_count).unwrap();
//! assert_eq!(message.kind(), kind);
//! ```

pub mod error;
pub mod protocol;
pub mod segments;

// Re-export the most-used types at the crate root so callers can write
// `mvn_core::MvnMessage` instead of `mvn_core::protocol::messages::MvnMessage`.
pub use error::MvnError;
pub use protocol::codec::{decode_header, decode_payload, encode_header};
pub use protocol::messages::{
    AngularSegmentKinematics, CenterOfMass, CharacterMetaData, EulerAngles, JointAngle,
    LinearSegmentKinematics, MessageKind, MvnHeader, MvnMessage, PointPosition, Quaternion,
    ScaleInfo, ScalePoint, ScaleSegment, SegmentEulerPose, SegmentQuaternionPose, TimeCode,
    TrackerKinematics, Vector3,
};
pub use protocol::reassembly::ReassemblyTracker;
pub use segments::{SegmentRegistry, SegmentTable};
