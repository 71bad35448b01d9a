//! Protocol module containing message types, the binary codec, and
//! fragment reassembly.

pub mod codec;
pub mod messages;
pub mod reassembly;

pub use codec::{decode_header, decode_payload, encode_header};
pub use messages::*;
pub use reassembly::{ReassemblyTracker, DEFAULT_STALENESS_WINDOW};
