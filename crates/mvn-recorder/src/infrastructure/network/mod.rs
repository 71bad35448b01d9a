//! Network infrastructure for the recorder application.
//!
//! # Sub-modules
//!
//! - **`receiver`** – Binds the UDP socket, runs the receive loop on a
//!   dedicated OS thread, and turns raw datagrams into decoded frames:
//!   header decode, fragment reassembly, payload decode, dispatch.
//!
//! - **`sink`** – The hand-off between the receive thread and the rest of
//!   the program.  Either a caller-supplied `FrameHandler` invoked inline,
//!   or a bounded `FrameQueue` that a consumer thread drains at its own
//!   pace.

pub mod receiver;
pub mod sink;
