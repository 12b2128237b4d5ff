//! Networking primitives for LWW gossip
//!
//! This crate provides:
//! - Length-prefixed message framing
//! - Postcard payloads for each frame type
//! - A request/response client over TCP
//! - The TCP push transport used by the disseminator

pub mod client;
pub mod framing;
pub mod messages;
pub mod transport;

pub use client::Client;
pub use framing::{Frame, FrameCodec, FrameError, FrameType};
pub use messages::{PushAck, SetRequest};
pub use transport::{TcpTransport, TransportError};
