//! TCP push transport
//!
//! Every push opens a fresh connection, sends one `Push` frame and waits for
//! the `PushAck`. No connection state outlives a push, so a peer that went
//! away costs one failed connect and nothing carries into the next round.

use crate::client::Client;
use crate::framing::{FrameError, FrameType};
use lww_gossip_core::{GossipMessage, PeerTarget, PushTransport};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Default bound on establishing a connection
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// Transport errors
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),
    #[error("Encoding error: {0}")]
    Encoding(#[from] lww_gossip_core::Error),
    #[error("Connection closed")]
    ConnectionClosed,
    #[error("Connect timed out")]
    ConnectTimeout,
    #[error("Rejected by remote: {0}")]
    Rejected(String),
    #[error("Unexpected frame: {0:?}")]
    UnexpectedFrame(FrameType),
}

/// Push transport over plain TCP
#[derive(Debug, Clone)]
pub struct TcpTransport {
    connect_timeout: Duration,
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT)
    }
}

impl TcpTransport {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl PushTransport for TcpTransport {
    type Error = TransportError;

    async fn send(&self, peer: &PeerTarget, msg: &GossipMessage) -> Result<(), TransportError> {
        let mut client = Client::connect_timeout(peer.addr, self.connect_timeout).await?;
        let accepted = client.push(msg).await?;
        debug!(
            "Pushed generation {} to {}: {}",
            msg.generation,
            peer,
            if accepted { "adopted" } else { "ignored" }
        );
        Ok(())
    }
}
