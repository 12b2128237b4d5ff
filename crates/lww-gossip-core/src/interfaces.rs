//! Collaborator seams
//!
//! Membership and transport are supplied from outside the protocol core.
//! Both are consumed once per round and never cached across rounds.

use crate::types::{GossipMessage, PeerTarget};
use std::future::Future;
use thiserror::Error;

/// Membership lookup errors
#[derive(Debug, Error)]
pub enum MembershipError {
    #[error("membership unavailable: {0}")]
    Unavailable(String),
}

/// Source of the currently reachable peers.
pub trait MembershipProvider: Send + Sync + 'static {
    /// Live peers, excluding the local node. May be empty. Must return
    /// promptly; a round never waits on membership.
    fn live_peers(&self) -> Result<Vec<PeerTarget>, MembershipError>;
}

/// Point-to-point delivery of one gossip message.
///
/// Cancellation is by dropping the returned future: the disseminator does so
/// when a round's deadline passes. Implementations report failure through
/// `Err`, never by panicking.
pub trait PushTransport: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    fn send(
        &self,
        peer: &PeerTarget,
        msg: &GossipMessage,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}
