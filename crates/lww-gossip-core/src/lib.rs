//! LWW Gossip Core Library
//!
//! This crate provides the replicated state cell, the peer-selection policy,
//! and the collaborator traits for a last-writer-wins epidemic replication
//! protocol. It is runtime-agnostic: nothing here spawns tasks or touches
//! sockets.
//!
//! # Modules
//!
//! - [`types`]: Protocol types (NodeId, PeerTarget, Snapshot, GossipMessage)
//! - [`register`]: The versioned value and its merge rule
//! - [`selector`]: Fan-out peer selection
//! - [`interfaces`]: Membership and push-transport seams
//! - [`canonical`]: Deterministic encoding and boundary validation
//! - [`error`]: Error types

pub mod canonical;
pub mod error;
pub mod interfaces;
pub mod register;
pub mod selector;
pub mod types;

#[cfg(test)]
mod test_vectors;

pub use error::{Error, Result};
pub use interfaces::{MembershipError, MembershipProvider, PushTransport};
pub use register::VersionedValue;
pub use selector::{PeerSelector, SelectionStrategy, DEFAULT_FANOUT};
pub use types::*;
