//! Error types for LWW gossip

use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// LWW gossip error types
#[derive(Debug, Error)]
pub enum Error {
    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] postcard::Error),

    /// Node name failed boundary validation
    #[error("invalid node name {name:?}: {reason}")]
    InvalidNodeName { name: String, reason: &'static str },

    /// Peer specification is not of the form `name@host:port`
    #[error("invalid peer spec {0:?}, expected name@host:port")]
    InvalidPeerSpec(String),

    /// Peer address could not be parsed
    #[error("invalid peer address {addr:?}: {source}")]
    InvalidAddress {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },

    /// A local write would overflow the generation counter
    #[error("generation counter exhausted")]
    GenerationExhausted,

    /// Unknown selection strategy name
    #[error("unknown selection strategy: {0}")]
    UnknownStrategy(String),
}
