//! gossipd - LWW register gossip daemon
//!
//! This daemon provides:
//! - A last-writer-wins register ordered by generation
//! - Periodic push rounds to a bounded set of peers
//! - Merge handling for pushed copies
//! - A static member registry
//! - A framed TCP listener for pushes and client reads/writes

pub mod config;
pub mod dissemination;
pub mod logging;
pub mod membership;
pub mod node;
pub mod receive;
pub mod scheduler;
pub mod server;
pub mod stats;

pub use config::Config;
pub use dissemination::{Disseminator, RoundReport};
pub use membership::MembershipManager;
pub use node::Node;
pub use receive::ReceiveHandler;
pub use scheduler::{RoundScheduler, SchedulerHandle, ShutdownMode};
pub use server::Server;
