//! Configuration for gossipd

use crate::logging::LogFormat;
use crate::scheduler::{OverlapPolicy, ScheduleSettings};
use clap::Parser;
use lww_gossip_core::canonical::validate_node_name;
use lww_gossip_core::{PeerSelector, PeerTarget, SelectionStrategy, DEFAULT_FANOUT};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::time::Duration;

/// gossipd - LWW register gossip daemon
#[derive(Parser, Debug, Clone)]
#[command(name = "gossipd")]
#[command(author, version, about = "LWW register gossip daemon", long_about = None)]
pub struct Config {
    /// Listen address for pushes and client requests
    #[arg(short, long, env = "GOSSIP_LISTEN", default_value = "0.0.0.0:9100")]
    pub listen: SocketAddr,

    /// This node's name, sent as the origin of every push
    #[arg(short, long, env = "GOSSIP_NODE_NAME")]
    pub name: String,

    /// Peers as name@host:port (comma-separated or repeated)
    #[arg(short, long = "peer", env = "GOSSIP_PEERS", value_delimiter = ',')]
    pub peers: Vec<PeerTarget>,

    /// Peers pushed to per gossip round
    #[arg(long, env = "GOSSIP_FANOUT", default_value_t = DEFAULT_FANOUT)]
    pub fanout: usize,

    /// Gossip round interval (milliseconds)
    #[arg(long, env = "GOSSIP_INTERVAL_MS", default_value = "2000")]
    pub gossip_interval_ms: u64,

    /// Deadline for all pushes of one round (milliseconds)
    #[arg(long, env = "GOSSIP_ROUND_TIMEOUT_MS", default_value = "2000")]
    pub round_timeout_ms: u64,

    /// Housekeeping (state dump) interval (seconds)
    #[arg(long, env = "GOSSIP_HOUSEKEEPING_SECS", default_value = "15")]
    pub housekeeping_interval_secs: u64,

    /// Peer selection strategy (window or uniform)
    #[arg(long, env = "GOSSIP_SELECTION", default_value = "window")]
    pub selection: SelectionStrategy,

    /// Whether a new round may start while the previous one is in flight
    #[arg(long, env = "GOSSIP_OVERLAP", value_enum, default_value = "concurrent")]
    pub overlap: OverlapPolicy,

    /// Value the register starts with at generation 0
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub initial_value: i64,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Log format (json or pretty)
    #[arg(long, value_enum, default_value = "pretty")]
    pub log_format: LogFormat,
}

impl Config {
    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        validate_node_name(&self.name)?;
        if self.fanout == 0 {
            anyhow::bail!("Fan-out must be at least 1");
        }
        if self.gossip_interval_ms == 0 {
            anyhow::bail!("Gossip interval cannot be zero");
        }
        if self.round_timeout_ms == 0 {
            anyhow::bail!("Round timeout cannot be zero");
        }
        if self.housekeeping_interval_secs == 0 {
            anyhow::bail!("Housekeeping interval cannot be zero");
        }

        let mut seen = HashSet::new();
        for peer in &self.peers {
            if peer.name == self.name {
                anyhow::bail!("Peer list contains the local node {}", peer);
            }
            if !seen.insert(peer.name.as_str()) {
                anyhow::bail!("Duplicate peer name: {}", peer.name);
            }
        }
        Ok(())
    }

    pub fn selector(&self) -> PeerSelector {
        PeerSelector::new(self.fanout, self.selection)
    }

    pub fn schedule(&self) -> ScheduleSettings {
        ScheduleSettings {
            gossip_interval: Duration::from_millis(self.gossip_interval_ms),
            round_timeout: Duration::from_millis(self.round_timeout_ms),
            housekeeping_interval: Duration::from_secs(self.housekeeping_interval_secs),
            overlap: self.overlap,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        let mut argv = vec!["gossipd"];
        argv.extend_from_slice(args);
        Config::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&["--name", "alpha"]);
        assert_eq!(config.fanout, 2);
        assert_eq!(config.selection, SelectionStrategy::Window);
        assert_eq!(config.overlap, OverlapPolicy::Concurrent);
        assert_eq!(config.schedule().gossip_interval, Duration::from_secs(2));
        assert_eq!(config.schedule().round_timeout, Duration::from_secs(2));
        assert_eq!(config.schedule().housekeeping_interval, Duration::from_secs(15));
        assert!(config.peers.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_peer_list_parsing() {
        let config = parse(&[
            "--name",
            "alpha",
            "--peer",
            "beta@127.0.0.1:9101,gamma@127.0.0.1:9102",
            "--peer",
            "delta@127.0.0.1:9103",
            "--initial-value",
            "-5",
        ]);
        let names: Vec<_> = config.peers.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["beta", "gamma", "delta"]);
        assert_eq!(config.initial_value, -5);
    }

    #[test]
    fn test_bad_peer_spec_rejected_at_parse() {
        let argv = ["gossipd", "--name", "alpha", "--peer", "beta"];
        assert!(Config::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_validation() {
        assert!(parse(&["--name", "alpha", "--fanout", "0"]).validate().is_err());
        assert!(parse(&["--name", "alpha", "--gossip-interval-ms", "0"])
            .validate()
            .is_err());
        assert!(parse(&["--name", "alpha", "--peer", "alpha@127.0.0.1:9100"])
            .validate()
            .is_err());
        assert!(parse(&[
            "--name",
            "alpha",
            "--peer",
            "beta@127.0.0.1:9101,beta@127.0.0.1:9102"
        ])
        .validate()
        .is_err());
        assert!(parse(&["--name", "has@at"]).validate().is_err());
    }
}
