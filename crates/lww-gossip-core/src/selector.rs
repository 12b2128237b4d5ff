//! Fan-out peer selection
//!
//! Two strategies are offered:
//! - `Window`: one uniform start index, then `K` consecutive peers wrapping
//!   around the list. Cheap, and fine when the membership order carries no
//!   meaning. Not a uniform sample without replacement: neighbouring peers
//!   are always picked together.
//! - `Uniform`: a true sample of `K` distinct peers without replacement.

use crate::error::Error;
use crate::types::PeerTarget;
use rand::Rng;
use std::fmt;
use std::str::FromStr;

/// Default number of peers pushed to per round
pub const DEFAULT_FANOUT: usize = 2;

/// How targets are drawn when there are more peers than the fan-out
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SelectionStrategy {
    /// Contiguous window from a random start index
    #[default]
    Window,
    /// Sampling without replacement
    Uniform,
}

impl FromStr for SelectionStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "window" => Ok(Self::Window),
            "uniform" => Ok(Self::Uniform),
            other => Err(Error::UnknownStrategy(other.to_string())),
        }
    }
}

impl fmt::Display for SelectionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Window => f.write_str("window"),
            Self::Uniform => f.write_str("uniform"),
        }
    }
}

/// Picks the peers a round pushes to
#[derive(Clone, Copy, Debug)]
pub struct PeerSelector {
    fanout: usize,
    strategy: SelectionStrategy,
}

impl Default for PeerSelector {
    fn default() -> Self {
        Self::new(DEFAULT_FANOUT, SelectionStrategy::default())
    }
}

impl PeerSelector {
    pub fn new(fanout: usize, strategy: SelectionStrategy) -> Self {
        Self { fanout, strategy }
    }

    pub fn fanout(&self) -> usize {
        self.fanout
    }

    pub fn strategy(&self) -> SelectionStrategy {
        self.strategy
    }

    /// Select the targets for one round.
    ///
    /// With `peers.len() <= fanout` every peer is returned in membership
    /// order; otherwise exactly `fanout` distinct peers are returned.
    pub fn select<R: Rng + ?Sized>(&self, peers: &[PeerTarget], rng: &mut R) -> Vec<PeerTarget> {
        let n = peers.len();
        if n <= self.fanout {
            return peers.to_vec();
        }

        match self.strategy {
            SelectionStrategy::Window => {
                let start = rng.gen_range(0..n);
                (0..self.fanout)
                    .map(|i| peers[(start + i) % n].clone())
                    .collect()
            }
            SelectionStrategy::Uniform => rand::seq::index::sample(rng, n, self.fanout)
                .into_iter()
                .map(|i| peers[i].clone())
                .collect(),
        }
    }
}
