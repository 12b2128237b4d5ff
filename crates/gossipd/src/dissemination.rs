//! One gossip round: fan-out push of the local state
//!
//! A round snapshots the register once, picks its targets, and pushes the
//! same copy to each of them as an independent task. Every push inherits the
//! round deadline; a push still running at the deadline is dropped and
//! counted as a failure for this round only. Failures are collected into a
//! [`RoundReport`] and logged, never returned.

use crate::stats::GossipStats;
use lww_gossip_core::{GossipMessage, PeerSelector, PeerTarget, PushTransport, Snapshot, VersionedValue};
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, warn};

/// Why a push did not complete
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The transport returned an error
    Transport(String),
    /// Still pending when the round deadline passed
    DeadlineExceeded,
    /// The push task panicked or was cancelled
    Aborted(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "{e}"),
            Self::DeadlineExceeded => f.write_str("deadline exceeded"),
            Self::Aborted(e) => write!(f, "aborted: {e}"),
        }
    }
}

/// A push that did not complete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushFailure {
    /// Peer name, or `?` when the task died before reporting
    pub peer: String,
    pub reason: FailureReason,
}

/// Outcome of one round
#[derive(Debug, Clone)]
pub struct RoundReport {
    /// The copy every target was sent
    pub snapshot: Snapshot,
    /// Pushes issued
    pub attempted: usize,
    /// Pushes acknowledged by the peer
    pub delivered: usize,
    pub failures: Vec<PushFailure>,
}

impl RoundReport {
    fn new(snapshot: Snapshot, attempted: usize) -> Self {
        Self {
            snapshot,
            attempted,
            delivered: 0,
            failures: Vec::new(),
        }
    }

    /// Whether every push was delivered
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn timed_out(&self) -> usize {
        self.failures
            .iter()
            .filter(|f| f.reason == FailureReason::DeadlineExceeded)
            .count()
    }
}

impl fmt::Display for RoundReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "generation {} delivered to {}/{} peers",
            self.snapshot.generation, self.delivered, self.attempted
        )?;
        for (i, failure) in self.failures.iter().enumerate() {
            let sep = if i == 0 { "; failed: " } else { ", " };
            write!(f, "{sep}{} ({})", failure.peer, failure.reason)?;
        }
        Ok(())
    }
}

/// Drives push rounds over a transport
pub struct Disseminator<T: PushTransport> {
    transport: Arc<T>,
    selector: PeerSelector,
    origin: String,
    stats: Arc<GossipStats>,
}

impl<T: PushTransport> Disseminator<T> {
    pub fn new(
        transport: Arc<T>,
        selector: PeerSelector,
        origin: impl Into<String>,
        stats: Arc<GossipStats>,
    ) -> Self {
        Self {
            transport,
            selector,
            origin: origin.into(),
            stats,
        }
    }

    pub fn selector(&self) -> &PeerSelector {
        &self.selector
    }

    /// Run one round against `peers`, finishing by `deadline`.
    pub async fn run_round(
        &self,
        peers: &[PeerTarget],
        value: &VersionedValue,
        deadline: Instant,
    ) -> RoundReport {
        let snapshot = value.read();
        let targets = {
            let mut rng = rand::thread_rng();
            self.selector.select(peers, &mut rng)
        };
        let msg = GossipMessage::new(snapshot, self.origin.as_str());

        let mut report = RoundReport::new(snapshot, targets.len());
        let mut pushes = JoinSet::new();
        for peer in targets {
            let transport = self.transport.clone();
            let msg = msg.clone();
            pushes.spawn(async move {
                let reason = match timeout_at(deadline, transport.send(&peer, &msg)).await {
                    Ok(Ok(())) => None,
                    Ok(Err(e)) => Some(FailureReason::Transport(e.to_string())),
                    Err(_) => Some(FailureReason::DeadlineExceeded),
                };
                (peer.name, reason)
            });
        }

        while let Some(joined) = pushes.join_next().await {
            let failure = match joined {
                Ok((_, None)) => {
                    report.delivered += 1;
                    self.stats.record_push_delivered();
                    continue;
                }
                Ok((peer, Some(reason))) => PushFailure { peer, reason },
                Err(e) => PushFailure {
                    peer: "?".to_string(),
                    reason: FailureReason::Aborted(e.to_string()),
                },
            };
            if failure.reason == FailureReason::DeadlineExceeded {
                self.stats.record_push_timed_out();
            } else {
                self.stats.record_push_failed();
            }
            report.failures.push(failure);
        }

        self.stats.record_round();
        if report.is_clean() {
            debug!("Gossip round: {}", report);
        } else {
            warn!("Error when notifying other members: {}", report);
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lww_gossip_core::SelectionStrategy;
    use parking_lot::Mutex;
    use std::collections::HashSet;
    use std::time::Duration;
    use thiserror::Error;

    #[derive(Debug, Error)]
    #[error("simulated network error")]
    struct SimulatedError;

    /// Records every push; named peers fail or never answer.
    #[derive(Default)]
    struct MockTransport {
        sent: Mutex<Vec<(String, GossipMessage)>>,
        failing: HashSet<String>,
        stalled: HashSet<String>,
    }

    impl MockTransport {
        fn failing(names: &[&str]) -> Self {
            Self {
                failing: names.iter().map(|s| s.to_string()).collect(),
                ..Self::default()
            }
        }

        fn stalled(names: &[&str]) -> Self {
            Self {
                stalled: names.iter().map(|s| s.to_string()).collect(),
                ..Self::default()
            }
        }

        fn targets(&self) -> Vec<String> {
            self.sent.lock().iter().map(|(name, _)| name.clone()).collect()
        }
    }

    impl PushTransport for MockTransport {
        type Error = SimulatedError;

        async fn send(&self, peer: &PeerTarget, msg: &GossipMessage) -> Result<(), SimulatedError> {
            self.sent.lock().push((peer.name.clone(), msg.clone()));
            if self.stalled.contains(&peer.name) {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            if self.failing.contains(&peer.name) {
                return Err(SimulatedError);
            }
            Ok(())
        }
    }

    fn peers(n: usize) -> Vec<PeerTarget> {
        (0..n)
            .map(|i| {
                PeerTarget::new(
                    format!("p{}", i + 1),
                    format!("127.0.0.1:{}", 9100 + i).parse().unwrap(),
                )
            })
            .collect()
    }

    fn disseminator(transport: MockTransport, fanout: usize) -> (Disseminator<MockTransport>, Arc<MockTransport>, Arc<GossipStats>) {
        let transport = Arc::new(transport);
        let stats = Arc::new(GossipStats::new());
        let d = Disseminator::new(
            transport.clone(),
            PeerSelector::new(fanout, SelectionStrategy::Window),
            "alpha",
            stats.clone(),
        );
        (d, transport, stats)
    }

    fn soon() -> Instant {
        Instant::now() + Duration::from_secs(5)
    }

    #[tokio::test]
    async fn test_fanout_bound() {
        for (n, expected) in [(0, 0), (1, 1), (2, 2), (5, 2), (9, 2)] {
            let (d, transport, _) = disseminator(MockTransport::default(), 2);
            let value = VersionedValue::new(1);

            let report = d.run_round(&peers(n), &value, soon()).await;

            let targets = transport.targets();
            let distinct: HashSet<_> = targets.iter().collect();
            assert_eq!(targets.len(), expected, "n = {n}");
            assert_eq!(distinct.len(), expected, "n = {n}");
            assert_eq!(report.attempted, expected);
            assert_eq!(report.delivered, expected);
            assert!(report.is_clean());
        }
    }

    #[tokio::test]
    async fn test_every_target_gets_the_same_snapshot() {
        let (d, transport, _) = disseminator(MockTransport::default(), 3);
        let value = VersionedValue::new(0);
        value.write(42).unwrap();

        let report = d.run_round(&peers(3), &value, soon()).await;

        let expected = GossipMessage {
            value: 42,
            generation: 1,
            origin: "alpha".into(),
        };
        for (_, msg) in transport.sent.lock().iter() {
            assert_eq!(msg, &expected);
        }
        assert_eq!(report.snapshot, expected.snapshot());
    }

    #[tokio::test]
    async fn test_partial_failure_is_isolated() {
        let (d, transport, stats) = disseminator(MockTransport::failing(&["p2"]), 3);
        let value = VersionedValue::new(7);

        let report = d.run_round(&peers(3), &value, soon()).await;

        assert_eq!(transport.targets().len(), 3);
        assert_eq!(report.delivered, 2);
        assert_eq!(
            report.failures,
            vec![PushFailure {
                peer: "p2".into(),
                reason: FailureReason::Transport("simulated network error".into()),
            }]
        );
        assert!(report.to_string().ends_with("failed: p2 (simulated network error)"));

        let counts = stats.snapshot();
        assert_eq!(counts.rounds, 1);
        assert_eq!(counts.pushes_delivered, 2);
        assert_eq!(counts.pushes_failed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_abandons_slow_pushes() {
        let (d, _, stats) = disseminator(MockTransport::stalled(&["p1"]), 3);
        let value = VersionedValue::new(0);
        let started = Instant::now();

        let report = d
            .run_round(&peers(3), &value, started + Duration::from_millis(100))
            .await;

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(100));
        assert!(elapsed < Duration::from_secs(1));
        assert_eq!(report.delivered, 2);
        assert_eq!(report.timed_out(), 1);
        assert_eq!(report.failures[0].peer, "p1");
        assert_eq!(stats.snapshot().pushes_timed_out, 1);
    }

    #[tokio::test]
    async fn test_expired_deadline_fails_every_push() {
        let (d, _, _) = disseminator(MockTransport::stalled(&["p1", "p2"]), 2);
        let value = VersionedValue::new(0);

        let report = d.run_round(&peers(2), &value, Instant::now()).await;

        assert_eq!(report.delivered, 0);
        assert_eq!(report.timed_out(), 2);
    }
}
