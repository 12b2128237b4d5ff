//! Round scheduling
//!
//! Two tickers run independently: gossip rounds and housekeeping. Each gossip
//! tick spawns its round as a separate task, so a slow round never delays the
//! next tick. Whether rounds may overlap is an [`OverlapPolicy`]. All round
//! tasks live in a `JoinSet` owned by the loop; on shutdown they are either
//! drained (each is bounded by the round timeout) or aborted.

use crate::dissemination::{Disseminator, RoundReport};
use crate::stats::GossipStats;
use clap::ValueEnum;
use lww_gossip_core::{MembershipProvider, PushTransport, VersionedValue};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Whether a gossip tick may start a round while an earlier one is running
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OverlapPolicy {
    /// Every tick starts a round
    #[default]
    Concurrent,
    /// A tick is skipped while a round is still in flight
    Skip,
}

/// What happens to in-flight rounds at shutdown
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShutdownMode {
    /// Wait for running rounds to finish
    Drain,
    /// Cancel running rounds
    Abort,
}

/// Scheduler timing
#[derive(Clone, Copy, Debug)]
pub struct ScheduleSettings {
    pub gossip_interval: Duration,
    /// Deadline for every push of a round, measured from the tick
    pub round_timeout: Duration,
    pub housekeeping_interval: Duration,
    pub overlap: OverlapPolicy,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            gossip_interval: Duration::from_secs(2),
            round_timeout: Duration::from_secs(2),
            housekeeping_interval: Duration::from_secs(15),
            overlap: OverlapPolicy::Concurrent,
        }
    }
}

/// Fires gossip and housekeeping rounds
pub struct RoundScheduler<M: MembershipProvider, T: PushTransport> {
    settings: ScheduleSettings,
    membership: Arc<M>,
    disseminator: Arc<Disseminator<T>>,
    value: Arc<VersionedValue>,
    stats: Arc<GossipStats>,
}

impl<M: MembershipProvider, T: PushTransport> RoundScheduler<M, T> {
    pub fn new(
        settings: ScheduleSettings,
        membership: Arc<M>,
        disseminator: Arc<Disseminator<T>>,
        value: Arc<VersionedValue>,
        stats: Arc<GossipStats>,
    ) -> Self {
        Self {
            settings,
            membership,
            disseminator,
            value,
            stats,
        }
    }

    /// Start both tickers. Dropping the handle stops them as well, draining
    /// in-flight rounds.
    pub fn spawn(self) -> SchedulerHandle {
        let (shutdown_tx, _) = broadcast::channel(1);
        let scheduler = Arc::new(self);

        let gossip = tokio::spawn(scheduler.clone().gossip_loop(shutdown_tx.subscribe()));
        let housekeeping = tokio::spawn(scheduler.housekeeping_loop(shutdown_tx.subscribe()));

        SchedulerHandle {
            shutdown_tx,
            gossip,
            housekeeping,
        }
    }

    /// Run a single gossip round now. Returns `None` when the round was
    /// skipped because membership failed or returned no peers.
    pub async fn gossip_round(&self) -> Option<RoundReport> {
        let peers = match self.membership.live_peers() {
            Ok(peers) => peers,
            Err(e) => {
                warn!("Membership lookup failed, skipping round: {}", e);
                self.stats.record_skipped_round();
                return None;
            }
        };
        if peers.is_empty() {
            debug!("No live peers, skipping round");
            self.stats.record_skipped_round();
            return None;
        }

        let deadline = Instant::now() + self.settings.round_timeout;
        Some(self.disseminator.run_round(&peers, &self.value, deadline).await)
    }

    /// Log members, current state and counters
    pub fn housekeeping(&self) {
        match self.membership.live_peers() {
            Ok(peers) => {
                for (i, peer) in peers.iter().enumerate() {
                    info!("Member {}: {} ({})", i, peer, peer.id);
                }
            }
            Err(e) => warn!("Membership lookup failed: {}", e),
        }
        info!("{}", self.value.read());
        info!("Gossip stats: {}", self.stats.snapshot());
    }

    async fn gossip_loop(self: Arc<Self>, mut shutdown_rx: broadcast::Receiver<ShutdownMode>) {
        let period = self.settings.gossip_interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut rounds = JoinSet::new();

        let mode = loop {
            // Finished rounds are reaped before a tick is considered, so the
            // skip policy only sees rounds that are really still running.
            tokio::select! {
                biased;
                Some(joined) = rounds.join_next(), if !rounds.is_empty() => {
                    if let Err(e) = joined {
                        warn!("Gossip round task failed: {}", e);
                    }
                }
                _ = ticker.tick() => {
                    if self.settings.overlap == OverlapPolicy::Skip && !rounds.is_empty() {
                        debug!("Previous round still running, skipping tick");
                        self.stats.record_skipped_round();
                        continue;
                    }
                    let scheduler = self.clone();
                    rounds.spawn(async move {
                        scheduler.gossip_round().await;
                    });
                }
                received = shutdown_rx.recv() => {
                    break received.unwrap_or(ShutdownMode::Drain);
                }
            }
        };

        match mode {
            ShutdownMode::Drain => {
                debug!("Draining {} in-flight rounds", rounds.len());
                while let Some(joined) = rounds.join_next().await {
                    if let Err(e) = joined {
                        warn!("Gossip round task failed: {}", e);
                    }
                }
            }
            ShutdownMode::Abort => {
                debug!("Aborting {} in-flight rounds", rounds.len());
                rounds.shutdown().await;
            }
        }
    }

    async fn housekeeping_loop(self: Arc<Self>, mut shutdown_rx: broadcast::Receiver<ShutdownMode>) {
        let period = self.settings.housekeeping_interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.housekeeping(),
                _ = shutdown_rx.recv() => break,
            }
        }
    }
}

/// Handle to the running tickers
pub struct SchedulerHandle {
    shutdown_tx: broadcast::Sender<ShutdownMode>,
    gossip: JoinHandle<()>,
    housekeeping: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop firing rounds and wait for the tickers to exit
    pub async fn shutdown(self, mode: ShutdownMode) {
        let _ = self.shutdown_tx.send(mode);
        for task in [self.gossip, self.housekeeping] {
            if let Err(e) = task.await {
                warn!("Scheduler task failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::membership::MembershipManager;
    use lww_gossip_core::{GossipMessage, MembershipError, PeerSelector, PeerTarget, SelectionStrategy};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use thiserror::Error;

    #[derive(Debug, Error)]
    #[error("unreachable")]
    struct Never;

    /// Counts pushes as they start, then takes `delay` to finish.
    struct SlowTransport {
        started: AtomicUsize,
        delay: Duration,
    }

    impl PushTransport for SlowTransport {
        type Error = Never;

        async fn send(&self, _peer: &PeerTarget, _msg: &GossipMessage) -> Result<(), Never> {
            self.started.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(())
        }
    }

    struct BrokenMembership;

    impl MembershipProvider for BrokenMembership {
        fn live_peers(&self) -> Result<Vec<PeerTarget>, MembershipError> {
            Err(MembershipError::Unavailable("agent down".into()))
        }
    }

    fn settings(overlap: OverlapPolicy) -> ScheduleSettings {
        ScheduleSettings {
            gossip_interval: Duration::from_millis(100),
            round_timeout: Duration::from_secs(10),
            housekeeping_interval: Duration::from_secs(15),
            overlap,
        }
    }

    fn scheduler<M: MembershipProvider>(
        settings: ScheduleSettings,
        membership: M,
        delay: Duration,
    ) -> (RoundScheduler<M, SlowTransport>, Arc<SlowTransport>, Arc<GossipStats>) {
        let transport = Arc::new(SlowTransport {
            started: AtomicUsize::new(0),
            delay,
        });
        let stats = Arc::new(GossipStats::new());
        let disseminator = Arc::new(Disseminator::new(
            transport.clone(),
            PeerSelector::new(2, SelectionStrategy::Window),
            "alpha",
            stats.clone(),
        ));
        let scheduler = RoundScheduler::new(
            settings,
            Arc::new(membership),
            disseminator,
            Arc::new(VersionedValue::new(0)),
            stats.clone(),
        );
        (scheduler, transport, stats)
    }

    fn one_peer() -> MembershipManager {
        MembershipManager::with_peers(
            "alpha",
            vec![PeerTarget::new("beta", "127.0.0.1:9101".parse().unwrap())],
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_rounds_do_not_delay_ticks() {
        let (scheduler, transport, _) =
            scheduler(settings(OverlapPolicy::Concurrent), one_peer(), Duration::from_secs(3600));
        let handle = scheduler.spawn();

        tokio::time::sleep(Duration::from_millis(350)).await;
        assert_eq!(transport.started.load(Ordering::SeqCst), 3);

        handle.shutdown(ShutdownMode::Abort).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_skip_policy_serializes_rounds() {
        let (scheduler, transport, stats) =
            scheduler(settings(OverlapPolicy::Skip), one_peer(), Duration::from_secs(3600));
        let handle = scheduler.spawn();

        tokio::time::sleep(Duration::from_millis(350)).await;
        assert_eq!(transport.started.load(Ordering::SeqCst), 1);
        assert_eq!(stats.snapshot().rounds_skipped, 2);

        handle.shutdown(ShutdownMode::Abort).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_skip_policy_runs_every_tick_when_rounds_finish() {
        let (scheduler, transport, stats) =
            scheduler(settings(OverlapPolicy::Skip), one_peer(), Duration::from_millis(90));
        let handle = scheduler.spawn();

        tokio::time::sleep(Duration::from_millis(350)).await;
        assert_eq!(transport.started.load(Ordering::SeqCst), 3);
        assert_eq!(stats.snapshot().rounds_skipped, 0);

        handle.shutdown(ShutdownMode::Drain).await;
        assert_eq!(stats.snapshot().rounds, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_membership_failure_skips_round() {
        let (scheduler, transport, stats) = scheduler(
            settings(OverlapPolicy::Concurrent),
            BrokenMembership,
            Duration::ZERO,
        );
        let handle = scheduler.spawn();

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(transport.started.load(Ordering::SeqCst), 0);
        assert_eq!(stats.snapshot().rounds_skipped, 2);

        handle.shutdown(ShutdownMode::Drain).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_waits_for_in_flight_round() {
        let (scheduler, _, stats) = scheduler(
            settings(OverlapPolicy::Concurrent),
            one_peer(),
            Duration::from_millis(200),
        );
        let handle = scheduler.spawn();

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(stats.snapshot().pushes_delivered, 0);

        handle.shutdown(ShutdownMode::Drain).await;
        let counts = stats.snapshot();
        assert_eq!(counts.rounds, 1);
        assert_eq!(counts.pushes_delivered, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abort_cancels_in_flight_round() {
        let (scheduler, transport, stats) = scheduler(
            settings(OverlapPolicy::Concurrent),
            one_peer(),
            Duration::from_millis(200),
        );
        let handle = scheduler.spawn();

        tokio::time::sleep(Duration::from_millis(150)).await;
        handle.shutdown(ShutdownMode::Abort).await;

        assert_eq!(transport.started.load(Ordering::SeqCst), 1);
        assert_eq!(stats.snapshot().rounds, 0);
    }

    #[tokio::test]
    async fn test_gossip_round_without_peers() {
        let (scheduler, _, stats) = scheduler(
            ScheduleSettings::default(),
            MembershipManager::new("alpha"),
            Duration::ZERO,
        );
        assert!(scheduler.gossip_round().await.is_none());
        assert_eq!(stats.snapshot().rounds_skipped, 1);
        scheduler.housekeeping();
    }
}
