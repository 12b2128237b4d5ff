//! gossipd server - listener and service loop

use crate::config::Config;
use crate::dissemination::Disseminator;
use crate::membership::{MembershipManager, MembershipStats};
use crate::node::Node;
use crate::scheduler::{RoundScheduler, ShutdownMode};
use crate::stats::StatsSnapshot;
use futures::{SinkExt, StreamExt};
use lww_gossip_core::Snapshot;
use lww_gossip_net::{Frame, FrameCodec, FrameError, FrameType, TcpTransport};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio_util::codec::Framed;
use tracing::{debug, error, info, warn};

/// Server errors
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Bind failed on {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        source: std::io::Error,
    },
}

/// Server state
pub struct Server {
    config: Config,
    node: Arc<Node>,
    membership: Arc<MembershipManager>,
    transport: Arc<TcpTransport>,
    /// Shutdown signal; latched so a request made before `serve` still counts
    shutdown_tx: watch::Sender<bool>,
}

impl Server {
    /// Create a new server instance
    pub fn new(config: Config) -> Self {
        let node = Arc::new(Node::new(&config.name, config.initial_value));
        let membership = Arc::new(MembershipManager::with_peers(
            &config.name,
            config.peers.iter().cloned(),
        ));
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            config,
            node,
            membership,
            transport: Arc::new(TcpTransport::default()),
            shutdown_tx,
        }
    }

    pub fn node(&self) -> &Arc<Node> {
        &self.node
    }

    pub fn membership(&self) -> &Arc<MembershipManager> {
        &self.membership
    }

    /// Bind the configured address and serve until shutdown
    pub async fn run(&self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.config.listen)
            .await
            .map_err(|source| ServerError::BindFailed {
                addr: self.config.listen,
                source,
            })?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener until shutdown
    pub async fn serve(&self, listener: TcpListener) -> Result<(), ServerError> {
        let local_addr = listener.local_addr()?;
        info!(
            "Starting gossipd node {} on {} ({} peers, fan-out {}, {} selection)",
            self.node.name(),
            local_addr,
            self.config.peers.len(),
            self.config.fanout,
            self.config.selection
        );

        let disseminator = Disseminator::new(
            self.transport.clone(),
            self.config.selector(),
            self.node.name(),
            self.node.stats().clone(),
        );
        let scheduler = RoundScheduler::new(
            self.config.schedule(),
            self.membership.clone(),
            Arc::new(disseminator),
            self.node.value().clone(),
            self.node.stats().clone(),
        )
        .spawn();

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let mut connections = JoinSet::new();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            debug!("Accepted connection from {}", addr);
                            let node = self.node.clone();
                            connections.spawn(async move {
                                if let Err(e) = handle_connection(node, stream).await {
                                    warn!("Connection error from {}: {}", addr, e);
                                }
                            });
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
                _ = shutdown_rx.wait_for(|stop| *stop) => {
                    info!("Shutting down...");
                    break;
                }
            }
        }

        scheduler.shutdown(ShutdownMode::Drain).await;
        connections.shutdown().await;
        let stats = self.stats();
        info!(
            "Final state: {} ({} of {} members alive); gossip: {}",
            stats.state, stats.members.alive, stats.members.total, stats.gossip
        );

        Ok(())
    }

    /// Shutdown the server
    pub fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }

    /// Get server statistics
    pub fn stats(&self) -> ServerStats {
        ServerStats {
            state: self.node.get(),
            members: self.membership.stats(),
            gossip: self.node.stats().snapshot(),
        }
    }
}

/// Server statistics
#[derive(Debug, Clone)]
pub struct ServerStats {
    pub state: Snapshot,
    pub members: MembershipStats,
    pub gossip: StatsSnapshot,
}

/// Serve requests on one connection until the peer hangs up
async fn handle_connection(node: Arc<Node>, stream: TcpStream) -> Result<(), FrameError> {
    stream.set_nodelay(true)?;
    let mut framed = Framed::new(stream, FrameCodec::new());

    while let Some(frame) = framed.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                // The stream is unusable after a framing error; tell the peer why.
                let _ = framed.send(Frame::rejected(e.to_string())).await;
                return Err(e);
            }
        };
        framed.send(respond(&node, frame)).await?;
    }
    Ok(())
}

/// Build the reply to one request frame
pub fn respond(node: &Node, frame: Frame) -> Frame {
    match frame.frame_type {
        FrameType::Ping => Frame::pong(),
        FrameType::Push => match frame.to_gossip_message() {
            Ok(msg) => encoded(Frame::push_ack(node.notify(&msg))),
            Err(e) => Frame::rejected(format!("malformed push: {e}")),
        },
        FrameType::Get => encoded(Frame::value(node.get())),
        FrameType::Set => match frame.to_set_request() {
            Ok(req) => match node.set(req.value) {
                Ok(snapshot) => encoded(Frame::value(snapshot)),
                Err(e) => Frame::rejected(format!("write refused: {e}")),
            },
            Err(e) => Frame::rejected(format!("malformed set: {e}")),
        },
        other => Frame::rejected(format!("unexpected frame: {other:?}")),
    }
}

fn encoded(frame: lww_gossip_core::Result<Frame>) -> Frame {
    frame.unwrap_or_else(|e| Frame::rejected(format!("encoding failed: {e}")))
}
