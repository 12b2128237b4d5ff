//! Request/response client over one TCP connection

use crate::framing::{Frame, FrameCodec, FrameType};
use crate::transport::TransportError;
use futures::{SinkExt, StreamExt};
use lww_gossip_core::{GossipMessage, Snapshot};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_util::codec::Framed;

/// A connection to a node's listener
pub struct Client {
    framed: Framed<TcpStream, FrameCodec>,
    addr: SocketAddr,
}

impl Client {
    /// Connect to a node
    pub async fn connect(addr: SocketAddr) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Ok(Self {
            framed: Framed::new(stream, FrameCodec::new()),
            addr,
        })
    }

    /// Connect, giving up after `timeout`
    pub async fn connect_timeout(addr: SocketAddr, timeout: Duration) -> Result<Self, TransportError> {
        tokio::time::timeout(timeout, Self::connect(addr))
            .await
            .map_err(|_| TransportError::ConnectTimeout)?
    }

    /// Remote address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Send one frame and wait for the reply of the expected type
    async fn request(&mut self, frame: Frame, expect: FrameType) -> Result<Frame, TransportError> {
        self.framed.send(frame).await?;
        let reply = self
            .framed
            .next()
            .await
            .ok_or(TransportError::ConnectionClosed)??;

        match reply.frame_type {
            t if t == expect => Ok(reply),
            FrameType::Rejected => Err(TransportError::Rejected(reply.reason())),
            other => Err(TransportError::UnexpectedFrame(other)),
        }
    }

    /// Push a gossip copy; returns whether the remote adopted it
    pub async fn push(&mut self, msg: &GossipMessage) -> Result<bool, TransportError> {
        let reply = self.request(Frame::push(msg)?, FrameType::PushAck).await?;
        Ok(reply.to_push_ack()?.accepted)
    }

    /// Read the remote's current value
    pub async fn get(&mut self) -> Result<Snapshot, TransportError> {
        let reply = self.request(Frame::get(), FrameType::Value).await?;
        Ok(reply.to_snapshot()?)
    }

    /// Write a value on the remote; returns the resulting state
    pub async fn set(&mut self, value: i64) -> Result<Snapshot, TransportError> {
        let reply = self.request(Frame::set(value)?, FrameType::Value).await?;
        Ok(reply.to_snapshot()?)
    }

    pub async fn ping(&mut self) -> Result<(), TransportError> {
        self.request(Frame::ping(), FrameType::Pong).await?;
        Ok(())
    }
}
