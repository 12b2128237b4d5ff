//! Message framing for network transport
//!
//! Provides length-prefixed framing over a byte stream.

use bytes::{Buf, BufMut, BytesMut};
use thiserror::Error;
use tokio_util::codec::{Decoder, Encoder};

/// Maximum frame size (1 MiB)
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Framing errors
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Frame too large: {0} bytes (max {MAX_FRAME_SIZE})")]
    TooLarge(usize),
    #[error("Empty frame")]
    Empty,
    #[error("Unknown frame type: {0}")]
    UnknownType(u8),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A framed message
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Frame type
    pub frame_type: FrameType,
    /// Payload bytes
    pub payload: Vec<u8>,
}

/// Frame types
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameType {
    /// Ping for keepalive
    Ping = 0,
    /// Pong response
    Pong = 1,
    /// Gossip push of a (value, generation, origin) copy
    Push = 10,
    /// Push acknowledgement, says whether the copy was adopted
    PushAck = 11,
    /// Read the current value
    Get = 20,
    /// Write a new value locally
    Set = 21,
    /// Current (value, generation), answers Get and Set
    Value = 22,
    /// Request rejected; payload is the reason
    Rejected = 30,
}

impl TryFrom<u8> for FrameType {
    type Error = FrameError;

    fn try_from(value: u8) -> Result<Self, FrameError> {
        match value {
            0 => Ok(Self::Ping),
            1 => Ok(Self::Pong),
            10 => Ok(Self::Push),
            11 => Ok(Self::PushAck),
            20 => Ok(Self::Get),
            21 => Ok(Self::Set),
            22 => Ok(Self::Value),
            30 => Ok(Self::Rejected),
            other => Err(FrameError::UnknownType(other)),
        }
    }
}

/// Codec for length-prefixed frames
///
/// Wire format:
/// - 4 bytes: length (big-endian, includes type byte)
/// - 1 byte: frame type
/// - N bytes: payload
#[derive(Debug, Default)]
pub struct FrameCodec;

impl FrameCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < 4 {
            return Ok(None);
        }

        let length = u32::from_be_bytes([src[0], src[1], src[2], src[3]]) as usize;

        if length == 0 {
            return Err(FrameError::Empty);
        }
        if length > MAX_FRAME_SIZE {
            return Err(FrameError::TooLarge(length));
        }

        if src.len() < 4 + length {
            src.reserve(4 + length - src.len());
            return Ok(None);
        }

        src.advance(4);
        let frame_type = FrameType::try_from(src[0]);
        src.advance(1);
        let payload = src.split_to(length - 1).to_vec();

        Ok(Some(Frame {
            frame_type: frame_type?,
            payload,
        }))
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let length = 1 + item.payload.len();
        if length > MAX_FRAME_SIZE {
            return Err(FrameError::TooLarge(length));
        }

        dst.reserve(4 + length);
        dst.put_u32(length as u32);
        dst.put_u8(item.frame_type as u8);
        dst.put_slice(&item.payload);

        Ok(())
    }
}

impl Frame {
    /// Create a new frame
    pub fn new(frame_type: FrameType, payload: Vec<u8>) -> Self {
        Self {
            frame_type,
            payload,
        }
    }

    /// Create a ping frame
    pub fn ping() -> Self {
        Self::new(FrameType::Ping, vec![])
    }

    /// Create a pong frame
    pub fn pong() -> Self {
        Self::new(FrameType::Pong, vec![])
    }

    /// Create a get frame
    pub fn get() -> Self {
        Self::new(FrameType::Get, vec![])
    }

    /// Create a rejection frame carrying a human-readable reason
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::new(FrameType::Rejected, reason.into().into_bytes())
    }

    /// Reason text of a rejection frame
    pub fn reason(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_roundtrip() {
        let mut codec = FrameCodec::new();
        let frame = Frame::new(FrameType::Push, vec![1, 2, 3, 4, 5]);

        let mut buf = BytesMut::new();
        codec.encode(frame.clone(), &mut buf).unwrap();
        assert_eq!(&buf[..5], &[0, 0, 0, 6, 10]);

        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, frame);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_partial_frame_waits_for_more() {
        let mut codec = FrameCodec::new();
        let mut full = BytesMut::new();
        codec.encode(Frame::get(), &mut full).unwrap();
        codec.encode(Frame::ping(), &mut full).unwrap();

        let mut buf = BytesMut::from(&full[..3]);
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(&full[3..]);
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), Frame::get());
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), Frame::ping());
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_rejects_oversized_and_unknown() {
        let mut codec = FrameCodec::new();

        let mut buf = BytesMut::new();
        buf.put_u32((MAX_FRAME_SIZE + 1) as u32);
        assert!(matches!(codec.decode(&mut buf), Err(FrameError::TooLarge(_))));

        let mut buf = BytesMut::new();
        buf.put_u32(1);
        buf.put_u8(99);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(FrameError::UnknownType(99))
        ));

        let mut buf = BytesMut::new();
        buf.put_u32(0);
        assert!(matches!(codec.decode(&mut buf), Err(FrameError::Empty)));
    }

    #[test]
    fn test_rejected_frame_reason() {
        let frame = Frame::rejected("malformed payload");
        assert_eq!(frame.frame_type, FrameType::Rejected);
        assert_eq!(frame.reason(), "malformed payload");
    }
}
