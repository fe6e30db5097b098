//! Transport framing: the fixed header in front of every datagram.

use bytemuck::{Pod, Zeroable};

/// Marks datagrams belonging to this protocol; anything else is dropped.
pub const FRAME_MAGIC: u16 = 0xC0BE;
pub const HEADER_LEN: usize = std::mem::size_of::<FrameHeader>();
/// Largest datagram we send, chosen to stay under common path MTUs.
pub const MAX_DATAGRAM: usize = 1200;
pub const MAX_PAYLOAD: usize = MAX_DATAGRAM - HEADER_LEN;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct FrameHeader {
    kind: u8,
    channel: u8,
    magic: u16,
    sequence: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Client → server, body is the 16-byte session token.
    Connect,
    /// Server → client, body is the assigned peer id.
    Accept,
    /// Server → client, the server is full.
    Refuse,
    Disconnect,
    Ping,
    /// Acknowledges the reliable message in `sequence`.
    Ack,
    Unreliable,
    Reliable,
}

impl FrameKind {
    fn to_byte(self) -> u8 {
        match self {
            FrameKind::Connect => 1,
            FrameKind::Accept => 2,
            FrameKind::Refuse => 3,
            FrameKind::Disconnect => 4,
            FrameKind::Ping => 5,
            FrameKind::Ack => 6,
            FrameKind::Unreliable => 7,
            FrameKind::Reliable => 8,
        }
    }

    fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            1 => FrameKind::Connect,
            2 => FrameKind::Accept,
            3 => FrameKind::Refuse,
            4 => FrameKind::Disconnect,
            5 => FrameKind::Ping,
            6 => FrameKind::Ack,
            7 => FrameKind::Unreliable,
            8 => FrameKind::Reliable,
            _ => return None,
        })
    }
}

/// Logical channel within a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Reliable,
    Unreliable,
}

impl Channel {
    pub fn index(self) -> u8 {
        match self {
            Channel::Reliable => 0,
            Channel::Unreliable => 1,
        }
    }
}

/// A borrowed, validated frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    pub kind: FrameKind,
    pub channel: u8,
    pub sequence: u32,
    pub body: &'a [u8],
}

pub fn encode(kind: FrameKind, channel: u8, sequence: u32, body: &[u8]) -> Vec<u8> {
    let header = FrameHeader {
        kind: kind.to_byte(),
        channel,
        magic: FRAME_MAGIC,
        sequence,
    };
    let mut out = Vec::with_capacity(HEADER_LEN + body.len());
    out.extend_from_slice(bytemuck::bytes_of(&header));
    out.extend_from_slice(body);
    out
}

pub fn decode(bytes: &[u8]) -> Option<Frame<'_>> {
    let header: FrameHeader = bytemuck::pod_read_unaligned(bytes.get(..HEADER_LEN)?);
    if header.magic != FRAME_MAGIC {
        return None;
    }
    Some(Frame {
        kind: FrameKind::from_byte(header.kind)?,
        channel: header.channel,
        sequence: header.sequence,
        body: &bytes[HEADER_LEN..],
    })
}

/// True when `a` is after `b` in wrapping sequence space.
pub fn sequence_newer(a: u32, b: u32) -> bool {
    (a.wrapping_sub(b) as i32) > 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_eight_bytes() {
        assert_eq!(HEADER_LEN, 8);
    }

    #[test]
    fn decode_reads_header_and_body() {
        let bytes = encode(FrameKind::Reliable, Channel::Reliable.index(), 41, b"hello");
        let frame = decode(&bytes).unwrap();
        assert_eq!(frame.kind, FrameKind::Reliable);
        assert_eq!(frame.channel, 0);
        assert_eq!(frame.sequence, 41);
        assert_eq!(frame.body, b"hello");
    }

    #[test]
    fn foreign_datagrams_are_dropped() {
        assert!(decode(&[1, 2, 3]).is_none());
        let mut bytes = encode(FrameKind::Ping, 0, 0, &[]);
        bytes[2] ^= 0xFF;
        assert!(decode(&bytes).is_none());
        let mut bytes = encode(FrameKind::Ping, 0, 0, &[]);
        bytes[0] = 200;
        assert!(decode(&bytes).is_none());
    }

    #[test]
    fn sequence_comparison_wraps() {
        assert!(sequence_newer(1, 0));
        assert!(!sequence_newer(0, 0));
        assert!(!sequence_newer(0, 1));
        assert!(sequence_newer(2, u32::MAX - 1));
        assert!(!sequence_newer(u32::MAX - 1, 2));
    }
}
