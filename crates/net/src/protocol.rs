//! Application wire protocol carried inside transport frames.
//!
//! Every packet starts with a one-byte tag. Multi-byte fields are host-endian
//! `#[repr(C)]` records copied with `bytemuck`.
//!
//! | Tag | Body | Direction |
//! |-----|------|-----------|
//! | 1   | x, y, z, yaw (`f32` each) | client → server, server → clients (own avatar) |
//! | 1   | sender (`u32`), x, y, z, yaw | server → clients (relay) |
//! | 2   | peer (`u32`) | server → clients, reliable |
//! | 254 | 64-byte NUL-padded map name | server → new client, reliable |

use crate::error::ProtocolError;
use bytemuck::{Pod, Zeroable};
use cubeworld_common::PeerId;
use glam::Vec3;

pub const TAG_POSITION: u8 = 1;
pub const TAG_PEER_LEFT: u8 = 2;
pub const TAG_METADATA: u8 = 254;

/// Fixed size of the map-name field, including the terminating NUL.
pub const MAP_NAME_LEN: usize = 64;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct PositionWire {
    x: f32,
    y: f32,
    z: f32,
    yaw: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct RelayedPositionWire {
    sender: u32,
    x: f32,
    y: f32,
    z: f32,
    yaw: f32,
}

const POSITION_LEN: usize = std::mem::size_of::<PositionWire>();
const RELAYED_LEN: usize = std::mem::size_of::<RelayedPositionWire>();
const PEER_LEFT_LEN: usize = std::mem::size_of::<u32>();

/// A decoded application packet.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    /// Position of the sending side's own avatar.
    Position { position: Vec3, yaw: f32 },
    /// Position of another participant, fanned out by the server.
    RelayedPosition { sender: PeerId, position: Vec3, yaw: f32 },
    /// A participant left the server.
    PeerLeft { peer: PeerId },
    /// Map the server is running, sent once on connect.
    Metadata { map: String },
}

impl Packet {
    pub fn tag(&self) -> u8 {
        match self {
            Packet::Position { .. } | Packet::RelayedPosition { .. } => TAG_POSITION,
            Packet::PeerLeft { .. } => TAG_PEER_LEFT,
            Packet::Metadata { .. } => TAG_METADATA,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = vec![self.tag()];
        match self {
            Packet::Position { position, yaw } => {
                let wire = PositionWire {
                    x: position.x,
                    y: position.y,
                    z: position.z,
                    yaw: *yaw,
                };
                out.extend_from_slice(bytemuck::bytes_of(&wire));
            }
            Packet::RelayedPosition {
                sender,
                position,
                yaw,
            } => {
                let wire = RelayedPositionWire {
                    sender: sender.0,
                    x: position.x,
                    y: position.y,
                    z: position.z,
                    yaw: *yaw,
                };
                out.extend_from_slice(bytemuck::bytes_of(&wire));
            }
            Packet::PeerLeft { peer } => {
                out.extend_from_slice(bytemuck::bytes_of(&peer.0));
            }
            Packet::Metadata { map } => {
                out.extend_from_slice(&encode_map_name(map));
            }
        }
        out
    }

    /// Decode one packet. Short or unknown packets are rejected before any
    /// field is read.
    pub fn decode(bytes: &[u8]) -> Result<Packet, ProtocolError> {
        let (&tag, body) = bytes.split_first().ok_or(ProtocolError::Empty)?;
        match tag {
            TAG_POSITION if body.len() >= RELAYED_LEN => {
                let wire: RelayedPositionWire = bytemuck::pod_read_unaligned(&body[..RELAYED_LEN]);
                Ok(Packet::RelayedPosition {
                    sender: PeerId(wire.sender),
                    position: Vec3::new(wire.x, wire.y, wire.z),
                    yaw: wire.yaw,
                })
            }
            TAG_POSITION => {
                let body = require(tag, body, POSITION_LEN)?;
                let wire: PositionWire = bytemuck::pod_read_unaligned(body);
                Ok(Packet::Position {
                    position: Vec3::new(wire.x, wire.y, wire.z),
                    yaw: wire.yaw,
                })
            }
            TAG_PEER_LEFT => {
                let body = require(tag, body, PEER_LEFT_LEN)?;
                let peer: u32 = bytemuck::pod_read_unaligned(body);
                Ok(Packet::PeerLeft { peer: PeerId(peer) })
            }
            TAG_METADATA => {
                let body = require(tag, body, MAP_NAME_LEN)?;
                Ok(Packet::Metadata {
                    map: decode_map_name(body),
                })
            }
            other => Err(ProtocolError::UnknownTag(other)),
        }
    }
}

fn require(tag: u8, body: &[u8], expected: usize) -> Result<&[u8], ProtocolError> {
    body.get(..expected).ok_or(ProtocolError::Truncated {
        tag,
        expected: expected + 1,
        actual: body.len() + 1,
    })
}

/// NUL-pad `map` into the fixed field, truncating on a char boundary so at
/// least one NUL always remains.
fn encode_map_name(map: &str) -> [u8; MAP_NAME_LEN] {
    let mut field = [0u8; MAP_NAME_LEN];
    let mut end = map.len().min(MAP_NAME_LEN - 1);
    while !map.is_char_boundary(end) {
        end -= 1;
    }
    field[..end].copy_from_slice(&map.as_bytes()[..end]);
    field
}

fn decode_map_name(field: &[u8]) -> String {
    let end = field.iter().position(|b| *b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_wire_layout() {
        let bytes = Packet::Position {
            position: Vec3::new(1.0, 2.0, 3.0),
            yaw: 90.0,
        }
        .encode();
        assert_eq!(bytes.len(), 17);
        assert_eq!(bytes[0], TAG_POSITION);
        assert_eq!(&bytes[1..5], &1.0f32.to_ne_bytes());
        assert_eq!(&bytes[13..17], &90.0f32.to_ne_bytes());
    }

    #[test]
    fn relayed_position_carries_sender_first() {
        let bytes = Packet::RelayedPosition {
            sender: PeerId(7),
            position: Vec3::new(1.0, 2.0, 3.0),
            yaw: 90.0,
        }
        .encode();
        assert_eq!(bytes.len(), 21);
        assert_eq!(&bytes[1..5], &7u32.to_ne_bytes());
        assert_eq!(
            Packet::decode(&bytes),
            Ok(Packet::RelayedPosition {
                sender: PeerId(7),
                position: Vec3::new(1.0, 2.0, 3.0),
                yaw: 90.0,
            })
        );
    }

    #[test]
    fn length_selects_direct_or_relayed() {
        let direct = Packet::Position {
            position: Vec3::new(4.0, 5.0, 6.0),
            yaw: -45.0,
        };
        assert_eq!(Packet::decode(&direct.encode()), Ok(direct));
    }

    #[test]
    fn short_packets_are_rejected() {
        assert_eq!(Packet::decode(&[]), Err(ProtocolError::Empty));
        assert_eq!(
            Packet::decode(&[TAG_POSITION, 0, 0, 0]),
            Err(ProtocolError::Truncated {
                tag: TAG_POSITION,
                expected: 17,
                actual: 4
            })
        );
        assert!(matches!(
            Packet::decode(&[TAG_METADATA, b'a']),
            Err(ProtocolError::Truncated { .. })
        ));
        assert!(matches!(
            Packet::decode(&[TAG_PEER_LEFT, 1]),
            Err(ProtocolError::Truncated { .. })
        ));
    }

    #[test]
    fn unknown_tag_is_rejected() {
        assert_eq!(Packet::decode(&[99, 1, 2]), Err(ProtocolError::UnknownTag(99)));
    }

    #[test]
    fn metadata_is_fixed_width_and_nul_terminated() {
        let bytes = Packet::Metadata { map: "Crossroads".into() }.encode();
        assert_eq!(bytes.len(), 1 + MAP_NAME_LEN);
        assert_eq!(
            Packet::decode(&bytes),
            Ok(Packet::Metadata { map: "Crossroads".into() })
        );
    }

    #[test]
    fn long_map_names_truncate_on_char_boundary() {
        let long = "é".repeat(40); // 80 bytes
        let bytes = Packet::Metadata { map: long }.encode();
        assert_eq!(*bytes.last().unwrap(), 0);
        match Packet::decode(&bytes) {
            Ok(Packet::Metadata { map }) => {
                assert_eq!(map, "é".repeat(31));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
