use std::net::SocketAddr;

/// Errors from session setup and explicit sends.
///
/// Nothing here is raised from `update()`: per-tick transport trouble is
/// logged and absorbed.
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    #[error("failed to bind UDP port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },
    #[error("socket error: {0}")]
    Socket(#[from] std::io::Error),
    #[error("could not resolve {address}")]
    Resolve { address: String },
    #[error("operation not valid in session state {0:?}")]
    InvalidState(crate::session::SessionState),
    #[error("unknown peer {0}")]
    UnknownPeer(cubeworld_common::PeerId),
    #[error("payload of {len} bytes exceeds the {max}-byte datagram limit")]
    PayloadTooLarge { len: usize, max: usize },
    #[error("send to {addr} failed: {source}")]
    Send {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// Reasons an application payload is rejected by the decoder.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("empty packet")]
    Empty,
    #[error("unknown packet tag {0}")]
    UnknownTag(u8),
    #[error("packet tag {tag} truncated: {actual} bytes, need {expected}")]
    Truncated { tag: u8, expected: usize, actual: usize },
}
