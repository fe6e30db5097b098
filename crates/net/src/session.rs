//! Replication session: one transport host plus the application protocol.
//!
//! The session owns the socket and turns transport traffic into
//! [`SessionEvent`]s. The simulation loop calls [`ReplicationSession::update`]
//! once per tick and then drains the queue; nothing is dispatched from inside
//! `update()`.
//!
//! # Invariants
//! - `update()` never blocks and never returns an error.
//! - A server never relays a peer's position back to that peer.
//! - Positions never grow the event queue past `event_capacity`.
//! - Peer joined/left and map events are never dropped.

use crate::config::NetConfig;
use crate::error::NetError;
use crate::frame::Channel;
use crate::protocol::Packet;
use crate::transport::{Host, Role, TransportEvent};
use cubeworld_common::PeerId;
use glam::Vec3;
use std::collections::{BTreeSet, VecDeque};
use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Initialized,
    Listening,
    Connecting,
    Active,
    ShuttingDown,
    Closed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    PeerJoined(PeerId),
    PeerLeft(PeerId),
    MapReceived(String),
    PositionReceived { peer: PeerId, position: Vec3, yaw: f32 },
}

impl SessionEvent {
    pub fn is_position(&self) -> bool {
        matches!(self, SessionEvent::PositionReceived { .. })
    }
}

pub struct ReplicationSession {
    config: NetConfig,
    state: SessionState,
    host: Option<Host>,
    /// Map we serve (server) or were told about (client).
    map: Option<String>,
    events: VecDeque<SessionEvent>,
    /// Client only: relayed peers we have heard from and not seen leave.
    relayed_peers: BTreeSet<PeerId>,
    transport_events: Vec<TransportEvent>,
    dropped_events: u64,
}

impl ReplicationSession {
    pub fn new(config: NetConfig) -> Self {
        Self {
            config,
            state: SessionState::Uninitialized,
            host: None,
            map: None,
            events: VecDeque::new(),
            relayed_peers: BTreeSet::new(),
            transport_events: Vec::new(),
            dropped_events: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &NetConfig {
        &self.config
    }

    pub fn is_server(&self) -> bool {
        self.host.as_ref().is_some_and(|h| h.role() == Role::Server)
    }

    pub fn map(&self) -> Option<&str> {
        self.map.as_deref()
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.host.as_ref().and_then(|h| h.local_addr().ok())
    }

    /// Id the server assigned to this client, once accepted.
    pub fn local_peer_id(&self) -> Option<PeerId> {
        self.host.as_ref().and_then(Host::assigned_id)
    }

    pub fn peer_count(&self) -> usize {
        self.host.as_ref().map_or(0, Host::peer_count)
    }

    /// Events discarded because the queue was full.
    pub fn dropped_events(&self) -> u64 {
        self.dropped_events
    }

    pub fn init(&mut self) -> Result<(), NetError> {
        match self.state {
            SessionState::Uninitialized | SessionState::Initialized => {
                self.state = SessionState::Initialized;
                Ok(())
            }
            other => Err(NetError::InvalidState(other)),
        }
    }

    /// Listen on `port` and serve `map` to every peer that connects.
    pub fn start_server(&mut self, map: &str, port: u16) -> Result<(), NetError> {
        self.require(SessionState::Initialized)?;
        match Host::bind_server(port, self.config.clone()) {
            Ok(host) => {
                self.host = Some(host);
                self.map = Some(map.to_string());
                self.state = SessionState::Listening;
                tracing::info!(map, port, "server listening");
                Ok(())
            }
            Err(err) => {
                self.state = SessionState::Closed;
                Err(err)
            }
        }
    }

    /// Begin connecting to `address:port`. The outcome is reported later as
    /// `PeerJoined(HOST)` or `PeerLeft(HOST)`.
    pub fn start_client(&mut self, address: &str, port: u16) -> Result<(), NetError> {
        self.require(SessionState::Initialized)?;
        let result = resolve(address, port)
            .and_then(|remote| Host::connect(remote, self.config.clone(), Instant::now()));
        match result {
            Ok(host) => {
                self.host = Some(host);
                self.state = SessionState::Connecting;
                Ok(())
            }
            Err(err) => {
                self.state = SessionState::Closed;
                Err(err)
            }
        }
    }

    pub fn update(&mut self) {
        self.update_at(Instant::now());
    }

    /// Poll the transport as of `now` and queue the resulting events.
    pub fn update_at(&mut self, now: Instant) {
        if !matches!(
            self.state,
            SessionState::Listening | SessionState::Connecting | SessionState::Active
        ) {
            return;
        }
        let _span = tracing::info_span!("session_update", state = ?self.state).entered();

        let mut transport_events = std::mem::take(&mut self.transport_events);
        if let Some(host) = self.host.as_mut() {
            host.service_at(now, &mut transport_events);
        }
        for event in transport_events.drain(..) {
            match event {
                TransportEvent::Connected(peer) => self.on_connected(peer, now),
                TransportEvent::Disconnected { peer, reason } => {
                    tracing::debug!(%peer, ?reason, "transport disconnect");
                    self.on_disconnected(peer, now);
                }
                TransportEvent::Received { peer, payload, .. } => {
                    self.on_payload(peer, &payload, now)
                }
            }
        }
        self.transport_events = transport_events;
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        self.events.drain(..).collect()
    }

    /// Send the local avatar's transform, unreliably: to the server from a
    /// client, to every peer from a server. Returns how many peers it went to;
    /// outside `Active` this is a no-op.
    pub fn send_position(&mut self, position: Vec3, yaw: f32) -> Result<usize, NetError> {
        if self.state != SessionState::Active {
            return Ok(0);
        }
        let Some(host) = self.host.as_mut() else {
            return Ok(0);
        };
        let bytes = Packet::Position { position, yaw }.encode();
        let now = Instant::now();
        match host.role() {
            Role::Server => Ok(host.broadcast(Channel::Unreliable, &bytes, None, now)),
            Role::Client => {
                host.send(PeerId::HOST, Channel::Unreliable, &bytes, now)?;
                Ok(1)
            }
        }
    }

    /// Notify every peer and release the socket. Safe to call repeatedly.
    pub fn shutdown(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.state = SessionState::ShuttingDown;
        if let Some(mut host) = self.host.take() {
            let notified = host.disconnect_all();
            tracing::info!(peers = notified.len(), "session shut down");
        }
        self.relayed_peers.clear();
        self.state = SessionState::Closed;
    }

    fn require(&self, expected: SessionState) -> Result<(), NetError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(NetError::InvalidState(self.state))
        }
    }

    /// Queue `event`. Lifecycle events are never dropped: on a full queue the
    /// oldest queued position makes room, and a new position is dropped only
    /// when nothing but lifecycle events is queued.
    fn push(&mut self, event: SessionEvent) {
        if self.events.len() >= self.config.event_capacity {
            match self.events.iter().position(SessionEvent::is_position) {
                Some(index) => {
                    if let Some(evicted) = self.events.remove(index) {
                        self.record_drop(&evicted);
                    }
                }
                None if event.is_position() => {
                    self.record_drop(&event);
                    return;
                }
                None => {}
            }
        }
        self.events.push_back(event);
    }

    fn record_drop(&mut self, dropped: &SessionEvent) {
        self.dropped_events += 1;
        tracing::warn!(
            ?dropped,
            capacity = self.config.event_capacity,
            "event queue full, dropping position"
        );
    }

    fn on_connected(&mut self, peer: PeerId, now: Instant) {
        self.state = SessionState::Active;
        if self.is_server() {
            let map = self.map.clone().unwrap_or_default();
            let bytes = Packet::Metadata { map }.encode();
            if let Some(host) = self.host.as_mut() {
                if let Err(err) = host.send(peer, Channel::Reliable, &bytes, now) {
                    tracing::warn!(%peer, %err, "failed to send map metadata");
                }
            }
        }
        self.push(SessionEvent::PeerJoined(peer));
    }

    fn on_disconnected(&mut self, peer: PeerId, now: Instant) {
        if self.is_server() {
            let bytes = Packet::PeerLeft { peer }.encode();
            if let Some(host) = self.host.as_mut() {
                host.broadcast(Channel::Reliable, &bytes, Some(peer), now);
            }
            self.push(SessionEvent::PeerLeft(peer));
            return;
        }

        // Lost the server: everyone we saw through it is gone too.
        for relayed in std::mem::take(&mut self.relayed_peers) {
            self.push(SessionEvent::PeerLeft(relayed));
        }
        self.push(SessionEvent::PeerLeft(peer));
        self.host = None;
        self.state = SessionState::Closed;
        tracing::info!("disconnected from server");
    }

    fn on_payload(&mut self, from: PeerId, payload: &[u8], now: Instant) {
        let packet = match Packet::decode(payload) {
            Ok(packet) => packet,
            Err(err) => {
                tracing::debug!(peer = %from, %err, "dropped malformed packet");
                return;
            }
        };
        let server = self.is_server();
        match packet {
            Packet::Position { position, yaw } => {
                if server {
                    let relay = Packet::RelayedPosition {
                        sender: from,
                        position,
                        yaw,
                    }
                    .encode();
                    if let Some(host) = self.host.as_mut() {
                        host.broadcast(Channel::Unreliable, &relay, Some(from), now);
                    }
                }
                self.push(SessionEvent::PositionReceived {
                    peer: from,
                    position,
                    yaw,
                });
            }
            Packet::RelayedPosition {
                sender,
                position,
                yaw,
            } if !server => {
                self.relayed_peers.insert(sender);
                self.push(SessionEvent::PositionReceived {
                    peer: sender,
                    position,
                    yaw,
                });
            }
            Packet::PeerLeft { peer } if !server => {
                self.relayed_peers.remove(&peer);
                self.push(SessionEvent::PeerLeft(peer));
            }
            Packet::Metadata { map } if !server => {
                tracing::info!(%map, "map received");
                self.map = Some(map.clone());
                self.push(SessionEvent::MapReceived(map));
            }
            other => {
                tracing::debug!(
                    peer = %from,
                    tag = other.tag(),
                    "ignored packet not meant for this role"
                );
            }
        }
    }
}

impl Drop for ReplicationSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Resolve `address:port`, preferring IPv4 since servers bind `0.0.0.0`.
fn resolve(address: &str, port: u16) -> Result<SocketAddr, NetError> {
    (address, port)
        .to_socket_addrs()
        .ok()
        .and_then(prefer_ipv4)
        .ok_or_else(|| NetError::Resolve {
            address: format!("{address}:{port}"),
        })
}

fn prefer_ipv4(addrs: impl IntoIterator<Item = SocketAddr>) -> Option<SocketAddr> {
    let mut first = None;
    for addr in addrs {
        if addr.is_ipv4() {
            return Some(addr);
        }
        first.get_or_insert(addr);
    }
    first
}
