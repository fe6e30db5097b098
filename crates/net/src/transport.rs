//! Connection layer over a single non-blocking UDP socket.
//!
//! A [`Host`] is either a server (accepts up to `max_peers` connections) or a
//! client (one connection, to [`PeerId::HOST`]). All I/O happens inside
//! [`Host::service_at`], which never blocks.
//!
//! # Invariants
//! - Reliable payloads are delivered once, in send order, per connection.
//! - Unreliable payloads are delivered at most once and never older than the
//!   newest already delivered on that connection.
//! - Server-assigned peer ids are unique among live connections and never 0.

use crate::config::NetConfig;
use crate::error::NetError;
use crate::frame::{self, Channel, FrameKind, MAX_PAYLOAD};
use cubeworld_common::PeerId;
use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::time::Instant;
use uuid::Uuid;

/// Out-of-order reliable messages buffered per connection before we start
/// dropping them (the sender resends).
const REORDER_WINDOW: u32 = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Server,
    Client,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The remote side sent `Disconnect`.
    Remote,
    /// Nothing heard within the peer timeout.
    TimedOut,
    /// A reliable message was resent too many times.
    Unresponsive,
    /// The server never accepted our connect request.
    ConnectTimedOut,
    /// The server is full.
    Refused,
    /// A new connect request arrived from the same address with another token.
    Replaced,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Connected(PeerId),
    Disconnected { peer: PeerId, reason: DisconnectReason },
    Received { peer: PeerId, channel: Channel, payload: Vec<u8> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkState {
    Connecting { started: Instant },
    Connected,
}

#[derive(Debug)]
struct Pending {
    datagram: Vec<u8>,
    last_sent: Instant,
    resends: u32,
}

#[derive(Debug)]
struct Connection {
    addr: SocketAddr,
    token: Uuid,
    state: LinkState,
    last_heard: Instant,
    last_sent: Instant,
    next_unreliable: u32,
    newest_unreliable: Option<u32>,
    next_reliable: u32,
    unacked: BTreeMap<u32, Pending>,
    expected_reliable: u32,
    reorder: BTreeMap<u32, Vec<u8>>,
}

impl Connection {
    fn new(addr: SocketAddr, token: Uuid, state: LinkState, now: Instant) -> Self {
        Self {
            addr,
            token,
            state,
            last_heard: now,
            last_sent: now,
            next_unreliable: 0,
            newest_unreliable: None,
            next_reliable: 0,
            unacked: BTreeMap::new(),
            expected_reliable: 0,
            reorder: BTreeMap::new(),
        }
    }

    fn is_connected(&self) -> bool {
        self.state == LinkState::Connected
    }
}

pub struct Host {
    socket: UdpSocket,
    role: Role,
    config: NetConfig,
    /// Client only: the token sent in `Connect`.
    token: Uuid,
    /// Client only: the id the server assigned us.
    assigned_id: Option<PeerId>,
    peers: BTreeMap<PeerId, Connection>,
    by_addr: HashMap<SocketAddr, PeerId>,
    recv_buf: Vec<u8>,
}

impl Host {
    /// Bind a server on all interfaces. Port 0 picks an ephemeral port.
    pub fn bind_server(port: u16, config: NetConfig) -> Result<Self, NetError> {
        let socket =
            UdpSocket::bind(("0.0.0.0", port)).map_err(|source| NetError::Bind { port, source })?;
        socket.set_nonblocking(true)?;
        tracing::info!(
            addr = ?socket.local_addr().ok(),
            max_peers = config.max_peers,
            "server bound"
        );
        Ok(Self::with_socket(socket, Role::Server, config))
    }

    /// Allocate a local socket and start connecting to `remote`. The outcome
    /// arrives later as `Connected(HOST)` or `Disconnected { peer: HOST, .. }`.
    pub fn connect(remote: SocketAddr, config: NetConfig, now: Instant) -> Result<Self, NetError> {
        let local: SocketAddr = if remote.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            (std::net::Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local).map_err(|source| NetError::Bind { port: 0, source })?;
        socket.set_nonblocking(true)?;

        let mut host = Self::with_socket(socket, Role::Client, config);
        let conn = Connection::new(
            remote,
            host.token,
            LinkState::Connecting { started: now },
            now,
        );
        host.peers.insert(PeerId::HOST, conn);
        host.by_addr.insert(remote, PeerId::HOST);
        host.send_connect(now);
        tracing::info!(%remote, token = %host.token, "connecting");
        Ok(host)
    }

    fn with_socket(socket: UdpSocket, role: Role, config: NetConfig) -> Self {
        Self {
            socket,
            role,
            config,
            token: Uuid::new_v4(),
            assigned_id: None,
            peers: BTreeMap::new(),
            by_addr: HashMap::new(),
            recv_buf: vec![0u8; frame::MAX_DATAGRAM * 2],
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn local_addr(&self) -> Result<SocketAddr, NetError> {
        Ok(self.socket.local_addr()?)
    }

    /// Id the server assigned to this client, once accepted.
    pub fn assigned_id(&self) -> Option<PeerId> {
        self.assigned_id
    }

    pub fn peer_count(&self) -> usize {
        self.peers.values().filter(|c| c.is_connected()).count()
    }

    pub fn connected_peers(&self) -> Vec<PeerId> {
        self.peers
            .iter()
            .filter(|(_, c)| c.is_connected())
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn is_connected(&self, peer: PeerId) -> bool {
        self.peers.get(&peer).is_some_and(Connection::is_connected)
    }

    pub fn service(&mut self, events: &mut Vec<TransportEvent>) {
        self.service_at(Instant::now(), events);
    }

    /// Read everything that has arrived, then run timers as of `now`.
    pub fn service_at(&mut self, now: Instant, events: &mut Vec<TransportEvent>) {
        let mut buf = std::mem::take(&mut self.recv_buf);
        for _ in 0..self.config.max_datagrams_per_poll {
            match self.socket.recv_from(&mut buf) {
                Ok((len, addr)) => self.handle_datagram(&buf[..len], addr, now, events),
                Err(err) if err.kind() == ErrorKind::WouldBlock => break,
                // ICMP port-unreachable surfaces here on some platforms.
                Err(err) if err.kind() == ErrorKind::ConnectionReset => continue,
                Err(err) => {
                    tracing::warn!(%err, "recv failed");
                    break;
                }
            }
        }
        self.recv_buf = buf;
        self.run_timers(now, events);
    }

    /// Queue `payload` for `peer`. Reliable payloads are kept until acked.
    pub fn send(
        &mut self,
        peer: PeerId,
        channel: Channel,
        payload: &[u8],
        now: Instant,
    ) -> Result<(), NetError> {
        if payload.len() > MAX_PAYLOAD {
            return Err(NetError::PayloadTooLarge {
                len: payload.len(),
                max: MAX_PAYLOAD,
            });
        }
        let conn = self
            .peers
            .get_mut(&peer)
            .filter(|c| c.is_connected())
            .ok_or(NetError::UnknownPeer(peer))?;

        conn.last_sent = now;
        match channel {
            Channel::Unreliable => {
                let seq = conn.next_unreliable;
                conn.next_unreliable = seq.wrapping_add(1);
                let datagram = frame::encode(FrameKind::Unreliable, channel.index(), seq, payload);
                send_datagram(&self.socket, conn.addr, &datagram)
            }
            Channel::Reliable => {
                let seq = conn.next_reliable;
                conn.next_reliable = seq.wrapping_add(1);
                let datagram = frame::encode(FrameKind::Reliable, channel.index(), seq, payload);
                let result = send_datagram(&self.socket, conn.addr, &datagram);
                conn.unacked.insert(
                    seq,
                    Pending {
                        datagram,
                        last_sent: now,
                        resends: 0,
                    },
                );
                // A failed first send is retried by the resend timer.
                if let Err(err) = result {
                    tracing::debug!(%peer, %err, "reliable send deferred to resend");
                }
                Ok(())
            }
        }
    }

    /// Send to every connected peer except `except`. Returns how many peers
    /// the payload was handed to.
    pub fn broadcast(
        &mut self,
        channel: Channel,
        payload: &[u8],
        except: Option<PeerId>,
        now: Instant,
    ) -> usize {
        let mut sent = 0;
        for peer in self.connected_peers() {
            if Some(peer) == except {
                continue;
            }
            match self.send(peer, channel, payload, now) {
                Ok(()) => sent += 1,
                Err(err) => tracing::warn!(%peer, %err, "broadcast send failed"),
            }
        }
        sent
    }

    /// Tell every peer we are leaving and forget them. Returns the peers that
    /// were connected.
    pub fn disconnect_all(&mut self) -> Vec<PeerId> {
        let connected = self.connected_peers();
        for conn in self.peers.values() {
            let datagram = frame::encode(FrameKind::Disconnect, 0, 0, &[]);
            if let Err(err) = send_datagram(&self.socket, conn.addr, &datagram) {
                tracing::debug!(%err, "disconnect notice not sent");
            }
        }
        self.peers.clear();
        self.by_addr.clear();
        connected
    }

    fn handle_datagram(
        &mut self,
        bytes: &[u8],
        addr: SocketAddr,
        now: Instant,
        events: &mut Vec<TransportEvent>,
    ) {
        let Some(frame) = frame::decode(bytes) else {
            tracing::trace!(%addr, len = bytes.len(), "dropped foreign datagram");
            return;
        };

        if frame.kind == FrameKind::Connect {
            if self.role == Role::Server {
                self.accept(frame.body, addr, now, events);
            }
            return;
        }

        let Some(&peer) = self.by_addr.get(&addr) else {
            tracing::trace!(%addr, kind = ?frame.kind, "datagram from unknown address");
            return;
        };

        match frame.kind {
            FrameKind::Connect => {}
            FrameKind::Accept => {
                if let Some(id) = frame.body.get(..4) {
                    self.assigned_id = Some(PeerId(bytemuck::pod_read_unaligned(id)));
                }
                self.mark_heard(peer, now, events);
            }
            FrameKind::Refuse => {
                if self.peers.get(&peer).is_some_and(|c| !c.is_connected()) {
                    self.drop_peer(peer, DisconnectReason::Refused, events);
                }
            }
            FrameKind::Disconnect => {
                self.drop_peer(peer, DisconnectReason::Remote, events);
            }
            FrameKind::Ping => self.mark_heard(peer, now, events),
            FrameKind::Ack => {
                self.mark_heard(peer, now, events);
                if let Some(conn) = self.peers.get_mut(&peer) {
                    conn.unacked.remove(&frame.sequence);
                }
            }
            FrameKind::Unreliable => {
                self.mark_heard(peer, now, events);
                let Some(conn) = self.peers.get_mut(&peer) else {
                    return;
                };
                let fresh = conn
                    .newest_unreliable
                    .is_none_or(|newest| frame::sequence_newer(frame.sequence, newest));
                if !fresh {
                    tracing::trace!(%peer, seq = frame.sequence, "stale unreliable dropped");
                    return;
                }
                conn.newest_unreliable = Some(frame.sequence);
                events.push(TransportEvent::Received {
                    peer,
                    channel: Channel::Unreliable,
                    payload: frame.body.to_vec(),
                });
            }
            FrameKind::Reliable => {
                self.mark_heard(peer, now, events);
                self.receive_reliable(peer, frame.sequence, frame.body, now, events);
            }
        }
    }

    fn accept(
        &mut self,
        body: &[u8],
        addr: SocketAddr,
        now: Instant,
        events: &mut Vec<TransportEvent>,
    ) {
        let Some(token) = body.get(..16).and_then(|b| Uuid::from_slice(b).ok()) else {
            tracing::debug!(%addr, "connect without token");
            return;
        };

        if let Some(&existing) = self.by_addr.get(&addr) {
            let same = self.peers.get(&existing).is_some_and(|c| c.token == token);
            if same {
                // Our Accept was lost; repeat it.
                self.send_control(existing, FrameKind::Accept, &existing.0.to_ne_bytes());
                return;
            }
            self.drop_peer(existing, DisconnectReason::Replaced, events);
        }

        let Some(id) = (1..=self.config.max_peers)
            .map(PeerId)
            .find(|id| !self.peers.contains_key(id))
        else {
            tracing::warn!(%addr, max_peers = self.config.max_peers, "server full, refusing");
            let datagram = frame::encode(FrameKind::Refuse, 0, 0, &[]);
            if let Err(err) = send_datagram(&self.socket, addr, &datagram) {
                tracing::debug!(%err, "refuse not sent");
            }
            return;
        };

        self.peers
            .insert(id, Connection::new(addr, token, LinkState::Connected, now));
        self.by_addr.insert(addr, id);
        self.send_control(id, FrameKind::Accept, &id.0.to_ne_bytes());
        tracing::info!(peer = %id, %addr, "peer connected");
        events.push(TransportEvent::Connected(id));
    }

    /// Record traffic from `peer`. On a client, any traffic from the server
    /// completes the handshake even if `Accept` itself was lost.
    fn mark_heard(&mut self, peer: PeerId, now: Instant, events: &mut Vec<TransportEvent>) {
        let Some(conn) = self.peers.get_mut(&peer) else {
            return;
        };
        conn.last_heard = now;
        if !conn.is_connected() {
            conn.state = LinkState::Connected;
            tracing::info!(addr = %conn.addr, assigned = ?self.assigned_id, "connected to server");
            events.push(TransportEvent::Connected(peer));
        }
    }

    fn receive_reliable(
        &mut self,
        peer: PeerId,
        seq: u32,
        body: &[u8],
        now: Instant,
        events: &mut Vec<TransportEvent>,
    ) {
        let Some(conn) = self.peers.get_mut(&peer) else {
            return;
        };
        let ack = frame::encode(FrameKind::Ack, Channel::Reliable.index(), seq, &[]);
        if let Err(err) = send_datagram(&self.socket, conn.addr, &ack) {
            tracing::debug!(%peer, %err, "ack not sent");
        }
        conn.last_sent = now;

        if seq == conn.expected_reliable {
            events.push(TransportEvent::Received {
                peer,
                channel: Channel::Reliable,
                payload: body.to_vec(),
            });
            conn.expected_reliable = conn.expected_reliable.wrapping_add(1);
            while let Some(payload) = conn.reorder.remove(&conn.expected_reliable) {
                events.push(TransportEvent::Received {
                    peer,
                    channel: Channel::Reliable,
                    payload,
                });
                conn.expected_reliable = conn.expected_reliable.wrapping_add(1);
            }
        } else if frame::sequence_newer(seq, conn.expected_reliable)
            && seq.wrapping_sub(conn.expected_reliable) < REORDER_WINDOW
        {
            conn.reorder.entry(seq).or_insert_with(|| body.to_vec());
        }
        // Anything older is a duplicate; the ack above is all it needs.
    }

    fn run_timers(&mut self, now: Instant, events: &mut Vec<TransportEvent>) {
        let mut dropped = Vec::new();
        let mut reconnect = false;

        for (&peer, conn) in self.peers.iter_mut() {
            match conn.state {
                LinkState::Connecting { started } => {
                    if now.duration_since(started) >= self.config.connect_timeout() {
                        dropped.push((peer, DisconnectReason::ConnectTimedOut));
                    } else if now.duration_since(conn.last_sent) >= self.config.resend_interval() {
                        reconnect = true;
                    }
                }
                LinkState::Connected => {
                    if now.duration_since(conn.last_heard) >= self.config.peer_timeout() {
                        dropped.push((peer, DisconnectReason::TimedOut));
                        continue;
                    }
                    let mut exhausted = false;
                    for pending in conn.unacked.values_mut() {
                        if now.duration_since(pending.last_sent) < self.config.resend_interval() {
                            continue;
                        }
                        if pending.resends >= self.config.max_resends {
                            exhausted = true;
                            break;
                        }
                        pending.resends += 1;
                        pending.last_sent = now;
                        conn.last_sent = now;
                        if let Err(err) =
                            send_datagram(&self.socket, conn.addr, &pending.datagram)
                        {
                            tracing::debug!(%peer, %err, "resend failed");
                        }
                    }
                    if exhausted {
                        dropped.push((peer, DisconnectReason::Unresponsive));
                        continue;
                    }
                    if now.duration_since(conn.last_sent) >= self.config.ping_interval() {
                        let ping = frame::encode(FrameKind::Ping, 0, 0, &[]);
                        if let Err(err) = send_datagram(&self.socket, conn.addr, &ping) {
                            tracing::debug!(%peer, %err, "ping failed");
                        }
                        conn.last_sent = now;
                    }
                }
            }
        }

        if reconnect {
            self.send_connect(now);
        }
        for (peer, reason) in dropped {
            self.drop_peer(peer, reason, events);
        }
    }

    fn send_connect(&mut self, now: Instant) {
        let token = self.token;
        if let Some(conn) = self.peers.get_mut(&PeerId::HOST) {
            conn.last_sent = now;
            let datagram = frame::encode(FrameKind::Connect, 0, 0, token.as_bytes());
            if let Err(err) = send_datagram(&self.socket, conn.addr, &datagram) {
                tracing::debug!(%err, "connect request not sent");
            }
        }
    }

    fn send_control(&self, peer: PeerId, kind: FrameKind, body: &[u8]) {
        if let Some(conn) = self.peers.get(&peer) {
            let datagram = frame::encode(kind, 0, 0, body);
            if let Err(err) = send_datagram(&self.socket, conn.addr, &datagram) {
                tracing::debug!(%peer, %err, ?kind, "control frame not sent");
            }
        }
    }

    fn drop_peer(
        &mut self,
        peer: PeerId,
        reason: DisconnectReason,
        events: &mut Vec<TransportEvent>,
    ) {
        let Some(conn) = self.peers.remove(&peer) else {
            return;
        };
        self.by_addr.remove(&conn.addr);
        tracing::info!(%peer, addr = %conn.addr, ?reason, "peer disconnected");
        events.push(TransportEvent::Disconnected { peer, reason });
    }
}

fn send_datagram(socket: &UdpSocket, addr: SocketAddr, datagram: &[u8]) -> Result<(), NetError> {
    match socket.send_to(datagram, addr) {
        Ok(_) => Ok(()),
        Err(source) => Err(NetError::Send { addr, source }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn loopback(host: &Host) -> SocketAddr {
        let port = host.local_addr().unwrap().port();
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    /// Service both hosts until `done` holds or two seconds pass.
    fn pump(
        a: &mut Host,
        b: &mut Host,
        a_events: &mut Vec<TransportEvent>,
        b_events: &mut Vec<TransportEvent>,
        done: impl Fn(&[TransportEvent], &[TransportEvent]) -> bool,
    ) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            a.service(a_events);
            b.service(b_events);
            if done(a_events.as_slice(), b_events.as_slice()) {
                return;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        panic!("timed out: a={a_events:?} b={b_events:?}");
    }

    fn connected_pair() -> (Host, Host, PeerId) {
        let mut server = Host::bind_server(0, NetConfig::default()).unwrap();
        let mut client =
            Host::connect(loopback(&server), NetConfig::default(), Instant::now()).unwrap();
        let (mut se, mut ce) = (Vec::new(), Vec::new());
        pump(&mut server, &mut client, &mut se, &mut ce, |s, c| {
            s.iter().any(|e| matches!(e, TransportEvent::Connected(_)))
                && c.contains(&TransportEvent::Connected(PeerId::HOST))
        });
        let TransportEvent::Connected(id) = se[0] else {
            panic!("unexpected {se:?}");
        };
        (server, client, id)
    }

    #[test]
    fn handshake_assigns_first_free_id() {
        let (server, client, id) = connected_pair();
        assert_eq!(id, PeerId(1));
        assert_eq!(client.assigned_id(), Some(PeerId(1)));
        assert_eq!(server.peer_count(), 1);
        assert!(client.is_connected(PeerId::HOST));
    }

    #[test]
    fn binding_a_taken_port_fails() {
        let first = Host::bind_server(0, NetConfig::default()).unwrap();
        let port = first.local_addr().unwrap().port();
        let err = Host::bind_server(port, NetConfig::default()).err().unwrap();
        assert!(matches!(err, NetError::Bind { port: p, .. } if p == port));
    }

    #[test]
    fn reliable_messages_arrive_in_order() {
        let (mut server, mut client, id) = connected_pair();
        let now = Instant::now();
        for i in 0..5u8 {
            server.send(id, Channel::Reliable, &[i], now).unwrap();
        }
        let (mut se, mut ce) = (Vec::new(), Vec::new());
        pump(&mut server, &mut client, &mut se, &mut ce, |_, c| c.len() == 5);
        let payloads: Vec<Vec<u8>> = ce
            .into_iter()
            .map(|e| match e {
                TransportEvent::Received { payload, channel, .. } => {
                    assert_eq!(channel, Channel::Reliable);
                    payload
                }
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(payloads, vec![vec![0], vec![1], vec![2], vec![3], vec![4]]);
    }

    #[test]
    fn out_of_order_reliable_is_buffered() {
        let (_server, mut client, _) = connected_pair();
        let mut events = Vec::new();
        let now = Instant::now();
        client.receive_reliable(PeerId::HOST, 1, b"b", now, &mut events);
        assert!(events.is_empty());
        client.receive_reliable(PeerId::HOST, 0, b"a", now, &mut events);
        client.receive_reliable(PeerId::HOST, 0, b"a", now, &mut events);
        let bodies: Vec<_> = events
            .iter()
            .map(|e| match e {
                TransportEvent::Received { payload, .. } => payload.clone(),
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(bodies, vec![b"a".to_vec(), b"b".to_vec()]);
    }

    #[test]
    fn stale_unreliable_is_dropped() {
        let (_server, mut client, _) = connected_pair();
        let server_addr = client.peers[&PeerId::HOST].addr;
        let now = Instant::now();
        let mut events = Vec::new();
        for seq in [3u32, 1, 4] {
            let datagram = frame::encode(FrameKind::Unreliable, 1, seq, &[seq as u8]);
            client.handle_datagram(&datagram, server_addr, now, &mut events);
        }
        let seen: Vec<u8> = events
            .iter()
            .map(|e| match e {
                TransportEvent::Received { payload, .. } => payload[0],
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(seen, vec![3, 4]);
    }

    #[test]
    fn connect_times_out_without_server() {
        let silent = UdpSocket::bind("127.0.0.1:0").unwrap();
        let start = Instant::now();
        let config = NetConfig::default();
        let mut client =
            Host::connect(silent.local_addr().unwrap(), config.clone(), start).unwrap();
        let mut events = Vec::new();
        client.service_at(start + config.resend_interval(), &mut events);
        assert!(events.is_empty());
        client.service_at(start + config.connect_timeout(), &mut events);
        assert_eq!(
            events,
            vec![TransportEvent::Disconnected {
                peer: PeerId::HOST,
                reason: DisconnectReason::ConnectTimedOut
            }]
        );
        assert_eq!(client.peer_count(), 0);
    }

    #[test]
    fn silent_peer_times_out() {
        let (mut server, _client, id) = connected_pair();
        server.service(&mut Vec::new());
        let later =
            Instant::now() + NetConfig::default().peer_timeout() + Duration::from_millis(10);
        let mut events = Vec::new();
        server.service_at(later, &mut events);
        assert!(events.contains(&TransportEvent::Disconnected {
            peer: id,
            reason: DisconnectReason::TimedOut
        }));
        assert_eq!(server.peer_count(), 0);
    }

    #[test]
    fn full_server_refuses() {
        let config = NetConfig {
            max_peers: 1,
            ..NetConfig::default()
        };
        let mut server = Host::bind_server(0, config.clone()).unwrap();
        let addr = loopback(&server);
        let mut first = Host::connect(addr, config.clone(), Instant::now()).unwrap();
        let (mut se, mut fe) = (Vec::new(), Vec::new());
        pump(&mut server, &mut first, &mut se, &mut fe, |_, f| !f.is_empty());

        let mut second = Host::connect(addr, config, Instant::now()).unwrap();
        let mut sec = Vec::new();
        pump(&mut server, &mut second, &mut se, &mut sec, |_, s| !s.is_empty());
        assert_eq!(
            sec,
            vec![TransportEvent::Disconnected {
                peer: PeerId::HOST,
                reason: DisconnectReason::Refused
            }]
        );
        assert_eq!(server.peer_count(), 1);
    }

    #[test]
    fn disconnect_is_reported_to_the_other_side() {
        let (mut server, mut client, id) = connected_pair();
        assert_eq!(client.disconnect_all(), vec![PeerId::HOST]);
        let (mut se, mut ce) = (Vec::new(), Vec::new());
        pump(&mut server, &mut client, &mut se, &mut ce, |s, _| !s.is_empty());
        assert_eq!(
            se,
            vec![TransportEvent::Disconnected {
                peer: id,
                reason: DisconnectReason::Remote
            }]
        );
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let (mut server, _client, id) = connected_pair();
        let big = vec![0u8; MAX_PAYLOAD + 1];
        assert!(matches!(
            server.send(id, Channel::Unreliable, &big, Instant::now()),
            Err(NetError::PayloadTooLarge { .. })
        ));
        assert!(matches!(
            server.send(PeerId(9), Channel::Unreliable, &[1], Instant::now()),
            Err(NetError::UnknownPeer(PeerId(9)))
        ));
    }
}
