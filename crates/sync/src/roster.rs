//! Remote participants and the characters that stand in for them.
//!
//! # Invariants
//! - At most one character per peer id; it is built on the peer's first
//!   sample, before any reconciliation runs for that peer.
//! - A departed peer's character subtree is destroyed exactly once and the
//!   peer is never reconciled again.

use crate::config::SyncConfig;
use crate::reconciler::{RemoteTarget, reconcile};
use cubeworld_common::PeerId;
use cubeworld_kernel::character::{build_character, pose_remote};
use cubeworld_kernel::{InstanceFactory, InstanceId, InstanceTree};
use cubeworld_net::SessionEvent;
use glam::Vec3;
use std::collections::BTreeMap;

/// Seed frame time for the first pose of a freshly spawned character.
const SPAWN_POSE_DT: f32 = 0.016;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RemotePeer {
    pub character: InstanceId,
    pub target: RemoteTarget,
}

/// What an applied event did to the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterChange {
    Spawned { peer: PeerId, character: InstanceId },
    Retargeted(PeerId),
    Removed(PeerId),
    Ignored,
}

/// Character name shown for a remote peer.
pub fn remote_name(peer: PeerId) -> String {
    if peer.is_host() {
        "Host_Server".to_string()
    } else {
        format!("Guest_{}", peer.0)
    }
}

pub struct RemoteRoster {
    world: InstanceId,
    config: SyncConfig,
    peers: BTreeMap<PeerId, RemotePeer>,
}

impl RemoteRoster {
    /// Characters are parented under `world` (usually the `Workspace`).
    pub fn new(world: InstanceId, config: SyncConfig) -> Self {
        Self {
            world,
            config,
            peers: BTreeMap::new(),
        }
    }

    pub fn world(&self) -> InstanceId {
        self.world
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn get(&self, peer: PeerId) -> Option<&RemotePeer> {
        self.peers.get(&peer)
    }

    pub fn character(&self, peer: PeerId) -> Option<InstanceId> {
        self.peers.get(&peer).map(|p| p.character)
    }

    pub fn peers(&self) -> impl Iterator<Item = PeerId> + '_ {
        self.peers.keys().copied()
    }

    /// Fold one session event into the roster and the tree.
    pub fn apply(
        &mut self,
        event: &SessionEvent,
        tree: &mut InstanceTree,
        factory: &InstanceFactory,
    ) -> RosterChange {
        match event {
            SessionEvent::PositionReceived {
                peer,
                position,
                yaw,
            } => self.on_position(*peer, *position, *yaw, tree, factory),
            SessionEvent::PeerLeft(peer) => self.remove(*peer, tree),
            SessionEvent::PeerJoined(_) | SessionEvent::MapReceived(_) => RosterChange::Ignored,
        }
    }

    fn on_position(
        &mut self,
        peer: PeerId,
        position: Vec3,
        yaw: f32,
        tree: &mut InstanceTree,
        factory: &InstanceFactory,
    ) -> RosterChange {
        let target = RemoteTarget { position, yaw };
        if let Some(existing) = self.peers.get_mut(&peer) {
            existing.target = target;
            return RosterChange::Retargeted(peer);
        }

        let character = build_character(tree, factory, &remote_name(peer), position);
        tree.set_parent(character, Some(self.world));
        pose_remote(tree, character, position, self.config.remote_gait_speed, SPAWN_POSE_DT);
        self.peers.insert(peer, RemotePeer { character, target });
        tracing::info!(
            %peer,
            name = tree.name(character).unwrap_or_default(),
            "remote character spawned"
        );
        RosterChange::Spawned { peer, character }
    }

    /// Destroy the peer's character and forget the peer.
    pub fn remove(&mut self, peer: PeerId, tree: &mut InstanceTree) -> RosterChange {
        let Some(remote) = self.peers.remove(&peer) else {
            return RosterChange::Ignored;
        };
        tree.destroy(remote.character);
        tracing::info!(%peer, "remote character removed");
        RosterChange::Removed(peer)
    }

    /// Reconcile every remote character one tick toward its target.
    /// Peers whose character was destroyed behind our back are dropped.
    pub fn tick(&mut self, tree: &mut InstanceTree, dt: f32) {
        let config = &self.config;
        self.peers.retain(|peer, remote| {
            let live = reconcile(tree, remote.character, &remote.target, config, dt);
            if !live {
                tracing::debug!(%peer, "remote character vanished, forgetting peer");
            }
            live
        });
    }

    /// Destroy every remote character.
    pub fn clear(&mut self, tree: &mut InstanceTree) {
        for (_, remote) in std::mem::take(&mut self.peers) {
            tree.destroy(remote.character);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cubeworld_kernel::services::{create_data_model, get_service};
    use cubeworld_kernel::{ClassKind, ROOT_PART_NAME};

    fn world() -> (InstanceTree, InstanceFactory, InstanceId) {
        let factory = InstanceFactory::with_builtin_classes();
        let mut tree = InstanceTree::new();
        let game = create_data_model(&mut tree, &factory);
        let workspace = get_service(&mut tree, &factory, game, ClassKind::Workspace);
        (tree, factory, workspace)
    }

    fn position(peer: u32, x: f32) -> SessionEvent {
        SessionEvent::PositionReceived {
            peer: PeerId(peer),
            position: Vec3::new(x, 0.0, 0.0),
            yaw: 45.0,
        }
    }

    #[test]
    fn first_sample_spawns_before_any_tick() {
        let (mut tree, factory, workspace) = world();
        let mut roster = RemoteRoster::new(workspace, SyncConfig::default());

        let change = roster.apply(&position(5, 3.0), &mut tree, &factory);
        let RosterChange::Spawned { peer, character } = change else {
            panic!("expected spawn, got {change:?}");
        };
        assert_eq!(peer, PeerId(5));
        assert_eq!(roster.character(PeerId(5)), Some(character));
        assert_eq!(tree.parent(character), Some(workspace));
        assert_eq!(tree.name(character), Some("Guest_5"));
        assert_eq!(tree.full_name(character), "Game.Workspace.Guest_5");

        // Posed at the sample, every part anchored.
        let root = tree.find_first_child(character, ROOT_PART_NAME).unwrap();
        assert_eq!(tree.part(root).unwrap().position, Vec3::new(3.0, 0.0, 0.0));
        for child in tree.children(character) {
            if let Some(p) = tree.part(*child) {
                assert!(p.anchored);
                assert!(!p.can_collide);
            }
        }
    }

    #[test]
    fn later_samples_only_retarget() {
        let (mut tree, factory, workspace) = world();
        let mut roster = RemoteRoster::new(workspace, SyncConfig::default());
        roster.apply(&position(5, 0.0), &mut tree, &factory);
        let live = tree.len();

        assert_eq!(
            roster.apply(&position(5, 10.0), &mut tree, &factory),
            RosterChange::Retargeted(PeerId(5))
        );
        assert_eq!(tree.len(), live);
        assert_eq!(roster.get(PeerId(5)).unwrap().target.position.x, 10.0);

        roster.tick(&mut tree, 0.016);
        let root = tree.primary_part(roster.character(PeerId(5)).unwrap()).unwrap();
        assert!((tree.part(root).unwrap().position.x - 2.0).abs() < 1e-4);
    }

    #[test]
    fn host_is_named_for_the_server() {
        let (mut tree, factory, workspace) = world();
        let mut roster = RemoteRoster::new(workspace, SyncConfig::default());
        roster.apply(&position(0, 0.0), &mut tree, &factory);
        let character = roster.character(PeerId::HOST).unwrap();
        assert_eq!(tree.name(character), Some("Host_Server"));
    }

    #[test]
    fn departure_destroys_the_whole_subtree_once() {
        let (mut tree, factory, workspace) = world();
        let mut roster = RemoteRoster::new(workspace, SyncConfig::default());
        roster.apply(&position(5, 0.0), &mut tree, &factory);
        let character = roster.character(PeerId(5)).unwrap();
        let subtree: Vec<_> = tree.descendants(character);

        assert_eq!(
            roster.apply(&SessionEvent::PeerLeft(PeerId(5)), &mut tree, &factory),
            RosterChange::Removed(PeerId(5))
        );
        assert!(tree.is_destroyed(character));
        assert!(subtree.iter().all(|id| tree.is_destroyed(*id)));
        assert!(tree.children(workspace).is_empty());
        assert!(roster.is_empty());

        // A second notice and further ticks leave everything alone.
        tree.drain_events();
        assert_eq!(
            roster.apply(&SessionEvent::PeerLeft(PeerId(5)), &mut tree, &factory),
            RosterChange::Ignored
        );
        roster.tick(&mut tree, 0.016);
        assert!(tree.drain_events().is_empty());
    }

    #[test]
    fn join_and_map_events_are_ignored() {
        let (mut tree, factory, workspace) = world();
        let mut roster = RemoteRoster::new(workspace, SyncConfig::default());
        let before = tree.len();
        assert_eq!(
            roster.apply(&SessionEvent::PeerJoined(PeerId(2)), &mut tree, &factory),
            RosterChange::Ignored
        );
        assert_eq!(
            roster.apply(&SessionEvent::MapReceived("Baseplate".into()), &mut tree, &factory),
            RosterChange::Ignored
        );
        assert_eq!(tree.len(), before);
    }

    #[test]
    fn externally_destroyed_character_is_forgotten_on_tick() {
        let (mut tree, factory, workspace) = world();
        let mut roster = RemoteRoster::new(workspace, SyncConfig::default());
        roster.apply(&position(3, 0.0), &mut tree, &factory);
        tree.clear_children(workspace);
        roster.tick(&mut tree, 0.016);
        assert!(roster.is_empty());
    }

    #[test]
    fn clear_destroys_everyone() {
        let (mut tree, factory, workspace) = world();
        let mut roster = RemoteRoster::new(workspace, SyncConfig::default());
        roster.apply(&position(1, 0.0), &mut tree, &factory);
        roster.apply(&position(2, 0.0), &mut tree, &factory);
        assert_eq!(roster.peers().collect::<Vec<_>>(), vec![PeerId(1), PeerId(2)]);
        roster.clear(&mut tree);
        assert!(roster.is_empty());
        assert!(tree.children(workspace).is_empty());
    }
}
