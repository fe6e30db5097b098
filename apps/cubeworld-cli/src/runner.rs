//! Headless fixed-rate simulation loop shared by `server` and `client`.

use crate::config::RuntimeConfig;
use crate::physics::KinematicPhysics;
use crate::scene::{self, FLOOR_HEIGHT, SPAWN_POINT, Scene};
use cubeworld_kernel::character::{build_character, drive_local, find_humanoid};
use cubeworld_kernel::physics::register_parts;
use cubeworld_kernel::{InstanceFactory, InstanceId, InstanceTree};
use cubeworld_net::{ReplicationSession, SessionEvent};
use cubeworld_sync::RemoteRoster;
use cubeworld_tools::TreeInspector;
use glam::Vec3;
use std::time::{Duration, Instant};

/// Seconds per lap of the scripted walk.
const WALK_LAP_SECONDS: f32 = 12.0;

pub enum Role {
    Server { map: String, port: u16 },
    Client { address: String, port: u16 },
}

pub struct Runner {
    config: RuntimeConfig,
    factory: InstanceFactory,
    tree: InstanceTree,
    scene: Scene,
    session: ReplicationSession,
    roster: RemoteRoster,
    physics: KinematicPhysics,
    player_name: String,
    local: Option<InstanceId>,
    elapsed: f32,
    since_send: f32,
}

impl Runner {
    pub fn new(config: RuntimeConfig, player_name: &str) -> Self {
        let factory = InstanceFactory::with_builtin_classes();
        let mut tree = InstanceTree::new();
        let scene = scene::build(&mut tree, &factory);
        let roster = RemoteRoster::new(scene.workspace, config.sync.clone());
        let session = ReplicationSession::new(config.net.clone());
        Self {
            config,
            factory,
            tree,
            scene,
            session,
            roster,
            physics: KinematicPhysics::new(FLOOR_HEIGHT),
            player_name: player_name.to_string(),
            local: None,
            elapsed: 0.0,
            since_send: 0.0,
        }
    }

    /// Open the session. A server spawns its avatar right away; a client
    /// waits for the map.
    pub fn start(&mut self, role: &Role) -> anyhow::Result<()> {
        self.session.init()?;
        match role {
            Role::Server { map, port } => {
                self.session.start_server(map, *port)?;
                self.spawn_local();
            }
            Role::Client { address, port } => {
                self.session.start_client(address, *port)?;
                tracing::info!(%address, port, "connecting to server");
            }
        }
        Ok(())
    }

    /// Run `ticks` fixed steps, or forever when `None`.
    pub fn run(&mut self, ticks: Option<u64>) {
        let dt = self.config.tick_dt();
        let period = Duration::from_secs_f32(dt);
        let mut next = Instant::now();
        let mut tick = 0u64;
        while ticks.is_none_or(|limit| tick < limit) {
            self.step(dt);
            tick += 1;
            next += period;
            let now = Instant::now();
            if next > now {
                std::thread::sleep(next - now);
            } else {
                next = now;
            }
        }
    }

    /// One simulation tick: network, local control, physics, send, remotes.
    /// The tree's event log is drained at the end of every tick.
    pub fn step(&mut self, dt: f32) {
        self.session.update();
        for event in self.session.drain_events() {
            self.handle(&event);
        }

        if let Some(character) = self.local {
            let move_dir = self.scripted_direction();
            drive_local(&mut self.tree, character, move_dir, false, &mut self.physics, dt);
        }
        self.physics.step(&mut self.tree, dt);

        self.since_send += dt;
        if self.since_send >= self.config.send_interval() {
            self.since_send = 0.0;
            self.send_local();
        }

        self.roster.tick(&mut self.tree, dt);
        let tree_events = self.tree.drain_events();
        if !tree_events.is_empty() {
            tracing::trace!(count = tree_events.len(), "tree events this tick");
        }
        self.elapsed += dt;
    }

    pub fn shutdown(&mut self) {
        tracing::info!(
            state = ?self.session.state(),
            remotes = self.roster.len(),
            "stopping"
        );
        self.session.shutdown();
        self.roster.clear(&mut self.tree);
        println!("{}", TreeInspector::summary(&self.tree));
    }

    #[cfg(test)]
    pub fn session_state(&self) -> cubeworld_net::SessionState {
        self.session.state()
    }

    #[cfg(test)]
    pub fn tree(&self) -> &InstanceTree {
        &self.tree
    }

    #[cfg(test)]
    pub fn roster(&self) -> &RemoteRoster {
        &self.roster
    }

    #[cfg(test)]
    pub fn local_character(&self) -> Option<InstanceId> {
        self.local
    }

    fn handle(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::PeerJoined(peer) => tracing::info!(%peer, "peer joined"),
            SessionEvent::PeerLeft(peer) => tracing::info!(%peer, "peer left"),
            SessionEvent::MapReceived(map) => {
                if map != scene::DEFAULT_MAP {
                    tracing::warn!(%map, "unknown map, staying on the baseplate");
                }
                self.spawn_local();
            }
            SessionEvent::PositionReceived { .. } => {}
        }
        self.roster.apply(event, &mut self.tree, &self.factory);
    }

    fn spawn_local(&mut self) {
        if self.local.is_some() {
            return;
        }
        let character =
            build_character(&mut self.tree, &self.factory, &self.player_name, SPAWN_POINT);
        self.tree.set_parent(character, Some(self.scene.workspace));
        let parts = register_parts(&self.tree, character, &mut self.physics);
        tracing::info!(name = %self.player_name, parts, "local character spawned");
        self.local = Some(character);
    }

    /// Walk a circle: the move direction is the tangent at the current angle.
    fn scripted_direction(&self) -> Vec3 {
        let angle = self.elapsed / WALK_LAP_SECONDS * std::f32::consts::TAU;
        Vec3::new(angle.cos(), 0.0, -angle.sin())
    }

    fn send_local(&mut self) {
        let Some(character) = self.local else {
            return;
        };
        let Some(position) = self
            .tree
            .primary_part(character)
            .and_then(|root| self.tree.part(root))
            .map(|p| p.position)
        else {
            return;
        };
        let yaw = find_humanoid(&self.tree, character)
            .and_then(|h| self.tree.humanoid(h))
            .map_or(0.0, |h| h.yaw);
        if let Err(err) = self.session.send_position(position, yaw) {
            tracing::debug!(%err, "position not sent");
        }
    }
}
