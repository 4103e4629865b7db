//! Authoritative game state and the fixed-step tick.
//!
//! `GameState` never touches the network. Every handler and every tick
//! pushes what clients should see into an outbox of [`Outgoing`] messages,
//! which the server drains and delivers after each step.

use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use skirmish_shared::{
    AgentId, AgentKind, PlayerId, ProjectileId, ProjectileKind, ServerEvent, SessionId, Vec3,
};
use std::collections::BTreeMap;
use std::time::Instant;

use crate::agents;
use crate::config::GameConfig;
use crate::entity::{Agent, Player, Projectile};
use crate::leaderboard::Leaderboard;
use crate::scheduler::{Scheduler, TimerAction};

/// An event addressed to one session or to everyone.
#[derive(Debug, Clone, PartialEq)]
pub enum Outgoing {
    Send {
        session: SessionId,
        event: ServerEvent,
    },
    Broadcast {
        event: ServerEvent,
        exclude: Option<SessionId>,
    },
}

pub struct GameState {
    pub tick: u64,
    pub config: GameConfig,
    pub players: BTreeMap<PlayerId, Player>,
    pub projectiles: BTreeMap<ProjectileId, Projectile>,
    pub agents: BTreeMap<AgentId, Agent>,
    pub(crate) leaderboard: Leaderboard,
    pub(crate) leaderboard_dirty: bool,
    pub(crate) timers: Scheduler<TimerAction>,
    next_projectile_id: ProjectileId,
    next_agent_id: AgentId,
    next_spawn_at: Instant,
    rng: StdRng,
    outbox: Vec<Outgoing>,
}

impl GameState {
    /// Builds the level: the configured number of static targets, with the
    /// minion spawner armed one interval from `now`.
    pub fn new(config: GameConfig, now: Instant) -> Self {
        let mut state = Self {
            tick: 0,
            leaderboard: Leaderboard::new(config.leaderboard_size),
            leaderboard_dirty: false,
            timers: Scheduler::new(),
            next_projectile_id: 1,
            next_agent_id: 1,
            next_spawn_at: now + config.agents.spawn_interval(),
            rng: StdRng::seed_from_u64(config.seed),
            players: BTreeMap::new(),
            projectiles: BTreeMap::new(),
            agents: BTreeMap::new(),
            outbox: Vec::new(),
            config,
        };

        for _ in 0..state.config.agents.initial_targets {
            state.spawn_agent(AgentKind::Target);
        }
        info!(
            "Level ready with {} targets (seed {:#x})",
            state.agents.len(),
            state.config.seed
        );
        state
    }

    /// Advances the simulation by one fixed step.
    pub fn tick(&mut self, now: Instant) {
        self.tick += 1;
        let dt = self.config.tick_dt();

        self.fire_timers(now);
        self.run_spawner(now);
        self.update_projectiles(dt, now);
        self.update_agents(dt);
        self.broadcast_snapshot();
        self.flush_leaderboard();
    }

    /// Takes everything queued for delivery since the last drain.
    pub fn drain_outbox(&mut self) -> Vec<Outgoing> {
        std::mem::take(&mut self.outbox)
    }

    pub fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub(crate) fn send(&mut self, session: SessionId, event: ServerEvent) {
        self.outbox.push(Outgoing::Send { session, event });
    }

    pub(crate) fn broadcast(&mut self, event: ServerEvent, exclude: Option<SessionId>) {
        self.outbox.push(Outgoing::Broadcast { event, exclude });
    }

    pub fn spawn_agent(&mut self, kind: AgentKind) -> AgentId {
        let id = self.next_agent_id;
        self.next_agent_id += 1;

        let rules = &self.config.agents;
        let position = agents::random_spawn_point(&mut self.rng, rules);
        let agent = Agent::new(id, kind, position, rules.max_hp, rules.minion_speed);
        debug!(
            "Spawned {:?} {} at ({:.1}, {:.1})",
            kind, id, position.x, position.z
        );
        self.agents.insert(id, agent);
        id
    }

    pub fn spawn_projectile(
        &mut self,
        owner: PlayerId,
        kind: ProjectileKind,
        position: Vec3,
        velocity: Vec3,
        now: Instant,
    ) -> ProjectileId {
        let id = self.next_projectile_id;
        self.next_projectile_id += 1;
        self.projectiles
            .insert(id, Projectile::new(id, owner, kind, position, velocity, now));
        id
    }

    /// Whole-state snapshot in the order it is sent every tick.
    pub fn snapshot(&self) -> [ServerEvent; 3] {
        [
            ServerEvent::StatePlayers(
                self.players
                    .iter()
                    .map(|(id, player)| (*id, player.to_state()))
                    .collect(),
            ),
            ServerEvent::StateBullets(
                self.projectiles
                    .values()
                    .map(Projectile::to_state)
                    .collect(),
            ),
            ServerEvent::StateMinions(
                self.agents
                    .iter()
                    .map(|(id, agent)| (*id, agent.to_state()))
                    .collect(),
            ),
        ]
    }

    fn broadcast_snapshot(&mut self) {
        for event in self.snapshot() {
            self.broadcast(event, None);
        }
    }

    /// Re-ranks if anything score-affecting happened and broadcasts the
    /// board only when the visible ranking changed.
    pub fn flush_leaderboard(&mut self) {
        if !self.leaderboard_dirty {
            return;
        }
        self.leaderboard_dirty = false;
        if self.leaderboard.refresh(&self.players) {
            let entries = self.leaderboard.entries().to_vec();
            self.broadcast(ServerEvent::UpdateLeaderboard(entries), None);
        }
    }

    fn fire_timers(&mut self, now: Instant) {
        for action in self.timers.drain_due(now) {
            match action {
                TimerAction::RespawnAgent(id) => {
                    if let Some(agent) = self.agents.get_mut(&id) {
                        if !agent.active {
                            agent.revive();
                            info!("{:?} {} respawned", agent.kind, id);
                        }
                    }
                }
            }
        }
    }

    /// Tops up each population by at most one agent per interval.
    fn run_spawner(&mut self, now: Instant) {
        if now < self.next_spawn_at {
            return;
        }
        self.next_spawn_at = now + self.config.agents.spawn_interval();

        if agents::count_kind(&self.agents, AgentKind::Target) < self.config.agents.initial_targets
        {
            self.spawn_agent(AgentKind::Target);
        }
        if agents::count_kind(&self.agents, AgentKind::Minion) < self.config.agents.max_minions {
            self.spawn_agent(AgentKind::Minion);
        }
    }

    fn update_agents(&mut self, dt: f32) {
        let hits = agents::step_minions(&mut self.agents, &self.players, &self.config.agents, dt);
        for hit in hits {
            debug!("Agent {} hit player {}", hit.agent, hit.target);
            self.damage_player(hit.target, hit.damage, None);
        }
    }
}
