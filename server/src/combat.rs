//! Collision and damage resolution.
//!
//! Projectiles are processed one at a time in id order. A projectile that
//! hits something is removed immediately, so it can damage at most one
//! target (or one blast area) in its lifetime.

use log::{debug, info};
use skirmish_shared::{AgentId, PlayerId, ProjectileId, ServerEvent, Vec3};
use std::time::Instant;

use crate::config::DefeatPolicy;
use crate::entity::Projectile;
use crate::game::GameState;
use crate::physics::{self, GroundContact};
use crate::scheduler::TimerAction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Agent(AgentId),
    Player(PlayerId),
}

impl GameState {
    pub(crate) fn update_projectiles(&mut self, dt: f32, now: Instant) {
        let rules = self.config.projectiles.clone();
        let ids: Vec<ProjectileId> = self.projectiles.keys().copied().collect();

        for id in ids {
            let Some(mut projectile) = self.projectiles.remove(&id) else {
                continue;
            };

            physics::integrate(&mut projectile, &rules, dt);

            if let Some(target) = self.find_hit(&projectile) {
                debug!("Projectile {} hit {:?}", id, target);
                self.resolve_hit(&projectile, target, now);
                self.broadcast(ServerEvent::RemoveBullet(id), None);
                continue;
            }

            if physics::resolve_ground(&mut projectile, &rules) == GroundContact::Impact {
                if projectile.kind.is_area_effect() {
                    let damage = projectile.kind.damage();
                    self.detonate(projectile.position, projectile.owner, damage, now);
                }
                self.broadcast(ServerEvent::RemoveBullet(id), None);
                continue;
            }

            let idle = physics::settle(&mut projectile, &rules, now);
            if idle || physics::expired(&projectile, &rules, now) {
                self.broadcast(ServerEvent::RemoveBullet(id), None);
                continue;
            }

            self.projectiles.insert(id, projectile);
        }
    }

    /// First candidate strictly closer than the hit radius: active agents,
    /// then (PvP only) live players other than the owner, each in id order.
    pub fn find_hit(&self, projectile: &Projectile) -> Option<HitTarget> {
        let radius = self.config.projectiles.hit_radius;

        let agent = self.agents.values().find(|agent| {
            agent.active && agent.position.distance(&projectile.position) < radius
        });
        if let Some(agent) = agent {
            return Some(HitTarget::Agent(agent.id));
        }

        if !self.config.combat.pvp {
            return None;
        }
        self.players
            .values()
            .find(|player| {
                player.is_alive()
                    && player.id != projectile.owner
                    && player.position.distance(&projectile.position) < radius
            })
            .map(|player| HitTarget::Player(player.id))
    }

    fn resolve_hit(&mut self, projectile: &Projectile, target: HitTarget, now: Instant) {
        let damage = projectile.kind.damage();
        if projectile.kind.is_area_effect() {
            self.detonate(projectile.position, projectile.owner, damage, now);
            return;
        }
        match target {
            HitTarget::Agent(id) => self.damage_agent(id, damage, Some(projectile.owner), now),
            HitTarget::Player(id) => self.damage_player(id, damage, Some(projectile.owner)),
        }
    }

    /// Damages every active agent, and with PvP every live non-owner player,
    /// within the blast radius of `center`. The blast edge is inclusive.
    pub fn detonate(&mut self, center: Vec3, owner: PlayerId, damage: u32, now: Instant) {
        let radius = self.config.projectiles.blast_radius;
        self.broadcast(
            ServerEvent::Explosion {
                position: center,
                radius,
            },
            None,
        );

        let caught_agents: Vec<AgentId> = self
            .agents
            .values()
            .filter(|agent| agent.active && agent.position.distance(&center) <= radius)
            .map(|agent| agent.id)
            .collect();
        for id in caught_agents {
            self.damage_agent(id, damage, Some(owner), now);
        }

        if !self.config.combat.pvp {
            return;
        }
        let caught_players: Vec<PlayerId> = self
            .players
            .values()
            .filter(|player| {
                player.is_alive()
                    && player.id != owner
                    && player.position.distance(&center) <= radius
            })
            .map(|player| player.id)
            .collect();
        for id in caught_players {
            self.damage_player(id, damage, Some(owner));
        }
    }

    /// Applies damage to an active agent. The defeat transition runs exactly
    /// once: an inactive agent ignores further damage.
    pub fn damage_agent(
        &mut self,
        id: AgentId,
        amount: u32,
        attacker: Option<PlayerId>,
        now: Instant,
    ) {
        let Some(agent) = self.agents.get_mut(&id) else {
            return;
        };
        if !agent.active {
            return;
        }
        agent.hp = agent.hp.saturating_sub(amount);
        if agent.hp > 0 {
            return;
        }

        agent.active = false;
        let kind = agent.kind;
        info!("{:?} {} defeated by {:?}", kind, id, attacker);

        if let Some(owner) = attacker {
            let reward = self.config.agents.kill_reward;
            self.credit_score(owner, reward);
        }
        self.broadcast(
            ServerEvent::MinionDefeated {
                id,
                killer_id: attacker,
            },
            None,
        );

        match self.config.agents.defeat {
            DefeatPolicy::Respawn => {
                let due = now + self.config.agents.respawn_delay();
                self.timers.schedule(due, TimerAction::RespawnAgent(id));
            }
            DefeatPolicy::Backfill => {
                self.agents.remove(&id);
            }
        }
    }

    /// Applies damage to a live player. `attacker` is the shooting player for
    /// PvP hits and `None` for agent melee.
    pub fn damage_player(&mut self, id: PlayerId, amount: u32, attacker: Option<PlayerId>) {
        let Some(player) = self.players.get_mut(&id) else {
            return;
        };
        if player.is_dead {
            return;
        }
        let killed = player.take_damage(amount);
        let hp = player.hp;

        self.broadcast(
            ServerEvent::PlayerDamaged {
                id,
                hp,
                attacker_id: attacker,
            },
            None,
        );
        if let Some(attacker) = attacker {
            let score = self.config.combat.pvp_hit_score;
            self.credit_score(attacker, score);
        }

        if killed {
            info!("Player {} died (killer {:?})", id, attacker);
            self.broadcast(
                ServerEvent::PlayerDied {
                    id,
                    killer_id: attacker,
                },
                None,
            );
            if let Some(attacker) = attacker {
                let bonus = self.config.combat.pvp_kill_bonus;
                self.credit_score(attacker, bonus);
            }
        }
    }

    /// Adds score to a player if they are still connected. Returns false for
    /// departed players, who get nothing.
    pub fn credit_score(&mut self, id: PlayerId, amount: u32) -> bool {
        let Some(player) = self.players.get_mut(&id) else {
            return false;
        };
        if amount == 0 {
            return true;
        }
        player.score = player.score.saturating_add(amount);
        let score = player.score;
        self.leaderboard_dirty = true;
        self.broadcast(ServerEvent::UpdateScore { id, score }, None);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GameConfig, GroundMode};
    use crate::game::Outgoing;
    use skirmish_shared::{AgentKind, ProjectileKind};
    use std::time::Duration;

    fn arena(config: GameConfig) -> (GameState, Instant) {
        let now = Instant::now();
        let mut config = config;
        config.agents.initial_targets = 0;
        config.agents.max_minions = 0;
        (GameState::new(config, now), now)
    }

    fn place_target(state: &mut GameState, position: Vec3) -> AgentId {
        let id = state.spawn_agent(AgentKind::Target);
        if let Some(agent) = state.agents.get_mut(&id) {
            agent.position = position;
            agent.home = position;
        }
        id
    }

    fn events(out: &[Outgoing]) -> Vec<&ServerEvent> {
        out.iter()
            .map(|message| match message {
                Outgoing::Send { event, .. } | Outgoing::Broadcast { event, .. } => event,
            })
            .collect()
    }

    fn count_named(out: &[Outgoing], name: &str) -> usize {
        events(out).iter().filter(|event| event.name() == name).count()
    }

    #[test]
    fn test_projectile_hits_only_first_agent() {
        let (mut state, now) = arena(GameConfig::default());
        state.join(1, None, None);
        let a = place_target(&mut state, Vec3::new(0.0, 2.0, 0.0));
        let b = place_target(&mut state, Vec3::new(0.3, 2.0, 0.0));
        let spot = Vec3::new(0.0, 2.0, 0.0);
        state.spawn_projectile(1, ProjectileKind::Normal, spot, Vec3::ZERO, now);
        state.drain_outbox();

        state.tick(now);

        assert!(state.projectiles.is_empty());
        assert_eq!(state.agents[&a].hp, 2);
        assert_eq!(state.agents[&b].hp, 3);
        assert_eq!(count_named(&state.drain_outbox(), "removeBullet"), 1);
    }

    #[test]
    fn test_three_hits_defeat_agent_exactly_once() {
        let (mut state, now) = arena(GameConfig::default());
        state.join(1, None, None);
        let id = place_target(&mut state, Vec3::new(5.0, 1.0, 5.0));

        for _ in 0..4 {
            state.damage_agent(id, 1, Some(1), now);
        }

        let agent = &state.agents[&id];
        assert_eq!(agent.hp, 0);
        assert!(!agent.active);
        assert_eq!(state.players[&1].score, state.config.agents.kill_reward);
        assert_eq!(state.pending_timers(), 1);

        let out = state.drain_outbox();
        assert_eq!(count_named(&out, "minionDefeated"), 1);
        assert_eq!(count_named(&out, "updateScore"), 2);
    }

    #[test]
    fn test_backfill_removes_defeated_agent() {
        let mut config = GameConfig::default();
        config.agents.defeat = DefeatPolicy::Backfill;
        let (mut state, now) = arena(config);
        let id = place_target(&mut state, Vec3::ZERO);

        state.damage_agent(id, 10, None, now);

        assert!(!state.agents.contains_key(&id));
        assert_eq!(state.pending_timers(), 0);
    }

    #[test]
    fn test_defeat_credit_skips_departed_owner() {
        let (mut state, now) = arena(GameConfig::default());
        let id = place_target(&mut state, Vec3::ZERO);

        state.damage_agent(id, 3, Some(42), now);

        assert!(!state.agents[&id].active);
        let out = state.drain_outbox();
        assert_eq!(count_named(&out, "updateScore"), 0);
        assert_eq!(count_named(&out, "minionDefeated"), 1);
    }

    #[test]
    fn test_explosion_damages_everything_in_radius() {
        let (mut state, now) = arena(GameConfig::default());
        state.join(1, None, None);
        let near = place_target(&mut state, Vec3::new(1.0, 0.2, 0.0));
        let edge = place_target(&mut state, Vec3::new(0.0, 0.2, 3.5));
        let far = place_target(&mut state, Vec3::new(10.0, 0.2, 0.0));
        state.spawn_projectile(
            1,
            ProjectileKind::Explosive,
            Vec3::new(0.0, 0.1, 0.0),
            Vec3::ZERO,
            now,
        );
        state.drain_outbox();

        state.tick(now);

        assert!(state.projectiles.is_empty());
        assert_eq!(state.agents[&near].hp, 0);
        assert_eq!(state.agents[&edge].hp, 0);
        assert_eq!(state.agents[&far].hp, 3);
        let out = state.drain_outbox();
        assert_eq!(count_named(&out, "explosion"), 1);
        assert_eq!(count_named(&out, "minionDefeated"), 2);
    }

    #[test]
    fn test_pvp_explosion_spares_owner() {
        let mut config = GameConfig::default();
        config.combat.pvp = true;
        let (mut state, now) = arena(config);
        state.join(1, None, None);
        state.join(2, None, None);
        state.join(3, None, None);
        let center = Vec3::new(0.0, 1.0, 0.0);
        for (id, position) in [
            (1, center),
            (2, Vec3::new(2.0, 1.0, 0.0)),
            (3, Vec3::new(9.0, 1.0, 0.0)),
        ] {
            if let Some(player) = state.players.get_mut(&id) {
                player.position = position;
            }
        }
        state.drain_outbox();

        state.detonate(center, 1, ProjectileKind::Explosive.damage(), now);

        assert_eq!(state.players[&1].hp, state.players[&1].max_hp);
        assert_eq!(state.players[&2].hp, state.players[&2].max_hp - 3);
        assert_eq!(state.players[&3].hp, state.players[&3].max_hp);
        let combat = &state.config.combat;
        assert_eq!(state.players[&1].score, combat.pvp_hit_score);

        let out = state.drain_outbox();
        assert!(events(&out).contains(&&ServerEvent::PlayerDamaged {
            id: 2,
            hp: 7,
            attacker_id: Some(1),
        }));
        assert_eq!(count_named(&out, "playerDamaged"), 1);
    }

    #[test]
    fn test_hit_radius_edge_is_a_miss() {
        let (mut state, now) = arena(GameConfig::default());
        let radius = state.config.projectiles.hit_radius;
        let target = place_target(&mut state, Vec3::new(radius, 2.0, 0.0));
        let spot = Vec3::new(0.0, 2.0, 0.0);
        let id = state.spawn_projectile(1, ProjectileKind::Normal, spot, Vec3::ZERO, now);

        assert_eq!(state.find_hit(&state.projectiles[&id]), None);

        if let Some(agent) = state.agents.get_mut(&target) {
            agent.position.x = radius * 0.99;
        }
        assert_eq!(
            state.find_hit(&state.projectiles[&id]),
            Some(HitTarget::Agent(target))
        );
    }

    #[test]
    fn test_resolve_mode_removes_low_projectile() {
        let mut config = GameConfig::default();
        config.projectiles.ground_mode = GroundMode::Resolve;
        config.projectiles.floor_y = 0.5;
        let (mut state, now) = arena(config);
        let id = state.spawn_projectile(
            1,
            ProjectileKind::Normal,
            Vec3::new(0.0, 0.4, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            now,
        );

        state.tick(now);

        assert!(state.projectiles.is_empty());
        let out = state.drain_outbox();
        assert!(events(&out).contains(&&ServerEvent::RemoveBullet(id)));
    }

    #[test]
    fn test_bounce_mode_keeps_projectile() {
        let (mut state, now) = arena(GameConfig::default());
        let id = state.spawn_projectile(
            1,
            ProjectileKind::Normal,
            Vec3::new(0.0, 0.25, 0.0),
            Vec3::new(10.0, -5.0, 0.0),
            now,
        );

        state.tick(now);

        let projectile = &state.projectiles[&id];
        assert!(projectile.velocity.y > 0.0);
        assert!(projectile.position.y >= state.config.projectiles.floor_y);
    }

    #[test]
    fn test_idle_projectile_despawns_after_grace() {
        let (mut state, now) = arena(GameConfig::default());
        let id = state.spawn_projectile(
            1,
            ProjectileKind::Normal,
            Vec3::new(0.0, 0.2, 0.0),
            Vec3::ZERO,
            now,
        );

        state.tick(now);
        assert!(state.projectiles.contains_key(&id));
        state.tick(now + Duration::from_millis(1000));
        assert!(state.projectiles.contains_key(&id));
        state.tick(now + Duration::from_millis(2100));
        assert!(!state.projectiles.contains_key(&id));
    }

    #[test]
    fn test_pvp_hits_other_players_only_when_enabled() {
        let (mut state, now) = arena(GameConfig::default());
        state.join(1, None, None);
        state.join(2, None, None);
        let spot = state.players[&2].position;
        state.spawn_projectile(1, ProjectileKind::Heavy, spot, Vec3::ZERO, now);

        let projectile = state.projectiles.values().next().cloned().unwrap();
        assert_eq!(state.find_hit(&projectile), None);

        state.config.combat.pvp = true;
        assert_eq!(state.find_hit(&projectile), Some(HitTarget::Player(2)));

        let mut own = projectile.clone();
        own.owner = 2;
        assert_eq!(state.find_hit(&own), Some(HitTarget::Player(1)));
    }

    #[test]
    fn test_pvp_kill_credits_hit_and_bonus_once() {
        let mut config = GameConfig::default();
        config.combat.pvp = true;
        let (mut state, _now) = arena(config);
        state.join(1, None, None);
        state.join(2, None, None);
        state.drain_outbox();

        state.damage_player(2, 6, Some(1));
        state.damage_player(2, 6, Some(1));
        state.damage_player(2, 6, Some(1));

        let victim = &state.players[&2];
        assert_eq!(victim.hp, 0);
        assert!(victim.is_dead);
        let combat = &state.config.combat;
        assert_eq!(
            state.players[&1].score,
            combat.pvp_hit_score * 2 + combat.pvp_kill_bonus
        );

        let out = state.drain_outbox();
        assert_eq!(count_named(&out, "playerDied"), 1);
        assert_eq!(count_named(&out, "playerDamaged"), 2);
    }

    #[test]
    fn test_melee_death_has_no_killer() {
        let (mut state, _now) = arena(GameConfig::default());
        state.join(1, None, None);
        state.drain_outbox();

        state.damage_player(1, 100, None);

        let out = state.drain_outbox();
        assert!(events(&out).contains(&&ServerEvent::PlayerDied {
            id: 1,
            killer_id: None
        }));
        assert_eq!(count_named(&out, "updateScore"), 0);
    }
}
