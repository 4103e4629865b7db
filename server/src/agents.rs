//! AI agent behavior: minion seek/melee and spawn placement.
//!
//! Both helpers work on plain stores so they can be tested without a full
//! `GameState`. Damage from melee hits is applied by the caller.

use rand::rngs::StdRng;
use rand::Rng;
use skirmish_shared::{AgentId, AgentKind, PlayerId, Vec3};
use std::collections::BTreeMap;

use crate::config::AgentRules;
use crate::entity::{Agent, Player};

/// A melee swing that landed this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeleeHit {
    pub agent: AgentId,
    pub target: PlayerId,
    pub damage: u32,
}

/// Nearest live player to `from` on the XZ plane, with its planar distance.
pub fn nearest_live_player(
    from: &Vec3,
    players: &BTreeMap<PlayerId, Player>,
) -> Option<(PlayerId, Vec3, f32)> {
    players
        .values()
        .filter(|player| player.is_alive())
        .map(|player| (player.id, player.position, from.planar_distance(&player.position)))
        .min_by(|a, b| a.2.total_cmp(&b.2))
}

/// Advances every active minion one step and collects the swings that landed.
///
/// Attack cooldowns decay on every agent, including inactive ones, so a
/// respawned minion never carries a stale cooldown for long.
pub fn step_minions(
    agents: &mut BTreeMap<AgentId, Agent>,
    players: &BTreeMap<PlayerId, Player>,
    rules: &AgentRules,
    dt: f32,
) -> Vec<MeleeHit> {
    let mut hits = Vec::new();

    for agent in agents.values_mut() {
        agent.attack_cooldown = (agent.attack_cooldown - dt).max(0.0);
        if !agent.active || agent.kind != AgentKind::Minion {
            continue;
        }

        let Some((target, target_pos, dist)) = nearest_live_player(&agent.position, players)
        else {
            continue;
        };
        if dist > rules.aggro_range {
            continue;
        }

        let dx = target_pos.x - agent.position.x;
        let dz = target_pos.z - agent.position.z;
        if dist > f32::EPSILON {
            agent.yaw = dx.atan2(dz);
        }

        if dist > rules.contact_range {
            let step = (agent.speed * dt).min(dist - rules.contact_range);
            agent.position.x += dx / dist * step;
            agent.position.z += dz / dist * step;
        } else if agent.attack_cooldown <= 0.0 && rules.attack_damage > 0 {
            hits.push(MeleeHit {
                agent: agent.id,
                target,
                damage: rules.attack_damage,
            });
            agent.attack_cooldown = rules.attack_cooldown_secs();
        }
    }

    hits
}

/// Uniform point inside the arena square, standing on the ground.
pub fn random_spawn_point(rng: &mut StdRng, rules: &AgentRules) -> Vec3 {
    let r = rules.arena_radius.abs();
    if r <= f32::EPSILON {
        return Vec3::new(0.0, rules.ground_height, 0.0);
    }
    Vec3::new(
        rng.gen_range(-r..=r),
        rules.ground_height,
        rng.gen_range(-r..=r),
    )
}

/// Population of `kind`, counting agents waiting to respawn.
pub fn count_kind(agents: &BTreeMap<AgentId, Agent>, kind: AgentKind) -> usize {
    agents.values().filter(|agent| agent.kind == kind).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlayerRules;
    use assert_approx_eq::assert_approx_eq;
    use rand::SeedableRng;

    fn player_at(id: PlayerId, position: Vec3) -> Player {
        let mut player = Player::new(
            id,
            format!("p{}", id),
            "#ffffff".to_string(),
            &PlayerRules::default(),
        );
        player.position = position;
        player
    }

    fn minion_at(id: AgentId, position: Vec3) -> Agent {
        Agent::new(id, AgentKind::Minion, position, 3, 2.0)
    }

    #[test]
    fn test_nearest_uses_planar_distance_and_skips_dead() {
        let mut players = BTreeMap::new();
        players.insert(1, player_at(1, Vec3::new(0.0, 50.0, 2.0)));
        players.insert(2, player_at(2, Vec3::new(0.0, 0.0, 3.0)));
        let mut dead = player_at(3, Vec3::new(0.0, 0.0, 0.5));
        dead.is_dead = true;
        players.insert(3, dead);

        let (id, _, dist) = nearest_live_player(&Vec3::ZERO, &players).unwrap();
        assert_eq!(id, 1);
        assert_approx_eq!(dist, 2.0);

        assert!(nearest_live_player(&Vec3::ZERO, &BTreeMap::new()).is_none());
    }

    #[test]
    fn test_minion_advances_and_faces_player() {
        let rules = AgentRules::default();
        let mut players = BTreeMap::new();
        players.insert(1, player_at(1, Vec3::new(10.0, 1.0, 0.0)));
        let mut agents = BTreeMap::new();
        agents.insert(1, minion_at(1, Vec3::new(0.0, 1.0, 0.0)));

        let hits = step_minions(&mut agents, &players, &rules, 0.5);

        assert!(hits.is_empty());
        let agent = &agents[&1];
        assert_approx_eq!(agent.position.x, 1.0);
        assert_approx_eq!(agent.position.z, 0.0);
        assert_approx_eq!(agent.yaw, std::f32::consts::FRAC_PI_2);
    }

    #[test]
    fn test_minion_stops_at_contact_range() {
        let rules = AgentRules::default();
        let mut players = BTreeMap::new();
        players.insert(1, player_at(1, Vec3::new(0.0, 1.0, 1.5)));
        let mut agents = BTreeMap::new();
        agents.insert(1, minion_at(1, Vec3::new(0.0, 1.0, 0.0)));

        step_minions(&mut agents, &players, &rules, 1.0);

        let agent = &agents[&1];
        assert_approx_eq!(agent.position.z, 1.5 - rules.contact_range);
    }

    #[test]
    fn test_minion_ignores_players_out_of_aggro_range() {
        let rules = AgentRules::default();
        let mut players = BTreeMap::new();
        players.insert(1, player_at(1, Vec3::new(rules.aggro_range + 5.0, 1.0, 0.0)));
        let mut agents = BTreeMap::new();
        agents.insert(1, minion_at(1, Vec3::ZERO));

        step_minions(&mut agents, &players, &rules, 1.0);
        assert_eq!(agents[&1].position, Vec3::ZERO);
    }

    #[test]
    fn test_melee_respects_cooldown() {
        let rules = AgentRules::default();
        let mut players = BTreeMap::new();
        players.insert(7, player_at(7, Vec3::new(0.5, 1.0, 0.0)));
        let mut agents = BTreeMap::new();
        agents.insert(1, minion_at(1, Vec3::new(0.0, 1.0, 0.0)));

        let hits = step_minions(&mut agents, &players, &rules, 0.1);
        assert_eq!(
            hits,
            vec![MeleeHit {
                agent: 1,
                target: 7,
                damage: rules.attack_damage,
            }]
        );

        let hits = step_minions(&mut agents, &players, &rules, 0.1);
        assert!(hits.is_empty());

        let hits = step_minions(&mut agents, &players, &rules, rules.attack_cooldown_secs());
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_targets_and_inactive_agents_stay_put() {
        let rules = AgentRules::default();
        let mut players = BTreeMap::new();
        players.insert(1, player_at(1, Vec3::new(0.5, 1.0, 0.0)));
        let mut agents = BTreeMap::new();
        agents.insert(1, Agent::new(1, AgentKind::Target, Vec3::ZERO, 3, 2.0));
        let mut inactive = minion_at(2, Vec3::new(5.0, 1.0, 0.0));
        inactive.active = false;
        agents.insert(2, inactive);

        let hits = step_minions(&mut agents, &players, &rules, 1.0);

        assert!(hits.is_empty());
        assert_eq!(agents[&1].position, Vec3::ZERO);
        assert_eq!(agents[&2].position, Vec3::new(5.0, 1.0, 0.0));
    }

    #[test]
    fn test_spawn_points_stay_inside_arena() {
        let rules = AgentRules::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let p = random_spawn_point(&mut rng, &rules);
            assert!(p.x.abs() <= rules.arena_radius);
            assert!(p.z.abs() <= rules.arena_radius);
            assert_approx_eq!(p.y, rules.ground_height);
        }
    }

    #[test]
    fn test_spawn_points_are_reproducible() {
        let rules = AgentRules::default();
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        assert_eq!(
            random_spawn_point(&mut a, &rules),
            random_spawn_point(&mut b, &rules)
        );
    }
}
