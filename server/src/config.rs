//! Gameplay and server tuning.
//!
//! Every section is `#[serde(default)]`, so a JSON config file only needs the
//! values it overrides. Command-line flags are applied on top in `main`.

use serde::{Deserialize, Serialize};
use skirmish_shared::{
    Inventory, ProjectileKind, Vec3, AGENT_MAX_HP, BLAST_RADIUS, DEFAULT_TICK_RATE, FLOOR_Y,
    GRAVITY, HIT_RADIUS, MAGAZINE_CAPACITY, PLAYER_MAX_HP,
};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::ServerResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub tick_rate: u32,
    pub max_clients: usize,
    /// Disconnect sessions silent for this long. Zero disables the sweep.
    pub idle_timeout_secs: u64,
    pub leaderboard_size: usize,
    /// Seed for agent spawn placement.
    pub seed: u64,
    pub player: PlayerRules,
    pub projectiles: ProjectileRules,
    pub agents: AgentRules,
    pub combat: CombatRules,
    pub economy: EconomyRules,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
            max_clients: 32,
            idle_timeout_secs: 0,
            leaderboard_size: 5,
            seed: 0x5eed,
            player: PlayerRules::default(),
            projectiles: ProjectileRules::default(),
            agents: AgentRules::default(),
            combat: CombatRules::default(),
            economy: EconomyRules::default(),
        }
    }
}

impl GameConfig {
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    pub fn load(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read config {}: {}", path.display(), e))?;
        let config = Self::from_json_str(&text)
            .map_err(|e| format!("invalid config {}: {}", path.display(), e))?;
        Ok(config)
    }

    /// Wall-clock length of one tick.
    pub fn tick_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate.max(1) as f64)
    }

    /// Simulation step in seconds. Fixed, independent of scheduling jitter.
    pub fn tick_dt(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_secs > 0).then(|| Duration::from_secs(self.idle_timeout_secs))
    }
}

/// What happens to a player's progress on `requestRespawn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RespawnPolicy {
    /// Score drops to zero and the inventory returns to the starting loadout.
    ResetProgress,
    KeepProgress,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerRules {
    pub max_hp: u32,
    pub spawn_point: Vec3,
    /// NORMAL rounds restored by `reloadWeapon`.
    pub magazine_capacity: u32,
    pub starting_inventory: Inventory,
    pub respawn: RespawnPolicy,
}

impl Default for PlayerRules {
    fn default() -> Self {
        let mut starting_inventory = Inventory::new();
        starting_inventory.insert(ProjectileKind::Normal, MAGAZINE_CAPACITY);
        Self {
            max_hp: PLAYER_MAX_HP,
            spawn_point: Vec3::new(0.0, 1.0, 0.0),
            magazine_capacity: MAGAZINE_CAPACITY,
            starting_inventory,
            respawn: RespawnPolicy::ResetProgress,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroundMode {
    /// Reflect and damp on contact; settled projectiles go through idle-despawn.
    Bounce,
    /// Ground contact is a terminal impact.
    Resolve,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileRules {
    pub gravity: f32,
    pub floor_y: f32,
    pub ground_mode: GroundMode,
    /// Fraction of vertical speed kept (and inverted) on a bounce.
    pub restitution: f32,
    /// Horizontal velocity multiplier applied on a bounce.
    pub friction: f32,
    pub hit_radius: f32,
    pub blast_radius: f32,
    /// Speed (units/s) under which a projectile counts as stopped.
    pub idle_speed: f32,
    pub idle_grace_ms: u64,
    pub max_lifetime_ms: u64,
}

impl Default for ProjectileRules {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            floor_y: FLOOR_Y,
            ground_mode: GroundMode::Bounce,
            restitution: 0.5,
            friction: 0.9,
            hit_radius: HIT_RADIUS,
            blast_radius: BLAST_RADIUS,
            idle_speed: 3.0,
            idle_grace_ms: 2000,
            max_lifetime_ms: 15_000,
        }
    }
}

impl ProjectileRules {
    pub fn idle_grace(&self) -> Duration {
        Duration::from_millis(self.idle_grace_ms)
    }

    pub fn max_lifetime(&self) -> Duration {
        Duration::from_millis(self.max_lifetime_ms)
    }
}

/// What happens to an agent once its hp reaches zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DefeatPolicy {
    /// Stay in the store inactive and come back at home after `respawn_delay_ms`.
    Respawn,
    /// Leave the store; the spawner refills the population.
    Backfill,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentRules {
    /// Stationary targets placed at level start.
    pub initial_targets: usize,
    pub max_minions: usize,
    pub spawn_interval_ms: u64,
    /// Agents spawn uniformly inside this square half-extent around the origin.
    pub arena_radius: f32,
    /// Height agents stand at.
    pub ground_height: f32,
    pub max_hp: u32,
    pub minion_speed: f32,
    pub aggro_range: f32,
    pub contact_range: f32,
    /// Melee damage per swing. Zero makes minions harmless.
    pub attack_damage: u32,
    pub attack_cooldown_ms: u64,
    pub defeat: DefeatPolicy,
    pub respawn_delay_ms: u64,
    /// Score credited to the projectile owner for a defeat.
    pub kill_reward: u32,
}

impl Default for AgentRules {
    fn default() -> Self {
        Self {
            initial_targets: 3,
            max_minions: 5,
            spawn_interval_ms: 3000,
            arena_radius: 20.0,
            ground_height: 1.0,
            max_hp: AGENT_MAX_HP,
            minion_speed: 2.5,
            aggro_range: 15.0,
            contact_range: 1.2,
            attack_damage: 1,
            attack_cooldown_ms: 1500,
            defeat: DefeatPolicy::Respawn,
            respawn_delay_ms: 5000,
            kill_reward: 10,
        }
    }
}

impl AgentRules {
    pub fn spawn_interval(&self) -> Duration {
        Duration::from_millis(self.spawn_interval_ms)
    }

    pub fn respawn_delay(&self) -> Duration {
        Duration::from_millis(self.respawn_delay_ms)
    }

    pub fn attack_cooldown_secs(&self) -> f32 {
        self.attack_cooldown_ms as f32 / 1000.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatRules {
    /// Player projectiles also hit other players.
    pub pvp: bool,
    pub pvp_hit_score: u32,
    pub pvp_kill_bonus: u32,
}

impl Default for CombatRules {
    fn default() -> Self {
        Self {
            pvp: false,
            pvp_hit_score: 1,
            pvp_kill_bonus: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyRules {
    /// Unit price per purchasable kind. Kinds without a price can't be bought.
    pub prices: BTreeMap<ProjectileKind, u32>,
}

impl Default for EconomyRules {
    fn default() -> Self {
        let mut prices = BTreeMap::new();
        prices.insert(ProjectileKind::Heavy, 5);
        prices.insert(ProjectileKind::Explosive, 20);
        Self { prices }
    }
}

impl EconomyRules {
    pub fn price_of(&self, kind: ProjectileKind) -> Option<u32> {
        self.prices.get(&kind).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_default_config() {
        let config = GameConfig::default();
        assert_eq!(config.tick_rate, 60);
        assert_eq!(config.player.max_hp, 10);
        assert_eq!(
            config.player.starting_inventory.get(&ProjectileKind::Normal),
            Some(&10)
        );
        assert_eq!(config.projectiles.ground_mode, GroundMode::Bounce);
        assert!(config.idle_timeout().is_none());
        assert_eq!(config.economy.price_of(ProjectileKind::Normal), None);
    }

    #[test]
    fn test_tick_timing() {
        let mut config = GameConfig::default();
        config.tick_rate = 20;
        assert_eq!(config.tick_period(), Duration::from_millis(50));
        assert_approx_eq!(config.tick_dt(), 0.05);

        config.tick_rate = 0;
        assert_eq!(config.tick_period(), Duration::from_secs(1));
    }

    #[test]
    fn test_partial_json_override() {
        let json = r#"{
            "tick_rate": 30,
            "combat": { "pvp": true },
            "projectiles": { "ground_mode": "RESOLVE", "floor_y": 0.5 },
            "agents": { "defeat": "BACKFILL" },
            "economy": { "prices": { "EXPLOSIVE": 50 } }
        }"#;
        let config = GameConfig::from_json_str(json).unwrap();

        assert_eq!(config.tick_rate, 30);
        assert!(config.combat.pvp);
        assert_eq!(config.combat.pvp_kill_bonus, 5);
        assert_eq!(config.projectiles.ground_mode, GroundMode::Resolve);
        assert_approx_eq!(config.projectiles.floor_y, 0.5);
        assert_approx_eq!(config.projectiles.gravity, GRAVITY);
        assert_eq!(config.agents.defeat, DefeatPolicy::Backfill);
        assert_eq!(config.economy.price_of(ProjectileKind::Explosive), Some(50));
        assert_eq!(config.economy.price_of(ProjectileKind::Heavy), None);
        assert_eq!(config.max_clients, 32);
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        assert!(GameConfig::from_json_str(r#"{"tick_rate": "fast"}"#).is_err());
        assert!(GameConfig::from_json_str(r#"{"agents": {"defeat": "VANISH"}}"#).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        tokio_test::assert_err!(GameConfig::load(Path::new("/definitely/not/here.json")));
    }
}
