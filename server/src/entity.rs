//! Server-side entity records.
//!
//! These are the single authoritative copies. Clients only ever see the
//! `*State` views built by `to_state`.

use skirmish_shared::{
    AgentId, AgentKind, AgentState, Inventory, PlayerId, PlayerState, ProjectileId,
    ProjectileKind, ProjectileState, Vec3,
};
use std::time::Instant;

use crate::config::PlayerRules;

#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub username: String,
    pub color: String,
    pub position: Vec3,
    pub rotation: Vec3,
    pub hp: u32,
    pub max_hp: u32,
    pub score: u32,
    pub inventory: Inventory,
    pub is_dead: bool,
}

impl Player {
    pub fn new(id: PlayerId, username: String, color: String, rules: &PlayerRules) -> Self {
        Self {
            id,
            username,
            color,
            position: rules.spawn_point,
            rotation: Vec3::ZERO,
            hp: rules.max_hp,
            max_hp: rules.max_hp,
            score: 0,
            inventory: rules.starting_inventory.clone(),
            is_dead: false,
        }
    }

    pub fn is_alive(&self) -> bool {
        !self.is_dead
    }

    pub fn ammo(&self, kind: ProjectileKind) -> u32 {
        self.inventory.get(&kind).copied().unwrap_or(0)
    }

    /// Takes one round of `kind`. Returns false, leaving the inventory
    /// untouched, when none is left.
    pub fn consume_ammo(&mut self, kind: ProjectileKind) -> bool {
        match self.inventory.get_mut(&kind) {
            Some(count) if *count > 0 => {
                *count -= 1;
                true
            }
            _ => false,
        }
    }

    pub fn add_ammo(&mut self, kind: ProjectileKind, amount: u32) {
        let count = self.inventory.entry(kind).or_insert(0);
        *count = count.saturating_add(amount);
    }

    /// Applies damage, clamping at zero. Returns true if this hit killed.
    pub fn take_damage(&mut self, amount: u32) -> bool {
        if self.is_dead {
            return false;
        }
        self.hp = self.hp.saturating_sub(amount);
        if self.hp == 0 {
            self.is_dead = true;
            return true;
        }
        false
    }

    pub fn to_state(&self) -> PlayerState {
        PlayerState {
            id: self.id,
            username: self.username.clone(),
            color: self.color.clone(),
            position: self.position,
            rotation: self.rotation,
            hp: self.hp,
            max_hp: self.max_hp,
            score: self.score,
            inventory: self.inventory.clone(),
            is_dead: self.is_dead,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: ProjectileId,
    /// Non-owning: the owner may have disconnected since firing.
    pub owner: PlayerId,
    pub kind: ProjectileKind,
    pub position: Vec3,
    pub velocity: Vec3,
    pub spawned_at: Instant,
    /// Set while speed stays under the idle threshold.
    pub stopped_since: Option<Instant>,
}

impl Projectile {
    pub fn new(
        id: ProjectileId,
        owner: PlayerId,
        kind: ProjectileKind,
        position: Vec3,
        velocity: Vec3,
        now: Instant,
    ) -> Self {
        Self {
            id,
            owner,
            kind,
            position,
            velocity,
            spawned_at: now,
            stopped_since: None,
        }
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    pub fn to_state(&self) -> ProjectileState {
        ProjectileState {
            id: self.id,
            owner_id: self.owner,
            kind: self.kind,
            position: self.position,
            velocity: self.velocity,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Agent {
    pub id: AgentId,
    pub kind: AgentKind,
    pub position: Vec3,
    /// Where the agent returns to when it respawns.
    pub home: Vec3,
    pub yaw: f32,
    pub hp: u32,
    pub max_hp: u32,
    pub active: bool,
    pub speed: f32,
    /// Seconds until the next melee swing is allowed.
    pub attack_cooldown: f32,
}

impl Agent {
    pub fn new(id: AgentId, kind: AgentKind, position: Vec3, max_hp: u32, speed: f32) -> Self {
        let speed = match kind {
            AgentKind::Minion => speed,
            AgentKind::Target => 0.0,
        };
        Self {
            id,
            kind,
            position,
            home: position,
            yaw: 0.0,
            hp: max_hp,
            max_hp,
            active: true,
            speed,
            attack_cooldown: 0.0,
        }
    }

    pub fn revive(&mut self) {
        self.hp = self.max_hp;
        self.position = self.home;
        self.active = true;
        self.attack_cooldown = 0.0;
    }

    pub fn to_state(&self) -> AgentState {
        AgentState {
            id: self.id,
            kind: self.kind,
            position: self.position,
            yaw: self.yaw,
            hp: self.hp,
            max_hp: self.max_hp,
            active: self.active,
        }
    }
}
