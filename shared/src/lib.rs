//! Types shared between the arena server and anything that talks to it.
//!
//! The crate holds the small 3D vector type used for every transform, the
//! projectile and agent kind tables, and the [`protocol`] module with the
//! JSON event envelopes exchanged over the WebSocket connection.

use serde::{Deserialize, Serialize};

pub mod protocol;

pub use protocol::*;

pub const DEFAULT_TICK_RATE: u32 = 60;
/// Downward acceleration applied to projectiles, in units/s².
pub const GRAVITY: f32 = 72.0;
/// Height at which a projectile is considered to touch the ground.
pub const FLOOR_Y: f32 = 0.2;
pub const PLAYER_MAX_HP: u32 = 10;
pub const MAGAZINE_CAPACITY: u32 = 10;
pub const AGENT_MAX_HP: u32 = 3;
pub const HIT_RADIUS: f32 = 1.0;
pub const BLAST_RADIUS: f32 = 4.0;

pub type SessionId = u32;
pub type PlayerId = SessionId;
pub type ProjectileId = u64;
pub type AgentId = u32;

/// Position, velocity or euler rotation in world space.
///
/// `y` is up; the ground plane is `x`/`z`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn length_sq(&self) -> f32 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    pub fn length(&self) -> f32 {
        self.length_sq().sqrt()
    }

    /// Returns the unit vector, or zero for a zero-length input.
    pub fn normalize(&self) -> Vec3 {
        let len = self.length();
        if len == 0.0 {
            Vec3::ZERO
        } else {
            self.scale(1.0 / len)
        }
    }

    pub fn scale(&self, scalar: f32) -> Vec3 {
        Vec3::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }

    pub fn add(&self, other: &Vec3) -> Vec3 {
        Vec3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    pub fn sub(&self, other: &Vec3) -> Vec3 {
        Vec3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    pub fn distance(&self, other: &Vec3) -> f32 {
        self.sub(other).length()
    }

    /// Distance on the ground plane, ignoring height.
    pub fn planar_distance(&self, other: &Vec3) -> f32 {
        let dx = other.x - self.x;
        let dz = other.z - self.z;
        (dx * dx + dz * dz).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Ammunition / projectile type. Doubles as the inventory key.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectileKind {
    #[default]
    Normal,
    Heavy,
    Explosive,
}

impl ProjectileKind {
    pub const ALL: [ProjectileKind; 3] = [
        ProjectileKind::Normal,
        ProjectileKind::Heavy,
        ProjectileKind::Explosive,
    ];

    pub fn damage(&self) -> u32 {
        match self {
            ProjectileKind::Normal => 1,
            ProjectileKind::Heavy => 2,
            ProjectileKind::Explosive => 3,
        }
    }

    /// Launch speed in units/s.
    pub fn muzzle_speed(&self) -> f32 {
        match self {
            ProjectileKind::Normal => 30.0,
            ProjectileKind::Heavy => 20.0,
            ProjectileKind::Explosive => 15.0,
        }
    }

    /// Area-effect kinds damage everything inside the blast radius instead
    /// of a single first-hit target.
    pub fn is_area_effect(&self) -> bool {
        matches!(self, ProjectileKind::Explosive)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentKind {
    /// Chases and attacks the nearest live player.
    Minion,
    /// Stationary practice target.
    Target,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_vec3_length_and_normalize() {
        let v = Vec3::new(3.0, 0.0, 4.0);
        assert_approx_eq!(v.length(), 5.0);

        let n = v.normalize();
        assert_approx_eq!(n.x, 0.6);
        assert_approx_eq!(n.z, 0.8);
        assert_approx_eq!(n.length(), 1.0);
    }

    #[test]
    fn test_vec3_normalize_zero() {
        assert_eq!(Vec3::ZERO.normalize(), Vec3::ZERO);
    }

    #[test]
    fn test_vec3_planar_distance_ignores_height() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(3.0, 50.0, 4.0);
        assert_approx_eq!(a.planar_distance(&b), 5.0);
        assert!(a.distance(&b) > 50.0);
    }

    #[test]
    fn test_vec3_is_finite() {
        assert!(Vec3::new(1.0, 2.0, 3.0).is_finite());
        assert!(!Vec3::new(f32::NAN, 0.0, 0.0).is_finite());
        assert!(!Vec3::new(0.0, f32::INFINITY, 0.0).is_finite());
    }

    #[test]
    fn test_projectile_kind_table() {
        assert_eq!(ProjectileKind::default(), ProjectileKind::Normal);
        assert_eq!(ProjectileKind::Normal.damage(), 1);
        assert!(ProjectileKind::Explosive.is_area_effect());
        assert!(!ProjectileKind::Heavy.is_area_effect());
        for kind in ProjectileKind::ALL {
            assert!(kind.muzzle_speed() > 0.0);
        }
    }
}
