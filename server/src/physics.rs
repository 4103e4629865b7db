//! Projectile motion: integration, ground contact and settling.

use std::time::Instant;

use crate::config::{GroundMode, ProjectileRules};
use crate::entity::Projectile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroundContact {
    Airborne,
    Bounced,
    /// Terminal impact: the projectile must be resolved and removed.
    Impact,
}

/// Advances one step: position first, then gravity on the vertical velocity.
pub fn integrate(projectile: &mut Projectile, rules: &ProjectileRules, dt: f32) {
    projectile.position = projectile
        .position
        .add(&projectile.velocity.scale(dt));
    projectile.velocity.y -= rules.gravity * dt;
}

/// Handles contact with the floor plane.
///
/// Area-effect projectiles always detonate on contact, whatever the mode.
pub fn resolve_ground(projectile: &mut Projectile, rules: &ProjectileRules) -> GroundContact {
    if projectile.position.y > rules.floor_y {
        return GroundContact::Airborne;
    }
    if rules.ground_mode == GroundMode::Resolve || projectile.kind.is_area_effect() {
        return GroundContact::Impact;
    }

    projectile.position.y = rules.floor_y;
    projectile.velocity.y *= -rules.restitution;
    projectile.velocity.x *= rules.friction;
    projectile.velocity.z *= rules.friction;
    GroundContact::Bounced
}

/// Tracks how long a projectile has been (nearly) still. Returns true once
/// it has stayed under `idle_speed` for longer than the grace window.
pub fn settle(projectile: &mut Projectile, rules: &ProjectileRules, now: Instant) -> bool {
    if projectile.speed() >= rules.idle_speed {
        projectile.stopped_since = None;
        return false;
    }
    match projectile.stopped_since {
        None => {
            projectile.stopped_since = Some(now);
            false
        }
        Some(since) => now.saturating_duration_since(since) > rules.idle_grace(),
    }
}

pub fn expired(projectile: &Projectile, rules: &ProjectileRules, now: Instant) -> bool {
    now.saturating_duration_since(projectile.spawned_at) > rules.max_lifetime()
}
