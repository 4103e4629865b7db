//! Client intent handlers.
//!
//! Intents are applied the moment they arrive, never queued for the next
//! tick. Anything that fails a precondition is dropped without a reply.

use log::{debug, info};
use skirmish_shared::{ClientEvent, ProjectileKind, ServerEvent, SessionId, Vec3};
use std::time::Instant;

use crate::config::RespawnPolicy;
use crate::entity::Player;
use crate::game::GameState;
use crate::utils::{sanitize_color, sanitize_username};

impl GameState {
    /// Routes a decoded intent from `session`, then flushes the leaderboard.
    pub fn handle_event(&mut self, session: SessionId, event: ClientEvent, now: Instant) {
        match event {
            ClientEvent::Join { username, color } => self.join(session, username, color),
            ClientEvent::PlayerInput { position, rotation } => {
                self.move_player(session, position, rotation)
            }
            ClientEvent::Shoot {
                position,
                direction,
                kind,
            } => self.fire(session, position, direction, kind, now),
            ClientEvent::ReloadWeapon {} => self.reload(session),
            ClientEvent::BuyItem { item, quantity } => self.buy_item(session, item, quantity),
            ClientEvent::RequestRespawn {} => self.respawn(session),
            ClientEvent::ChatMessage(message) => self.chat(session, message),
        }
        self.flush_leaderboard();
    }

    /// Creates the player for `session`. A session joins at most once.
    pub fn join(&mut self, session: SessionId, username: Option<String>, color: Option<String>) {
        if self.players.contains_key(&session) {
            debug!("Session {} already joined", session);
            return;
        }

        let username = sanitize_username(username.as_deref(), session);
        let color = sanitize_color(color.as_deref(), session);
        let player = Player::new(session, username, color, &self.config.player);
        info!("Player {} joined as '{}'", session, player.username);

        let state = player.to_state();
        let inventory = player.inventory.clone();
        let score = player.score;
        self.players.insert(session, player);

        let everyone = self
            .players
            .iter()
            .map(|(id, player)| (*id, player.to_state()))
            .collect();
        self.send(session, ServerEvent::CurrentPlayers(everyone));
        self.send(
            session,
            ServerEvent::UpdateInventory {
                id: session,
                inventory,
            },
        );
        self.send(session, ServerEvent::UpdateScore { id: session, score });
        self.broadcast(ServerEvent::NewPlayer(state), Some(session));

        // The joiner always gets the board; everyone else only on change.
        self.leaderboard_dirty = false;
        if self.leaderboard.refresh(&self.players) {
            let entries = self.leaderboard.entries().to_vec();
            self.broadcast(ServerEvent::UpdateLeaderboard(entries), None);
        } else {
            let entries = self.leaderboard.entries().to_vec();
            self.send(session, ServerEvent::UpdateLeaderboard(entries));
        }
    }

    /// Drops the player bound to `session`. Its projectiles keep flying.
    pub fn leave(&mut self, session: SessionId) {
        if self.players.remove(&session).is_none() {
            return;
        }
        info!("Player {} left", session);
        self.broadcast(ServerEvent::PlayerDisconnected(session), Some(session));
        self.leaderboard_dirty = true;
        self.flush_leaderboard();
    }

    fn move_player(&mut self, session: SessionId, position: Vec3, rotation: Vec3) {
        if !position.is_finite() || !rotation.is_finite() {
            debug!("Session {} sent a non-finite transform", session);
            return;
        }
        let Some(player) = self.players.get_mut(&session) else {
            return;
        };
        if player.is_dead {
            return;
        }
        player.position = position;
        player.rotation = rotation;

        self.broadcast(
            ServerEvent::PlayerMoved {
                id: session,
                position,
                rotation,
            },
            Some(session),
        );
    }

    fn fire(
        &mut self,
        session: SessionId,
        position: Vec3,
        direction: Vec3,
        kind: ProjectileKind,
        now: Instant,
    ) {
        if !position.is_finite() || !direction.is_finite() || direction.length_sq() <= f32::EPSILON
        {
            debug!("Session {} fired with an invalid direction", session);
            return;
        }
        let Some(player) = self.players.get_mut(&session) else {
            return;
        };
        if player.is_dead {
            return;
        }
        if !player.consume_ammo(kind) {
            debug!("Player {} is out of {:?} ammo", session, kind);
            return;
        }
        let inventory = player.inventory.clone();

        let velocity = direction.normalize().scale(kind.muzzle_speed());
        let id = self.spawn_projectile(session, kind, position, velocity, now);
        if let Some(projectile) = self.projectiles.get(&id) {
            let state = projectile.to_state();
            self.broadcast(ServerEvent::SpawnBullet(state), None);
        }
        self.send(
            session,
            ServerEvent::UpdateInventory {
                id: session,
                inventory,
            },
        );
    }

    fn reload(&mut self, session: SessionId) {
        let capacity = self.config.player.magazine_capacity;
        let Some(player) = self.players.get_mut(&session) else {
            return;
        };
        if player.is_dead {
            return;
        }
        player.inventory.insert(ProjectileKind::Normal, capacity);
        let inventory = player.inventory.clone();
        self.send(
            session,
            ServerEvent::UpdateInventory {
                id: session,
                inventory,
            },
        );
    }

    /// Score and inventory change together or not at all.
    fn buy_item(&mut self, session: SessionId, item: ProjectileKind, quantity: u32) {
        if quantity == 0 {
            return;
        }
        let Some(price) = self.config.economy.price_of(item) else {
            debug!("{:?} is not for sale", item);
            return;
        };
        let Some(cost) = price.checked_mul(quantity) else {
            return;
        };
        let Some(player) = self.players.get_mut(&session) else {
            return;
        };
        if player.is_dead || player.score < cost {
            debug!(
                "Player {} can't afford {} x {:?} ({} < {})",
                session, quantity, item, player.score, cost
            );
            return;
        }

        player.score -= cost;
        player.add_ammo(item, quantity);
        let score = player.score;
        let inventory = player.inventory.clone();
        self.leaderboard_dirty = true;

        self.broadcast(ServerEvent::UpdateScore { id: session, score }, None);
        self.send(
            session,
            ServerEvent::UpdateInventory {
                id: session,
                inventory,
            },
        );
    }

    fn respawn(&mut self, session: SessionId) {
        let rules = &self.config.player;
        let Some(player) = self.players.get_mut(&session) else {
            return;
        };
        if !player.is_dead {
            debug!("Player {} asked to respawn while alive", session);
            return;
        }

        player.hp = player.max_hp;
        player.position = rules.spawn_point;
        player.rotation = Vec3::ZERO;
        player.is_dead = false;
        if rules.respawn == RespawnPolicy::ResetProgress {
            player.score = 0;
            player.inventory = rules.starting_inventory.clone();
        }
        info!("Player {} respawned", session);

        let state = player.to_state();
        let inventory = player.inventory.clone();
        let score = player.score;
        self.leaderboard_dirty = true;

        self.broadcast(ServerEvent::NewPlayer(state), None);
        self.broadcast(ServerEvent::UpdateScore { id: session, score }, None);
        self.send(
            session,
            ServerEvent::UpdateInventory {
                id: session,
                inventory,
            },
        );
    }

    fn chat(&mut self, session: SessionId, message: String) {
        let Some(player) = self.players.get(&session) else {
            return;
        };
        let username = player.username.clone();
        self.broadcast(
            ServerEvent::ChatMessage {
                id: session,
                username,
                message,
            },
            None,
        );
    }
}
