//! Wire protocol: named events carrying JSON payloads.
//!
//! Every WebSocket text frame is one object of the form
//! `{"event": "<name>", "data": <payload>}`. Intents without a payload send
//! `"data": {}`. Record fields are camelCase.

use crate::{AgentId, AgentKind, PlayerId, ProjectileId, ProjectileKind, SessionId, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ammo counts keyed by projectile kind. Missing keys mean zero.
pub type Inventory = BTreeMap<ProjectileKind, u32>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
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

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectileState {
    pub id: ProjectileId,
    pub owner_id: PlayerId,
    #[serde(rename = "type")]
    pub kind: ProjectileKind,
    pub position: Vec3,
    pub velocity: Vec3,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentState {
    pub id: AgentId,
    pub kind: AgentKind,
    pub position: Vec3,
    pub yaw: f32,
    pub hp: u32,
    pub max_hp: u32,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub username: String,
    pub score: u32,
}

/// Intents submitted by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    #[serde(alias = "initPlayer")]
    Join {
        #[serde(default)]
        username: Option<String>,
        #[serde(default)]
        color: Option<String>,
    },
    #[serde(alias = "playerMovement")]
    PlayerInput { position: Vec3, rotation: Vec3 },
    #[serde(alias = "fire")]
    Shoot {
        position: Vec3,
        direction: Vec3,
        #[serde(default, rename = "type")]
        kind: ProjectileKind,
    },
    ReloadWeapon {},
    BuyItem { item: ProjectileKind, quantity: u32 },
    RequestRespawn {},
    ChatMessage(String),
}

impl ClientEvent {
    /// Event name as it appears on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::Join { .. } => "join",
            ClientEvent::PlayerInput { .. } => "playerInput",
            ClientEvent::Shoot { .. } => "shoot",
            ClientEvent::ReloadWeapon {} => "reloadWeapon",
            ClientEvent::BuyItem { .. } => "buyItem",
            ClientEvent::RequestRespawn {} => "requestRespawn",
            ClientEvent::ChatMessage(_) => "chatMessage",
        }
    }
}

/// Everything the server pushes to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// First message on every connection.
    Welcome { id: SessionId },
    CurrentPlayers(BTreeMap<PlayerId, PlayerState>),
    NewPlayer(PlayerState),
    PlayerDisconnected(PlayerId),
    StatePlayers(BTreeMap<PlayerId, PlayerState>),
    PlayerMoved {
        id: PlayerId,
        position: Vec3,
        rotation: Vec3,
    },
    SpawnBullet(ProjectileState),
    StateBullets(Vec<ProjectileState>),
    RemoveBullet(ProjectileId),
    Explosion { position: Vec3, radius: f32 },
    StateMinions(BTreeMap<AgentId, AgentState>),
    MinionDefeated {
        id: AgentId,
        killer_id: Option<PlayerId>,
    },
    UpdateScore { id: PlayerId, score: u32 },
    UpdateInventory { id: PlayerId, inventory: Inventory },
    UpdateLeaderboard(Vec<LeaderboardEntry>),
    PlayerDamaged {
        id: PlayerId,
        hp: u32,
        attacker_id: Option<PlayerId>,
    },
    PlayerDied {
        id: PlayerId,
        killer_id: Option<PlayerId>,
    },
    ChatMessage {
        id: PlayerId,
        username: String,
        message: String,
    },
}

impl ServerEvent {
    /// Event name as it appears on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::Welcome { .. } => "welcome",
            ServerEvent::CurrentPlayers(_) => "currentPlayers",
            ServerEvent::NewPlayer(_) => "newPlayer",
            ServerEvent::PlayerDisconnected(_) => "playerDisconnected",
            ServerEvent::StatePlayers(_) => "statePlayers",
            ServerEvent::PlayerMoved { .. } => "playerMoved",
            ServerEvent::SpawnBullet(_) => "spawnBullet",
            ServerEvent::StateBullets(_) => "stateBullets",
            ServerEvent::RemoveBullet(_) => "removeBullet",
            ServerEvent::Explosion { .. } => "explosion",
            ServerEvent::StateMinions(_) => "stateMinions",
            ServerEvent::MinionDefeated { .. } => "minionDefeated",
            ServerEvent::UpdateScore { .. } => "updateScore",
            ServerEvent::UpdateInventory { .. } => "updateInventory",
            ServerEvent::UpdateLeaderboard(_) => "updateLeaderboard",
            ServerEvent::PlayerDamaged { .. } => "playerDamaged",
            ServerEvent::PlayerDied { .. } => "playerDied",
            ServerEvent::ChatMessage { .. } => "chatMessage",
        }
    }
}

pub fn decode_client_event(text: &str) -> serde_json::Result<ClientEvent> {
    serde_json::from_str(text)
}

pub fn encode_client_event(event: &ClientEvent) -> serde_json::Result<String> {
    serde_json::to_string(event)
}

pub fn decode_server_event(text: &str) -> serde_json::Result<ServerEvent> {
    serde_json::from_str(text)
}

pub fn encode_server_event(event: &ServerEvent) -> serde_json::Result<String> {
    serde_json::to_string(event)
}
