//! # Arena Game Server Library
//!
//! Authoritative server for a multiplayer arena shooter. The server owns all
//! gameplay truth (player health and inventory, projectile physics, enemy
//! AI, hit detection, scoring) and streams it to thin rendering clients over
//! WebSocket.
//!
//! ## Architecture
//!
//! ### Single Owner Task
//! One task owns the connection registry and the game state. Connection
//! tasks only do the WebSocket handshake, JSON decoding and frame writing,
//! and talk to the owner through channels. Intents and ticks therefore never
//! interleave and no locks are needed.
//!
//! ### Immediate Intents, Fixed Ticks
//! Client intents (move, fire, reload, buy, respawn, chat) are applied the
//! moment they arrive. Projectile physics, agent AI and collision advance on
//! a fixed step of `1 / tick_rate` seconds, after which the whole state is
//! broadcast.
//!
//! ## Module Organization
//!
//! - `client_manager`: session registry, capacity, idle timeouts
//! - `game`: `GameState`, the tick and the outbox of pending events
//! - `intents`: per-intent validation and handlers
//! - `combat`: hit tests, damage, defeats and score credit
//! - `physics`: projectile integration and ground contact
//! - `agents`: minion AI and spawn placement
//! - `leaderboard`: top-N ranking over player scores
//! - `scheduler`: deferred actions drained by the tick
//! - `config`: gameplay tuning loaded from JSON
//! - `network`: the server loop and connection tasks
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use skirmish_server::config::GameConfig;
//! use skirmish_server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> skirmish_server::ServerResult<()> {
//!     let mut server = Server::new("127.0.0.1:3000", GameConfig::default()).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod agents;
pub mod client_manager;
pub mod combat;
pub mod config;
pub mod entity;
pub mod game;
pub mod intents;
pub mod leaderboard;
pub mod network;
pub mod physics;
pub mod scheduler;
pub mod utils;

/// Result type for fallible setup and I/O.
pub type ServerResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;
