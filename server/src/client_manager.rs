//! Connection registry for the game server
//!
//! This module tracks every live WebSocket session, including:
//! - Session id allocation and capacity limits
//! - The player bound to each session once it has joined
//! - Last-activity bookkeeping for the idle timeout sweep
//! - The outbound frame channel of each connection task
//!
//! The registry only routes frames. It never decides gameplay; the game
//! state is told about joins and departures by the server loop.

use log::{info, warn};
use skirmish_shared::{PlayerId, SessionId};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// One connected client
#[derive(Debug)]
pub struct Session {
    /// Unique session identifier, also used as the player id
    pub id: SessionId,
    /// Remote address of the connection
    pub addr: SocketAddr,
    /// Last time any frame arrived from this session
    pub last_seen: Instant,
    /// Set once the session has joined the game
    pub player: Option<PlayerId>,
    /// Serialized frames queued for the connection task
    sender: mpsc::UnboundedSender<String>,
}

impl Session {
    pub fn new(id: SessionId, addr: SocketAddr, sender: mpsc::UnboundedSender<String>) -> Self {
        Self {
            id,
            addr,
            last_seen: Instant::now(),
            player: None,
            sender,
        }
    }

    /// Checks if the session has been silent for longer than `timeout`
    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }

    /// Queues a frame. Returns false if the connection task is gone.
    pub fn send(&self, frame: String) -> bool {
        self.sender.send(frame).is_ok()
    }
}

/// Manages all connected sessions
///
/// Session ids start at 1 and are never reused while the server runs, so a
/// stale id held by a projectile or timer can't alias a newer player.
pub struct ClientManager {
    sessions: BTreeMap<SessionId, Session>,
    next_session_id: SessionId,
    max_clients: usize,
}

impl ClientManager {
    pub fn new(max_clients: usize) -> Self {
        Self {
            sessions: BTreeMap::new(),
            next_session_id: 1,
            max_clients,
        }
    }

    /// Registers a new connection
    ///
    /// Returns Some(session_id) if successful, None if the server is at
    /// capacity. The caller closes refused connections.
    pub fn add_session(
        &mut self,
        addr: SocketAddr,
        sender: mpsc::UnboundedSender<String>,
    ) -> Option<SessionId> {
        if self.sessions.len() >= self.max_clients {
            warn!("Refusing {}: server full ({} sessions)", addr, self.max_clients);
            return None;
        }

        let id = self.next_session_id;
        self.next_session_id += 1;

        info!("Session {} connected from {}", id, addr);
        self.sessions.insert(id, Session::new(id, addr, sender));
        Some(id)
    }

    /// Removes a session, handing it back so the caller can drop its player
    /// from the game.
    pub fn remove_session(&mut self, id: SessionId) -> Option<Session> {
        let session = self.sessions.remove(&id)?;
        info!("Session {} disconnected", id);
        Some(session)
    }

    pub fn bind_player(&mut self, id: SessionId, player: PlayerId) -> bool {
        match self.sessions.get_mut(&id) {
            Some(session) => {
                session.player = Some(player);
                true
            }
            None => false,
        }
    }

    pub fn player_of(&self, id: SessionId) -> Option<PlayerId> {
        self.sessions.get(&id).and_then(|session| session.player)
    }

    /// Marks activity on a session for the idle timeout.
    pub fn touch(&mut self, id: SessionId) {
        if let Some(session) = self.sessions.get_mut(&id) {
            session.last_seen = Instant::now();
        }
    }

    /// Removes sessions silent for longer than `timeout`
    ///
    /// Returns the removed sessions so the server can drop their players
    /// and close their connections.
    pub fn check_timeouts(&mut self, timeout: Duration) -> Vec<Session> {
        let timed_out: Vec<SessionId> = self
            .sessions
            .values()
            .filter(|session| session.is_timed_out(timeout))
            .map(|session| session.id)
            .collect();

        timed_out
            .into_iter()
            .filter_map(|id| {
                info!("Session {} timed out", id);
                self.remove_session(id)
            })
            .collect()
    }

    /// Queues a frame for one session. Returns false if it is unknown or
    /// its connection task has already exited.
    pub fn send(&self, id: SessionId, frame: String) -> bool {
        self.sessions
            .get(&id)
            .map(|session| session.send(frame))
            .unwrap_or(false)
    }

    /// Queues a frame for every session except `exclude`.
    pub fn broadcast(&self, frame: &str, exclude: Option<SessionId>) -> usize {
        self.sessions
            .values()
            .filter(|session| Some(session.id) != exclude)
            .filter(|session| session.send(frame.to_string()))
            .count()
    }

    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
