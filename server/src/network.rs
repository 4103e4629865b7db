//! Server network layer: WebSocket sessions and game loop coordination

use crate::client_manager::ClientManager;
use crate::config::GameConfig;
use crate::game::{GameState, Outgoing};
use crate::ServerResult;
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use skirmish_shared::{
    decode_client_event, encode_server_event, ClientEvent, ServerEvent, SessionId,
};
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, MissedTickBehavior};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

/// Messages sent from connection tasks to the main server loop
#[derive(Debug)]
pub enum ServerMessage {
    /// Handshake finished. The loop answers with the session id, or `None`
    /// when the server is full.
    Connected {
        addr: SocketAddr,
        sender: mpsc::UnboundedSender<String>,
        reply: oneshot::Sender<Option<SessionId>>,
    },
    EventReceived {
        session: SessionId,
        event: ClientEvent,
    },
    /// A frame arrived that carried no intent (ping, malformed JSON).
    Activity {
        session: SessionId,
    },
    Disconnected {
        session: SessionId,
    },
    Shutdown,
}

/// Main server: owns the registry and the game state, and is the only task
/// that ever touches either.
pub struct Server {
    listener: Option<TcpListener>,
    local_addr: SocketAddr,
    clients: ClientManager,
    game: GameState,
    tick_duration: Duration,
    idle_timeout: Option<Duration>,

    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
}

impl Server {
    pub async fn new(addr: &str, config: GameConfig) -> ServerResult<Self> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        info!(
            "Server listening on ws://{} at {}Hz",
            local_addr, config.tick_rate
        );

        let (server_tx, server_rx) = mpsc::unbounded_channel();

        Ok(Server {
            listener: Some(listener),
            local_addr,
            clients: ClientManager::new(config.max_clients),
            tick_duration: config.tick_period(),
            idle_timeout: config.idle_timeout(),
            game: GameState::new(config, Instant::now()),
            server_tx,
            server_rx,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    /// Handle for feeding the loop from outside, e.g. to send `Shutdown`.
    pub fn control(&self) -> mpsc::UnboundedSender<ServerMessage> {
        self.server_tx.clone()
    }

    /// Spawns task that accepts TCP connections and hands each to its own
    /// connection task
    fn spawn_acceptor(&mut self) -> ServerResult<()> {
        let listener = self.listener.take().ok_or("server is already running")?;
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, addr)) => {
                        if server_tx.is_closed() {
                            break;
                        }
                        tokio::spawn(Self::handle_connection(stream, addr, server_tx.clone()));
                    }
                    Err(e) => {
                        error!("Error accepting connection: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });

        Ok(())
    }

    /// Per-connection task: handshake, registration, then frame pumping in
    /// both directions until either side goes away.
    async fn handle_connection(
        stream: TcpStream,
        addr: SocketAddr,
        server_tx: mpsc::UnboundedSender<ServerMessage>,
    ) {
        let ws_stream = match accept_async(stream).await {
            Ok(ws) => ws,
            Err(e) => {
                warn!("WebSocket handshake with {} failed: {}", addr, e);
                return;
            }
        };
        let (mut write, mut read) = ws_stream.split();

        let (frame_tx, mut frame_rx) = mpsc::unbounded_channel::<String>();
        let (reply_tx, reply_rx) = oneshot::channel();
        let registered = server_tx.send(ServerMessage::Connected {
            addr,
            sender: frame_tx,
            reply: reply_tx,
        });
        if registered.is_err() {
            return;
        }

        let session = match reply_rx.await {
            Ok(Some(session)) => session,
            _ => {
                let _ = write.send(Message::Close(None)).await;
                return;
            }
        };

        loop {
            tokio::select! {
                frame = frame_rx.recv() => match frame {
                    Some(text) => {
                        if let Err(e) = write.send(Message::Text(text)).await {
                            debug!("Failed to write to session {}: {}", session, e);
                            break;
                        }
                    }
                    // Registry dropped the session (idle timeout)
                    None => {
                        let _ = write.send(Message::Close(None)).await;
                        break;
                    }
                },

                incoming = read.next() => match incoming {
                    Some(Ok(Message::Text(text))) => {
                        let message = match decode_client_event(&text) {
                            Ok(event) => ServerMessage::EventReceived { session, event },
                            Err(e) => {
                                debug!("Dropping malformed frame from session {}: {}", session, e);
                                ServerMessage::Activity { session }
                            }
                        };
                        if server_tx.send(message).is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {
                        let _ = server_tx.send(ServerMessage::Activity { session });
                    }
                    Some(Err(e)) => {
                        warn!("Error reading from session {}: {}", session, e);
                        break;
                    }
                },
            }
        }

        let _ = server_tx.send(ServerMessage::Disconnected { session });
    }

    fn handle_message(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::Connected {
                addr,
                sender,
                reply,
            } => {
                let session = self.clients.add_session(addr, sender);
                if let Some(id) = session {
                    self.send_event(id, &ServerEvent::Welcome { id });
                }
                if reply.send(session).is_err() {
                    if let Some(id) = session {
                        self.disconnect(id);
                    }
                }
            }

            ServerMessage::EventReceived { session, event } => {
                if self.clients.get(session).is_none() {
                    return;
                }
                self.clients.touch(session);
                debug!("Session {} sent {}", session, event.name());

                let joining = matches!(event, ClientEvent::Join { .. });
                self.game.handle_event(session, event, Instant::now());
                if joining && self.game.players.contains_key(&session) {
                    self.clients.bind_player(session, session);
                }
                self.flush();
            }

            ServerMessage::Activity { session } => self.clients.touch(session),

            ServerMessage::Disconnected { session } => self.disconnect(session),

            ServerMessage::Shutdown => {}
        }
    }

    fn disconnect(&mut self, session: SessionId) {
        if let Some(removed) = self.clients.remove_session(session) {
            if let Some(player) = removed.player {
                self.game.leave(player);
            }
        }
        self.flush();
    }

    fn sweep_timeouts(&mut self) {
        let Some(timeout) = self.idle_timeout else {
            return;
        };
        for session in self.clients.check_timeouts(timeout) {
            if let Some(player) = session.player {
                self.game.leave(player);
            }
        }
        self.flush();
    }

    fn send_event(&self, session: SessionId, event: &ServerEvent) {
        if let Some(frame) = Self::encode(event) {
            self.clients.send(session, frame);
        }
    }

    fn encode(event: &ServerEvent) -> Option<String> {
        match encode_server_event(event) {
            Ok(frame) => Some(frame),
            Err(e) => {
                error!("Failed to encode {}: {}", event.name(), e);
                None
            }
        }
    }

    /// Delivers everything the game queued. Broadcasts are serialized once.
    fn flush(&mut self) {
        for outgoing in self.game.drain_outbox() {
            match outgoing {
                Outgoing::Send { session, event } => self.send_event(session, &event),
                Outgoing::Broadcast { event, exclude } => {
                    if self.clients.is_empty() {
                        continue;
                    }
                    if let Some(frame) = Self::encode(&event) {
                        self.clients.broadcast(&frame, exclude);
                    }
                }
            }
        }
    }

    /// Main server loop coordinating all operations
    pub async fn run(&mut self) -> ServerResult<()> {
        self.spawn_acceptor()?;

        let mut tick_interval = interval(self.tick_duration);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut sweep_interval = interval(Duration::from_secs(1));
        let report_every = u64::from(self.game.config.tick_rate.max(1));

        info!("Server started successfully");

        loop {
            tokio::select! {
                // Handle connection events
                message = self.server_rx.recv() => {
                    match message {
                        Some(ServerMessage::Shutdown) | None => {
                            info!("Server shutting down");
                            break;
                        }
                        Some(message) => self.handle_message(message),
                    }
                },

                // Handle server tick events
                _ = tick_interval.tick() => {
                    self.game.tick(Instant::now());
                    self.flush();

                    if self.game.tick % report_every == 0 && !self.clients.is_empty() {
                        debug!(
                            "Tick {}: {} sessions, {} players, {} projectiles, {} agents",
                            self.game.tick,
                            self.clients.len(),
                            self.game.players.len(),
                            self.game.projectiles.len(),
                            self.game.agents.len()
                        );
                    }
                },

                _ = sweep_interval.tick(), if self.idle_timeout.is_some() => {
                    self.sweep_timeouts();
                },
            }
        }

        Ok(())
    }
}
