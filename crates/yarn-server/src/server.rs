//! WebSocket server and connection handling.

use crate::protocol::{ClientMessage, ServerMessage};
use crate::session::{PuzzleSession, SessionError};
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use yarn_core::LevelCatalog;

/// Server state shared across all connections.
pub struct ServerState {
    /// One puzzle session per connection
    pub sessions: DashMap<Uuid, PuzzleSession>,
    /// Mapping from session ID to its message sender
    pub session_senders: DashMap<Uuid, mpsc::UnboundedSender<ServerMessage>>,
    /// Levels shared by every session, read once at startup
    pub catalog: Arc<LevelCatalog>,
}

impl ServerState {
    pub fn new(catalog: LevelCatalog) -> Self {
        Self {
            sessions: DashMap::new(),
            session_senders: DashMap::new(),
            catalog: Arc::new(catalog),
        }
    }

    /// Send a message to a specific session.
    pub fn send_to_session(&self, session_id: Uuid, msg: ServerMessage) {
        if let Some(sender) = self.session_senders.get(&session_id) {
            let _ = sender.send(msg);
        }
    }

    /// Run one command against a session. The session entry stays locked
    /// until the command has been fully applied.
    pub fn dispatch(
        &self,
        session_id: Uuid,
        msg: ClientMessage,
    ) -> Result<Vec<ServerMessage>, SessionError> {
        let mut session = self
            .sessions
            .get_mut(&session_id)
            .ok_or(SessionError::SessionNotFound)?;
        Ok(session.handle(&self.catalog, msg))
    }
}

/// Run the WebSocket server.
pub async fn run_server(addr: SocketAddr, state: Arc<ServerState>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Yarn Sort server listening on {}", addr);

    while let Ok((stream, peer_addr)) = listener.accept().await {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, state).await {
                error!("Connection error from {}: {}", peer_addr, e);
            }
        });
    }

    Ok(())
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    state: Arc<ServerState>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    info!("New WebSocket connection from {}", addr);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let session_id = Uuid::new_v4();
    state
        .sessions
        .insert(session_id, PuzzleSession::new(session_id));

    // Create channel for outgoing messages
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    state.session_senders.insert(session_id, tx);

    let welcome = ServerMessage::Welcome { session_id };
    let msg_text = serde_json::to_string(&welcome)?;
    ws_sender.send(Message::Text(msg_text)).await?;

    // Forward messages from channel to WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Ok(text) = serde_json::to_string(&msg) {
                if ws_sender.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
        }
    });

    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => handle_message(session_id, client_msg, &state),
                Err(e) => {
                    warn!("Invalid message from {}: {}", session_id, text);
                    state.send_to_session(
                        session_id,
                        ServerMessage::Error {
                            message: format!("Invalid message: {}", e),
                        },
                    );
                }
            },
            Ok(Message::Close(_)) => {
                info!("Client {} closing connection", session_id);
                break;
            }
            Ok(Message::Ping(_)) => {
                state.send_to_session(session_id, ServerMessage::Pong);
            }
            Err(e) => {
                error!("WebSocket error from {}: {}", session_id, e);
                break;
            }
            _ => {}
        }
    }

    handle_disconnect(session_id, &state);
    send_task.abort();

    info!("Connection closed for {}", session_id);
    Ok(())
}

/// Handle a client message.
fn handle_message(session_id: Uuid, msg: ClientMessage, state: &Arc<ServerState>) {
    debug!("Session {}: {:?}", session_id, msg);

    match state.dispatch(session_id, msg) {
        Ok(replies) => {
            for reply in replies {
                if let ServerMessage::LevelComplete { result } = &reply {
                    info!(
                        "Session {} cleared level {} with {} points",
                        session_id, result.level, result.score
                    );
                }
                state.send_to_session(session_id, reply);
            }
        }
        Err(e) => {
            warn!("Session {}: {}", session_id, e);
            state.send_to_session(
                session_id,
                ServerMessage::Error {
                    message: e.to_string(),
                },
            );
        }
    }
}

/// Drop the session of a closed connection.
fn handle_disconnect(session_id: Uuid, state: &Arc<ServerState>) {
    state.session_senders.remove(&session_id);
    if let Some((_, session)) = state.sessions.remove(&session_id) {
        info!(
            "Session {} ended after {:?}: {} commands, {} levels completed, total score {}",
            session.id,
            session.started_at.elapsed(),
            session.commands,
            session.engine.completed_levels(),
            session.engine.total_score()
        );
    }
}
