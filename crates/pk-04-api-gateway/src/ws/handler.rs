//! WebSocket session over the connection registry.
//!
//! Client frames:
//!
//! ```text
//! {"event":"join","userId":"…","token":"…"}
//! {"event":"leave","userId":"…"}
//! ```
//!
//! Server frames: `joined`, `left`, `error`, and
//! `{"event":"new-notification","data":{"notification":{…}}}`.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::router::AppState;
use pickup_types::IdentityId;
use pk_01_identity::AuthGuard;
use pk_02_notifications::{ConnectionId, ConnectionRegistry, NotificationView};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ClientFrame {
    Join {
        #[serde(rename = "userId")]
        user_id: IdentityId,
        #[serde(default)]
        token: Option<String>,
    },
    Leave {
        #[serde(rename = "userId")]
        user_id: IdentityId,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ServerFrame<'a> {
    Joined {
        #[serde(rename = "userId")]
        user_id: IdentityId,
    },
    Left {
        #[serde(rename = "userId")]
        user_id: IdentityId,
    },
    Error {
        message: String,
    },
    NewNotification {
        data: NotificationPayload<'a>,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationPayload<'a> {
    pub notification: &'a NotificationView,
}

impl ServerFrame<'_> {
    fn error(message: impl Into<String>) -> Self {
        ServerFrame::Error {
            message: message.into(),
        }
    }

    fn to_message(&self) -> Option<Message> {
        match serde_json::to_string(self) {
            Ok(text) => Some(Message::Text(text)),
            Err(e) => {
                warn!(error = %e, "Could not encode server frame");
                None
            }
        }
    }
}

/// `GET /ws`
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let session = WebSocketSession::new(
        Arc::clone(&state.registry),
        Arc::clone(&state.guard),
        state.config.websocket.require_token,
        state.config.websocket.ping_interval,
    );
    ws.on_upgrade(move |socket| session.run(socket))
}

/// One live socket. Subscriptions are removed when it ends.
pub struct WebSocketSession {
    registry: Arc<ConnectionRegistry>,
    guard: Arc<AuthGuard>,
    require_token: bool,
    ping_interval: Duration,
}

impl WebSocketSession {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        guard: Arc<AuthGuard>,
        require_token: bool,
        ping_interval: Duration,
    ) -> Self {
        Self {
            registry,
            guard,
            require_token,
            ping_interval,
        }
    }

    pub async fn run(self, mut socket: WebSocket) {
        let (connection, mut events) = self.registry.connect();
        info!(connection = %connection, "WebSocket connected");

        let mut ping = tokio::time::interval(self.ping_interval);
        ping.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ping.tick().await;

        loop {
            tokio::select! {
                incoming = socket.recv() => {
                    let text = match incoming {
                        Some(Ok(Message::Text(text))) => text,
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Ok(_)) => continue,
                        Some(Err(e)) => {
                            debug!(connection = %connection, error = %e, "Socket read failed");
                            break;
                        }
                    };
                    let reply = self.handle_text(connection, &text).await;
                    if let Some(message) = reply.to_message() {
                        if socket.send(message).await.is_err() {
                            break;
                        }
                    }
                }
                event = events.recv() => {
                    let Some(view) = event else { break };
                    let frame = ServerFrame::NewNotification {
                        data: NotificationPayload { notification: &view },
                    };
                    if let Some(message) = frame.to_message() {
                        if socket.send(message).await.is_err() {
                            break;
                        }
                    }
                }
                _ = ping.tick() => {
                    if socket.send(Message::Ping(Vec::new())).await.is_err() {
                        break;
                    }
                }
            }
        }

        self.registry.remove_connection(connection);
        info!(connection = %connection, "WebSocket disconnected");
    }

    /// Apply one client frame and produce the reply.
    pub async fn handle_text(&self, connection: ConnectionId, text: &str) -> ServerFrame<'static> {
        let frame: ClientFrame = match serde_json::from_str(text) {
            Ok(frame) => frame,
            Err(e) => return ServerFrame::error(format!("Invalid frame: {}", e)),
        };

        match frame {
            ClientFrame::Join { user_id, token } => {
                if self.require_token {
                    let Some(token) = token else {
                        return ServerFrame::error("A token is required to join");
                    };
                    match self.guard.authenticate_token(&token).await {
                        Ok(caller) if caller.id == user_id => {}
                        Ok(_) => return ServerFrame::error("Token does not match userId"),
                        Err(e) => return ServerFrame::error(e.to_string()),
                    }
                }
                self.registry.join(connection, user_id);
                debug!(connection = %connection, user = %user_id, "Joined channel");
                ServerFrame::Joined { user_id }
            }
            ClientFrame::Leave { user_id } => {
                self.registry.leave(connection, user_id);
                ServerFrame::Left { user_id }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pickup_types::{GuardianProfile, Identity, ManualTimeSource, RoleProfile};
    use pk_01_identity::{IdentityStore, InMemoryIdentityStore, TokenConfig, TokenIssuer};

    struct Fixture {
        session: WebSocketSession,
        registry: Arc<ConnectionRegistry>,
        user: IdentityId,
        token: String,
    }

    async fn fixture(require_token: bool) -> Fixture {
        let now = Utc.timestamp_opt(1_800_000_000, 0).unwrap();
        let clock = Arc::new(ManualTimeSource::new(now));
        let store = Arc::new(InMemoryIdentityStore::new());
        let identity = store
            .insert(Identity {
                id: IdentityId::new(),
                email: "g@x.io".into(),
                password_hash: String::new(),
                full_name: "Gwen".into(),
                phone_number: "1".into(),
                profile: RoleProfile::Guardian(GuardianProfile::default()),
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
        let issuer = Arc::new(TokenIssuer::new(TokenConfig::default(), clock));
        let token = issuer.issue(&identity).unwrap();
        let registry = Arc::new(ConnectionRegistry::default());
        let guard = Arc::new(AuthGuard::new(issuer, store));
        Fixture {
            session: WebSocketSession::new(
                registry.clone(),
                guard,
                require_token,
                Duration::from_secs(30),
            ),
            registry,
            user: identity.id,
            token,
        }
    }

    fn render(frame: &ServerFrame<'_>) -> serde_json::Value {
        serde_json::to_value(frame).unwrap()
    }

    #[tokio::test]
    async fn test_join_with_matching_token() {
        let f = fixture(true).await;
        let (conn, _rx) = f.registry.connect();
        let text = serde_json::json!({ "event": "join", "userId": f.user, "token": f.token });

        let reply = f.session.handle_text(conn, &text.to_string()).await;
        assert_eq!(render(&reply)["event"], "joined");
        assert_eq!(f.registry.listeners(f.user), 1);
    }

    #[tokio::test]
    async fn test_join_rejects_missing_or_foreign_token() {
        let f = fixture(true).await;
        let (conn, _rx) = f.registry.connect();

        let bare = serde_json::json!({ "event": "join", "userId": f.user });
        let reply = f.session.handle_text(conn, &bare.to_string()).await;
        assert_eq!(render(&reply)["event"], "error");

        let other = IdentityId::new();
        let foreign = serde_json::json!({ "event": "join", "userId": other, "token": f.token });
        let reply = f.session.handle_text(conn, &foreign.to_string()).await;
        assert_eq!(render(&reply)["message"], "Token does not match userId");
        assert_eq!(f.registry.listeners(other), 0);
    }

    #[tokio::test]
    async fn test_join_without_token_when_not_required() {
        let f = fixture(false).await;
        let (conn, _rx) = f.registry.connect();
        let text = serde_json::json!({ "event": "join", "userId": f.user });

        let reply = f.session.handle_text(conn, &text.to_string()).await;
        assert_eq!(render(&reply)["event"], "joined");
    }

    #[tokio::test]
    async fn test_leave_and_malformed_frames() {
        let f = fixture(false).await;
        let (conn, _rx) = f.registry.connect();
        f.registry.join(conn, f.user);

        let leave = serde_json::json!({ "event": "leave", "userId": f.user });
        let reply = f.session.handle_text(conn, &leave.to_string()).await;
        assert_eq!(render(&reply)["event"], "left");
        assert_eq!(f.registry.listeners(f.user), 0);

        let reply = f.session.handle_text(conn, "{\"event\":\"dance\"}").await;
        assert_eq!(render(&reply)["event"], "error");
    }

    #[test]
    fn test_error_frame_shape() {
        let frame = ServerFrame::error("x");
        assert_eq!(
            render(&frame),
            serde_json::json!({ "event": "error", "message": "x" })
        );
    }
}
