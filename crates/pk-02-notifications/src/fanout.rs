//! Live-connection registry for real-time notification delivery.
//!
//! A connection registers once and receives an `mpsc` receiver. It then
//! joins one or more identity channels; `publish` pushes a populated view
//! to every connection currently joined to the recipient. Nothing is
//! queued for identities without a live connection.

use dashmap::DashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::adapters::LoggingRelay;
use crate::domain::NotificationView;
use crate::ports::{NotificationPublisher, OfflineRelay};
use pickup_types::{CoreResult, IdentityId};

/// Per-connection outbound buffer when none is configured.
pub const DEFAULT_CONNECTION_BUFFER: usize = 64;

/// Process-unique connection handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Concurrent identity → connections multimap.
pub struct ConnectionRegistry {
    /// Outbound channel of every live connection.
    senders: DashMap<ConnectionId, mpsc::Sender<Arc<NotificationView>>>,
    /// Identity channels each connection has joined.
    by_connection: DashMap<ConnectionId, Vec<IdentityId>>,
    /// Connections joined to each identity channel.
    by_identity: DashMap<IdentityId, Vec<ConnectionId>>,
    id_counter: AtomicU64,
    buffer: usize,
    relay: Arc<dyn OfflineRelay>,
}

impl ConnectionRegistry {
    pub fn new(buffer: usize) -> Self {
        Self::with_relay(buffer, Arc::new(LoggingRelay))
    }

    pub fn with_relay(buffer: usize, relay: Arc<dyn OfflineRelay>) -> Self {
        Self {
            senders: DashMap::new(),
            by_connection: DashMap::new(),
            by_identity: DashMap::new(),
            id_counter: AtomicU64::new(1),
            buffer: buffer.max(1),
            relay,
        }
    }

    /// Register a live connection and hand back its event stream.
    pub fn connect(&self) -> (ConnectionId, mpsc::Receiver<Arc<NotificationView>>) {
        let id = ConnectionId(self.id_counter.fetch_add(1, Ordering::SeqCst));
        let (tx, rx) = mpsc::channel(self.buffer);
        self.senders.insert(id, tx);
        self.by_connection.insert(id, Vec::new());
        debug!(connection_id = %id, "Registered connection");
        (id, rx)
    }

    /// Join `identity`'s private channel. Returns `false` when the
    /// connection is unknown or already joined.
    pub fn join(&self, connection: ConnectionId, identity: IdentityId) -> bool {
        let Some(mut joined) = self.by_connection.get_mut(&connection) else {
            return false;
        };
        if joined.contains(&identity) {
            return false;
        }
        joined.push(identity);
        drop(joined);

        self.by_identity
            .entry(identity)
            .or_default()
            .push(connection);
        debug!(connection_id = %connection, identity = %identity, "Joined identity channel");
        true
    }

    /// Leave one identity channel.
    pub fn leave(&self, connection: ConnectionId, identity: IdentityId) -> bool {
        let left = self
            .by_connection
            .get_mut(&connection)
            .map(|mut joined| {
                let before = joined.len();
                joined.retain(|i| *i != identity);
                joined.len() != before
            })
            .unwrap_or(false);

        if left {
            self.detach(identity, connection);
            debug!(connection_id = %connection, identity = %identity, "Left identity channel");
        }
        left
    }

    /// Drop a connection and every channel it joined.
    pub fn remove_connection(&self, connection: ConnectionId) {
        self.senders.remove(&connection);
        if let Some((_, identities)) = self.by_connection.remove(&connection) {
            for identity in identities {
                self.detach(identity, connection);
            }
            debug!(connection_id = %connection, "Removed connection");
        }
    }

    fn detach(&self, identity: IdentityId, connection: ConnectionId) {
        let empty = self
            .by_identity
            .get_mut(&identity)
            .map(|mut conns| {
                conns.retain(|c| *c != connection);
                conns.is_empty()
            })
            .unwrap_or(false);
        if empty {
            self.by_identity.remove_if(&identity, |_, conns| conns.is_empty());
        }
    }

    /// Identity channels a connection has joined.
    pub fn joined(&self, connection: ConnectionId) -> Vec<IdentityId> {
        self.by_connection
            .get(&connection)
            .map(|j| j.clone())
            .unwrap_or_default()
    }

    pub fn connection_count(&self) -> usize {
        self.senders.len()
    }

    /// Number of live connections joined to `identity`.
    pub fn listeners(&self, identity: IdentityId) -> usize {
        self.by_identity.get(&identity).map(|c| c.len()).unwrap_or(0)
    }

    /// Push `view` to every connection joined to `recipient`. Connections
    /// whose receiver is gone are pruned. Returns the number reached.
    pub fn deliver(&self, recipient: IdentityId, view: &NotificationView) -> usize {
        let targets = self
            .by_identity
            .get(&recipient)
            .map(|c| c.clone())
            .unwrap_or_default();

        let payload = Arc::new(view.clone());
        let mut delivered = 0;
        let mut closed = Vec::new();

        for connection in targets {
            let Some(tx) = self.senders.get(&connection).map(|t| t.clone()) else {
                closed.push(connection);
                continue;
            };
            match tx.try_send(payload.clone()) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(
                        connection_id = %connection,
                        notification_id = %view.id,
                        "Connection buffer full; dropping push"
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => closed.push(connection),
            }
        }

        for connection in closed {
            self.detach(recipient, connection);
            self.remove_connection(connection);
        }

        if delivered == 0 {
            self.relay.relay(recipient, view);
        }
        delivered
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECTION_BUFFER)
    }
}

impl NotificationPublisher for ConnectionRegistry {
    fn publish(&self, recipient: IdentityId, view: &NotificationView) -> CoreResult<usize> {
        Ok(self.deliver(recipient, view))
    }
}
