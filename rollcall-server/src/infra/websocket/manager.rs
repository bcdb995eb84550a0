use crate::infra::websocket::connection::Connection;
use dashmap::DashMap;
use std::{fmt, sync::Arc};
use uuid::Uuid;

/// Registry of live dashboard sessions.
///
/// Fan-out itself rides the roster event bus (every session's forwarding
/// task holds its own subscription); the manager exists for targeted sends
/// and lifecycle bookkeeping, and is torn down with the server.
#[derive(Clone, Default)]
pub struct ConnectionManager {
    connections: Arc<DashMap<Uuid, Arc<Connection>>>,
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("connection_count", &self.connections.len())
            .finish()
    }
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection
    pub fn add_connection(&self, conn_id: Uuid, connection: Arc<Connection>) {
        self.connections.insert(conn_id, connection);
    }

    /// Remove a connection on disconnect
    pub fn remove_connection(&self, conn_id: Uuid) {
        self.connections.remove(&conn_id);
    }

    /// Get a specific connection
    pub fn get_connection(&self, conn_id: &Uuid) -> Option<Arc<Connection>> {
        self.connections.get(conn_id).map(|c| c.clone())
    }

    pub fn session_count(&self) -> usize {
        self.connections.len()
    }

    /// Drop every session; used at server teardown.
    pub fn shutdown(&self) {
        self.connections.clear();
    }
}
