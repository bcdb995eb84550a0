use anyhow::Result;
use chrono::{DateTime, Utc};
use rollcall_model::{RosterEvent, User};
use std::{fmt, sync::Arc};
use tokio::sync::mpsc;
use uuid::Uuid;

/// One accepted dashboard session on the push channel.
#[derive(Clone)]
pub struct Connection {
    /// Unique connection ID
    pub id: Uuid,
    /// Authenticated staff user behind this session
    pub user: Arc<User>,
    /// Channel for targeted sends to this session alone
    sender: mpsc::Sender<RosterEvent>,
    pub connected_at: DateTime<Utc>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("user_id", &self.user.id)
            .field("username", &self.user.username)
            .field("channel_closed", &self.sender.is_closed())
            .field("connected_at", &self.connected_at)
            .finish()
    }
}

impl Connection {
    pub fn new(user: User, sender: mpsc::Sender<RosterEvent>) -> Self {
        Self {
            id: Uuid::now_v7(),
            user: Arc::new(user),
            sender,
            connected_at: Utc::now(),
        }
    }

    /// Send an event to this session only (used for targeted resyncs).
    pub async fn send_event(&self, event: RosterEvent) -> Result<()> {
        self.sender
            .send(event)
            .await
            .map_err(|_| anyhow::anyhow!("Failed to send event: channel closed"))
    }
}
