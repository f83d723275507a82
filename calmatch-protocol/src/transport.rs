//! Store-and-forward relay contract.
//!
//! The two parties are never directly connected; they exchange messages
//! through a relay room addressed by an opaque session id. The relay keeps
//! arrival order and delivers each message to each party at most once (one
//! read cursor per party). The relay itself is out of scope; `InMemoryRelay`
//! stands in for it in tests and demos.

use crate::error::{CalMatchError, Result};
use crate::messages::{Message, Role};
use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Opaque relay room identifier, shared out of band between the parties.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Asynchronous send/poll primitive consumed by the session driver.
#[async_trait]
pub trait MessageTransport: Send + Sync {
    /// Allocate a new relay room.
    async fn create(&self) -> Result<SessionId>;

    /// Check that a room exists before joining it.
    ///
    /// # Errors
    /// `SessionNotFound` if no room exists for the id.
    async fn join(&self, id: &SessionId) -> Result<()>;

    /// Best-effort delivery to the relay; no acknowledgement beyond success.
    async fn send(&self, id: &SessionId, message: Message) -> Result<()>;

    /// Messages accumulated since this party's last poll, in arrival order.
    /// May be empty; never duplicates a message for the same party.
    async fn poll(&self, id: &SessionId, reader: Role) -> Result<Vec<Message>>;
}

/// In-process relay with the same contract as the real store-and-forward
/// service: per-room message log, one cursor per party.
#[derive(Clone, Default)]
pub struct InMemoryRelay {
    rooms: Arc<Mutex<HashMap<SessionId, Room>>>,
}

#[derive(Default)]
struct Room {
    messages: Vec<Message>,
    cursors: HashMap<Role, usize>,
}

impl InMemoryRelay {
    pub fn new() -> Self {
        Self::default()
    }

    fn random_room_code() -> String {
        const CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
        let mut rng = rand::thread_rng();
        (0..6)
            .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
            .collect()
    }
}

#[async_trait]
impl MessageTransport for InMemoryRelay {
    async fn create(&self) -> Result<SessionId> {
        let mut rooms = self.rooms.lock().expect("relay lock poisoned");
        loop {
            let id = SessionId(Self::random_room_code());
            if !rooms.contains_key(&id) {
                rooms.insert(id.clone(), Room::default());
                return Ok(id);
            }
        }
    }

    async fn join(&self, id: &SessionId) -> Result<()> {
        let rooms = self.rooms.lock().expect("relay lock poisoned");
        if rooms.contains_key(id) {
            Ok(())
        } else {
            Err(CalMatchError::SessionNotFound(id.to_string()))
        }
    }

    async fn send(&self, id: &SessionId, message: Message) -> Result<()> {
        let mut rooms = self.rooms.lock().expect("relay lock poisoned");
        let room = rooms
            .get_mut(id)
            .ok_or_else(|| CalMatchError::SessionNotFound(id.to_string()))?;
        room.messages.push(message);
        Ok(())
    }

    async fn poll(&self, id: &SessionId, reader: Role) -> Result<Vec<Message>> {
        let mut rooms = self.rooms.lock().expect("relay lock poisoned");
        let room = rooms
            .get_mut(id)
            .ok_or_else(|| CalMatchError::SessionNotFound(id.to_string()))?;
        let cursor = room.cursors.entry(reader).or_insert(0);
        let batch = room.messages[*cursor..].to_vec();
        *cursor = room.messages.len();
        Ok(batch)
    }
}
