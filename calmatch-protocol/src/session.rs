//! Session state for one side of a matching run.

use crate::event::CalendarEvent;
use crate::keys::{KeyPair, SharedSecret};
use crate::messages::Role;
use crate::transport::SessionId;
use std::collections::HashMap;

/// Externally observable protocol states.
///
/// The intersection computation itself happens inside the STEP_2/STEP_3
/// handlers and never parks the session in an intermediate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Built but not started.
    Idle,
    /// Initiator waiting for a peer to JOIN.
    Created,
    /// Handshake rounds in flight.
    Exchanging,
    /// Intersection recorded; notes may now flow.
    Results,
}

/// One party's view of a matching session.
///
/// All fields are mutated exclusively by the transition functions in
/// `protocol.rs`; everything public here is a read-only view. Dropping the
/// session discards the keypair, shared secret, blinded sets, matches and
/// notes in one go, and a new run requires a fresh `Session` (which generates
/// a fresh keypair).
#[derive(Debug)]
pub struct Session {
    pub(crate) id: SessionId,
    pub(crate) role: Role,
    pub(crate) state: SessionState,
    pub(crate) events: Vec<CalendarEvent>,
    pub(crate) keys: KeyPair,
    pub(crate) shared_secret: Option<SharedSecret>,
    /// Joiner only: the initiator's set after our second blinding, kept in
    /// the initiator's order for the STEP_3 comparison.
    pub(crate) stored_double_blinded: Vec<String>,
    pub(crate) matches: Vec<CalendarEvent>,
    /// uid -> plaintext, peer notes and local echoes of sent notes alike.
    pub(crate) notes: HashMap<String, String>,
}

impl Session {
    /// Build a session for the given role with a fresh keypair.
    ///
    /// The session starts `Idle`; call [`Session::start`] to enter the
    /// handshake.
    pub fn new(id: SessionId, role: Role, events: Vec<CalendarEvent>) -> Self {
        Self {
            id,
            role,
            state: SessionState::Idle,
            events,
            keys: KeyPair::generate(),
            shared_secret: None,
            stored_double_blinded: Vec::new(),
            matches: Vec::new(),
            notes: HashMap::new(),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn events(&self) -> &[CalendarEvent] {
        &self.events
    }

    /// Events both parties attend, filled in once the session reaches
    /// `Results`.
    pub fn matches(&self) -> &[CalendarEvent] {
        &self.matches
    }

    /// Decrypted notes by event uid.
    pub fn notes(&self) -> &HashMap<String, String> {
        &self.notes
    }

    /// Whether the encrypted note channel is usable.
    pub fn channel_established(&self) -> bool {
        self.shared_secret.is_some()
    }
}
