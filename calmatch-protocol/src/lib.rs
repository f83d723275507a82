//! # Private calendar matching
//!
//! This library lets two parties discover which calendar events they both
//! attend without revealing their full schedules, using Private Set
//! Intersection (PSI) over the Ristretto group (curve25519-dalek), and then
//! exchange short AEAD-encrypted notes about the shared events.
//!
//! ## Features
//!
//! - **Blinded-point PSI**: event uids are hashed to curve points and blinded
//!   by each party's secret scalar; equal double-blinded points prove a
//!   shared event without disclosing non-matching ones.
//! - **Ephemeral key agreement**: each session generates a fresh keypair and
//!   derives a shared AEAD key Diffie-Hellman style from the peer's public
//!   point.
//! - **Store-and-forward transport**: parties are not directly connected;
//!   messages go through a relay room and are pulled by polling. The relay
//!   is abstracted behind [`MessageTransport`]; an [`InMemoryRelay`] ships
//!   for tests and demos.
//! - **Replay-tolerant state machine**: the relay may redeliver or reorder,
//!   so a [`Session`] ignores messages that do not fit its current state and
//!   role instead of faulting.
//!
//! ## Protocol Overview
//!
//! Roles are asymmetric: the *initiator* creates the room, the *joiner*
//! joins it.
//!
//! 1. **JOIN** (joiner → initiator): announces the joiner plus its public
//!    key for the note channel.
//! 2. **STEP_1** (initiator → joiner): the initiator's first-blinded set and
//!    its public key.
//! 3. **STEP_2** (joiner → initiator): the initiator's set double-blinded by
//!    the joiner, plus the joiner's own first-blinded set.
//! 4. **STEP_3** (initiator → joiner): the joiner's set double-blinded by
//!    the initiator. Both sides now intersect by point equality and map
//!    matching positions back to their own event lists.
//! 5. **NOTE** (either direction): AEAD-encrypted text about one matched
//!    event, decrypted with the shared secret from step 1/2.
//!
//! ## Example Usage
//!
//! ```ignore
//! use calmatch_protocol::{CalendarEvent, Role, Session, SessionId};
//!
//! let events = vec![CalendarEvent::new("uid-1", "Standup", "2026-03-02T09:00:00Z")];
//! let mut initiator = Session::new(SessionId::from("ROOM"), Role::Initiator, events);
//! initiator.start();
//! // Poll the relay, feed batches into `initiator.handle_batch(..)`, and
//! // send whatever it returns. Once `state()` is `Results`, read
//! // `matches()` and exchange notes with `compose_note(..)`.
//! ```
//!
//! ## Security Considerations
//!
//! - Blinded points leak no information about non-matching events; the
//!   hash-to-point construction has no known discrete log, so candidate uids
//!   cannot be tested offline against disclosed blinded values.
//! - The note channel authenticates every message; tampering is detected,
//!   never returned as corrupted plaintext.
//! - The relay is untrusted for confidentiality but trusted for liveness:
//!   a relay that drops or reorders messages forever stalls the handshake.
//!
//! ## Modules
//!
//! - [`event`] - Calendar event input type
//! - [`keys`] - Ephemeral key agreement
//! - [`blind`] - Point mapping and blinding
//! - [`notes`] - AEAD note channel
//! - [`messages`] - Wire message types
//! - [`session`] - Session state
//! - [`protocol`] - Transition logic
//! - [`transport`] - Relay contract and in-memory relay
//! - [`driver`] - Polling driver
//! - [`error`] - Error types

pub use driver::SessionDriver;
pub use error::{CalMatchError, Result};
pub use event::CalendarEvent;
pub use keys::{derive_shared_secret, KeyPair, SharedSecret};
pub use messages::{
    JoinPayload, Message, MessageBody, NotePayload, Role, Step1Payload, Step2Payload,
    Step3Payload,
};
pub use session::{Session, SessionState};
pub use transport::{InMemoryRelay, MessageTransport, SessionId};

pub mod blind;
pub mod driver;
pub mod error;
pub mod event;
pub mod keys;
pub mod messages;
pub mod notes;
pub mod protocol;
pub mod session;
pub mod transport;
