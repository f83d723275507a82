//! Transition logic for the matching session.
//!
//! Handshake order is strict: JOIN → STEP_1 → STEP_2 → STEP_3, with the
//! initiator handling JOIN/STEP_2 and the joiner handling STEP_1/STEP_3. The
//! relay may redeliver or reorder, so any message that does not fit the
//! current state and role is ignored without faulting. Per poll batch only
//! the most recent handshake message drives a transition (transitions are not
//! replay-safe), while every NOTE in the batch is applied (notes are
//! additive).

use crate::blind::{blind_identifier, blind_received, encode_point};
use crate::error::{CalMatchError, Result};
use crate::keys::derive_shared_secret;
use crate::messages::{
    JoinPayload, Message, MessageBody, NotePayload, Role, Step1Payload, Step2Payload,
    Step3Payload,
};
use crate::notes;
use crate::session::{Session, SessionState};
use std::collections::HashSet;
use tracing::{debug, info, warn};

impl Session {
    /// Enter the handshake.
    ///
    /// The initiator moves to `Created` and waits; the joiner moves to
    /// `Exchanging` and returns the JOIN message announcing its public key.
    /// Calling `start` on a session that already started is a no-op.
    pub fn start(&mut self) -> Vec<Message> {
        if self.state != SessionState::Idle {
            return Vec::new();
        }
        match self.role {
            Role::Initiator => {
                self.state = SessionState::Created;
                info!(session = %self.id, "session created, waiting for peer");
                Vec::new()
            }
            Role::Joiner => {
                self.state = SessionState::Exchanging;
                info!(session = %self.id, "joined session");
                vec![Message::new(
                    self.role,
                    MessageBody::Join(JoinPayload {
                        public_key: Some(self.keys.public_hex()),
                    }),
                )]
            }
        }
    }

    /// Apply one poll batch and return the messages to send in response.
    ///
    /// The caller performs the sends; a failed send surfaces there and can be
    /// retried explicitly.
    ///
    /// # Errors
    /// `InvalidPoint` if a handshake payload carries an undecodable blinded
    /// value; the session is then unusable and should be discarded. Note
    /// failures never surface here — a bad note is logged and dropped.
    pub fn handle_batch(&mut self, messages: &[Message]) -> Result<Vec<Message>> {
        let from_peer: Vec<&Message> = messages
            .iter()
            .filter(|m| m.sender != self.role)
            .collect();

        let mut outbound = Vec::new();
        if let Some(trigger) = from_peer.iter().rev().find(|m| !m.is_note()) {
            outbound = self.handle_handshake(trigger)?;
        }
        for message in from_peer.iter().filter(|m| m.is_note()) {
            if let MessageBody::Note(payload) = &message.body {
                self.apply_note(payload);
            }
        }
        Ok(outbound)
    }

    /// Encrypt a note for a matched event and record the local echo.
    ///
    /// # Errors
    /// `NoSecureChannel` before `Results` or when the peer never supplied a
    /// usable public key.
    pub fn compose_note(&mut self, uid: &str, text: &str) -> Result<Message> {
        if self.state != SessionState::Results {
            return Err(CalMatchError::NoSecureChannel);
        }
        let key = self
            .shared_secret
            .as_ref()
            .ok_or(CalMatchError::NoSecureChannel)?;
        let encrypted = notes::encrypt(text, key)?;
        self.notes.insert(uid.to_string(), text.to_string());
        Ok(Message::new(
            self.role,
            MessageBody::Note(NotePayload {
                uid: uid.to_string(),
                encrypted,
            }),
        ))
    }

    fn handle_handshake(&mut self, message: &Message) -> Result<Vec<Message>> {
        match (self.state, self.role, &message.body) {
            (SessionState::Created, Role::Initiator, MessageBody::Join(payload)) => {
                self.on_join(payload)
            }
            (SessionState::Exchanging, Role::Joiner, MessageBody::Step1(payload)) => {
                self.on_step1(payload)
            }
            (SessionState::Exchanging, Role::Initiator, MessageBody::Step2(payload)) => {
                self.on_step2(payload)
            }
            (SessionState::Exchanging, Role::Joiner, MessageBody::Step3(payload)) => {
                self.on_step3(payload)
            }
            (state, role, body) => {
                debug!(
                    session = %self.id,
                    ?state,
                    ?role,
                    message = body.kind(),
                    "ignoring message not expected in current state"
                );
                Ok(Vec::new())
            }
        }
    }

    /// Initiator: peer joined, blind our set and open the exchange.
    fn on_join(&mut self, payload: &JoinPayload) -> Result<Vec<Message>> {
        info!(session = %self.id, "peer joined, starting handshake");
        self.establish_channel(payload.public_key.as_deref());

        let blinded = self.blind_own_events();
        self.state = SessionState::Exchanging;
        Ok(vec![Message::new(
            self.role,
            MessageBody::Step1(Step1Payload {
                blinded,
                public_key: Some(self.keys.public_hex()),
            }),
        )])
    }

    /// Joiner: second-blind the initiator's set, keep it for STEP_3, and
    /// send our own first-blinded set alongside.
    fn on_step1(&mut self, payload: &Step1Payload) -> Result<Vec<Message>> {
        info!(session = %self.id, count = payload.blinded.len(), "received initiator set");
        self.establish_channel(payload.public_key.as_deref());

        self.stored_double_blinded = blind_received(&payload.blinded, &self.keys.secret)?;
        let blinded = self.blind_own_events();
        Ok(vec![Message::new(
            self.role,
            MessageBody::Step2(Step2Payload {
                double_blinded: self.stored_double_blinded.clone(),
                blinded,
            }),
        )])
    }

    /// Initiator: double-blind the joiner's set, intersect, reply with the
    /// double-blinded values so the joiner can intersect too.
    fn on_step2(&mut self, payload: &Step2Payload) -> Result<Vec<Message>> {
        info!(session = %self.id, "received joiner set, computing intersection");
        let our_double_blinded = blind_received(&payload.blinded, &self.keys.secret)?;

        // `payload.double_blinded` is our own set after the peer's blinding,
        // in our event order; positions that land in the peer's set are the
        // matches.
        self.record_matches(&payload.double_blinded, &our_double_blinded);
        self.state = SessionState::Results;
        Ok(vec![Message::new(
            self.role,
            MessageBody::Step3(Step3Payload {
                double_blinded: our_double_blinded,
            }),
        )])
    }

    /// Joiner: intersect the returned double-blinded values against the set
    /// stored during STEP_1.
    fn on_step3(&mut self, payload: &Step3Payload) -> Result<Vec<Message>> {
        info!(session = %self.id, "received final set, computing intersection");
        let stored = std::mem::take(&mut self.stored_double_blinded);
        self.record_matches(&payload.double_blinded, &stored);
        self.state = SessionState::Results;
        Ok(Vec::new())
    }

    /// Intersect by exact point-encoding equality. `aligned` is positionally
    /// aligned to our own event list; `own_set` holds our double-blinded
    /// values in any order.
    fn record_matches(&mut self, aligned: &[String], own_set: &[String]) {
        let own: HashSet<&String> = own_set.iter().collect();
        self.matches = aligned
            .iter()
            .enumerate()
            .filter(|(_, value)| own.contains(value))
            .filter_map(|(index, _)| self.events.get(index).cloned())
            .collect();
        info!(session = %self.id, matches = self.matches.len(), "intersection complete");
    }

    fn blind_own_events(&self) -> Vec<String> {
        self.events
            .iter()
            .map(|event| encode_point(&blind_identifier(&event.uid, &self.keys.secret)))
            .collect()
    }

    /// Derive the shared secret from the peer's public key, if usable.
    /// Missing or malformed keys are non-fatal: matching proceeds, notes
    /// just cannot be decrypted later.
    fn establish_channel(&mut self, peer_public_hex: Option<&str>) {
        if self.shared_secret.is_some() {
            return;
        }
        let Some(peer_public_hex) = peer_public_hex else {
            warn!(session = %self.id, "peer sent no public key, note channel unavailable");
            return;
        };
        match derive_shared_secret(peer_public_hex, &self.keys.secret) {
            Ok(secret) => {
                self.shared_secret = Some(secret);
                info!(session = %self.id, "encryption channel established");
            }
            Err(error) => {
                warn!(session = %self.id, %error, "bad peer public key, note channel unavailable");
            }
        }
    }

    /// Decrypt and store a note; the newest note for a uid wins.
    fn apply_note(&mut self, payload: &NotePayload) {
        if self.state != SessionState::Results {
            debug!(session = %self.id, uid = %payload.uid, "note before results, ignoring");
            return;
        }
        let Some(key) = self.shared_secret.as_ref() else {
            warn!(session = %self.id, uid = %payload.uid, "no note channel, dropping note");
            return;
        };
        match notes::decrypt(&payload.encrypted, key) {
            Ok(text) => {
                self.notes.insert(payload.uid.clone(), text);
            }
            Err(error) => {
                warn!(session = %self.id, uid = %payload.uid, %error, "failed to decrypt note");
            }
        }
    }
}
