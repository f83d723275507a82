//! Wire messages exchanged through the relay.
//!
//! Every message is a JSON object `{type, sender, payload}`. Point values and
//! note envelopes travel as hex strings so the relay never needs to
//! understand binary payloads.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Which side of the session a party plays.
///
/// The initiator creates the relay room and drives STEP_1/STEP_3; the joiner
/// announces itself with JOIN and drives STEP_2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Initiator,
    Joiner,
}

impl Role {
    pub fn peer(self) -> Role {
        match self {
            Role::Initiator => Role::Joiner,
            Role::Joiner => Role::Initiator,
        }
    }
}

/// A protocol message as stored and forwarded by the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub sender: Role,
    #[serde(flatten)]
    pub body: MessageBody,
}

/// Message type plus its type-specific payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum MessageBody {
    #[serde(rename = "JOIN")]
    Join(JoinPayload),
    #[serde(rename = "STEP_1")]
    Step1(Step1Payload),
    #[serde(rename = "STEP_2")]
    Step2(Step2Payload),
    #[serde(rename = "STEP_3")]
    Step3(Step3Payload),
    #[serde(rename = "NOTE")]
    Note(NotePayload),
}

/// Joiner announces itself and offers its public key for the note channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinPayload {
    /// Compressed-point hex. Optional on the wire: a peer that omits it still
    /// gets matching, just no decryptable notes.
    #[serde(rename = "publicKey")]
    pub public_key: Option<String>,
}

/// Initiator's first-blinded set, positionally aligned to its own event list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step1Payload {
    pub blinded: Vec<String>,
    #[serde(rename = "publicKey")]
    pub public_key: Option<String>,
}

/// Joiner returns the initiator's set double-blinded (in the initiator's
/// order) alongside its own first-blinded set (in the joiner's order).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step2Payload {
    #[serde(rename = "doubleBlinded")]
    pub double_blinded: Vec<String>,
    pub blinded: Vec<String>,
}

/// Initiator returns the joiner's set double-blinded, positionally aligned to
/// the joiner's original event order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step3Payload {
    #[serde(rename = "doubleBlinded")]
    pub double_blinded: Vec<String>,
}

/// An encrypted note about one matched event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotePayload {
    pub uid: String,
    /// `nonce-hex:cipher-hex` envelope from the note channel.
    pub encrypted: String,
}

impl MessageBody {
    /// Wire name of the message type, for logs and diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            MessageBody::Join(_) => "JOIN",
            MessageBody::Step1(_) => "STEP_1",
            MessageBody::Step2(_) => "STEP_2",
            MessageBody::Step3(_) => "STEP_3",
            MessageBody::Note(_) => "NOTE",
        }
    }
}

impl Message {
    pub fn new(sender: Role, body: MessageBody) -> Self {
        Self { sender, body }
    }

    /// True for NOTE messages; every note in a poll batch is applied, while
    /// only the most recent non-note message drives a handshake transition.
    pub fn is_note(&self) -> bool {
        matches!(self.body, MessageBody::Note(_))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_peer() {
        assert_eq!(Role::Initiator.peer(), Role::Joiner);
        assert_eq!(Role::Joiner.peer(), Role::Initiator);
    }

    #[test]
    fn test_join_wire_shape() {
        let msg = Message::new(
            Role::Joiner,
            MessageBody::Join(JoinPayload {
                public_key: Some("ab12".to_string()),
            }),
        );
        let json = msg.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "JOIN");
        assert_eq!(value["sender"], "JOINER");
        assert_eq!(value["payload"]["publicKey"], "ab12");
    }

    #[test]
    fn test_step2_wire_shape() {
        let msg = Message::new(
            Role::Joiner,
            MessageBody::Step2(Step2Payload {
                double_blinded: vec!["aa".to_string()],
                blinded: vec!["bb".to_string()],
            }),
        );
        let value: serde_json::Value =
            serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(value["type"], "STEP_2");
        assert_eq!(value["payload"]["doubleBlinded"][0], "aa");
        assert_eq!(value["payload"]["blinded"][0], "bb");
    }

    #[test]
    fn test_message_json_round_trip() {
        let msg = Message::new(
            Role::Initiator,
            MessageBody::Note(NotePayload {
                uid: "uid-1".to_string(),
                encrypted: "00:11".to_string(),
            }),
        );
        let back = Message::from_json(&msg.to_json().unwrap()).unwrap();
        assert_eq!(msg, back);
    }

    #[test]
    fn test_join_without_public_key_parses() {
        let json = r#"{"type":"JOIN","sender":"JOINER","payload":{"publicKey":null}}"#;
        let msg = Message::from_json(json).unwrap();
        match msg.body {
            MessageBody::Join(ref payload) => assert!(payload.public_key.is_none()),
            _ => panic!("expected JOIN"),
        }
    }

    #[test]
    fn test_is_note() {
        let note = Message::new(
            Role::Joiner,
            MessageBody::Note(NotePayload {
                uid: "u".to_string(),
                encrypted: "e".to_string(),
            }),
        );
        let join = Message::new(Role::Joiner, MessageBody::Join(JoinPayload { public_key: None }));
        assert!(note.is_note());
        assert!(!join.is_note());
    }

    #[test]
    fn test_unknown_type_rejected() {
        let json = r#"{"type":"STEP_9","sender":"JOINER","payload":{}}"#;
        assert!(Message::from_json(json).is_err());
    }
}
