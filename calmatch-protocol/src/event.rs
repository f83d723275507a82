//! Calendar event type consumed by the matching protocol.

use serde::{Deserialize, Serialize};

/// A calendar event as supplied by the caller's feed parser.
///
/// The protocol only matches on `uid`; the remaining fields ride along so a
/// match result can be displayed without another lookup. The core never
/// persists events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// Opaque identifier, stable across both parties' feeds.
    pub uid: String,
    pub title: String,
    /// RFC 3339 start timestamp, passed through verbatim.
    pub start: String,
    pub location: Option<String>,
}

impl CalendarEvent {
    pub fn new(
        uid: impl Into<String>,
        title: impl Into<String>,
        start: impl Into<String>,
    ) -> Self {
        Self {
            uid: uid.into(),
            title: title.into(),
            start: start.into(),
            location: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}
