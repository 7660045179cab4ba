//! Wire shapes of calendar events as exchanged with the server.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ServiceResult;

/// A numeric code that does not name a known variant.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("unknown {kind} code {code}")]
pub struct UnknownCode {
    kind: &'static str,
    code: u8,
}

/// Protection applied to a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CardKind {
    /// Plain data, neither signed nor encrypted.
    Clear,
    /// Cleartext data with a detached signature.
    Signed,
    /// Base64 ciphertext whose plaintext carries a detached signature.
    EncryptedAndSigned,
}

impl From<CardKind> for u8 {
    fn from(kind: CardKind) -> Self {
        match kind {
            CardKind::Clear => 0,
            CardKind::Signed => 2,
            CardKind::EncryptedAndSigned => 3,
        }
    }
}

impl TryFrom<u8> for CardKind {
    type Error = UnknownCode;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Clear),
            2 => Ok(Self::Signed),
            3 => Ok(Self::EncryptedAndSigned),
            _ => Err(UnknownCode {
                kind: "card type",
                code,
            }),
        }
    }
}

/// One signed and/or encrypted payload of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CalendarCard {
    #[serde(rename = "Type")]
    pub kind: CardKind,
    pub data: String,
    #[serde(default)]
    pub signature: Option<String>,
    pub author: String,
}

/// The signed and encrypted cards of one part, picked by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardPart {
    pub signed: Option<CalendarCard>,
    pub encrypted: Option<CalendarCard>,
}

impl CardPart {
    /// Picks the first card of each protected kind. Clear cards are ignored.
    #[must_use]
    pub fn from_cards(cards: &[CalendarCard]) -> Self {
        let first = |kind: CardKind| cards.iter().find(|c| c.kind == kind).cloned();
        Self {
            signed: first(CardKind::Signed),
            encrypted: first(CardKind::EncryptedAndSigned),
        }
    }

    /// Returns the cards in wire order (signed first).
    #[must_use]
    pub fn into_cards(self) -> Vec<CalendarCard> {
        self.signed.into_iter().chain(self.encrypted).collect()
    }
}

/// Server-side participation status of an attendee.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum AttendeeStatus {
    #[default]
    NeedsAction,
    Tentative,
    Declined,
    Accepted,
}

impl From<AttendeeStatus> for u8 {
    fn from(status: AttendeeStatus) -> Self {
        match status {
            AttendeeStatus::NeedsAction => 0,
            AttendeeStatus::Tentative => 1,
            AttendeeStatus::Declined => 2,
            AttendeeStatus::Accepted => 3,
        }
    }
}

impl TryFrom<u8> for AttendeeStatus {
    type Error = UnknownCode;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::NeedsAction),
            1 => Ok(Self::Tentative),
            2 => Ok(Self::Declined),
            3 => Ok(Self::Accepted),
            _ => Err(UnknownCode {
                kind: "attendee status",
                code,
            }),
        }
    }
}

/// Cleartext attendee record known to the server, identified by token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttendeeClear {
    pub token: String,
    pub permissions: u32,
    #[serde(default)]
    pub status: Option<AttendeeStatus>,
}

/// A member's personal card (alarms and other per-member data).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalCard {
    #[serde(rename = "MemberID")]
    pub member_id: String,
    #[serde(flatten)]
    pub card: CalendarCard,
}

/// A calendar event as fetched from the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CalendarEvent {
    pub shared_events: Vec<CalendarCard>,
    pub calendar_events: Vec<CalendarCard>,
    pub attendees_events: Vec<CalendarCard>,
    pub attendees: Vec<AttendeeClear>,
    pub personal_event: Vec<PersonalCard>,
    pub shared_key_packet: String,
    pub calendar_key_packet: Option<String>,
}

impl CalendarEvent {
    /// ## Summary
    /// Decodes an event from its JSON payload.
    ///
    /// ## Errors
    /// Returns an error if the payload is not a valid event document.
    pub fn from_json(payload: &str) -> ServiceResult<Self> {
        Ok(serde_json::from_str(payload)?)
    }

    /// ## Summary
    /// Encodes the event as a JSON payload.
    ///
    /// ## Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> ServiceResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}
