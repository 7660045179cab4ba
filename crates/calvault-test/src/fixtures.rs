//! Sample events and identities shared by the integration tests.

use std::collections::HashMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use calvault_rfc::rfc::ical::core::Component;
use calvault_rfc::rfc::ical::parse::{ParseResult, parse_event};
use calvault_service::calendar::serialize::SealingKeys;
use calvault_service::calendar::{CalendarCard, CardKind};
use calvault_service::crypto::{CalendarCrypto, CryptoError, SessionKey};

use crate::mock::{MockCrypto, MockKeyPair, MockPublicKey};

/// Organizer's address; also the author of every sealed card.
pub const ORGANIZER: &str = "organizer@example.com";

/// A weekly, zoned meeting with two attendees and an alarm.
pub const WEEKLY_MEETING: &str = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//example//test//EN\r\n\
BEGIN:VEVENT\r\n\
UID:weekly-sync@example.com\r\n\
DTSTAMP:20240101T090000Z\r\n\
DTSTART;TZID=Europe/Zurich:20240108T100000\r\n\
DTEND;TZID=Europe/Zurich:20240108T103000\r\n\
RRULE:FREQ=WEEKLY;COUNT=10\r\n\
EXDATE;TZID=Europe/Zurich:20240122T100000\r\n\
SUMMARY:Weekly sync\\, team A\r\n\
DESCRIPTION:Agenda in the usual doc\r\n\
LOCATION:Room 4\r\n\
STATUS:CONFIRMED\r\n\
TRANSP:OPAQUE\r\n\
ORGANIZER;CN=Olga:mailto:organizer@example.com\r\n\
ATTENDEE;CN=James;PARTSTAT=ACCEPTED;X-PM-PERMISSIONS=3:mailto:james@mi6.org\r\n\
ATTENDEE;CN=\"Doe, Jane\";PARTSTAT=TENTATIVE:mailto:jane@example.com\r\n\
SEQUENCE:1\r\n\
X-CUSTOM-NOTE:kept in the shared part\r\n\
BEGIN:VALARM\r\n\
ACTION:DISPLAY\r\n\
TRIGGER:-PT15M\r\n\
DESCRIPTION:Reminder\r\n\
END:VALARM\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

/// ## Summary
/// Parses [`WEEKLY_MEETING`].
///
/// ## Errors
/// Returns the parse error if the fixture is malformed.
pub fn weekly_meeting() -> ParseResult<Component> {
    parse_event(WEEKLY_MEETING)
}

/// Key material for one sealing identity plus the calendar's own keys.
#[derive(Debug, Clone)]
pub struct TestIdentity {
    pub author: String,
    pub author_keys: MockKeyPair,
    pub calendar_keys: MockKeyPair,
}

impl TestIdentity {
    #[must_use]
    pub fn new(author: &str) -> Self {
        Self {
            author: author.to_string(),
            author_keys: MockKeyPair::derive(author),
            calendar_keys: MockKeyPair::derive(&format!("calendar-of:{author}")),
        }
    }

    #[must_use]
    pub fn sealing_keys(&self) -> SealingKeys<'_, MockCrypto> {
        SealingKeys {
            author: &self.author,
            signing_key: &self.author_keys.private,
            calendar_public_key: &self.calendar_keys.public,
        }
    }

    /// Public keys by author address, holding only this identity.
    #[must_use]
    pub fn keys_by_author(&self) -> HashMap<String, Vec<MockPublicKey>> {
        HashMap::from([(self.author.clone(), vec![self.author_keys.public.clone()])])
    }

    /// ## Summary
    /// Builds a signed card over `data`.
    ///
    /// ## Errors
    /// Propagates capability failures.
    pub async fn signed_card(
        &self,
        crypto: &MockCrypto,
        data: &str,
    ) -> Result<CalendarCard, CryptoError> {
        let signature = crypto
            .sign_detached(data.as_bytes(), &self.author_keys.private)
            .await?;
        Ok(CalendarCard {
            kind: CardKind::Signed,
            data: data.to_string(),
            signature: Some(signature),
            author: self.author.clone(),
        })
    }

    /// ## Summary
    /// Builds an encrypted card over `data`, signed over the plaintext.
    ///
    /// ## Errors
    /// Propagates capability failures.
    pub async fn encrypted_card(
        &self,
        crypto: &MockCrypto,
        data: &str,
        session_key: &SessionKey,
    ) -> Result<CalendarCard, CryptoError> {
        let signature = crypto
            .sign_detached(data.as_bytes(), &self.author_keys.private)
            .await?;
        let ciphertext = crypto.encrypt(data.as_bytes(), session_key).await?;
        Ok(CalendarCard {
            kind: CardKind::EncryptedAndSigned,
            data: BASE64.encode(ciphertext),
            signature: Some(signature),
            author: self.author.clone(),
        })
    }
}

/// Wraps VEVENT content lines in `BEGIN`/`END` lines.
#[must_use]
pub fn vevent(body: &str) -> String {
    format!("BEGIN:VEVENT\r\n{body}END:VEVENT\r\n")
}
