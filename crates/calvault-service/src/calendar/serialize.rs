//! Splitting a VEVENT into signed and encrypted cards.
//!
//! This is the inverse of [`super::deserialize::read_calendar_event`].

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use calvault_core::constants::CALENDAR_PROD_ID;
use calvault_rfc::rfc::ical::build::serialize_wrapped;
use calvault_rfc::rfc::ical::core::{Component, Property};

use super::attendees::from_internal_attendee;
use super::card::{AttendeeClear, CalendarCard, CalendarEvent, CardKind, PersonalCard};
use crate::crypto::{CalendarCrypto, SessionKey};
use crate::error::{ServiceError, ServiceResult};

/// Properties every participant can read, signed in clear.
pub const SHARED_SIGNED_PROPERTIES: &[&str] = &[
    "UID",
    "DTSTAMP",
    "DTSTART",
    "DTEND",
    "RRULE",
    "EXDATE",
    "RECURRENCE-ID",
    "ORGANIZER",
    "SEQUENCE",
];

/// Properties that describe the event, encrypted with the shared key.
pub const SHARED_ENCRYPTED_PROPERTIES: &[&str] = &["SUMMARY", "DESCRIPTION", "LOCATION"];

/// Per-calendar properties, encrypted with the calendar key.
pub const CALENDAR_ENCRYPTED_PROPERTIES: &[&str] = &["STATUS", "TRANSP", "COMMENT"];

/// Keys and identity used to seal an event.
pub struct SealingKeys<'a, C: CalendarCrypto> {
    /// Written as the author of every card.
    pub author: &'a str,
    pub signing_key: &'a C::PrivateKey,
    /// Key the session key packets are wrapped for.
    pub calendar_public_key: &'a C::PublicKey,
}

/// ## Summary
/// Seals a VEVENT into the wire form of an event.
///
/// The shared part holds the signed scheduling properties and the
/// encrypted description; any property not listed elsewhere is encrypted
/// there too. Calendar properties get their own session key. Attendees are
/// converted to their wire form and their cleartext records are returned in
/// `Attendees`. Sub-components such as alarms belong to the personal part
/// and are not sealed here.
///
/// ## Errors
/// Returns `MissingData` without a UID or an attendee email, and propagates
/// capability failures.
#[tracing::instrument(skip_all, fields(author = keys.author))]
pub async fn create_calendar_event<C: CalendarCrypto>(
    crypto: &C,
    component: &Component,
    keys: &SealingKeys<'_, C>,
) -> ServiceResult<CalendarEvent> {
    let uid = component
        .uid()
        .ok_or_else(|| ServiceError::MissingData("event UID".into()))?;

    let shared_signed = fragment(component, |name| SHARED_SIGNED_PROPERTIES.contains(&name));
    let shared_encrypted = fragment(component, |name| {
        SHARED_ENCRYPTED_PROPERTIES.contains(&name) || !is_classified(name)
    });
    let calendar_encrypted =
        fragment(component, |name| CALENDAR_ENCRYPTED_PROPERTIES.contains(&name));

    let mut wire_attendees = Component::event();
    let mut attendees: Vec<AttendeeClear> = Vec::new();
    for attendee in component.attendees() {
        let (wire, clear) = from_internal_attendee(attendee, uid)?;
        wire_attendees.add_property(wire);
        attendees.push(clear);
    }

    let has_calendar_part = !calendar_encrypted.properties.is_empty();
    let (shared_key, calendar_key) = futures::try_join!(crypto.generate_session_key(), async {
        if has_calendar_part {
            crypto.generate_session_key().await.map(Some)
        } else {
            Ok(None)
        }
    })?;

    let (signed, encrypted, calendar_card, attendee_card, shared_key_packet, calendar_key_packet) =
        futures::try_join!(
            seal_signed(crypto, &shared_signed, keys),
            seal_encrypted(crypto, Some(&shared_encrypted), keys, &shared_key),
            seal_encrypted(
                crypto,
                has_calendar_part.then_some(&calendar_encrypted),
                keys,
                calendar_key.as_ref().unwrap_or(&shared_key),
            ),
            seal_encrypted(
                crypto,
                (!attendees.is_empty()).then_some(&wire_attendees),
                keys,
                &shared_key,
            ),
            wrap_session_key(crypto, Some(&shared_key), keys.calendar_public_key),
            wrap_session_key(crypto, calendar_key.as_ref(), keys.calendar_public_key),
        )?;

    tracing::debug!(
        uid,
        attendees = attendees.len(),
        has_calendar_part,
        "Sealed calendar event"
    );

    Ok(CalendarEvent {
        shared_events: std::iter::once(signed).chain(encrypted).collect(),
        calendar_events: calendar_card.into_iter().collect(),
        attendees_events: attendee_card.into_iter().collect(),
        attendees,
        personal_event: Vec::new(),
        shared_key_packet: shared_key_packet.unwrap_or_default(),
        calendar_key_packet,
    })
}

/// ## Summary
/// Seals a member's personal part: the UID and the event's alarms, signed.
///
/// ## Errors
/// Returns `MissingData` without a UID and propagates signing failures.
pub async fn create_personal_event<C: CalendarCrypto>(
    crypto: &C,
    component: &Component,
    member_id: &str,
    keys: &SealingKeys<'_, C>,
) -> ServiceResult<PersonalCard> {
    let uid = component
        .uid()
        .ok_or_else(|| ServiceError::MissingData("event UID".into()))?;

    let mut personal = Component::event().with_property(Property::text("UID", uid));
    for alarm in component.alarms() {
        personal.add_child(alarm.clone());
    }

    Ok(PersonalCard {
        member_id: member_id.to_string(),
        card: seal_signed(crypto, &personal, keys).await?,
    })
}

/// Unclassified properties travel in the shared encrypted card.
fn is_classified(name: &str) -> bool {
    name == "ATTENDEE"
        || SHARED_SIGNED_PROPERTIES.contains(&name)
        || SHARED_ENCRYPTED_PROPERTIES.contains(&name)
        || CALENDAR_ENCRYPTED_PROPERTIES.contains(&name)
}

fn fragment(component: &Component, keep: impl Fn(&str) -> bool) -> Component {
    let mut part = Component::event();
    part.properties = component
        .properties
        .iter()
        .filter(|p| keep(&p.name))
        .cloned()
        .collect();
    part
}

async fn seal_signed<C: CalendarCrypto>(
    crypto: &C,
    part: &Component,
    keys: &SealingKeys<'_, C>,
) -> ServiceResult<CalendarCard> {
    let data = serialize_wrapped(part, CALENDAR_PROD_ID);
    let signature = crypto
        .sign_detached(data.as_bytes(), keys.signing_key)
        .await?;
    Ok(CalendarCard {
        kind: CardKind::Signed,
        data,
        signature: Some(signature),
        author: keys.author.to_string(),
    })
}

async fn seal_encrypted<C: CalendarCrypto>(
    crypto: &C,
    part: Option<&Component>,
    keys: &SealingKeys<'_, C>,
    session_key: &SessionKey,
) -> ServiceResult<Option<CalendarCard>> {
    let Some(part) = part.filter(|p| !p.properties.is_empty()) else {
        return Ok(None);
    };

    let plaintext = serialize_wrapped(part, CALENDAR_PROD_ID);
    let (signature, ciphertext) = futures::try_join!(
        crypto.sign_detached(plaintext.as_bytes(), keys.signing_key),
        crypto.encrypt(plaintext.as_bytes(), session_key),
    )?;
    Ok(Some(CalendarCard {
        kind: CardKind::EncryptedAndSigned,
        data: BASE64.encode(ciphertext),
        signature: Some(signature),
        author: keys.author.to_string(),
    }))
}

async fn wrap_session_key<C: CalendarCrypto>(
    crypto: &C,
    session_key: Option<&SessionKey>,
    public_key: &C::PublicKey,
) -> ServiceResult<Option<String>> {
    match session_key {
        Some(session_key) => {
            let packet = crypto.encrypt_session_key(session_key, public_key).await?;
            Ok(Some(BASE64.encode(packet)))
        }
        None => Ok(None),
    }
}
