//! Reassembly of a calendar event from its protected cards.

use std::collections::HashMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use calvault_rfc::error::RfcError;
use calvault_rfc::rfc::ical::core::{Component, Property};
use calvault_rfc::rfc::ical::parse::parse_event;
use futures::future::try_join_all;

use super::attendees::to_internal_attendee;
use super::card::{CalendarCard, CalendarEvent, PersonalCard};
use super::decrypt::{card_signature, decrypt_and_verify_calendar_event, verify_signed_card};
use crate::crypto::{CalendarCrypto, SessionKey};
use crate::error::{ServiceError, ServiceResult};

/// ## Summary
/// Unwraps one base64 key packet.
///
/// ## Errors
/// Returns an error if the packet is not base64 or no private key opens it.
pub async fn read_session_key<C: CalendarCrypto>(
    crypto: &C,
    packet: &str,
    private_keys: &[C::PrivateKey],
) -> ServiceResult<SessionKey> {
    let packet = BASE64.decode(packet)?;
    Ok(crypto.decrypt_session_key(&packet, private_keys).await?)
}

/// ## Summary
/// Unwraps the shared and, if present, the calendar session key of an
/// event concurrently.
///
/// ## Errors
/// Fails if either present packet cannot be unwrapped.
#[tracing::instrument(skip_all, fields(has_calendar_packet = event.calendar_key_packet.is_some()))]
pub async fn read_session_keys<C: CalendarCrypto>(
    crypto: &C,
    event: &CalendarEvent,
    private_keys: &[C::PrivateKey],
) -> ServiceResult<(SessionKey, Option<SessionKey>)> {
    let calendar = async {
        match event.calendar_key_packet.as_deref() {
            Some(packet) => read_session_key(crypto, packet, private_keys).await.map(Some),
            None => Ok(None),
        }
    };

    futures::try_join!(
        read_session_key(crypto, &event.shared_key_packet, private_keys),
        calendar,
    )
}

/// ## Summary
/// Verifies, decrypts and merges the shared, calendar and attendee cards of
/// an event into one VEVENT.
///
/// Shared fragments are applied first and calendar fragments second; a later
/// fragment replaces every property of a name it carries. Attendee cards are
/// opened with the shared session key, and their attendees replace the
/// merged ATTENDEE list only when there is at least one.
///
/// Personal cards are not part of the result; see [`read_personal_part`].
///
/// ## Errors
/// Fails closed: any card that does not verify, decrypt or parse fails the
/// whole event.
#[tracing::instrument(skip_all, fields(
    shared = event.shared_events.len(),
    calendar = event.calendar_events.len(),
    attendee_cards = event.attendees_events.len(),
))]
pub async fn read_calendar_event<C: CalendarCrypto>(
    crypto: &C,
    event: &CalendarEvent,
    keys_by_author: &HashMap<String, Vec<C::PublicKey>>,
    shared_key: Option<&SessionKey>,
    calendar_key: Option<&SessionKey>,
) -> ServiceResult<Component> {
    let (shared, calendar, attendee_cards) = futures::try_join!(
        open_cards(crypto, &event.shared_events, keys_by_author, shared_key),
        open_cards(crypto, &event.calendar_events, keys_by_author, calendar_key),
        open_cards(crypto, &event.attendees_events, keys_by_author, shared_key),
    )?;

    let mut merged = Component::event();
    for plaintext in shared.iter().chain(&calendar).flatten() {
        merged.merge(parse_fragment(plaintext)?);
    }

    let mut wire_attendees: Vec<Property> = Vec::new();
    for plaintext in attendee_cards.iter().flatten() {
        let mut fragment = parse_fragment(plaintext)?;
        wire_attendees.extend(fragment.remove_properties("ATTENDEE"));
    }

    let resolution = to_internal_attendee(wire_attendees, &event.attendees);
    if resolution.unresolved > 0 {
        tracing::warn!(
            unresolved = resolution.unresolved,
            "Some attendees have no cleartext record"
        );
    }
    if !resolution.attendees.is_empty() {
        merged.remove_properties("ATTENDEE");
        merged.properties.extend(resolution.attendees);
    }

    tracing::debug!(
        uid = merged.uid().unwrap_or_default(),
        properties = merged.properties.len(),
        "Assembled calendar event"
    );
    Ok(merged)
}

/// ## Summary
/// Verifies a member's personal card and parses it.
///
/// ## Errors
/// Returns `SignatureError` unless the card verifies against `public_keys`,
/// and a parse error if its data is not a VEVENT.
#[tracing::instrument(skip_all, fields(author = %card.author))]
pub async fn read_personal_part<C: CalendarCrypto>(
    crypto: &C,
    card: &CalendarCard,
    public_keys: &[C::PublicKey],
) -> ServiceResult<Component> {
    let signature = card_signature(card)?;
    let data = verify_signed_card(crypto, &card.data, signature, public_keys).await?;
    parse_fragment(data)
}

/// Indexes personal cards by member id. A later card for the same member
/// replaces an earlier one.
#[must_use]
pub fn get_personal_part_map(event: &CalendarEvent) -> HashMap<&str, &PersonalCard> {
    event
        .personal_event
        .iter()
        .map(|personal| (personal.member_id.as_str(), personal))
        .collect()
}

/// Opens every card of a group, keeping card order.
async fn open_cards<C: CalendarCrypto>(
    crypto: &C,
    cards: &[CalendarCard],
    keys_by_author: &HashMap<String, Vec<C::PublicKey>>,
    session_key: Option<&SessionKey>,
) -> ServiceResult<Vec<Option<String>>> {
    try_join_all(
        cards
            .iter()
            .map(|card| decrypt_and_verify_calendar_event(crypto, card, keys_by_author, session_key)),
    )
    .await
}

fn parse_fragment(plaintext: &str) -> ServiceResult<Component> {
    parse_event(plaintext).map_err(|err| {
        tracing::warn!(%err, "Card plaintext is not a VEVENT");
        ServiceError::from(RfcError::from(err))
    })
}
