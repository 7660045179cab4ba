use calvault_test::component::calendar::CardKind;
use calvault_test::component::calendar::deserialize::{read_calendar_event, read_session_keys};
use calvault_test::component::crypto::CalendarCrypto;
use calvault_test::component::error::ServiceError;
use calvault_test::fixtures::TestIdentity;

use super::helpers::{Sealed, card_mut};

#[test_log::test(tokio::test)]
async fn tampered_signed_card_is_rejected() {
    let mut sealed = Sealed::weekly_meeting().await;
    let card = card_mut(&mut sealed.event.shared_events, CardKind::Signed);
    card.data = card.data.replace("COUNT=10", "COUNT=11");

    assert!(matches!(sealed.open().await, Err(ServiceError::SignatureError)));
}

#[test_log::test(tokio::test)]
async fn signature_of_another_card_is_rejected() {
    let mut sealed = Sealed::weekly_meeting().await;
    let signed_signature = card_mut(&mut sealed.event.shared_events, CardKind::Signed)
        .signature
        .clone();
    card_mut(&mut sealed.event.shared_events, CardKind::EncryptedAndSigned).signature =
        signed_signature;

    assert!(matches!(sealed.open().await, Err(ServiceError::SignatureError)));
}

#[test_log::test(tokio::test)]
async fn missing_signature_is_rejected() {
    let mut sealed = Sealed::weekly_meeting().await;
    card_mut(&mut sealed.event.attendees_events, CardKind::EncryptedAndSigned).signature = None;

    assert!(matches!(sealed.open().await, Err(ServiceError::SignatureError)));
}

#[test_log::test(tokio::test)]
async fn unknown_author_is_rejected() {
    let sealed = Sealed::weekly_meeting().await;
    let (shared_key, calendar_key) = read_session_keys(
        &sealed.crypto,
        &sealed.event,
        &[sealed.identity.calendar_keys.private.clone()],
    )
    .await
    .expect("session keys should unwrap");

    let stranger = TestIdentity::new("stranger@example.com");
    let result = read_calendar_event(
        &sealed.crypto,
        &sealed.event,
        &stranger.keys_by_author(),
        Some(&shared_key),
        calendar_key.as_ref(),
    )
    .await;

    assert!(matches!(result, Err(ServiceError::SignatureError)));
}

#[test_log::test(tokio::test)]
async fn missing_calendar_key_is_missing_data() {
    let sealed = Sealed::weekly_meeting().await;
    let (shared_key, _) = read_session_keys(
        &sealed.crypto,
        &sealed.event,
        &[sealed.identity.calendar_keys.private.clone()],
    )
    .await
    .expect("session keys should unwrap");

    let result = read_calendar_event(
        &sealed.crypto,
        &sealed.event,
        &sealed.identity.keys_by_author(),
        Some(&shared_key),
        None,
    )
    .await;

    assert!(matches!(result, Err(ServiceError::MissingData(_))));
}

#[test_log::test(tokio::test)]
async fn wrong_session_key_is_rejected() {
    let sealed = Sealed::weekly_meeting().await;
    let (shared_key, calendar_key) = read_session_keys(
        &sealed.crypto,
        &sealed.event,
        &[sealed.identity.calendar_keys.private.clone()],
    )
    .await
    .expect("session keys should unwrap");

    let result = read_calendar_event(
        &sealed.crypto,
        &sealed.event,
        &sealed.identity.keys_by_author(),
        calendar_key.as_ref(),
        Some(&shared_key),
    )
    .await;

    assert!(matches!(result, Err(ServiceError::SignatureError)));
}

#[test_log::test(tokio::test)]
async fn validly_signed_garbage_fails_to_parse() {
    let mut sealed = Sealed::weekly_meeting().await;
    let garbage = "this is not a calendar".to_string();
    let signature = sealed
        .crypto
        .sign_detached(garbage.as_bytes(), &sealed.identity.author_keys.private)
        .await
        .expect("mock signing cannot fail");

    let card = card_mut(&mut sealed.event.shared_events, CardKind::Signed);
    card.data = garbage;
    card.signature = Some(signature);

    assert!(matches!(sealed.open().await, Err(ServiceError::RfcError(_))));
}
