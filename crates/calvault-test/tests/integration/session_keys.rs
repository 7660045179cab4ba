use calvault_test::component::calendar::deserialize::{read_session_key, read_session_keys};
use calvault_test::component::crypto::CryptoError;
use calvault_test::component::error::ServiceError;
use calvault_test::mock::MockKeyPair;

use super::helpers::Sealed;

#[test_log::test(tokio::test)]
async fn both_packets_unwrap_to_distinct_keys() {
    let sealed = Sealed::weekly_meeting().await;
    let (shared, calendar) = read_session_keys(
        &sealed.crypto,
        &sealed.event,
        &[sealed.identity.calendar_keys.private.clone()],
    )
    .await
    .expect("session keys should unwrap");

    let calendar = calendar.expect("event has a calendar part");
    assert_ne!(shared, calendar);

    let single = read_session_key(
        &sealed.crypto,
        &sealed.event.shared_key_packet,
        &[sealed.identity.calendar_keys.private.clone()],
    )
    .await
    .expect("shared packet should unwrap");
    assert_eq!(single, shared);
}

#[test_log::test(tokio::test)]
async fn absent_calendar_packet_yields_none() {
    let mut sealed = Sealed::weekly_meeting().await;
    sealed.event.calendar_key_packet = None;

    let (_, calendar) = read_session_keys(
        &sealed.crypto,
        &sealed.event,
        &[sealed.identity.calendar_keys.private.clone()],
    )
    .await
    .expect("shared key should unwrap");

    assert!(calendar.is_none());
}

#[test_log::test(tokio::test)]
async fn foreign_private_key_cannot_unwrap() {
    let sealed = Sealed::weekly_meeting().await;
    let foreign = MockKeyPair::derive("somebody else");

    let result = read_session_keys(&sealed.crypto, &sealed.event, &[foreign.private]).await;

    assert!(matches!(
        result,
        Err(ServiceError::CryptoError(CryptoError::NoMatchingKey))
    ));
}

#[test_log::test(tokio::test)]
async fn packet_must_be_base64() {
    let sealed = Sealed::weekly_meeting().await;

    let result = read_session_key(
        &sealed.crypto,
        "not base64!",
        &[sealed.identity.calendar_keys.private.clone()],
    )
    .await;

    assert!(matches!(result, Err(ServiceError::Base64Error(_))));
}
