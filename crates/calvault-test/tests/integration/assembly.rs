//! Merge rules of the assembler, exercised with hand-built cards.

use calvault_test::component::calendar::decrypt::decrypt_and_verify_part;
use calvault_test::component::calendar::deserialize::read_calendar_event;
use calvault_test::component::calendar::{
    AttendeeClear, CalendarCard, CalendarEvent, CardKind, CardPart,
};
use calvault_test::component::constants::{ATTENDEE_PERMISSIONS_PARAM, ATTENDEE_TOKEN_PARAM};
use calvault_test::component::crypto::{CalendarCrypto, SessionKey};
use calvault_test::fixtures::{ORGANIZER, TestIdentity, vevent};
use calvault_test::mock::MockCrypto;
use calvault_test::rfc::rfc::ical::core::{Component, Property};

struct Harness {
    crypto: MockCrypto,
    identity: TestIdentity,
    shared_key: SessionKey,
    calendar_key: SessionKey,
}

impl Harness {
    async fn new() -> Self {
        let crypto = MockCrypto::new();
        let shared_key = crypto.generate_session_key().await.unwrap();
        let calendar_key = crypto.generate_session_key().await.unwrap();
        Self {
            crypto,
            identity: TestIdentity::new(ORGANIZER),
            shared_key,
            calendar_key,
        }
    }

    async fn signed(&self, body: &str) -> CalendarCard {
        self.identity
            .signed_card(&self.crypto, &vevent(body))
            .await
            .unwrap()
    }

    async fn encrypted(&self, body: &str, key: &SessionKey) -> CalendarCard {
        self.identity
            .encrypted_card(&self.crypto, &vevent(body), key)
            .await
            .unwrap()
    }

    async fn read(&self, event: &CalendarEvent) -> Component {
        read_calendar_event(
            &self.crypto,
            event,
            &self.identity.keys_by_author(),
            Some(&self.shared_key),
            Some(&self.calendar_key),
        )
        .await
        .unwrap()
    }
}

fn text<'a>(component: &'a Component, name: &str) -> Vec<&'a str> {
    component
        .get_properties(name)
        .into_iter()
        .filter_map(Property::as_text)
        .collect()
}

#[test_log::test(tokio::test)]
async fn calendar_fragment_overrides_shared_fragment() {
    let h = Harness::new().await;
    let event = CalendarEvent {
        shared_events: vec![
            h.signed("UID:merge@example.com\r\nX-NOTE:shared\r\nX-ONLY-SHARED:1\r\n")
                .await,
            h.encrypted("X-NOTE:shared encrypted\r\n", &h.shared_key).await,
        ],
        calendar_events: vec![
            h.encrypted("X-NOTE:calendar\r\nX-NOTE:calendar again\r\n", &h.calendar_key)
                .await,
        ],
        ..CalendarEvent::default()
    };

    let merged = h.read(&event).await;

    assert_eq!(merged.uid(), Some("merge@example.com"));
    assert_eq!(text(&merged, "X-ONLY-SHARED"), vec!["1"]);
    assert_eq!(text(&merged, "X-NOTE"), vec!["calendar", "calendar again"]);
}

#[test_log::test(tokio::test)]
async fn clear_cards_contribute_nothing() {
    let h = Harness::new().await;
    let event = CalendarEvent {
        shared_events: vec![
            h.signed("UID:clear@example.com\r\n").await,
            CalendarCard {
                kind: CardKind::Clear,
                data: vevent("SUMMARY:unprotected\r\n"),
                signature: None,
                author: ORGANIZER.to_string(),
            },
        ],
        ..CalendarEvent::default()
    };

    let merged = h.read(&event).await;

    assert_eq!(merged.summary(), None);
}

#[test_log::test(tokio::test)]
async fn attendee_cards_replace_attendees_only_when_non_empty() {
    let h = Harness::new().await;
    let shared = h
        .signed("UID:att@example.com\r\nATTENDEE:mailto:original@example.com\r\n")
        .await;

    let empty = CalendarEvent {
        shared_events: vec![shared.clone()],
        attendees_events: vec![h.encrypted("X-UNRELATED:1\r\n", &h.shared_key).await],
        ..CalendarEvent::default()
    };
    let kept = h.read(&empty).await;
    let emails: Vec<&str> = kept.attendees().iter().map(|a| a.raw_value.as_str()).collect();
    assert_eq!(emails, vec!["mailto:original@example.com"]);
    assert!(kept.get_property("X-UNRELATED").is_none());

    let replaced = CalendarEvent {
        shared_events: vec![shared],
        attendees_events: vec![
            h.encrypted(
                "ATTENDEE;X-PM-TOKEN=t1:mailto:a@example.com\r\n",
                &h.shared_key,
            )
            .await,
            h.encrypted(
                "ATTENDEE;X-PM-TOKEN=t2:mailto:b@example.com\r\n",
                &h.shared_key,
            )
            .await,
        ],
        attendees: vec![AttendeeClear {
            token: "t2".into(),
            permissions: 5,
            status: None,
        }],
        ..CalendarEvent::default()
    };
    let merged = h.read(&replaced).await;

    let attendees = merged.attendees();
    let emails: Vec<&str> = attendees.iter().map(|a| a.raw_value.as_str()).collect();
    assert_eq!(emails, vec!["mailto:a@example.com", "mailto:b@example.com"]);
    assert_eq!(attendees[0].get_param_value(ATTENDEE_TOKEN_PARAM), Some("t1"));
    assert!(attendees[0].get_param(ATTENDEE_PERMISSIONS_PARAM).is_none());
    assert_eq!(attendees[1].get_param_value(ATTENDEE_PERMISSIONS_PARAM), Some("5"));
}

#[test_log::test(tokio::test)]
async fn attendee_cards_use_the_shared_key() {
    let h = Harness::new().await;
    let event = CalendarEvent {
        shared_events: vec![h.signed("UID:key@example.com\r\n").await],
        attendees_events: vec![
            h.encrypted("ATTENDEE:mailto:a@example.com\r\n", &h.calendar_key)
                .await,
        ],
        ..CalendarEvent::default()
    };

    let result = read_calendar_event(
        &h.crypto,
        &event,
        &h.identity.keys_by_author(),
        Some(&h.shared_key),
        Some(&h.calendar_key),
    )
    .await;

    assert!(result.is_err());
}

#[test_log::test(tokio::test)]
async fn part_decodes_signed_and_encrypted_halves() {
    let h = Harness::new().await;
    let cards = vec![
        h.encrypted("SUMMARY:secret\r\n", &h.shared_key).await,
        h.signed("UID:part@example.com\r\n").await,
    ];
    let part = CardPart::from_cards(&cards);

    let (signed, encrypted) = decrypt_and_verify_part(
        &h.crypto,
        &part,
        &[h.identity.author_keys.public.clone()],
        Some(&h.shared_key),
    )
    .await
    .unwrap();

    assert_eq!(signed, Some(vevent("UID:part@example.com\r\n")));
    assert_eq!(encrypted, Some(vevent("SUMMARY:secret\r\n")));

    let (signed, encrypted) = decrypt_and_verify_part(
        &h.crypto,
        &CardPart::from_cards(&cards[1..]),
        &[h.identity.author_keys.public.clone()],
        None,
    )
    .await
    .unwrap();
    assert!(signed.is_some());
    assert_eq!(encrypted, None);
}
