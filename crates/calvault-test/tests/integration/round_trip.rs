use calvault_test::component::calendar::serialize::create_calendar_event;
use calvault_test::component::calendar::{AttendeeStatus, CalendarEvent, CardKind};
use calvault_test::component::constants::{ATTENDEE_PERMISSIONS_PARAM, ATTENDEE_TOKEN_PARAM};

use super::helpers::Sealed;

/// ## Summary
/// Every non-attendee property survives sealing and opening unchanged.
#[test_log::test(tokio::test)]
async fn sealed_event_opens_to_original() {
    let sealed = Sealed::weekly_meeting().await;
    let opened = sealed.open().await.expect("event should open");

    for name in sealed.original.property_names() {
        if name == "ATTENDEE" {
            continue;
        }
        let before: Vec<_> = sealed
            .original
            .get_properties(name)
            .into_iter()
            .map(|p| (&p.value, &p.params))
            .collect();
        let after: Vec<_> = opened
            .get_properties(name)
            .into_iter()
            .map(|p| (&p.value, &p.params))
            .collect();
        assert_eq!(before, after, "property {name} changed");
    }
    assert!(opened.alarms().is_empty(), "alarms live in the personal part");
}

#[test_log::test(tokio::test)]
async fn attendees_regain_permissions_but_not_partstat() {
    let sealed = Sealed::weekly_meeting().await;
    let opened = sealed.open().await.expect("event should open");

    let attendees = opened.attendees();
    assert_eq!(attendees.len(), 2);

    let permissions: Vec<Option<&str>> = attendees
        .iter()
        .map(|a| a.get_param_value(ATTENDEE_PERMISSIONS_PARAM))
        .collect();
    assert_eq!(permissions, vec![Some("3"), Some("1")]);

    for attendee in &attendees {
        assert!(attendee.get_param("PARTSTAT").is_none());
        assert_eq!(attendee.get_param_value("RSVP"), Some("TRUE"));
        assert!(attendee.get_param_value(ATTENDEE_TOKEN_PARAM).is_some());
    }
    assert_eq!(attendees[1].get_param_value("CN"), Some("Doe, Jane"));
}

#[test_log::test(tokio::test)]
async fn wire_form_separates_parts() {
    let sealed = Sealed::weekly_meeting().await;
    let event = &sealed.event;

    let kinds: Vec<CardKind> = event.shared_events.iter().map(|c| c.kind).collect();
    assert_eq!(kinds, vec![CardKind::Signed, CardKind::EncryptedAndSigned]);

    let signed = &event.shared_events[0].data;
    assert!(signed.contains("UID:weekly-sync@example.com"));
    assert!(signed.contains("RRULE:FREQ=WEEKLY;COUNT=10"));
    assert!(!signed.contains("SUMMARY"));
    assert!(!signed.contains("mailto:james@mi6.org"));

    assert_eq!(event.calendar_events.len(), 1);
    assert_eq!(event.attendees_events.len(), 1);
    assert!(event.calendar_key_packet.is_some());
    assert!(event.personal_event.is_empty());

    let statuses: Vec<Option<AttendeeStatus>> =
        event.attendees.iter().map(|a| a.status).collect();
    assert_eq!(
        statuses,
        vec![Some(AttendeeStatus::Accepted), Some(AttendeeStatus::Tentative)]
    );
    assert!(event.attendees.iter().all(|a| a.token.len() == 40));
}

#[test_log::test(tokio::test)]
async fn json_transport_preserves_event() {
    let mut sealed = Sealed::weekly_meeting().await;
    let direct = sealed.open().await.expect("event should open");

    let payload = sealed.event.to_json().expect("event should serialize");
    assert!(payload.contains("\"SharedKeyPacket\""));
    sealed.event = CalendarEvent::from_json(&payload).expect("payload should decode");

    let via_json = sealed.open().await.expect("event should open after transport");
    assert_eq!(direct, via_json);
}

#[test_log::test(tokio::test)]
async fn event_without_calendar_properties_has_no_calendar_key() {
    let mut sealed = Sealed::weekly_meeting().await;
    let mut bare = sealed.original.clone();
    for name in ["STATUS", "TRANSP", "COMMENT"] {
        bare.remove_properties(name);
    }
    bare.remove_properties("ATTENDEE");

    sealed.event = create_calendar_event(&sealed.crypto, &bare, &sealed.identity.sealing_keys())
        .await
        .expect("sealing should succeed");

    assert!(sealed.event.calendar_events.is_empty());
    assert!(sealed.event.attendees_events.is_empty());
    assert_eq!(sealed.event.calendar_key_packet, None);

    let opened = sealed.open().await.expect("event should open");
    assert_eq!(opened.summary(), Some("Weekly sync, team A"));
    assert!(opened.attendees().is_empty());
}
