use calvault_test::component::calendar::deserialize::{get_personal_part_map, read_personal_part};
use calvault_test::component::calendar::serialize::create_personal_event;
use calvault_test::component::error::ServiceError;
use calvault_test::fixtures::ORGANIZER;

use super::helpers::Sealed;

#[test_log::test(tokio::test)]
async fn personal_part_carries_uid_and_alarms() {
    let sealed = Sealed::weekly_meeting().await;
    let card = create_personal_event(
        &sealed.crypto,
        &sealed.original,
        "member-1",
        &sealed.identity.sealing_keys(),
    )
    .await
    .expect("personal part should seal");

    assert_eq!(card.member_id, "member-1");
    assert_eq!(card.card.author, ORGANIZER);

    let personal = read_personal_part(
        &sealed.crypto,
        &card.card,
        &[sealed.identity.author_keys.public.clone()],
    )
    .await
    .expect("personal part should verify");

    assert_eq!(personal.uid(), Some("weekly-sync@example.com"));
    assert_eq!(personal.alarms().len(), 1);
    assert!(personal.summary().is_none());
    assert!(personal.attendees().is_empty());
}

#[test_log::test(tokio::test)]
async fn tampered_personal_part_is_rejected() {
    let sealed = Sealed::weekly_meeting().await;
    let mut card = create_personal_event(
        &sealed.crypto,
        &sealed.original,
        "member-1",
        &sealed.identity.sealing_keys(),
    )
    .await
    .expect("personal part should seal");
    card.card.data = card.card.data.replace("-PT15M", "-PT5M");

    let result = read_personal_part(
        &sealed.crypto,
        &card.card,
        &[sealed.identity.author_keys.public.clone()],
    )
    .await;

    assert!(matches!(result, Err(ServiceError::SignatureError)));
}

#[test_log::test(tokio::test)]
async fn unsigned_personal_part_is_rejected() {
    let sealed = Sealed::weekly_meeting().await;
    let mut card = create_personal_event(
        &sealed.crypto,
        &sealed.original,
        "member-1",
        &sealed.identity.sealing_keys(),
    )
    .await
    .expect("personal part should seal");
    let keys = [sealed.identity.author_keys.public.clone()];

    for signature in [None, Some(String::new())] {
        card.card.signature = signature;
        let result = read_personal_part(&sealed.crypto, &card.card, &keys).await;
        assert!(matches!(result, Err(ServiceError::SignatureError)));
    }
}

#[test_log::test(tokio::test)]
async fn personal_parts_are_found_by_member() {
    let mut sealed = Sealed::weekly_meeting().await;
    for member in ["member-1", "member-2"] {
        let card = create_personal_event(
            &sealed.crypto,
            &sealed.original,
            member,
            &sealed.identity.sealing_keys(),
        )
        .await
        .expect("personal part should seal");
        sealed.event.personal_event.push(card);
    }

    let event = sealed.event.clone();
    let map = get_personal_part_map(&event);

    assert_eq!(map.len(), 2);
    let second = map.get("member-2").expect("member-2 has a personal part");
    let personal = read_personal_part(
        &sealed.crypto,
        &second.card,
        &[sealed.identity.author_keys.public.clone()],
    )
    .await
    .expect("personal part should verify");
    assert_eq!(personal.alarms().len(), 1);
}
