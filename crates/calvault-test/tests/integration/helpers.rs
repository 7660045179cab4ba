#![allow(clippy::expect_used, dead_code)]
//! Test helpers for integration tests.
//!
//! Seals the weekly meeting fixture once per test and opens it again with
//! the same identity.

use calvault_test::component::calendar::deserialize::{read_calendar_event, read_session_keys};
use calvault_test::component::calendar::serialize::create_calendar_event;
use calvault_test::component::calendar::{CalendarCard, CalendarEvent, CardKind};
use calvault_test::component::error::ServiceResult;
use calvault_test::fixtures::{ORGANIZER, TestIdentity, weekly_meeting};
use calvault_test::mock::MockCrypto;
use calvault_test::rfc::rfc::ical::core::Component;

/// Everything a test needs to open a sealed event.
pub struct Sealed {
    pub crypto: MockCrypto,
    pub identity: TestIdentity,
    pub original: Component,
    pub event: CalendarEvent,
}

impl Sealed {
    /// Seals the weekly meeting fixture as the organizer.
    pub async fn weekly_meeting() -> Self {
        let crypto = MockCrypto::new();
        let identity = TestIdentity::new(ORGANIZER);
        let original = weekly_meeting().expect("fixture should parse");
        let event = create_calendar_event(&crypto, &original, &identity.sealing_keys())
            .await
            .expect("sealing should succeed");
        Self {
            crypto,
            identity,
            original,
            event,
        }
    }

    /// Unwraps the session keys and assembles the event.
    pub async fn open(&self) -> ServiceResult<Component> {
        let (shared_key, calendar_key) = read_session_keys(
            &self.crypto,
            &self.event,
            &[self.identity.calendar_keys.private.clone()],
        )
        .await?;
        read_calendar_event(
            &self.crypto,
            &self.event,
            &self.identity.keys_by_author(),
            Some(&shared_key),
            calendar_key.as_ref(),
        )
        .await
    }
}

/// Returns the first card of `kind`.
pub fn card_mut(cards: &mut [CalendarCard], kind: CardKind) -> &mut CalendarCard {
    cards
        .iter_mut()
        .find(|card| card.kind == kind)
        .expect("card of requested kind")
}
