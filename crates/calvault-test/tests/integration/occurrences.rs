use std::sync::Arc;

use calvault_test::component::calendar::{OccurrenceCache, RecurrenceExpander};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use tokio::sync::Mutex;

use super::helpers::Sealed;

fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0)
        .single()
        .expect("valid instant")
}

/// ## Summary
/// The opened event expands exactly like the original: the excluded week is
/// skipped but still counts towards the occurrence numbers.
#[test_log::test(tokio::test)]
async fn opened_event_expands_in_its_zone() {
    let sealed = Sealed::weekly_meeting().await;
    let opened = sealed.open().await.expect("event should open");
    let expander = RecurrenceExpander::default();
    let mut cache = OccurrenceCache::new();

    let occurrences = expander
        .try_get_occurrences_between(&opened, utc(2024, 1, 1, 0), utc(2024, 2, 1, 0), &mut cache)
        .expect("rule should expand");

    let numbers: Vec<u32> = occurrences.iter().map(|o| o.occurrence_number).collect();
    assert_eq!(numbers, vec![1, 2, 4]);
    let starts: Vec<DateTime<Utc>> = occurrences.iter().map(|o| o.utc_start).collect();
    assert_eq!(
        starts,
        vec![utc(2024, 1, 8, 9), utc(2024, 1, 15, 9), utc(2024, 1, 29, 9)]
    );
    let first = &occurrences[0];
    assert_eq!(
        first.local_start,
        NaiveDate::from_ymd_opt(2024, 1, 8)
            .and_then(|date| date.and_hms_opt(10, 0, 0))
            .expect("valid date")
    );
    assert_eq!(first.utc_end - first.utc_start, chrono::TimeDelta::minutes(30));

    let original = expander
        .try_get_occurrences_between(
            &sealed.original,
            utc(2024, 1, 1, 0),
            utc(2024, 2, 1, 0),
            &mut OccurrenceCache::new(),
        )
        .expect("rule should expand");
    assert_eq!(original, occurrences);
}

#[test_log::test(tokio::test)]
async fn shared_cache_serves_concurrent_queries() {
    let sealed = Sealed::weekly_meeting().await;
    let opened = Arc::new(sealed.open().await.expect("event should open"));
    let cache = Arc::new(Mutex::new(OccurrenceCache::new()));
    let expander = RecurrenceExpander::default();

    let months = [(1, 2), (2, 3), (3, 4)];
    let tasks = months.map(|(from, to)| {
        let opened = Arc::clone(&opened);
        let cache = Arc::clone(&cache);
        tokio::spawn(async move {
            let mut cache = cache.lock().await;
            expander.get_occurrences_between(
                &opened,
                utc(2024, from, 1, 0),
                utc(2024, to, 1, 0),
                &mut cache,
            )
        })
    });

    let mut total = 0;
    for task in tasks {
        total += task.await.expect("task should not panic").len();
    }
    // COUNT=10 from 2024-01-08 ends on 2024-03-11, minus one excluded week.
    assert_eq!(total, 9);
}
