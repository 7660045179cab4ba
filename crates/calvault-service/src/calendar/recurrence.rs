//! Expansion of recurring events into concrete occurrences.
//!
//! The rule is evaluated on "fake UTC" values: the event's local wall clock
//! tagged as UTC. This keeps daylight saving transitions from shifting the
//! wall-clock time of later occurrences. Each occurrence is converted back
//! to a real instant through the DTSTART timezone.

use std::collections::HashSet;

use calvault_core::config::RecurrenceConfig;
use calvault_core::constants::{DEFAULT_RECURRENCE_MARGIN_DAYS, DEFAULT_RECURRENCE_MAX_INSTANCES};
use calvault_rfc::error::RfcError;
use calvault_rfc::rfc::ical::core::{
    Component, Date, DateTime as IcalDateTime, DateTimeForm, Property, RRule as IcalRRule,
    RRuleUntil, Value,
};
use calvault_rfc::rfc::ical::expand::{
    ConversionError, TimeZoneResolver, convert_from_utc, convert_to_utc, datetime_to_utc,
};
use calvault_rfc::rfc::ical::parse::parse_rrule;
use chrono::{DateTime, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use rrule::{RRule, RRuleSet, Tz, Unvalidated};

use crate::error::{ServiceError, ServiceResult};

/// One materialized occurrence of an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    /// Wall-clock start in the DTSTART timezone.
    pub local_start: NaiveDateTime,
    /// Wall-clock end. For all-day events this is the last day, inclusive.
    pub local_end: NaiveDateTime,
    pub utc_start: DateTime<Utc>,
    pub utc_end: DateTime<Utc>,
    /// 1-based position in the rule's sequence, counting excluded dates.
    pub occurrence_number: u32,
}

/// Where wall-clock values live.
#[derive(Debug, Clone, PartialEq, Eq)]
enum StartZone {
    /// UTC, floating or all-day: wall clock and instant coincide.
    Utc,
    Zoned(String),
}

/// Length of each occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OccurrenceLength {
    /// All-day events, counted in calendar days beyond the first.
    Days(i64),
    Timed(TimeDelta),
}

impl OccurrenceLength {
    fn end_of(self, local_start: NaiveDateTime) -> NaiveDateTime {
        match self {
            Self::Days(days) => local_start + TimeDelta::days(days),
            Self::Timed(duration) => local_start + duration,
        }
    }
}

/// Everything derived once from the component.
#[derive(Debug, Clone)]
struct NormalizedRecurrence {
    zone: StartZone,
    local_start: NaiveDateTime,
    utc_start: DateTime<Utc>,
    length: OccurrenceLength,
    /// Rule text with UNTIL rewritten to fake UTC; `None` if not recurring.
    rule: Option<String>,
    exdates: HashSet<NaiveDateTime>,
}

impl NormalizedRecurrence {
    fn to_utc(
        &self,
        local: NaiveDateTime,
        resolver: &mut TimeZoneResolver,
    ) -> Result<DateTime<Utc>, ConversionError> {
        match &self.zone {
            StartZone::Utc => Ok(local.and_utc()),
            StartZone::Zoned(tzid) => convert_to_utc(local, tzid, resolver),
        }
    }
}

/// Occurrences computed for a padded interval.
#[derive(Debug, Clone)]
struct IterationState {
    interval_start: DateTime<Utc>,
    interval_end: DateTime<Utc>,
    occurrences: Vec<Occurrence>,
}

impl IterationState {
    fn covers(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start >= self.interval_start && end <= self.interval_end
    }
}

/// Reusable expansion state for one component.
///
/// Only ever a performance aid: dropping or clearing it never changes
/// results. The cache must not be shared between components. It needs
/// exclusive access; callers sharing one across tasks wrap it in a
/// `tokio::sync::Mutex`.
#[derive(Debug, Default)]
pub struct OccurrenceCache {
    start: Option<NormalizedRecurrence>,
    iteration: Option<IterationState>,
}

impl OccurrenceCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets everything, e.g. after the component changed.
    pub fn clear(&mut self) {
        self.start = None;
        self.iteration = None;
    }
}

/// Returns whether the component carries a recurrence rule.
#[must_use]
pub fn is_recurring(component: &Component) -> bool {
    component.has_property("RRULE")
}

/// Expands components into occurrences over query intervals.
#[derive(Debug, Clone, Copy)]
pub struct RecurrenceExpander {
    margin: TimeDelta,
    max_instances: usize,
}

impl Default for RecurrenceExpander {
    fn default() -> Self {
        Self::from_config(&RecurrenceConfig {
            margin_days: DEFAULT_RECURRENCE_MARGIN_DAYS,
            max_instances: DEFAULT_RECURRENCE_MAX_INSTANCES,
        })
    }
}

impl RecurrenceExpander {
    #[must_use]
    pub fn from_config(config: &RecurrenceConfig) -> Self {
        Self {
            margin: TimeDelta::days(i64::from(config.margin_days)),
            max_instances: usize::try_from(config.max_instances).unwrap_or(usize::MAX),
        }
    }

    /// ## Summary
    /// Returns the occurrences of `component` intersecting `[start, end]`,
    /// in rule order.
    ///
    /// Failures are logged and produce an empty list.
    #[must_use]
    pub fn get_occurrences_between(
        &self,
        component: &Component,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        cache: &mut OccurrenceCache,
    ) -> Vec<Occurrence> {
        self.try_get_occurrences_between(component, start, end, cache)
            .unwrap_or_else(|error| {
                tracing::warn!(
                    uid = component.uid().unwrap_or_default(),
                    %error,
                    "Failed to expand recurrence, showing no occurrences"
                );
                Vec::new()
            })
    }

    /// ## Summary
    /// Returns the occurrences of `component` intersecting `[start, end]`,
    /// in rule order.
    ///
    /// The cache is reused when it already covers the query and rebuilt over
    /// the query padded by the configured margin otherwise.
    ///
    /// ## Errors
    /// Returns an error if DTSTART is missing or unusable, a timezone cannot
    /// be resolved, the rule does not evaluate, or the expansion exceeds the
    /// instance limit. The cache is left without iteration state then.
    pub fn try_get_occurrences_between(
        &self,
        component: &Component,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        cache: &mut OccurrenceCache,
    ) -> ServiceResult<Vec<Occurrence>> {
        let normalized = match cache.start.take() {
            Some(normalized) => normalized,
            None => normalize(component)?,
        };
        let normalized = cache.start.insert(normalized);

        if normalized.utc_start > end {
            return Ok(Vec::new());
        }

        let covered = cache
            .iteration
            .as_ref()
            .is_some_and(|iteration| iteration.covers(start, end));
        if covered {
            tracing::trace!("Recurrence cache hit");
        } else {
            cache.iteration = None;
            let iteration = self.expand(normalized, start - self.margin, end + self.margin)?;
            tracing::debug!(
                interval_start = %iteration.interval_start,
                interval_end = %iteration.interval_end,
                cached = iteration.occurrences.len(),
                "Expanded recurrence"
            );
            cache.iteration = Some(iteration);
        }

        Ok(cache
            .iteration
            .as_ref()
            .map(|iteration| {
                iteration
                    .occurrences
                    .iter()
                    .filter(|o| o.utc_start <= end && o.utc_end >= start)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn expand(
        &self,
        normalized: &NormalizedRecurrence,
        interval_start: DateTime<Utc>,
        interval_end: DateTime<Utc>,
    ) -> ServiceResult<IterationState> {
        let mut resolver = TimeZoneResolver::new();
        let mut state = IterationState {
            interval_start,
            interval_end,
            occurrences: Vec::new(),
        };

        let Some(rule) = &normalized.rule else {
            let occurrence = make_occurrence(normalized, normalized.local_start, 1, &mut resolver)?;
            if occurrence.utc_start <= interval_end && occurrence.utc_end >= interval_start {
                state.occurrences.push(occurrence);
            }
            return Ok(state);
        };

        let set = build_rule_set(rule, normalized.local_start)?;
        // Wall clocks never drift more than a day from UTC.
        let skip_before = interval_start.naive_utc() - TimeDelta::days(1);
        for (index, instance) in (&set).into_iter().enumerate() {
            let local_start = instance.naive_utc();
            if normalized.exdates.contains(&local_start)
                || normalized.length.end_of(local_start) < skip_before
            {
                continue;
            }

            let occurrence_number = u32::try_from(index + 1).unwrap_or(u32::MAX);
            let occurrence =
                make_occurrence(normalized, local_start, occurrence_number, &mut resolver)?;
            if occurrence.utc_start > interval_end {
                break;
            }
            if occurrence.utc_end < interval_start {
                continue;
            }
            if state.occurrences.len() >= self.max_instances {
                return Err(ServiceError::RecurrenceError(format!(
                    "more than {} instances between {interval_start} and {interval_end}",
                    self.max_instances
                )));
            }
            state.occurrences.push(occurrence);
        }

        Ok(state)
    }
}

/// ## Summary
/// Returns the occurrences of `component` intersecting `[start, end]` with
/// the default margin and instance limit.
///
/// Failures are logged and produce an empty list.
#[must_use]
pub fn get_occurrences_between(
    component: &Component,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    cache: &mut OccurrenceCache,
) -> Vec<Occurrence> {
    RecurrenceExpander::default().get_occurrences_between(component, start, end, cache)
}

fn make_occurrence(
    normalized: &NormalizedRecurrence,
    local_start: NaiveDateTime,
    occurrence_number: u32,
    resolver: &mut TimeZoneResolver,
) -> ServiceResult<Occurrence> {
    let local_end = normalized.length.end_of(local_start);
    let utc_start = normalized
        .to_utc(local_start, resolver)
        .map_err(RfcError::from)?;
    let utc_end = normalized
        .to_utc(local_end, resolver)
        .map_err(RfcError::from)?;
    Ok(Occurrence {
        local_start,
        local_end,
        utc_start,
        utc_end,
        occurrence_number,
    })
}

fn build_rule_set(rule: &str, local_start: NaiveDateTime) -> ServiceResult<RRuleSet> {
    let rrule = rule
        .parse::<RRule<Unvalidated>>()
        .map_err(|err| ServiceError::RecurrenceError(err.to_string()))?;
    rrule
        .build(local_start.and_utc().with_timezone(&Tz::UTC))
        .map_err(|err| ServiceError::RecurrenceError(err.to_string()))
}

fn midnight(date: Date) -> ServiceResult<NaiveDateTime> {
    date.to_naive()
        .map(|d| d.and_time(NaiveTime::MIN))
        .ok_or_else(|| ServiceError::RecurrenceError(format!("invalid date {date}")))
}

fn naive_of(value: &IcalDateTime) -> ServiceResult<NaiveDateTime> {
    value
        .to_naive()
        .ok_or_else(|| ServiceError::RecurrenceError(format!("invalid date-time {value}")))
}

/// Reads a DATE-TIME as wall clock in `zone`.
fn wall_clock_in(
    value: &IcalDateTime,
    zone: &StartZone,
    resolver: &mut TimeZoneResolver,
) -> ServiceResult<NaiveDateTime> {
    match (&value.form, zone) {
        (DateTimeForm::Floating, _) | (DateTimeForm::Utc, StartZone::Utc) => naive_of(value),
        (DateTimeForm::Zoned { tzid }, StartZone::Zoned(start_tzid)) if tzid == start_tzid => {
            naive_of(value)
        }
        (_, StartZone::Utc) => Ok(datetime_to_utc(value, resolver)
            .map_err(RfcError::from)?
            .naive_utc()),
        (_, StartZone::Zoned(start_tzid)) => {
            let instant = datetime_to_utc(value, resolver).map_err(RfcError::from)?;
            convert_from_utc(instant, start_tzid, resolver)
                .map_err(RfcError::from)
                .map_err(ServiceError::from)
        }
    }
}

fn normalize(component: &Component) -> ServiceResult<NormalizedRecurrence> {
    let mut resolver = TimeZoneResolver::new();

    let dtstart = component
        .get_property("DTSTART")
        .ok_or_else(|| ServiceError::RecurrenceError("missing DTSTART".into()))?;

    let (zone, local_start, utc_start, length) = match &dtstart.value {
        Value::Date(date) => {
            let local_start = midnight(*date)?;
            let days = all_day_length(component.get_property("DTEND"), local_start)?;
            (
                StartZone::Utc,
                local_start,
                local_start.and_utc(),
                OccurrenceLength::Days(days),
            )
        }
        Value::DateTime(value) => {
            let zone = value
                .tzid()
                .map_or(StartZone::Utc, |tzid| StartZone::Zoned(tzid.to_string()));
            let local_start = naive_of(value)?;
            let utc_start = datetime_to_utc(value, &mut resolver).map_err(RfcError::from)?;
            let duration = timed_length(component.get_property("DTEND"), utc_start, &mut resolver)?;
            (zone, local_start, utc_start, OccurrenceLength::Timed(duration))
        }
        _ => {
            return Err(ServiceError::RecurrenceError(
                "DTSTART is neither DATE nor DATE-TIME".into(),
            ));
        }
    };

    let rule = match component.get_property("RRULE") {
        Some(property) => Some(rule_text(property, &zone, &mut resolver)?),
        None => None,
    };

    let all_day = matches!(length, OccurrenceLength::Days(_));
    let exdates = exception_dates(component, &zone, all_day, &mut resolver)?;

    tracing::trace!(
        %local_start,
        %utc_start,
        all_day,
        recurring = rule.is_some(),
        exdates = exdates.len(),
        "Normalized recurrence"
    );

    Ok(NormalizedRecurrence {
        zone,
        local_start,
        utc_start,
        length,
        rule,
        exdates,
    })
}

/// DTEND of an all-day event is exclusive; the length counts days after
/// the first.
fn all_day_length(dtend: Option<&Property>, local_start: NaiveDateTime) -> ServiceResult<i64> {
    let end = match dtend.map(|p| &p.value) {
        Some(Value::Date(date)) => midnight(*date)?,
        Some(Value::DateTime(value)) => naive_of(value)?.date().and_time(NaiveTime::MIN),
        _ => return Ok(0),
    };
    let last_day = end - TimeDelta::days(1);
    Ok((last_day - local_start).num_days().max(0))
}

/// Whole minutes between DTSTART and DTEND, never negative.
fn timed_length(
    dtend: Option<&Property>,
    utc_start: DateTime<Utc>,
    resolver: &mut TimeZoneResolver,
) -> ServiceResult<TimeDelta> {
    let utc_end = match dtend.map(|p| &p.value) {
        Some(Value::DateTime(value)) => datetime_to_utc(value, resolver).map_err(RfcError::from)?,
        Some(Value::Date(date)) => midnight(*date)?.and_utc(),
        _ => utc_start,
    };
    let minutes = (utc_end.max(utc_start) - utc_start).num_minutes();
    Ok(TimeDelta::minutes(minutes))
}

/// Rule text for the rule engine, with UNTIL moved into fake UTC.
fn rule_text(
    property: &Property,
    zone: &StartZone,
    resolver: &mut TimeZoneResolver,
) -> ServiceResult<String> {
    let mut rule: IcalRRule = match &property.value {
        Value::Recur(rule) => (**rule).clone(),
        _ => parse_rrule(&property.raw_value, 0, 0).map_err(RfcError::from)?,
    };

    let until = match &rule.until {
        Some(RRuleUntil::Date(date)) => Some(midnight(*date)? + TimeDelta::seconds(86_399)),
        Some(RRuleUntil::DateTime(value)) => Some(wall_clock_in(value, zone, resolver)?),
        None => None,
    };
    if let Some(until) = until {
        let fake = IcalDateTime::from_naive(until, DateTimeForm::Utc)
            .ok_or_else(|| ServiceError::RecurrenceError(format!("UNTIL out of range: {until}")))?;
        rule.until = Some(RRuleUntil::DateTime(fake));
    }

    Ok(rule.to_string())
}

fn exception_dates(
    component: &Component,
    zone: &StartZone,
    all_day: bool,
    resolver: &mut TimeZoneResolver,
) -> ServiceResult<HashSet<NaiveDateTime>> {
    let mut exdates = HashSet::new();
    for property in component.get_properties("EXDATE") {
        match &property.value {
            Value::Date(date) => {
                exdates.insert(midnight(*date)?);
            }
            Value::DateList(dates) => {
                for date in dates {
                    exdates.insert(midnight(*date)?);
                }
            }
            Value::DateTime(value) => {
                exdates.insert(wall_clock_in(value, zone, resolver)?);
            }
            Value::DateTimeList(values) => {
                for value in values {
                    exdates.insert(wall_clock_in(value, zone, resolver)?);
                }
            }
            _ => tracing::debug!(raw = %property.raw_value, "Ignoring unsupported EXDATE value"),
        }
    }

    if all_day {
        exdates = exdates
            .into_iter()
            .map(|dt| dt.date().and_time(NaiveTime::MIN))
            .collect();
    }
    Ok(exdates)
}
