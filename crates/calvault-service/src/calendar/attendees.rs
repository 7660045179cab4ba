//! Attendee tokens and the wire/internal attendee conversions.
//!
//! On the wire an attendee carries only its token and `RSVP=TRUE`. The
//! permission bitmask and participation status live in the server's
//! cleartext [`AttendeeClear`] records, correlated by token.

use std::collections::HashMap;

use calvault_core::constants::{
    ATTENDEE_PERMISSIONS_PARAM, ATTENDEE_TOKEN_PARAM, DEFAULT_ATTENDEE_PERMISSIONS,
};
use calvault_rfc::rfc::ical::core::{Component, Parameter, Property};
use sha1::{Digest, Sha1};

use super::card::{AttendeeClear, AttendeeStatus};
use crate::error::{ServiceError, ServiceResult};

/// Derives the correlation token of an attendee.
///
/// Lowercase hex SHA-1 over `uid` followed by `email`.
#[must_use]
pub fn generate_attendee_token(email: &str, uid: &str) -> String {
    hex::encode(
        Sha1::new()
            .chain_update(uid.as_bytes())
            .chain_update(email.as_bytes())
            .finalize(),
    )
}

/// Maps an iCalendar PARTSTAT to the server's status code.
///
/// Anything other than TENTATIVE, ACCEPTED or DECLINED is "needs action".
#[must_use]
pub fn convert_partstat(partstat: Option<&str>) -> AttendeeStatus {
    match partstat.map(str::to_ascii_uppercase).as_deref() {
        Some("TENTATIVE") => AttendeeStatus::Tentative,
        Some("ACCEPTED") => AttendeeStatus::Accepted,
        Some("DECLINED") => AttendeeStatus::Declined,
        _ => AttendeeStatus::NeedsAction,
    }
}

/// Returns the email address of an ATTENDEE or ORGANIZER property.
///
/// The `mailto:` scheme is stripped case-insensitively.
#[must_use]
pub fn attendee_email(attendee: &Property) -> Option<&str> {
    let address = attendee
        .as_cal_address()
        .unwrap_or(attendee.raw_value.as_str())
        .trim();
    let email = match address.get(..7) {
        Some(scheme) if scheme.eq_ignore_ascii_case("mailto:") => &address[7..],
        _ => address,
    };
    (!email.is_empty()).then_some(email)
}

/// ## Summary
/// Converts an internal attendee into its wire form plus the cleartext
/// record the server keeps for it.
///
/// The wire property loses `X-PM-PERMISSIONS` and `PARTSTAT`, keeps an
/// existing `X-PM-TOKEN` or gets a derived one, and is marked `RSVP=TRUE`.
///
/// ## Errors
/// Returns `MissingData` if the attendee has no token and no email address
/// to derive one from.
pub fn from_internal_attendee(
    attendee: &Property,
    uid: &str,
) -> ServiceResult<(Property, AttendeeClear)> {
    let mut wire = attendee.clone();

    let permissions = wire
        .remove_param(ATTENDEE_PERMISSIONS_PARAM)
        .and_then(|p| p.value().map(str::to_string))
        .map_or(DEFAULT_ATTENDEE_PERMISSIONS, |raw| {
            raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(raw = %raw, "Unparseable attendee permissions, using default");
                DEFAULT_ATTENDEE_PERMISSIONS
            })
        });
    let partstat = wire
        .remove_param("PARTSTAT")
        .and_then(|p| p.value().map(str::to_string));

    let token = match attendee.get_param_value(ATTENDEE_TOKEN_PARAM) {
        Some(token) => token.to_string(),
        None => {
            let email = attendee_email(attendee).ok_or_else(|| {
                ServiceError::MissingData("attendee email for token derivation".into())
            })?;
            generate_attendee_token(email, uid)
        }
    };

    wire.set_param(Parameter::new(ATTENDEE_TOKEN_PARAM, token.clone()));
    wire.set_param(Parameter::rsvp(true));

    let clear = AttendeeClear {
        token,
        permissions,
        status: Some(convert_partstat(partstat.as_deref())),
    };
    Ok((wire, clear))
}

/// Attendees restored from the wire, plus how many had no cleartext match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttendeeResolution {
    pub attendees: Vec<Property>,
    pub unresolved: usize,
}

/// Restores internal attendees from wire attendees.
///
/// An attendee whose token exactly matches a cleartext record gets that
/// record's permissions as `X-PM-PERMISSIONS`. Any other attendee is passed
/// through unchanged and counted as unresolved.
#[must_use]
pub fn to_internal_attendee(
    wire_attendees: impl IntoIterator<Item = Property>,
    clear: &[AttendeeClear],
) -> AttendeeResolution {
    let by_token: HashMap<&str, &AttendeeClear> =
        clear.iter().map(|c| (c.token.as_str(), c)).collect();

    let mut resolution = AttendeeResolution::default();
    for mut attendee in wire_attendees {
        let record = attendee
            .get_param_value(ATTENDEE_TOKEN_PARAM)
            .and_then(|token| by_token.get(token).copied());
        match record {
            Some(record) => attendee.set_param(Parameter::new(
                ATTENDEE_PERMISSIONS_PARAM,
                record.permissions.to_string(),
            )),
            None => resolution.unresolved += 1,
        }
        resolution.attendees.push(attendee);
    }

    if resolution.unresolved > 0 {
        tracing::debug!(
            unresolved = resolution.unresolved,
            total = resolution.attendees.len(),
            "Attendees without a cleartext record"
        );
    }
    resolution
}

/// Sets `PARTSTAT` on every attendee listed in `partstats`.
///
/// Keys are email addresses and match case-insensitively. Returns how many
/// attendees were updated.
pub fn modify_attendees_partstat(
    component: &mut Component,
    partstats: &HashMap<String, String>,
) -> usize {
    let lookup: HashMap<String, &str> = partstats
        .iter()
        .map(|(email, partstat)| (email.to_ascii_lowercase(), partstat.as_str()))
        .collect();

    let mut modified = 0;
    for attendee in component
        .properties
        .iter_mut()
        .filter(|p| p.name == "ATTENDEE")
    {
        let partstat = attendee_email(attendee)
            .and_then(|email| lookup.get(&email.to_ascii_lowercase()).copied());
        if let Some(partstat) = partstat {
            attendee.set_param(Parameter::partstat(partstat));
            modified += 1;
        }
    }
    modified
}
