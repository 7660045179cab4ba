//! Answering invitations on behalf of one of the user's addresses.

use std::collections::HashMap;

use calvault_rfc::rfc::ical::core::Component;

use super::attendees::{attendee_email, modify_attendees_partstat};
use crate::error::{ServiceError, ServiceResult};

/// Who is answering, and into which calendar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvitationContext {
    pub calendar_id: Option<String>,
    pub member_id: Option<String>,
    pub address_id: Option<String>,
}

impl InvitationContext {
    /// ## Summary
    /// Checks that every identifier an answer needs is present.
    ///
    /// ## Errors
    /// Returns `MissingData` naming the first absent identifier.
    pub fn validate(&self) -> ServiceResult<()> {
        let missing = [
            ("calendar id", &self.calendar_id),
            ("member id", &self.member_id),
            ("address id", &self.address_id),
        ]
        .into_iter()
        .find(|(_, value)| value.as_deref().is_none_or(str::is_empty));

        match missing {
            Some((name, _)) => Err(ServiceError::MissingData(name.to_string())),
            None => Ok(()),
        }
    }
}

/// ## Summary
/// Returns a copy of `component` in which the attendee with `email` has
/// answered with `partstat`.
///
/// ## Errors
/// Returns `MissingData` if the context is incomplete or `email` is not an
/// attendee of the event.
pub fn prepare_invitation_response(
    component: &Component,
    context: &InvitationContext,
    email: &str,
    partstat: &str,
) -> ServiceResult<Component> {
    context.validate()?;

    let is_attendee = component
        .attendees()
        .into_iter()
        .filter_map(attendee_email)
        .any(|candidate| candidate.eq_ignore_ascii_case(email));
    if !is_attendee {
        return Err(ServiceError::MissingData(format!("attendee {email}")));
    }

    let mut answered = component.clone();
    let updates = HashMap::from([(email.to_string(), partstat.to_string())]);
    modify_attendees_partstat(&mut answered, &updates);
    tracing::debug!(partstat, uid = answered.uid().unwrap_or_default(), "Prepared invitation answer");
    Ok(answered)
}
