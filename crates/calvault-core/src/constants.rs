/// Attendee parameter carrying the correlation token shared with the server.
pub const ATTENDEE_TOKEN_PARAM: &str = "X-PM-TOKEN";
/// Attendee parameter carrying the permission bitmask. Never sent on the wire.
pub const ATTENDEE_PERMISSIONS_PARAM: &str = "X-PM-PERMISSIONS";

/// Attendee permission bits.
pub mod permissions {
    pub const SEE: u32 = 1;
    pub const INVITE: u32 = 2;
    pub const SEE_AND_INVITE: u32 = SEE | INVITE;
    pub const EDIT: u32 = 4;
    pub const DELETE: u32 = 8;
}

/// Permissions granted to an attendee that carries no explicit annotation.
pub const DEFAULT_ATTENDEE_PERMISSIONS: u32 = permissions::SEE;

/// Padding applied on both sides of a recurrence query before re-expanding.
pub const DEFAULT_RECURRENCE_MARGIN_DAYS: u32 = 365;

/// Upper bound on generated instances per expansion.
pub const DEFAULT_RECURRENCE_MAX_INSTANCES: u32 = 100_000;

/// PRODID written on every serialized card.
pub const CALENDAR_PROD_ID: &str = "-//calvault//calendar envelope//EN";
