//! calvault - integration test support.
//!
//! Re-exports the workspace crates and provides a deterministic stand-in
//! for the cryptographic capability, so envelopes can be sealed and opened
//! end to end without a real OpenPGP backend.

pub mod fixtures;
pub mod mock;

pub mod component {
    pub use calvault_core::{config, constants};
    pub use calvault_service::*;
}

pub use calvault_rfc as rfc;
