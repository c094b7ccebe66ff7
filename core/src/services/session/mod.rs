//! Session lifecycle services
//!
//! This module owns the authentication session lifecycle:
//! - Stateless JWT signing and verification (codec)
//! - Token-pair issuance, verification, rotation, and revocation (service)
//! - Periodic cleanup of expired refresh token records
//! - Injectable clock and immutable configuration

mod cleanup;
mod clock;
mod codec;
mod config;
mod service;

#[cfg(test)]
mod tests;

pub use cleanup::{SessionCleanupConfig, SessionCleanupService};
pub use clock::{Clock, FixedClock, SystemClock};
pub use codec::{SignRequest, SignedToken, TokenCodec};
pub use config::{Lifetime, SessionConfig};
pub use service::{SessionService, TokenRefreshResult, REASON_FAILED_ROTATION, REASON_ROTATION};
