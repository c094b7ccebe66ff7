//! # TripSync Core
//!
//! Core domain layer for the TripSync backend. This crate contains the
//! authentication session lifecycle: token entities, the stateless token
//! codec, the session service orchestrating issuance/rotation/revocation,
//! repository interfaces, and error types.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::*;
pub use errors::*;
pub use repositories::*;
pub use services::*;
