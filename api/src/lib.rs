//! # API Layer
//!
//! HTTP-facing pieces of the authentication subsystem: the request
//! authenticator middleware that gates routes on a verified access token,
//! and the extractors handlers use to read the resolved identity.
//!
//! Handlers and route wiring live with the application crates; this crate
//! only provides the authentication seam.

pub mod middleware;

pub use middleware::auth::{AuthContext, AuthGateway, OptionalAuth, SessionAuth};
