//! Repository interfaces for persistence collaborators
//!
//! Concrete database implementations live in the infrastructure crate; this
//! layer only defines the contracts plus in-memory implementations used by
//! tests and local development.

pub mod audit;
pub mod identity;
pub mod token;

pub use audit::{AuditLogRepository, InMemoryAuditLogRepository, NoopAuditLogRepository};
pub use identity::{IdentityRepository, InMemoryIdentityRepository};
pub use token::{InMemoryTokenStore, TokenStore};
