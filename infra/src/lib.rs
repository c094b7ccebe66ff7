//! # Infrastructure Layer
//!
//! MySQL-backed implementations of the persistence traits defined in
//! `ts_core`: the token store, the identity repository, and the security
//! audit sink. Connection pooling is managed here and injected into the
//! repository implementations.

pub mod database;

pub use database::connection::DatabasePool;
pub use database::mysql::{MySqlAuditLogRepository, MySqlIdentityRepository, MySqlTokenStore};
