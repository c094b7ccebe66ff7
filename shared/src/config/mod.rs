//! Configuration module with business-specific sub-modules
//!
//! Configuration is organized into logical areas:
//! - `auth` - Token signing and session lifetime configuration
//! - `database` - MySQL connection pool configuration

pub mod auth;
pub mod database;

pub use auth::{AuthConfig, ConfigError};
pub use database::DatabaseConfig;
