//! Shared utilities and common types for the TripSync server
//!
//! This crate provides common functionality used across all server modules:
//! - Configuration types loaded from the environment
//! - API response structures
//! - Common type definitions

pub mod config;
pub mod types;

// Re-export commonly used items at crate root
pub use config::{AuthConfig, ConfigError, DatabaseConfig};
pub use types::response::{ApiResponse, ErrorResponse};
