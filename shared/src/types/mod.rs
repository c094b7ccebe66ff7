//! Type definitions shared between layers

pub mod response;

pub use response::{ApiResponse, ErrorResponse};
