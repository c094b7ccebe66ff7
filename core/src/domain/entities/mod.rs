//! Domain entities

pub mod audit;
pub mod identity;
pub mod token;

pub use audit::{SecurityEvent, SecurityEventKind, Severity};
pub use identity::Identity;
pub use token::{Claims, ClientMetadata, RefreshTokenRecord, TokenPair, TokenType};
