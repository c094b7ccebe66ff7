pub mod r#trait {
    pub use super::trait_::*;
}
#[path = "trait.rs"]
mod trait_;

pub mod memory;
pub mod noop;

pub use memory::InMemoryAuditLogRepository;
pub use noop::NoopAuditLogRepository;
pub use r#trait::AuditLogRepository;
