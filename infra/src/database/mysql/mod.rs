//! MySQL repository implementations

mod audit_repository_impl;
mod identity_repository_impl;
mod token_store_impl;

pub use audit_repository_impl::MySqlAuditLogRepository;
pub use identity_repository_impl::MySqlIdentityRepository;
pub use token_store_impl::MySqlTokenStore;
