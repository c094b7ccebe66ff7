//! Identity entity referenced by token operations.
//!
//! User management is owned by a separate collaborator; the session core only
//! needs the fields that become claims, referenced by value.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims-level view of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Opaque user identifier
    pub id: Uuid,

    /// Email address carried as a claim
    pub email: String,

    /// Optional username carried as a claim
    pub username: Option<String>,
}

impl Identity {
    pub fn new(id: Uuid, email: impl Into<String>, username: Option<String>) -> Self {
        Self {
            id,
            email: email.into(),
            username,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_construction() {
        let id = Uuid::new_v4();
        let identity = Identity::new(id, "ada@example.com", Some("ada".to_string()));

        assert_eq!(identity.id, id);
        assert_eq!(identity.email, "ada@example.com");
        assert_eq!(identity.username.as_deref(), Some("ada"));
    }
}
