//! Authenticated actors.

use super::ActorId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of an authenticated actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Lists donations
    Donor,
    /// Claims donations for pickup
    #[serde(alias = "claimant")]
    Recipient,
    /// Operator with override rights
    Admin,
}

impl Role {
    /// Wire name of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Donor => "donor",
            Role::Recipient => "recipient",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An authenticated identity, supplied by the calling context per request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    /// Opaque unique id
    pub id: ActorId,
    /// Role granted by the identity provider
    pub role: Role,
}

impl Actor {
    /// Create an actor
    pub fn new(id: impl Into<ActorId>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }

    /// Create a donor
    pub fn donor(id: impl Into<ActorId>) -> Self {
        Self::new(id, Role::Donor)
    }

    /// Create a recipient
    pub fn recipient(id: impl Into<ActorId>) -> Self {
        Self::new(id, Role::Recipient)
    }

    /// Create an admin
    pub fn admin(id: impl Into<ActorId>) -> Self {
        Self::new(id, Role::Admin)
    }

    /// Whether this actor holds the admin role
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Whether this actor is the given identity
    pub fn is(&self, id: &ActorId) -> bool {
        &self.id == id
    }
}
