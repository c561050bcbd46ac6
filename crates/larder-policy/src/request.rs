//! Access requests
//!
//! A request pairs the authenticated actor (if any) with an operation and
//! the document snapshots involved. Snapshots follow the remote store's
//! conventions: `existing` is the stored document before the operation,
//! `proposed` is the document as it would be after it.

use larder_core::{Actor, ActorId, Claim, Donation};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Document operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Create a new document
    Create,
    /// Read a stored document
    Read,
    /// Replace a stored document
    Update,
    /// Remove a stored document
    Delete,
}

impl Operation {
    /// Every operation
    pub const ALL: [Operation; 4] = [
        Operation::Create,
        Operation::Read,
        Operation::Update,
        Operation::Delete,
    ];

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }

    /// Whether this operation needs the stored document
    pub fn needs_existing(&self) -> bool {
        !matches!(self, Operation::Create)
    }

    /// Whether this operation needs the post-operation document
    pub fn needs_proposed(&self) -> bool {
        matches!(self, Operation::Create | Operation::Update)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Collections the rule table knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// The `donations` collection
    Donation,
    /// The `claims` collection
    Claim,
}

impl ResourceKind {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Donation => "donation",
            ResourceKind::Claim => "claim",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Document snapshots addressed by a request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Resource {
    /// A donation document
    Donation {
        /// Stored document before the operation
        #[serde(default)]
        existing: Option<Donation>,
        /// Document after the operation
        #[serde(default)]
        proposed: Option<Donation>,
    },
    /// A claim document
    Claim {
        /// Stored document before the operation
        #[serde(default)]
        existing: Option<Claim>,
        /// Document after the operation
        #[serde(default)]
        proposed: Option<Claim>,
        /// Owner of the claimed donation, when the caller looked it up
        #[serde(default, rename = "donationOwner")]
        donation_owner: Option<ActorId>,
    },
    /// Any collection without rules
    #[serde(other)]
    Unknown,
}

impl Resource {
    /// The collection addressed, `None` for unknown collections
    pub fn kind(&self) -> Option<ResourceKind> {
        match self {
            Resource::Donation { .. } => Some(ResourceKind::Donation),
            Resource::Claim { .. } => Some(ResourceKind::Claim),
            Resource::Unknown => None,
        }
    }
}

/// A single authorization question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessRequest {
    /// Authenticated actor; `None` for anonymous callers
    #[serde(default)]
    pub actor: Option<Actor>,
    /// Requested operation
    pub operation: Operation,
    /// Addressed document
    pub resource: Resource,
}

impl AccessRequest {
    /// Build a request from its parts
    pub fn new(actor: Option<Actor>, operation: Operation, resource: Resource) -> Self {
        Self {
            actor,
            operation,
            resource,
        }
    }

    /// Create a donation
    pub fn create_donation(actor: &Actor, proposed: Donation) -> Self {
        Self::donation(actor, Operation::Create, None, Some(proposed))
    }

    /// Read a donation
    pub fn read_donation(actor: &Actor, existing: Donation) -> Self {
        Self::donation(actor, Operation::Read, Some(existing), None)
    }

    /// Replace a donation
    pub fn update_donation(actor: &Actor, existing: Donation, proposed: Donation) -> Self {
        Self::donation(actor, Operation::Update, Some(existing), Some(proposed))
    }

    /// Delete a donation
    pub fn delete_donation(actor: &Actor, existing: Donation) -> Self {
        Self::donation(actor, Operation::Delete, Some(existing), None)
    }

    /// Create a claim
    pub fn create_claim(actor: &Actor, proposed: Claim) -> Self {
        Self::claim(actor, Operation::Create, None, Some(proposed), None)
    }

    /// Read a claim, optionally naming the owner of the claimed donation
    pub fn read_claim(actor: &Actor, existing: Claim, donation_owner: Option<ActorId>) -> Self {
        Self::claim(actor, Operation::Read, Some(existing), None, donation_owner)
    }

    /// Replace a claim
    pub fn update_claim(actor: &Actor, existing: Claim, proposed: Claim) -> Self {
        Self::claim(actor, Operation::Update, Some(existing), Some(proposed), None)
    }

    /// Delete a claim
    pub fn delete_claim(actor: &Actor, existing: Claim) -> Self {
        Self::claim(actor, Operation::Delete, Some(existing), None, None)
    }

    /// Same request without an authenticated actor
    pub fn anonymous(mut self) -> Self {
        self.actor = None;
        self
    }

    fn donation(
        actor: &Actor,
        operation: Operation,
        existing: Option<Donation>,
        proposed: Option<Donation>,
    ) -> Self {
        Self::new(
            Some(actor.clone()),
            operation,
            Resource::Donation { existing, proposed },
        )
    }

    fn claim(
        actor: &Actor,
        operation: Operation,
        existing: Option<Claim>,
        proposed: Option<Claim>,
        donation_owner: Option<ActorId>,
    ) -> Self {
        Self::new(
            Some(actor.clone()),
            operation,
            Resource::Claim {
                existing,
                proposed,
                donation_owner,
            },
        )
    }
}
