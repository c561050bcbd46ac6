//! Policy decisions
//!
//! Deny reasons name the failed condition only. They never carry document
//! ids or actor ids, so they are safe to show to the caller that was denied.

use serde::Serialize;
use std::fmt;

/// Fields that an update may not change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    /// Document id
    Id,
    /// Donation owner
    OwnerId,
    /// Claim holder
    UserId,
    /// Claimed donation
    DonationId,
}

impl Field {
    /// Document field name
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::OwnerId => "ownerId",
            Field::UserId => "userId",
            Field::DonationId => "donationId",
        }
    }
}

/// Why a request was denied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum DenyReason {
    /// No authenticated actor
    Unauthenticated,
    /// The addressed collection has no rules
    UnknownResource,
    /// The rule table has no row for this collection and operation
    NoMatchingRule,
    /// A document snapshot the operation needs was not supplied
    MissingSnapshot,
    /// The new document names someone other than the actor as its owner
    IdentityMismatch,
    /// The actor neither owns the document nor holds a bypass
    NotOwner,
    /// An update tried to change a field that is fixed for life
    ImmutableField {
        /// The field that changed
        field: Field,
    },
    /// An update moved the status along an edge the lifecycle forbids
    IllegalTransition {
        /// Current status
        from: &'static str,
        /// Requested status
        to: &'static str,
    },
    /// The generated rule program found no matching allow policy
    RuleProgram,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::Unauthenticated => f.write_str("request is not authenticated"),
            DenyReason::UnknownResource => f.write_str("collection has no access rules"),
            DenyReason::NoMatchingRule => f.write_str("no rule grants this operation"),
            DenyReason::MissingSnapshot => f.write_str("document snapshot is missing"),
            DenyReason::IdentityMismatch => {
                f.write_str("document owner must be the authenticated actor")
            }
            DenyReason::NotOwner => f.write_str("actor does not own this document"),
            DenyReason::ImmutableField { field } => {
                write!(f, "field '{}' cannot be changed", field.as_str())
            }
            DenyReason::IllegalTransition { from, to } => {
                write!(f, "status cannot move from '{from}' to '{to}'")
            }
            DenyReason::RuleProgram => f.write_str("no allow policy matched"),
        }
    }
}

/// Outcome of a policy evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    /// The operation may proceed
    Allow,
    /// The operation is refused
    Deny {
        /// The first condition that failed
        reason: DenyReason,
    },
}

impl Decision {
    /// Shorthand for a denial
    pub fn deny(reason: DenyReason) -> Self {
        Decision::Deny { reason }
    }

    /// Whether the operation may proceed
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// The deny reason, if any
    pub fn reason(&self) -> Option<DenyReason> {
        match self {
            Decision::Allow => None,
            Decision::Deny { reason } => Some(*reason),
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Allow => f.write_str("allow"),
            Decision::Deny { reason } => write!(f, "deny: {reason}"),
        }
    }
}
