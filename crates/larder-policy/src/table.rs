//! The enumerated rule table
//!
//! One row per (collection, operation). A row names who is granted the
//! operation and which constraints the new document must satisfy. Requests
//! with no row are denied.
//!
//! | Collection | Create | Read | Update | Delete |
//! |---|---|---|---|---|
//! | donation | owner of new doc | any authenticated | owner or admin; owner fixed; legal status move | owner or admin |
//! | claim | holder of new doc | holder, donation owner, or admin | holder or admin; holder and donation fixed; legal status move | holder or admin |
//!
//! Admins bypass ownership and status constraints but never identity ones.

use crate::request::{Operation, ResourceKind};

/// Who an operation is granted to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grant {
    /// Anyone authenticated
    AnyAuthenticated,
    /// The actor named as owner by the proposed document
    ProposedOwner,
    /// The stored document's owner, or an admin
    OwnerOrAdmin,
    /// The claim holder, the owner of the claimed donation, or an admin
    ParticipantOrAdmin,
}

impl Grant {
    /// Whether admins satisfy this grant regardless of ownership
    pub fn admits_admin(&self) -> bool {
        matches!(self, Grant::OwnerOrAdmin | Grant::ParticipantOrAdmin)
    }
}

/// Condition an update must satisfy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// Document id and references stay fixed; binds admins too
    IdentityUnchanged,
    /// Donation owner stays fixed
    OwnerUnchanged,
    /// Status moves only along lifecycle edges
    StatusTransition,
}

impl Constraint {
    /// Whether this constraint also applies to admins
    pub fn binds_admin(&self) -> bool {
        matches!(self, Constraint::IdentityUnchanged)
    }
}

/// One row of the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    /// Collection
    pub kind: ResourceKind,
    /// Operation
    pub operation: Operation,
    /// Who is granted
    pub grant: Grant,
    /// Conditions on the proposed document
    pub constraints: &'static [Constraint],
}

const UPDATE_DONATION: &[Constraint] = &[
    Constraint::IdentityUnchanged,
    Constraint::OwnerUnchanged,
    Constraint::StatusTransition,
];

const UPDATE_CLAIM: &[Constraint] = &[Constraint::IdentityUnchanged, Constraint::StatusTransition];

/// Every rule the engine knows
pub const RULES: &[Rule] = &[
    Rule {
        kind: ResourceKind::Donation,
        operation: Operation::Create,
        grant: Grant::ProposedOwner,
        constraints: &[],
    },
    Rule {
        kind: ResourceKind::Donation,
        operation: Operation::Read,
        grant: Grant::AnyAuthenticated,
        constraints: &[],
    },
    Rule {
        kind: ResourceKind::Donation,
        operation: Operation::Update,
        grant: Grant::OwnerOrAdmin,
        constraints: UPDATE_DONATION,
    },
    Rule {
        kind: ResourceKind::Donation,
        operation: Operation::Delete,
        grant: Grant::OwnerOrAdmin,
        constraints: &[],
    },
    Rule {
        kind: ResourceKind::Claim,
        operation: Operation::Create,
        grant: Grant::ProposedOwner,
        constraints: &[],
    },
    Rule {
        kind: ResourceKind::Claim,
        operation: Operation::Read,
        grant: Grant::ParticipantOrAdmin,
        constraints: &[],
    },
    Rule {
        kind: ResourceKind::Claim,
        operation: Operation::Update,
        grant: Grant::OwnerOrAdmin,
        constraints: UPDATE_CLAIM,
    },
    Rule {
        kind: ResourceKind::Claim,
        operation: Operation::Delete,
        grant: Grant::OwnerOrAdmin,
        constraints: &[],
    },
];

/// Find the row for a collection and operation
pub fn rule_for(kind: ResourceKind, operation: Operation) -> Option<&'static Rule> {
    RULES
        .iter()
        .find(|rule| rule.kind == kind && rule.operation == operation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_pair_has_one_row() {
        for kind in [ResourceKind::Donation, ResourceKind::Claim] {
            for operation in Operation::ALL {
                let rows = RULES
                    .iter()
                    .filter(|r| r.kind == kind && r.operation == operation)
                    .count();
                assert_eq!(rows, 1, "{kind} {operation}");
            }
        }
    }

    #[test]
    fn test_only_updates_carry_constraints() {
        for rule in RULES {
            assert_eq!(
                rule.operation == Operation::Update,
                !rule.constraints.is_empty()
            );
        }
    }
}
