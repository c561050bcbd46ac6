//! Native rule evaluation
//!
//! Walks the matching table row in a fixed order: authentication, snapshot
//! presence, grant, then constraints. The first failing step decides the
//! deny reason. Anything not covered by a row is denied.

use crate::decision::{Decision, DenyReason, Field};
use crate::document::Document;
use crate::errors::{PolicyError, PolicyResult};
use crate::request::{AccessRequest, Operation, Resource};
use crate::table::{self, Constraint, Grant, Rule};
use larder_core::{Actor, ActorId};

/// Evaluate a request against the rule table
pub fn evaluate(request: &AccessRequest) -> Decision {
    let decision = match decide(request) {
        Ok(()) => Decision::Allow,
        Err(reason) => Decision::deny(reason),
    };
    tracing::debug!(
        operation = %request.operation,
        kind = request.resource.kind().map(|k| k.as_str()).unwrap_or("unknown"),
        %decision,
        "Policy evaluated"
    );
    decision
}

/// Evaluate a request, turning a denial into an error
pub fn authorize(request: &AccessRequest) -> PolicyResult<()> {
    match evaluate(request) {
        Decision::Allow => Ok(()),
        Decision::Deny { reason } => Err(PolicyError::Denied(reason)),
    }
}

fn decide(request: &AccessRequest) -> Result<(), DenyReason> {
    let actor = request.actor.as_ref().ok_or(DenyReason::Unauthenticated)?;
    let kind = request.resource.kind().ok_or(DenyReason::UnknownResource)?;
    let rule = table::rule_for(kind, request.operation).ok_or(DenyReason::NoMatchingRule)?;

    match &request.resource {
        Resource::Donation { existing, proposed } => Check {
            rule,
            actor,
            operation: request.operation,
            existing: existing.as_ref(),
            proposed: proposed.as_ref(),
            donation_owner: None,
        }
        .run(),
        Resource::Claim {
            existing,
            proposed,
            donation_owner,
        } => Check {
            rule,
            actor,
            operation: request.operation,
            existing: existing.as_ref(),
            proposed: proposed.as_ref(),
            donation_owner: donation_owner.as_ref(),
        }
        .run(),
        Resource::Unknown => Err(DenyReason::UnknownResource),
    }
}

struct Check<'a, D> {
    rule: &'static Rule,
    actor: &'a Actor,
    operation: Operation,
    existing: Option<&'a D>,
    proposed: Option<&'a D>,
    donation_owner: Option<&'a ActorId>,
}

impl<D: Document> Check<'_, D> {
    fn run(&self) -> Result<(), DenyReason> {
        if (self.operation.needs_existing() && self.existing.is_none())
            || (self.operation.needs_proposed() && self.proposed.is_none())
        {
            return Err(DenyReason::MissingSnapshot);
        }
        self.grant()?;
        for constraint in self.rule.constraints {
            if self.actor.is_admin() && !constraint.binds_admin() {
                continue;
            }
            self.constraint(*constraint)?;
        }
        Ok(())
    }

    fn grant(&self) -> Result<(), DenyReason> {
        let admin = self.rule.grant.admits_admin() && self.actor.is_admin();
        let owns_existing = self
            .existing
            .is_some_and(|doc| self.actor.is(doc.owner()));
        match self.rule.grant {
            Grant::AnyAuthenticated => Ok(()),
            Grant::ProposedOwner => {
                if self.proposed.is_some_and(|doc| self.actor.is(doc.owner())) {
                    Ok(())
                } else {
                    Err(DenyReason::IdentityMismatch)
                }
            }
            Grant::OwnerOrAdmin => {
                if admin || owns_existing {
                    Ok(())
                } else {
                    Err(DenyReason::NotOwner)
                }
            }
            Grant::ParticipantOrAdmin => {
                let owns_donation = self.donation_owner.is_some_and(|id| self.actor.is(id));
                if admin || owns_existing || owns_donation {
                    Ok(())
                } else {
                    Err(DenyReason::NotOwner)
                }
            }
        }
    }

    fn constraint(&self, constraint: Constraint) -> Result<(), DenyReason> {
        let (Some(existing), Some(proposed)) = (self.existing, self.proposed) else {
            return Err(DenyReason::MissingSnapshot);
        };
        match constraint {
            Constraint::IdentityUnchanged => match existing.changed_identity(proposed) {
                Some(field) => Err(DenyReason::ImmutableField { field }),
                None => Ok(()),
            },
            Constraint::OwnerUnchanged => {
                if existing.owner() == proposed.owner() {
                    Ok(())
                } else {
                    Err(DenyReason::ImmutableField {
                        field: Field::OwnerId,
                    })
                }
            }
            Constraint::StatusTransition => {
                if existing.can_become(proposed) {
                    Ok(())
                } else {
                    Err(DenyReason::IllegalTransition {
                        from: existing.status_name(),
                        to: proposed.status_name(),
                    })
                }
            }
        }
    }
}
