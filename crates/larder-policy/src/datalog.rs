//! Datalog rendition of the rule table
//!
//! The remote document store evaluates access with Biscuit Datalog. The
//! program is generated from [`RULES`](crate::table::RULES) and the status
//! lifecycle tables, so there is no second hand-maintained copy of the
//! rules. Requests are turned into facts and run against the program with an
//! [`Authorizer`]; a request is allowed only if some `allow` policy matches
//! before the trailing `deny if true;`.
//!
//! Request facts:
//!
//! ```text
//! actor($id)  role($role)  operation($op)  kind($kind)
//! existing_id  existing_owner  existing_status  existing_donation
//! proposed_id  proposed_owner  proposed_status  proposed_donation
//! donation_owner($id)
//! ```

use crate::decision::{Decision, DenyReason};
use crate::document::Document;
use crate::errors::{PolicyError, PolicyResult};
use crate::request::{AccessRequest, Resource, ResourceKind};
use crate::table::{Constraint, Grant, Rule, RULES};
use biscuit_auth::{error, Authorizer, AuthorizerLimits};
use larder_core::{ClaimStatus, DonationStatus};
use std::time::Duration;

const MAX_EVALUATION_TIME: Duration = Duration::from_millis(250);

/// Generated Datalog program for the whole rule table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleProgram {
    source: String,
}

impl RuleProgram {
    /// Render the rule table as Datalog
    pub fn generate() -> Self {
        let mut lines = Vec::new();
        for from in DonationStatus::ALL {
            for to in DonationStatus::ALL {
                if from.can_transition_to(to) {
                    lines.push(transition_fact(ResourceKind::Donation, from.as_str(), to.as_str()));
                }
            }
        }
        for from in ClaimStatus::ALL {
            for to in ClaimStatus::ALL {
                if from.can_transition_to(to) {
                    lines.push(transition_fact(ResourceKind::Claim, from.as_str(), to.as_str()));
                }
            }
        }
        for rule in RULES {
            lines.extend(policies_for(rule));
        }
        lines.push("deny if true;".to_string());
        Self {
            source: lines.join("\n"),
        }
    }

    /// Program text
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Run a request through the program
    pub fn evaluate(&self, request: &AccessRequest) -> PolicyResult<Decision> {
        let mut code = request_facts(request).join("\n");
        code.push('\n');
        code.push_str(&self.source);

        let mut authorizer = Authorizer::new();
        authorizer
            .add_code(code)
            .map_err(|e| PolicyError::rule_program(format!("Failed to load program: {e}")))?;

        let limits = AuthorizerLimits {
            max_time: MAX_EVALUATION_TIME,
            ..Default::default()
        };
        let decision = match authorizer.authorize_with_limits(limits) {
            Ok(_) => Decision::Allow,
            Err(error::Token::FailedLogic(_)) => Decision::deny(DenyReason::RuleProgram),
            Err(e) => return Err(PolicyError::rule_program(e.to_string())),
        };
        tracing::debug!(operation = %request.operation, %decision, "Rule program evaluated");
        Ok(decision)
    }
}

impl Default for RuleProgram {
    fn default() -> Self {
        Self::generate()
    }
}

fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

fn transition_fact(kind: ResourceKind, from: &str, to: &str) -> String {
    format!(
        "transition({}, {}, {});",
        quote(kind.as_str()),
        quote(from),
        quote(to)
    )
}

fn policies_for(rule: &Rule) -> Vec<String> {
    let kind = rule.kind.as_str();
    let mut common = vec![
        format!("kind({})", quote(kind)),
        format!("operation({})", quote(rule.operation.as_str())),
        "actor($actor)".to_string(),
    ];
    if rule.operation.needs_existing() {
        common.push("existing_id($existing)".to_string());
    }
    if rule.operation.needs_proposed() {
        common.push("proposed_id($proposed)".to_string());
    }

    let mut alternatives: Vec<(&str, bool)> = match rule.grant {
        Grant::AnyAuthenticated => vec![("", false)],
        Grant::ProposedOwner => vec![("proposed_owner($actor)", false)],
        Grant::OwnerOrAdmin => vec![("existing_owner($actor)", false)],
        Grant::ParticipantOrAdmin => vec![
            ("existing_owner($actor)", false),
            ("donation_owner($actor)", false),
        ],
    };
    if rule.grant.admits_admin() {
        alternatives.push(("role(\"admin\")", true));
    }

    alternatives
        .into_iter()
        .map(|(grant, admin)| {
            let mut body = common.clone();
            if !grant.is_empty() {
                body.push(grant.to_string());
            }
            for constraint in rule.constraints {
                if admin && !constraint.binds_admin() {
                    continue;
                }
                body.extend(constraint_terms(rule.kind, *constraint));
            }
            format!("allow if {};", body.join(", "))
        })
        .collect()
}

fn constraint_terms(kind: ResourceKind, constraint: Constraint) -> Vec<String> {
    let terms: &[&str] = match (constraint, kind) {
        (Constraint::IdentityUnchanged, ResourceKind::Donation) => {
            &["existing_id($id)", "proposed_id($id)"]
        }
        (Constraint::IdentityUnchanged, ResourceKind::Claim) => &[
            "existing_id($id)",
            "proposed_id($id)",
            "existing_owner($holder)",
            "proposed_owner($holder)",
            "existing_donation($donation)",
            "proposed_donation($donation)",
        ],
        (Constraint::OwnerUnchanged, _) => &["existing_owner($owner)", "proposed_owner($owner)"],
        (Constraint::StatusTransition, _) => &["existing_status($before)", "proposed_status($after)"],
    };
    let mut terms: Vec<String> = terms.iter().map(|t| t.to_string()).collect();
    if constraint == Constraint::StatusTransition {
        terms.push(format!("transition({}, $before, $after)", quote(kind.as_str())));
    }
    terms
}

fn request_facts(request: &AccessRequest) -> Vec<String> {
    let mut facts = vec![format!("operation({});", quote(request.operation.as_str()))];
    if let Some(actor) = &request.actor {
        facts.push(format!("actor({});", quote(actor.id.as_str())));
        facts.push(format!("role({});", quote(actor.role.as_str())));
    }
    match &request.resource {
        Resource::Donation { existing, proposed } => {
            facts.push(format!("kind({});", quote(ResourceKind::Donation.as_str())));
            document_facts(&mut facts, "existing", existing.as_ref());
            document_facts(&mut facts, "proposed", proposed.as_ref());
        }
        Resource::Claim {
            existing,
            proposed,
            donation_owner,
        } => {
            facts.push(format!("kind({});", quote(ResourceKind::Claim.as_str())));
            document_facts(&mut facts, "existing", existing.as_ref());
            document_facts(&mut facts, "proposed", proposed.as_ref());
            if let Some(owner) = donation_owner {
                facts.push(format!("donation_owner({});", quote(owner.as_str())));
            }
        }
        Resource::Unknown => facts.push("kind(\"unknown\");".to_string()),
    }
    facts
}

fn document_facts<D: Document>(facts: &mut Vec<String>, prefix: &str, doc: Option<&D>) {
    let Some(doc) = doc else { return };
    facts.push(format!("{prefix}_id({});", quote(doc.document_id())));
    facts.push(format!("{prefix}_owner({});", quote(doc.owner().as_str())));
    facts.push(format!("{prefix}_status({});", quote(doc.status_name())));
    if let Some(donation) = doc.donation_ref() {
        facts.push(format!("{prefix}_donation({});", quote(donation.as_str())));
    }
}
