//! # Larder Policy - Resource Access Policy Engine
//!
//! **Purpose**: Decide whether an actor may create, read, update or delete a
//! donation or claim document.
//!
//! The decision is a pure function of the authenticated actor, the document
//! before and after the mutation, and the requested operation. Rules live in
//! one enumerated table ([`table::RULES`]); anything the table does not name
//! is denied. The same table is rendered as a Biscuit Datalog program
//! ([`RuleProgram`]) for the remote store's rule-evaluation hook, and both
//! renditions must agree on every request.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Deny reasons and decisions
pub mod decision;

/// Kind-neutral view over donations and claims
mod document;

/// Policy error types
pub mod errors;

/// Native rule evaluation
pub mod evaluation;

/// Datalog rendition of the rule table
pub mod datalog;

/// Access requests
pub mod request;

/// The enumerated rule table
pub mod table;

pub use datalog::RuleProgram;
pub use decision::{Decision, DenyReason, Field};
pub use errors::{PolicyError, PolicyResult};
pub use evaluation::{authorize, evaluate};
pub use request::{AccessRequest, Operation, Resource, ResourceKind};
