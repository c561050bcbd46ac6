//! # Larder Core - Foundation
//!
//! **Purpose**: Domain types, the unified error type, time handling and the
//! value serializer shared by the policy engine and the claim store.
//!
//! # Architecture Constraints
//!
//! - YES Donation, claim and actor types with their status tables
//! - YES Canonical timestamp text and the sanitize / wire transforms
//! - YES Configuration loading helpers
//! - NO authorization decisions (that's larder-policy)
//! - NO persistence or remote I/O (that's larder-store)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Configuration loading and validation helpers
pub mod config;

/// Unified error type
pub mod errors;

/// Value model with sanitize, wire and rehydrate transforms
pub mod serialization;

/// Canonical timestamps and clocks
pub mod time;

/// Actors, donations, claims and identifiers
pub mod types;

pub use config::{load_toml, ConfigValidation};
pub use errors::{LarderError, Result};
pub use serialization::{rehydrate, sanitize, sanitize_str, to_wire, Opaque, Value};
pub use time::{Clock, SystemClock, Timestamp};
pub use types::{
    Actor, ActorId, Claim, ClaimId, ClaimStatus, Donation, DonationId, DonationStatus, Role,
};
