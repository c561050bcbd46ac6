//! Domain types: actors, donations, claims and their identifiers

mod actor;
mod claim;
mod donation;
mod identifiers;

pub use actor::{Actor, Role};
pub use claim::{Claim, ClaimStatus};
pub use donation::{Donation, DonationStatus};
pub use identifiers::{ActorId, ClaimId, DonationId};
