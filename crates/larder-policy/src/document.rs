//! Kind-neutral view over donations and claims

use crate::decision::Field;
use larder_core::{ActorId, Claim, Donation, DonationId};

/// What the evaluator needs to know about a document
pub(crate) trait Document {
    /// Stable document id
    fn document_id(&self) -> &str;

    /// Actor the document belongs to (donor for donations, holder for claims)
    fn owner(&self) -> &ActorId;

    /// Status wire name
    fn status_name(&self) -> &'static str;

    /// Claimed donation, for documents that reference one
    fn donation_ref(&self) -> Option<&DonationId>;

    /// Whether the lifecycle allows moving from this status to `next`'s
    fn can_become(&self, next: &Self) -> bool;

    /// First field fixed for life that differs in `next`
    fn changed_identity(&self, next: &Self) -> Option<Field>;
}

impl Document for Donation {
    fn document_id(&self) -> &str {
        self.id.as_str()
    }

    fn owner(&self) -> &ActorId {
        &self.owner_id
    }

    fn status_name(&self) -> &'static str {
        self.status.as_str()
    }

    fn donation_ref(&self) -> Option<&DonationId> {
        None
    }

    fn can_become(&self, next: &Self) -> bool {
        self.status.can_transition_to(next.status)
    }

    fn changed_identity(&self, next: &Self) -> Option<Field> {
        (self.id != next.id).then_some(Field::Id)
    }
}

impl Document for Claim {
    fn document_id(&self) -> &str {
        self.id.as_str()
    }

    fn owner(&self) -> &ActorId {
        &self.user_id
    }

    fn status_name(&self) -> &'static str {
        self.status.as_str()
    }

    fn donation_ref(&self) -> Option<&DonationId> {
        Some(&self.donation_id)
    }

    fn can_become(&self, next: &Self) -> bool {
        self.status.can_transition_to(next.status)
    }

    fn changed_identity(&self, next: &Self) -> Option<Field> {
        if self.id != next.id {
            Some(Field::Id)
        } else if self.user_id != next.user_id {
            Some(Field::UserId)
        } else if self.donation_id != next.donation_id {
            Some(Field::DonationId)
        } else {
            None
        }
    }
}
