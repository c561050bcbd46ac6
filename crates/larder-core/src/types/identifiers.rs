//! Strongly typed document identifiers.
//!
//! Identifiers are opaque strings issued by the authentication provider or
//! the remote document store; only claim ids are minted locally.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create an identifier from its string form.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the underlying string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Authenticated actor identifier.
    ActorId
);

string_id!(
    /// Donation document identifier.
    DonationId
);

string_id!(
    /// Claim identifier, minted on the device that created the claim.
    ClaimId
);

impl ClaimId {
    /// Mint a fresh random claim identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transparent_serde() {
        let id = DonationId::new("d1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"d1\"");
        let back: DonationId = serde_json::from_str("\"d1\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_generated_claim_ids_are_unique() {
        let a = ClaimId::generate();
        let b = ClaimId::generate();
        assert_ne!(a, b);
        assert!(uuid::Uuid::parse_str(a.as_str()).is_ok());
    }
}
