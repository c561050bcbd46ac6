//! Policy error types

use crate::decision::DenyReason;
use larder_core::LarderError;

/// Errors raised by the policy engine
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    /// The request was evaluated and refused
    #[error("Access denied: {0}")]
    Denied(DenyReason),

    /// The generated rule program could not be loaded or run
    #[error("Rule program error: {message}")]
    RuleProgram {
        /// Error reported by the Datalog engine
        message: String,
    },
}

impl PolicyError {
    /// Create a rule program error
    pub fn rule_program(message: impl Into<String>) -> Self {
        Self::RuleProgram {
            message: message.into(),
        }
    }
}

/// Result type for policy operations
pub type PolicyResult<T> = std::result::Result<T, PolicyError>;

impl From<PolicyError> for LarderError {
    fn from(err: PolicyError) -> Self {
        match err {
            PolicyError::Denied(reason) => LarderError::permission_denied(reason.to_string()),
            PolicyError::RuleProgram { message } => LarderError::internal(message),
        }
    }
}
