//! Claim domain errors

use thiserror::Error;

use core_kernel::DomainError;

use crate::claim::ClaimStatus;

/// Errors that can occur in the claims domain
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClaimError {
    /// A policy is already associated with this claim
    #[error("Policy already associated")]
    PolicyAlreadyAssociated,

    /// No matching policy association exists
    #[error("Policy not found")]
    PolicyNotFound,

    /// Closed claims are frozen
    #[error("Claim cannot be modified when closed")]
    Closed { status: ClaimStatus },

    /// Invalid status transition attempted
    #[error("Invalid claim status transition from {from} to {to}")]
    InvalidStatusTransition { from: ClaimStatus, to: ClaimStatus },
}

impl ClaimError {
    /// Returns the stable error code for this variant
    pub fn code(&self) -> &'static str {
        match self {
            ClaimError::PolicyAlreadyAssociated => "claim.policy.already.associated",
            ClaimError::PolicyNotFound => "claim.policy.not.found",
            ClaimError::Closed { .. } => "claim.cannot.be.modified.when.closed",
            ClaimError::InvalidStatusTransition { .. } => "claim.invalid.status.transition",
        }
    }
}

impl From<ClaimError> for DomainError {
    fn from(error: ClaimError) -> Self {
        DomainError::new(error.code(), error.to_string())
    }
}
