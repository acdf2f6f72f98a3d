//! Quote domain errors
//!
//! This module defines all error types that can occur within the
//! quote administration domain. Every variant carries a stable dotted
//! error code that API layers surface unchanged.

use thiserror::Error;

use core_kernel::DomainError;

use crate::quote::{QuoteStatus, QuoteType};

/// Errors that can occur in the quote domain
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuoteError {
    /// A policy-derived quote was requested with a type that starts fresh
    #[error("Quote type {quote_type} cannot be created for an existing policy")]
    TypeRequiresPolicy { quote_type: QuoteType },

    /// Quote cannot be modified in its current status
    #[error("Quote cannot be modified when {status}")]
    NotModifiable { status: QuoteStatus },

    /// The customer is already assigned to this quote
    #[error("Customer already assigned")]
    CustomerAlreadyAssigned,

    /// Submission requires captured form data
    #[error("Quote cannot be submitted without form data")]
    SubmissionRequiresFormData,

    /// Operation requires the quote to be complete
    #[error("Quote must be complete")]
    MustBeComplete { status: QuoteStatus },

    /// A policy has already been issued from this quote
    #[error("Policy already issued")]
    PolicyAlreadyIssued,

    /// An issued quote cannot be discarded
    #[error("Quote cannot be discarded after policy issue")]
    CannotDiscardIssued,

    /// The quote is already discarded
    #[error("Quote already discarded")]
    AlreadyDiscarded,

    /// Only incomplete quotes expire
    #[error("Only incomplete quotes can expire")]
    ExpiryRequiresIncomplete { status: QuoteStatus },
}

impl QuoteError {
    /// Returns the stable error code for this variant
    pub fn code(&self) -> &'static str {
        match self {
            QuoteError::TypeRequiresPolicy { .. } => "quote.type.requires.policy",
            QuoteError::NotModifiable { status } => match status {
                QuoteStatus::Complete => "quote.cannot.be.modified.when.complete",
                QuoteStatus::Discarded => "quote.cannot.be.modified.when.discarded",
                QuoteStatus::Expired => "quote.cannot.be.modified.when.expired",
                QuoteStatus::Incomplete => "quote.cannot.be.modified",
            },
            QuoteError::CustomerAlreadyAssigned => "quote.customer.already.assigned",
            QuoteError::SubmissionRequiresFormData => "quote.submission.requires.form.data",
            QuoteError::MustBeComplete { .. } => "quote.must.be.complete",
            QuoteError::PolicyAlreadyIssued => "quote.policy.already.issued",
            QuoteError::CannotDiscardIssued => "quote.cannot.discard.issued",
            QuoteError::AlreadyDiscarded => "quote.already.discarded",
            QuoteError::ExpiryRequiresIncomplete { .. } => "quote.expiry.requires.incomplete",
        }
    }
}

impl From<QuoteError> for DomainError {
    fn from(error: QuoteError) -> Self {
        DomainError::new(error.code(), error.to_string())
    }
}
