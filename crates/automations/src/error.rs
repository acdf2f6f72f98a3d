//! Errors raised by automation providers

use core_kernel::DomainError;
use thiserror::Error;

use crate::patch_object::{FailureReason, OperationKind};

/// Why a PatchObject run could not produce a document
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PatchObjectError {
    /// The configuration JSON or its seed document could not be parsed
    #[error("Invalid patch definition: {0}")]
    InvalidDefinition(String),

    /// An operation hit a failure condition under a `raiseError` policy
    #[error("Operation {operation_index} ({kind}) failed: {reason}")]
    OperationFailed {
        operation_index: usize,
        kind: OperationKind,
        reason: FailureReason,
    },
}

impl PatchObjectError {
    /// Stable machine-readable code for API error payloads
    pub fn code(&self) -> &'static str {
        match self {
            PatchObjectError::InvalidDefinition(_) => {
                "automation.providers.patchObject.definition.invalid"
            }
            // Historical spelling, relied on by existing automation configs
            PatchObjectError::OperationFailed { .. } => {
                "automation.providers.patchObject.operaton.failed"
            }
        }
    }
}

impl From<PatchObjectError> for DomainError {
    fn from(error: PatchObjectError) -> Self {
        match &error {
            PatchObjectError::InvalidDefinition(message) => {
                DomainError::new(error.code(), "Invalid patch definition")
                    .with_details(vec![message.clone()])
            }
            PatchObjectError::OperationFailed { kind, reason, .. } => {
                DomainError::new(error.code(), "Patch operation failed").with_details(vec![
                    format!("Operation: {kind}"),
                    format!("Error Message: {reason}"),
                ])
            }
        }
    }
}
