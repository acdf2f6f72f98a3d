//! Domain events for the claim aggregate
//!
//! Envelope context (tenant, claim id, sequence, timestamp, performing user)
//! lives on [`EventEnvelope`]; variants carry only the replay data.
//!
//! [`EventEnvelope`]: core_kernel::EventEnvelope

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{
    CustomerId, DeploymentEnvironment, DomainEvent, Money, OrganisationId, PolicyId, ProductId,
};

use crate::claim::ClaimStatus;

/// Domain events emitted by the Claim aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClaimEvent {
    /// Claim has been lodged
    Initialized {
        organisation_id: OrganisationId,
        product_id: ProductId,
        environment: DeploymentEnvironment,
        claim_number: String,
        policy_id: Option<PolicyId>,
        policy_number: Option<String>,
        customer_id: Option<CustomerId>,
        description: String,
        incident_date: DateTime<Utc>,
    },

    /// A policy has been associated with the claim
    AssociatedWithPolicy {
        policy_id: PolicyId,
        policy_number: String,
    },

    /// The policy association has been removed
    DisassociatedFromPolicy { policy_id: PolicyId },

    /// The claimed amount has changed
    AmountUpdated { amount: Money },

    /// Description or incident date have changed
    DetailsUpdated {
        description: String,
        incident_date: DateTime<Utc>,
    },

    /// The claim moved through the assessment workflow
    StatusChanged { from: ClaimStatus, to: ClaimStatus },

    /// The claim moved to another workflow step
    WorkflowStepChanged { step: String },
}

impl DomainEvent for ClaimEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ClaimEvent::Initialized { .. } => "Initialized",
            ClaimEvent::AssociatedWithPolicy { .. } => "AssociatedWithPolicy",
            ClaimEvent::DisassociatedFromPolicy { .. } => "DisassociatedFromPolicy",
            ClaimEvent::AmountUpdated { .. } => "AmountUpdated",
            ClaimEvent::DetailsUpdated { .. } => "DetailsUpdated",
            ClaimEvent::StatusChanged { .. } => "StatusChanged",
            ClaimEvent::WorkflowStepChanged { .. } => "WorkflowStepChanged",
        }
    }
}
