//! Domain events for the quote aggregate
//!
//! Domain events represent significant occurrences within the quote
//! lifecycle. They are used for:
//! - Rebuilding aggregate state by replay
//! - Audit trails
//! - Driving system event emission
//!
//! Identity and sequencing live on the surrounding [`EventEnvelope`]
//! (tenant, aggregate id, sequence, timestamp, performing user); variants
//! carry only the domain data needed to replay the change.
//!
//! [`EventEnvelope`]: core_kernel::EventEnvelope

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{
    CustomerId, DeploymentEnvironment, DomainEvent, Money, OrganisationId, PolicyId, ProductId,
};

use crate::quote::QuoteType;

/// Domain events emitted by the Quote aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QuoteEvent {
    /// Quote has been created
    Initialized {
        organisation_id: OrganisationId,
        product_id: ProductId,
        environment: DeploymentEnvironment,
        quote_type: QuoteType,
        quote_number: String,
        policy_id: Option<PolicyId>,
        policy_number: Option<String>,
    },

    /// Captured form data has been replaced
    FormDataUpdated { form_data: serde_json::Value },

    /// A pricing calculation has completed
    CalculationCompleted {
        result: serde_json::Value,
        total_payable: Option<Money>,
    },

    /// A customer has been assigned to the quote
    CustomerAssigned { customer_id: CustomerId },

    /// The quote moved to another workflow step
    WorkflowStepChanged { step: String },

    /// The quote has been submitted and is now complete
    Submitted,

    /// A policy has been issued from the quote
    PolicyIssued {
        policy_id: PolicyId,
        policy_number: String,
    },

    /// The quote has been discarded
    Discarded,

    /// The quote has expired
    Expired { expired_at: DateTime<Utc> },
}

impl DomainEvent for QuoteEvent {
    fn event_type(&self) -> &'static str {
        match self {
            QuoteEvent::Initialized { .. } => "Initialized",
            QuoteEvent::FormDataUpdated { .. } => "FormDataUpdated",
            QuoteEvent::CalculationCompleted { .. } => "CalculationCompleted",
            QuoteEvent::CustomerAssigned { .. } => "CustomerAssigned",
            QuoteEvent::WorkflowStepChanged { .. } => "WorkflowStepChanged",
            QuoteEvent::Submitted => "Submitted",
            QuoteEvent::PolicyIssued { .. } => "PolicyIssued",
            QuoteEvent::Discarded => "Discarded",
            QuoteEvent::Expired { .. } => "Expired",
        }
    }
}
