//! Claim aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{
    verify_contiguous, ClaimId, CustomerId, DeploymentEnvironment, DomainEvent, EventEnvelope,
    EventSourced, Money, OrganisationId, PolicyId, ProductId, RehydrateError, TenantId, UserId,
};

use crate::error::ClaimError;
use crate::events::ClaimEvent;

/// Claim assessment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClaimStatus {
    /// Lodged, awaiting acknowledgement
    Notified,
    /// Receipt confirmed to the claimant
    Acknowledged,
    /// Being assessed
    UnderAssessment,
    /// Assessment approved the claim
    Approved,
    /// Assessment declined the claim
    Declined,
    /// Settled and closed out
    Complete,
    /// Withdrawn by the claimant
    Withdrawn,
}

impl std::fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ClaimStatus::Notified => "Notified",
            ClaimStatus::Acknowledged => "Acknowledged",
            ClaimStatus::UnderAssessment => "UnderAssessment",
            ClaimStatus::Approved => "Approved",
            ClaimStatus::Declined => "Declined",
            ClaimStatus::Complete => "Complete",
            ClaimStatus::Withdrawn => "Withdrawn",
        };
        write!(f, "{name}")
    }
}

/// A claim lodged against an organisation's product, optionally tied to a policy
///
/// State is derived by folding the event stream. The approved amount is a
/// snapshot of the claimed amount at the moment the status reached
/// [`ClaimStatus::Approved`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    tenant_id: TenantId,
    id: ClaimId,
    organisation_id: OrganisationId,
    product_id: ProductId,
    environment: DeploymentEnvironment,
    claim_number: String,
    status: ClaimStatus,
    policy_id: Option<PolicyId>,
    policy_number: Option<String>,
    customer_id: Option<CustomerId>,
    amount: Option<Money>,
    approved_amount: Option<Money>,
    description: String,
    incident_date: DateTime<Utc>,
    workflow_step: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    sequence: u64,
    #[serde(skip)]
    unsaved: Vec<EventEnvelope<ClaimId, ClaimEvent>>,
}

impl Claim {
    /// Lodges a claim against a known policy
    #[allow(clippy::too_many_arguments)]
    pub fn create_for_policy(
        tenant_id: TenantId,
        organisation_id: OrganisationId,
        product_id: ProductId,
        environment: DeploymentEnvironment,
        claim_number: impl Into<String>,
        policy_id: PolicyId,
        policy_number: impl Into<String>,
        customer_id: Option<CustomerId>,
        description: impl Into<String>,
        incident_date: DateTime<Utc>,
        performed_by: Option<UserId>,
    ) -> Self {
        Self::create(
            tenant_id,
            organisation_id,
            product_id,
            environment,
            claim_number.into(),
            Some(policy_id),
            Some(policy_number.into()),
            customer_id,
            description.into(),
            incident_date,
            performed_by,
        )
    }

    /// Lodges a claim with no policy association yet
    ///
    /// Used when the loss is reported before the covering policy has been
    /// identified; association happens later via
    /// [`Claim::associate_with_policy`].
    #[allow(clippy::too_many_arguments)]
    pub fn create_unassociated(
        tenant_id: TenantId,
        organisation_id: OrganisationId,
        product_id: ProductId,
        environment: DeploymentEnvironment,
        claim_number: impl Into<String>,
        customer_id: Option<CustomerId>,
        description: impl Into<String>,
        incident_date: DateTime<Utc>,
        performed_by: Option<UserId>,
    ) -> Self {
        Self::create(
            tenant_id,
            organisation_id,
            product_id,
            environment,
            claim_number.into(),
            None,
            None,
            customer_id,
            description.into(),
            incident_date,
            performed_by,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn create(
        tenant_id: TenantId,
        organisation_id: OrganisationId,
        product_id: ProductId,
        environment: DeploymentEnvironment,
        claim_number: String,
        policy_id: Option<PolicyId>,
        policy_number: Option<String>,
        customer_id: Option<CustomerId>,
        description: String,
        incident_date: DateTime<Utc>,
        performed_by: Option<UserId>,
    ) -> Self {
        let mut claim = Self::shell(
            tenant_id,
            ClaimId::new_v7(),
            organisation_id,
            product_id,
            environment,
            claim_number.clone(),
            description.clone(),
            incident_date,
        );
        claim.record(
            ClaimEvent::Initialized {
                organisation_id,
                product_id,
                environment,
                claim_number,
                policy_id,
                policy_number,
                customer_id,
                description,
                incident_date,
            },
            performed_by,
            Utc::now(),
        );
        claim
    }

    /// Rebuilds a claim by folding its historical event stream
    pub fn rehydrate(
        events: Vec<EventEnvelope<ClaimId, ClaimEvent>>,
    ) -> Result<Self, RehydrateError> {
        verify_contiguous(Self::AGGREGATE_TYPE, &events)?;
        let first = &events[0];
        let ClaimEvent::Initialized {
            organisation_id,
            product_id,
            environment,
            claim_number,
            description,
            incident_date,
            ..
        } = &first.event
        else {
            return Err(RehydrateError::NotInitializingEvent {
                aggregate_type: Self::AGGREGATE_TYPE,
                expected: "Initialized",
                found: first.event.event_type().to_string(),
            });
        };

        let mut claim = Self::shell(
            first.tenant_id,
            first.aggregate_id,
            *organisation_id,
            *product_id,
            *environment,
            claim_number.clone(),
            description.clone(),
            *incident_date,
        );
        for envelope in &events {
            claim.apply(envelope);
        }
        Ok(claim)
    }

    pub fn organisation_id(&self) -> OrganisationId {
        self.organisation_id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn environment(&self) -> DeploymentEnvironment {
        self.environment
    }

    pub fn claim_number(&self) -> &str {
        &self.claim_number
    }

    pub fn status(&self) -> ClaimStatus {
        self.status
    }

    pub fn policy_id(&self) -> Option<PolicyId> {
        self.policy_id
    }

    pub fn policy_number(&self) -> Option<&str> {
        self.policy_number.as_deref()
    }

    pub fn customer_id(&self) -> Option<CustomerId> {
        self.customer_id
    }

    /// The claimed amount, if one has been recorded
    pub fn amount(&self) -> Option<Money> {
        self.amount
    }

    /// The amount approved at assessment, if the claim was approved
    pub fn approved_amount(&self) -> Option<Money> {
        self.approved_amount
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn incident_date(&self) -> DateTime<Utc> {
        self.incident_date
    }

    pub fn workflow_step(&self) -> Option<&str> {
        self.workflow_step.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Whether the claim has reached a terminal, frozen state
    pub fn is_closed(&self) -> bool {
        matches!(
            self.status,
            ClaimStatus::Complete | ClaimStatus::Withdrawn | ClaimStatus::Declined
        )
    }

    /// Associates a policy with the claim
    ///
    /// # Errors
    ///
    /// Returns `claim.policy.already.associated` while any policy is
    /// associated; disassociate first to switch policies.
    pub fn associate_with_policy(
        &mut self,
        policy_id: PolicyId,
        policy_number: impl Into<String>,
        performed_by: Option<UserId>,
    ) -> Result<(), ClaimError> {
        self.ensure_open()?;
        if self.policy_id.is_some() {
            return Err(ClaimError::PolicyAlreadyAssociated);
        }
        self.record(
            ClaimEvent::AssociatedWithPolicy {
                policy_id,
                policy_number: policy_number.into(),
            },
            performed_by,
            Utc::now(),
        );
        Ok(())
    }

    /// Removes the association with the given policy
    ///
    /// # Errors
    ///
    /// Returns `claim.policy.not.found` when no association exists or the id
    /// does not match the associated policy.
    pub fn disassociate_from_policy(
        &mut self,
        policy_id: PolicyId,
        performed_by: Option<UserId>,
    ) -> Result<(), ClaimError> {
        self.ensure_open()?;
        if self.policy_id != Some(policy_id) {
            return Err(ClaimError::PolicyNotFound);
        }
        self.record(
            ClaimEvent::DisassociatedFromPolicy { policy_id },
            performed_by,
            Utc::now(),
        );
        Ok(())
    }

    /// Records the claimed amount
    pub fn update_amount(
        &mut self,
        amount: Money,
        performed_by: Option<UserId>,
    ) -> Result<(), ClaimError> {
        self.ensure_open()?;
        self.record(ClaimEvent::AmountUpdated { amount }, performed_by, Utc::now());
        Ok(())
    }

    /// Updates the claim description and incident date
    pub fn update_details(
        &mut self,
        description: impl Into<String>,
        incident_date: DateTime<Utc>,
        performed_by: Option<UserId>,
    ) -> Result<(), ClaimError> {
        self.ensure_open()?;
        self.record(
            ClaimEvent::DetailsUpdated {
                description: description.into(),
                incident_date,
            },
            performed_by,
            Utc::now(),
        );
        Ok(())
    }

    /// Moves the claim through the assessment workflow
    ///
    /// # Errors
    ///
    /// Returns `claim.invalid.status.transition` when the transition is not
    /// in the allowed matrix.
    pub fn change_status(
        &mut self,
        target: ClaimStatus,
        performed_by: Option<UserId>,
    ) -> Result<(), ClaimError> {
        if !self.can_transition_to(target) {
            return Err(ClaimError::InvalidStatusTransition {
                from: self.status,
                to: target,
            });
        }
        self.record(
            ClaimEvent::StatusChanged {
                from: self.status,
                to: target,
            },
            performed_by,
            Utc::now(),
        );
        Ok(())
    }

    /// Moves the claim to another workflow step
    ///
    /// Workflow steps are working-state bookkeeping; no system event is
    /// emitted for them.
    pub fn change_workflow_step(
        &mut self,
        step: impl Into<String>,
        performed_by: Option<UserId>,
    ) -> Result<(), ClaimError> {
        self.ensure_open()?;
        self.record(
            ClaimEvent::WorkflowStepChanged { step: step.into() },
            performed_by,
            Utc::now(),
        );
        Ok(())
    }

    /// Checks if transition is valid
    fn can_transition_to(&self, target: ClaimStatus) -> bool {
        use ClaimStatus::*;
        matches!(
            (self.status, target),
            (Notified, Acknowledged)
                | (Acknowledged, UnderAssessment)
                | (UnderAssessment, Approved)
                | (UnderAssessment, Declined)
                | (Approved, Complete)
                | (Declined, Complete)
                | (Notified, Withdrawn)
                | (Acknowledged, Withdrawn)
                | (UnderAssessment, Withdrawn)
                | (Approved, Withdrawn)
        )
    }

    fn ensure_open(&self) -> Result<(), ClaimError> {
        if self.is_closed() {
            return Err(ClaimError::Closed {
                status: self.status,
            });
        }
        Ok(())
    }

    fn record(
        &mut self,
        event: ClaimEvent,
        performed_by: Option<UserId>,
        timestamp: DateTime<Utc>,
    ) {
        let envelope = EventEnvelope {
            tenant_id: self.tenant_id,
            aggregate_id: self.id,
            sequence: self.sequence,
            timestamp,
            performing_user_id: performed_by,
            event,
        };
        self.apply(&envelope);
        self.unsaved.push(envelope);
    }

    #[allow(clippy::too_many_arguments)]
    fn shell(
        tenant_id: TenantId,
        id: ClaimId,
        organisation_id: OrganisationId,
        product_id: ProductId,
        environment: DeploymentEnvironment,
        claim_number: String,
        description: String,
        incident_date: DateTime<Utc>,
    ) -> Self {
        Self {
            tenant_id,
            id,
            organisation_id,
            product_id,
            environment,
            claim_number,
            status: ClaimStatus::Notified,
            policy_id: None,
            policy_number: None,
            customer_id: None,
            amount: None,
            approved_amount: None,
            description,
            incident_date,
            workflow_step: None,
            created_at: DateTime::<Utc>::MIN_UTC,
            updated_at: DateTime::<Utc>::MIN_UTC,
            sequence: 0,
            unsaved: Vec::new(),
        }
    }
}

impl EventSourced for Claim {
    type Id = ClaimId;
    type Event = ClaimEvent;

    const AGGREGATE_TYPE: &'static str = "claim";

    fn id(&self) -> ClaimId {
        self.id
    }

    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    fn sequence(&self) -> u64 {
        self.sequence
    }

    fn apply(&mut self, envelope: &EventEnvelope<ClaimId, ClaimEvent>) {
        match &envelope.event {
            ClaimEvent::Initialized {
                organisation_id,
                product_id,
                environment,
                claim_number,
                policy_id,
                policy_number,
                customer_id,
                description,
                incident_date,
            } => {
                self.organisation_id = *organisation_id;
                self.product_id = *product_id;
                self.environment = *environment;
                self.claim_number = claim_number.clone();
                self.policy_id = *policy_id;
                self.policy_number = policy_number.clone();
                self.customer_id = *customer_id;
                self.description = description.clone();
                self.incident_date = *incident_date;
                self.status = ClaimStatus::Notified;
                self.created_at = envelope.timestamp;
            }
            ClaimEvent::AssociatedWithPolicy {
                policy_id,
                policy_number,
            } => {
                self.policy_id = Some(*policy_id);
                self.policy_number = Some(policy_number.clone());
            }
            ClaimEvent::DisassociatedFromPolicy { .. } => {
                self.policy_id = None;
                self.policy_number = None;
            }
            ClaimEvent::AmountUpdated { amount } => {
                self.amount = Some(*amount);
            }
            ClaimEvent::DetailsUpdated {
                description,
                incident_date,
            } => {
                self.description = description.clone();
                self.incident_date = *incident_date;
            }
            ClaimEvent::StatusChanged { to, .. } => {
                self.status = *to;
                // Approval freezes the claimed amount as the approved amount
                if *to == ClaimStatus::Approved {
                    self.approved_amount = self.amount;
                }
            }
            ClaimEvent::WorkflowStepChanged { step } => {
                self.workflow_step = Some(step.clone());
            }
        }
        self.updated_at = envelope.timestamp;
        self.sequence = envelope.sequence + 1;
    }

    fn unsaved_events(&self) -> &[EventEnvelope<ClaimId, ClaimEvent>] {
        &self.unsaved
    }

    fn on_saved_changes(&mut self) {
        self.unsaved.clear();
    }
}
