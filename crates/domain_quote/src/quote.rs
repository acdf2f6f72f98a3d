//! Quote Aggregate Root
//!
//! The Quote aggregate is the consistency boundary for quote administration.
//! State is derived exclusively by folding its event stream; mutators
//! validate against the folded state, append an event, and apply it
//! immediately so reads within the same unit of work stay consistent.
//!
//! # Invariants
//!
//! - Form data and calculations can only change while the quote is incomplete
//! - A customer can be assigned once; re-assignment of the same customer is rejected
//! - Submission requires captured form data
//! - A policy is issued at most once, and only from a complete quote
//! - Only incomplete quotes expire

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{
    verify_contiguous, CustomerId, DeploymentEnvironment, DomainEvent, EventEnvelope, EventSourced,
    Money, OrganisationId, PolicyId, ProductId, QuoteId, RehydrateError, TenantId, UserId,
};

use crate::error::QuoteError;
use crate::events::QuoteEvent;

/// Quote lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuoteStatus {
    /// Being worked on - form data and calculations still changing
    Incomplete,
    /// Submitted; the captured data is frozen
    Complete,
    /// Abandoned by the organisation or the customer
    Discarded,
    /// Timed out before submission
    Expired,
}

impl std::fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            QuoteStatus::Incomplete => "incomplete",
            QuoteStatus::Complete => "complete",
            QuoteStatus::Discarded => "discarded",
            QuoteStatus::Expired => "expired",
        };
        write!(f, "{name}")
    }
}

/// The business intent behind a quote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuoteType {
    /// A brand-new risk, no existing policy
    NewBusiness,
    /// Mid-term adjustment of an existing policy
    Adjustment,
    /// Renewal of an existing policy
    Renewal,
    /// Cancellation quote for an existing policy
    Cancellation,
}

impl std::fmt::Display for QuoteType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            QuoteType::NewBusiness => "NewBusiness",
            QuoteType::Adjustment => "Adjustment",
            QuoteType::Renewal => "Renewal",
            QuoteType::Cancellation => "Cancellation",
        };
        write!(f, "{name}")
    }
}

/// The Quote aggregate root
///
/// # State Machine
///
/// Valid transitions:
/// - Incomplete -> Complete (via submit)
/// - Incomplete -> Discarded (via discard)
/// - Incomplete -> Expired (via expire)
/// - Complete -> Discarded (via discard, unless a policy was issued)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    tenant_id: TenantId,
    id: QuoteId,
    organisation_id: OrganisationId,
    product_id: ProductId,
    environment: DeploymentEnvironment,
    quote_type: QuoteType,
    status: QuoteStatus,
    /// Human-readable quote number allocated by the caller
    quote_number: String,
    /// Source policy for adjustment/renewal/cancellation quotes, or the
    /// issued policy once issue has happened
    policy_id: Option<PolicyId>,
    policy_number: Option<String>,
    policy_issued: bool,
    customer_id: Option<CustomerId>,
    form_data: Option<serde_json::Value>,
    calculation_result: Option<serde_json::Value>,
    total_payable: Option<Money>,
    workflow_step: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    /// Events applied so far; the next envelope's sequence
    sequence: u64,
    /// Events awaiting persistence
    #[serde(skip)]
    unsaved: Vec<EventEnvelope<QuoteId, QuoteEvent>>,
}

impl Quote {
    /// Creates a new-business quote
    ///
    /// New business starts from nothing, so no policy linkage is recorded.
    pub fn create_new_business(
        tenant_id: TenantId,
        organisation_id: OrganisationId,
        product_id: ProductId,
        environment: DeploymentEnvironment,
        quote_number: impl Into<String>,
        performed_by: Option<UserId>,
    ) -> Self {
        let quote_number = quote_number.into();
        let mut quote = Self::shell(
            tenant_id,
            QuoteId::new_v7(),
            organisation_id,
            product_id,
            environment,
            QuoteType::NewBusiness,
            quote_number.clone(),
        );
        quote.record(
            QuoteEvent::Initialized {
                organisation_id,
                product_id,
                environment,
                quote_type: QuoteType::NewBusiness,
                quote_number,
                policy_id: None,
                policy_number: None,
            },
            performed_by,
            Utc::now(),
        );
        quote
    }

    /// Creates a quote derived from an existing policy
    ///
    /// # Errors
    ///
    /// Returns `quote.type.requires.policy` when `quote_type` is
    /// [`QuoteType::NewBusiness`] - new business never references a policy.
    #[allow(clippy::too_many_arguments)]
    pub fn create_for_policy(
        tenant_id: TenantId,
        organisation_id: OrganisationId,
        product_id: ProductId,
        environment: DeploymentEnvironment,
        quote_type: QuoteType,
        quote_number: impl Into<String>,
        policy_id: PolicyId,
        policy_number: impl Into<String>,
        performed_by: Option<UserId>,
    ) -> Result<Self, QuoteError> {
        if quote_type == QuoteType::NewBusiness {
            return Err(QuoteError::TypeRequiresPolicy { quote_type });
        }

        let quote_number = quote_number.into();
        let mut quote = Self::shell(
            tenant_id,
            QuoteId::new_v7(),
            organisation_id,
            product_id,
            environment,
            quote_type,
            quote_number.clone(),
        );
        quote.record(
            QuoteEvent::Initialized {
                organisation_id,
                product_id,
                environment,
                quote_type,
                quote_number,
                policy_id: Some(policy_id),
                policy_number: Some(policy_number.into()),
            },
            performed_by,
            Utc::now(),
        );
        Ok(quote)
    }

    /// Rebuilds a quote by folding its historical event stream
    ///
    /// # Errors
    ///
    /// Returns an error when the stream is empty, does not start with
    /// [`QuoteEvent::Initialized`], or has a sequence gap.
    pub fn rehydrate(
        events: Vec<EventEnvelope<QuoteId, QuoteEvent>>,
    ) -> Result<Self, RehydrateError> {
        verify_contiguous(Self::AGGREGATE_TYPE, &events)?;
        let first = &events[0];
        let QuoteEvent::Initialized {
            organisation_id,
            product_id,
            environment,
            quote_type,
            quote_number,
            ..
        } = &first.event
        else {
            return Err(RehydrateError::NotInitializingEvent {
                aggregate_type: Self::AGGREGATE_TYPE,
                expected: "Initialized",
                found: first.event.event_type().to_string(),
            });
        };

        let mut quote = Self::shell(
            first.tenant_id,
            first.aggregate_id,
            *organisation_id,
            *product_id,
            *environment,
            *quote_type,
            quote_number.clone(),
        );
        for envelope in &events {
            quote.apply(envelope);
        }
        Ok(quote)
    }

    /// Returns the organisation that owns this quote
    pub fn organisation_id(&self) -> OrganisationId {
        self.organisation_id
    }

    /// Returns the product being quoted
    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    /// Returns the deployment environment the quote lives in
    pub fn environment(&self) -> DeploymentEnvironment {
        self.environment
    }

    /// Returns the quote type
    pub fn quote_type(&self) -> QuoteType {
        self.quote_type
    }

    /// Returns the current lifecycle status
    pub fn status(&self) -> QuoteStatus {
        self.status
    }

    /// Returns the human-readable quote number
    pub fn quote_number(&self) -> &str {
        &self.quote_number
    }

    /// Returns the linked policy, if any
    pub fn policy_id(&self) -> Option<PolicyId> {
        self.policy_id
    }

    /// Returns the linked policy number, if any
    pub fn policy_number(&self) -> Option<&str> {
        self.policy_number.as_deref()
    }

    /// Whether a policy has been issued from this quote
    pub fn policy_issued(&self) -> bool {
        self.policy_issued
    }

    /// Returns the assigned customer, if any
    pub fn customer_id(&self) -> Option<CustomerId> {
        self.customer_id
    }

    /// Returns the captured form data, if any
    pub fn form_data(&self) -> Option<&serde_json::Value> {
        self.form_data.as_ref()
    }

    /// Returns the latest calculation result, if any
    pub fn calculation_result(&self) -> Option<&serde_json::Value> {
        self.calculation_result.as_ref()
    }

    /// Returns the latest total payable, if any
    pub fn total_payable(&self) -> Option<Money> {
        self.total_payable
    }

    /// Returns the current workflow step, if any
    pub fn workflow_step(&self) -> Option<&str> {
        self.workflow_step.as_deref()
    }

    /// Returns the creation instant
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the instant of the last applied event
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Replaces the captured form data
    ///
    /// # Errors
    ///
    /// Returns `quote.cannot.be.modified.when.*` unless the quote is
    /// incomplete.
    pub fn update_form_data(
        &mut self,
        form_data: serde_json::Value,
        performed_by: Option<UserId>,
    ) -> Result<(), QuoteError> {
        self.ensure_modifiable()?;
        self.record(
            QuoteEvent::FormDataUpdated { form_data },
            performed_by,
            Utc::now(),
        );
        Ok(())
    }

    /// Records the result of a pricing calculation
    ///
    /// # Errors
    ///
    /// Returns `quote.cannot.be.modified.when.*` unless the quote is
    /// incomplete.
    pub fn record_calculation(
        &mut self,
        result: serde_json::Value,
        total_payable: Option<Money>,
        performed_by: Option<UserId>,
    ) -> Result<(), QuoteError> {
        self.ensure_modifiable()?;
        self.record(
            QuoteEvent::CalculationCompleted {
                result,
                total_payable,
            },
            performed_by,
            Utc::now(),
        );
        Ok(())
    }

    /// Assigns a customer to the quote
    ///
    /// # Errors
    ///
    /// Returns `quote.customer.already.assigned` when the same customer is
    /// assigned twice, and the modifiability errors otherwise.
    pub fn assign_customer(
        &mut self,
        customer_id: CustomerId,
        performed_by: Option<UserId>,
    ) -> Result<(), QuoteError> {
        self.ensure_modifiable()?;
        if self.customer_id == Some(customer_id) {
            return Err(QuoteError::CustomerAlreadyAssigned);
        }
        self.record(
            QuoteEvent::CustomerAssigned { customer_id },
            performed_by,
            Utc::now(),
        );
        Ok(())
    }

    /// Moves the quote to another workflow step
    ///
    /// Workflow steps are working-state bookkeeping; no system event is
    /// emitted for them.
    pub fn change_workflow_step(
        &mut self,
        step: impl Into<String>,
        performed_by: Option<UserId>,
    ) -> Result<(), QuoteError> {
        self.ensure_modifiable()?;
        self.record(
            QuoteEvent::WorkflowStepChanged { step: step.into() },
            performed_by,
            Utc::now(),
        );
        Ok(())
    }

    /// Submits the quote, freezing the captured data
    ///
    /// # Errors
    ///
    /// Returns `quote.submission.requires.form.data` when no form data has
    /// been captured, and the modifiability errors when the quote is not
    /// incomplete.
    pub fn submit(&mut self, performed_by: Option<UserId>) -> Result<(), QuoteError> {
        self.ensure_modifiable()?;
        if self.form_data.is_none() {
            return Err(QuoteError::SubmissionRequiresFormData);
        }
        self.record(QuoteEvent::Submitted, performed_by, Utc::now());
        Ok(())
    }

    /// Records the policy issued from this quote
    ///
    /// # Errors
    ///
    /// Returns `quote.must.be.complete` unless the quote has been submitted
    /// and `quote.policy.already.issued` on a second issue.
    pub fn issue_policy(
        &mut self,
        policy_id: PolicyId,
        policy_number: impl Into<String>,
        performed_by: Option<UserId>,
    ) -> Result<(), QuoteError> {
        if self.policy_issued {
            return Err(QuoteError::PolicyAlreadyIssued);
        }
        if self.status != QuoteStatus::Complete {
            return Err(QuoteError::MustBeComplete {
                status: self.status,
            });
        }
        self.record(
            QuoteEvent::PolicyIssued {
                policy_id,
                policy_number: policy_number.into(),
            },
            performed_by,
            Utc::now(),
        );
        Ok(())
    }

    /// Discards the quote
    ///
    /// # Errors
    ///
    /// Returns `quote.cannot.discard.issued` once a policy has been issued
    /// and `quote.already.discarded` on a second discard.
    pub fn discard(&mut self, performed_by: Option<UserId>) -> Result<(), QuoteError> {
        if self.policy_issued {
            return Err(QuoteError::CannotDiscardIssued);
        }
        if self.status == QuoteStatus::Discarded {
            return Err(QuoteError::AlreadyDiscarded);
        }
        self.record(QuoteEvent::Discarded, performed_by, Utc::now());
        Ok(())
    }

    /// Expires the quote at the given instant
    ///
    /// Expiry is driven by a scheduled sweep, so the effective instant is
    /// supplied by the caller rather than read from the clock.
    ///
    /// # Errors
    ///
    /// Returns `quote.expiry.requires.incomplete` unless the quote is still
    /// incomplete.
    pub fn expire(
        &mut self,
        at: DateTime<Utc>,
        performed_by: Option<UserId>,
    ) -> Result<(), QuoteError> {
        if self.status != QuoteStatus::Incomplete {
            return Err(QuoteError::ExpiryRequiresIncomplete {
                status: self.status,
            });
        }
        self.record(QuoteEvent::Expired { expired_at: at }, performed_by, Utc::now());
        Ok(())
    }

    fn ensure_modifiable(&self) -> Result<(), QuoteError> {
        match self.status {
            QuoteStatus::Incomplete => Ok(()),
            status => Err(QuoteError::NotModifiable { status }),
        }
    }

    fn record(
        &mut self,
        event: QuoteEvent,
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

    fn shell(
        tenant_id: TenantId,
        id: QuoteId,
        organisation_id: OrganisationId,
        product_id: ProductId,
        environment: DeploymentEnvironment,
        quote_type: QuoteType,
        quote_number: String,
    ) -> Self {
        Self {
            tenant_id,
            id,
            organisation_id,
            product_id,
            environment,
            quote_type,
            status: QuoteStatus::Incomplete,
            quote_number,
            policy_id: None,
            policy_number: None,
            policy_issued: false,
            customer_id: None,
            form_data: None,
            calculation_result: None,
            total_payable: None,
            workflow_step: None,
            created_at: DateTime::<Utc>::MIN_UTC,
            updated_at: DateTime::<Utc>::MIN_UTC,
            sequence: 0,
            unsaved: Vec::new(),
        }
    }
}

impl EventSourced for Quote {
    type Id = QuoteId;
    type Event = QuoteEvent;

    const AGGREGATE_TYPE: &'static str = "quote";

    fn id(&self) -> QuoteId {
        self.id
    }

    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    fn sequence(&self) -> u64 {
        self.sequence
    }

    fn apply(&mut self, envelope: &EventEnvelope<QuoteId, QuoteEvent>) {
        match &envelope.event {
            QuoteEvent::Initialized {
                organisation_id,
                product_id,
                environment,
                quote_type,
                quote_number,
                policy_id,
                policy_number,
            } => {
                self.organisation_id = *organisation_id;
                self.product_id = *product_id;
                self.environment = *environment;
                self.quote_type = *quote_type;
                self.quote_number = quote_number.clone();
                self.policy_id = *policy_id;
                self.policy_number = policy_number.clone();
                self.status = QuoteStatus::Incomplete;
                self.created_at = envelope.timestamp;
            }
            QuoteEvent::FormDataUpdated { form_data } => {
                self.form_data = Some(form_data.clone());
            }
            QuoteEvent::CalculationCompleted {
                result,
                total_payable,
            } => {
                self.calculation_result = Some(result.clone());
                self.total_payable = *total_payable;
            }
            QuoteEvent::CustomerAssigned { customer_id } => {
                self.customer_id = Some(*customer_id);
            }
            QuoteEvent::WorkflowStepChanged { step } => {
                self.workflow_step = Some(step.clone());
            }
            QuoteEvent::Submitted => {
                self.status = QuoteStatus::Complete;
            }
            QuoteEvent::PolicyIssued {
                policy_id,
                policy_number,
            } => {
                self.policy_id = Some(*policy_id);
                self.policy_number = Some(policy_number.clone());
                self.policy_issued = true;
            }
            QuoteEvent::Discarded => {
                self.status = QuoteStatus::Discarded;
            }
            QuoteEvent::Expired { .. } => {
                self.status = QuoteStatus::Expired;
            }
        }
        self.updated_at = envelope.timestamp;
        self.sequence = envelope.sequence + 1;
    }

    fn unsaved_events(&self) -> &[EventEnvelope<QuoteId, QuoteEvent>] {
        &self.unsaved
    }

    fn on_saved_changes(&mut self) {
        self.unsaved.clear();
    }
}
