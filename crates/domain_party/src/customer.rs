//! Customer aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{
    verify_contiguous, CustomerId, DeploymentEnvironment, DomainEvent, EventEnvelope, EventSourced,
    OrganisationId, PersonId, RehydrateError, TenantId, UserId,
};

use crate::error::PartyError;
use crate::person::PersonDetails;

/// Domain events emitted by the Customer aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CustomerEvent {
    /// Customer record has been created
    Initialized {
        organisation_id: OrganisationId,
        environment: DeploymentEnvironment,
        person_id: PersonId,
        details: PersonDetails,
    },

    /// Contact details have been replaced
    DetailsUpdated { details: PersonDetails },

    /// A user took ownership of the customer relationship
    OwnershipAssigned { owner_user_id: UserId },
}

impl DomainEvent for CustomerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CustomerEvent::Initialized { .. } => "Initialized",
            CustomerEvent::DetailsUpdated { .. } => "DetailsUpdated",
            CustomerEvent::OwnershipAssigned { .. } => "OwnershipAssigned",
        }
    }
}

/// A customer of one organisation
///
/// The customer owns a primary person record; its id is allocated at
/// creation so downstream person-keyed systems can reference it before any
/// separate person aggregate exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    tenant_id: TenantId,
    id: CustomerId,
    organisation_id: OrganisationId,
    environment: DeploymentEnvironment,
    person_id: PersonId,
    details: PersonDetails,
    owner_user_id: Option<UserId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    sequence: u64,
    #[serde(skip)]
    unsaved: Vec<EventEnvelope<CustomerId, CustomerEvent>>,
}

impl Customer {
    /// Creates a customer with a fresh person record
    ///
    /// # Errors
    ///
    /// Returns `person.details.invalid` when the details fail validation.
    pub fn new_customer(
        tenant_id: TenantId,
        organisation_id: OrganisationId,
        environment: DeploymentEnvironment,
        details: PersonDetails,
        performed_by: Option<UserId>,
    ) -> Result<Self, PartyError> {
        details.ensure_valid()?;
        let person_id = PersonId::new_v7();
        let mut customer = Self::shell(
            tenant_id,
            CustomerId::new_v7(),
            organisation_id,
            environment,
            person_id,
            details.clone(),
        );
        customer.record(
            CustomerEvent::Initialized {
                organisation_id,
                environment,
                person_id,
                details,
            },
            performed_by,
            Utc::now(),
        );
        Ok(customer)
    }

    /// Rebuilds a customer by folding its historical event stream
    pub fn rehydrate(
        events: Vec<EventEnvelope<CustomerId, CustomerEvent>>,
    ) -> Result<Self, RehydrateError> {
        verify_contiguous(Self::AGGREGATE_TYPE, &events)?;
        let first = &events[0];
        let CustomerEvent::Initialized {
            organisation_id,
            environment,
            person_id,
            details,
        } = &first.event
        else {
            return Err(RehydrateError::NotInitializingEvent {
                aggregate_type: Self::AGGREGATE_TYPE,
                expected: "Initialized",
                found: first.event.event_type().to_string(),
            });
        };

        let mut customer = Self::shell(
            first.tenant_id,
            first.aggregate_id,
            *organisation_id,
            *environment,
            *person_id,
            details.clone(),
        );
        for envelope in &events {
            customer.apply(envelope);
        }
        Ok(customer)
    }

    pub fn organisation_id(&self) -> OrganisationId {
        self.organisation_id
    }

    pub fn environment(&self) -> DeploymentEnvironment {
        self.environment
    }

    /// The customer's primary person record
    pub fn person_id(&self) -> PersonId {
        self.person_id
    }

    pub fn details(&self) -> &PersonDetails {
        &self.details
    }

    pub fn display_name(&self) -> &str {
        self.details.display_name()
    }

    pub fn owner_user_id(&self) -> Option<UserId> {
        self.owner_user_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Replaces the customer's contact details
    ///
    /// # Errors
    ///
    /// Returns `person.details.invalid` when the details fail validation.
    pub fn update_details(
        &mut self,
        details: PersonDetails,
        performed_by: Option<UserId>,
    ) -> Result<(), PartyError> {
        details.ensure_valid()?;
        self.record(
            CustomerEvent::DetailsUpdated { details },
            performed_by,
            Utc::now(),
        );
        Ok(())
    }

    /// Assigns the user who owns this customer relationship
    ///
    /// # Errors
    ///
    /// Returns `customer.owner.already.assigned` when the same owner is
    /// assigned twice.
    pub fn assign_owner(
        &mut self,
        owner_user_id: UserId,
        performed_by: Option<UserId>,
    ) -> Result<(), PartyError> {
        if self.owner_user_id == Some(owner_user_id) {
            return Err(PartyError::OwnerAlreadyAssigned);
        }
        self.record(
            CustomerEvent::OwnershipAssigned { owner_user_id },
            performed_by,
            Utc::now(),
        );
        Ok(())
    }

    fn record(
        &mut self,
        event: CustomerEvent,
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
        id: CustomerId,
        organisation_id: OrganisationId,
        environment: DeploymentEnvironment,
        person_id: PersonId,
        details: PersonDetails,
    ) -> Self {
        Self {
            tenant_id,
            id,
            organisation_id,
            environment,
            person_id,
            details,
            owner_user_id: None,
            created_at: DateTime::<Utc>::MIN_UTC,
            updated_at: DateTime::<Utc>::MIN_UTC,
            sequence: 0,
            unsaved: Vec::new(),
        }
    }
}

impl EventSourced for Customer {
    type Id = CustomerId;
    type Event = CustomerEvent;

    const AGGREGATE_TYPE: &'static str = "customer";

    fn id(&self) -> CustomerId {
        self.id
    }

    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    fn sequence(&self) -> u64 {
        self.sequence
    }

    fn apply(&mut self, envelope: &EventEnvelope<CustomerId, CustomerEvent>) {
        match &envelope.event {
            CustomerEvent::Initialized {
                organisation_id,
                environment,
                person_id,
                details,
            } => {
                self.organisation_id = *organisation_id;
                self.environment = *environment;
                self.person_id = *person_id;
                self.details = details.clone();
                self.created_at = envelope.timestamp;
            }
            CustomerEvent::DetailsUpdated { details } => {
                self.details = details.clone();
            }
            CustomerEvent::OwnershipAssigned { owner_user_id } => {
                self.owner_user_id = Some(*owner_user_id);
            }
        }
        self.updated_at = envelope.timestamp;
        self.sequence = envelope.sequence + 1;
    }

    fn unsaved_events(&self) -> &[EventEnvelope<CustomerId, CustomerEvent>] {
        &self.unsaved
    }

    fn on_saved_changes(&mut self) {
        self.unsaved.clear();
    }
}
