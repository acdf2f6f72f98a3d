//! Customer event emitter

use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use core_kernel::{CustomerId, EventEnvelope, EventSourced, SystemEventId};
use domain_party::{Customer, CustomerEvent};

use crate::emitter::{EmissionChannel, EmitError};
use crate::jobs::CreateSystemEventCommand;
use crate::payload::EventPayloadFactory;
use crate::retention::RetentionTable;
use crate::types::{Relationship, RelationshipType, SystemEventType};

pub struct CustomerEventEmitter {
    payload_factory: Arc<dyn EventPayloadFactory>,
    channel: EmissionChannel,
    retention: RetentionTable,
}

impl CustomerEventEmitter {
    pub fn new(
        payload_factory: Arc<dyn EventPayloadFactory>,
        channel: EmissionChannel,
        retention: RetentionTable,
    ) -> Self {
        Self {
            payload_factory,
            channel,
            retention,
        }
    }

    /// The system event type for one customer domain event, if any
    pub fn system_event_type(event: &CustomerEvent) -> Option<SystemEventType> {
        match event {
            CustomerEvent::Initialized { .. } => Some(SystemEventType::CustomerCreated),
            CustomerEvent::DetailsUpdated { .. } => Some(SystemEventType::CustomerDetailsUpdated),
            CustomerEvent::OwnershipAssigned { .. } => {
                Some(SystemEventType::CustomerOwnershipAssigned)
            }
        }
    }

    /// Emits the system event for one appended customer event
    pub async fn dispatch(
        &self,
        customer: &Customer,
        envelope: &EventEnvelope<CustomerId, CustomerEvent>,
        delay: Duration,
    ) -> Result<Option<SystemEventId>, EmitError> {
        let Some(event_type) = Self::system_event_type(&envelope.event) else {
            return Ok(None);
        };

        let payload = match self
            .payload_factory
            .create_customer_payload(customer, envelope.performing_user_id)
            .await
            .map(|payload| serde_json::to_value(&payload))
        {
            Ok(Ok(payload)) => payload,
            Ok(Err(serialize_error)) => {
                warn!(
                    customer_id = %customer.id(),
                    event_type = %event_type,
                    error = %serialize_error,
                    "dropping customer system event, payload could not be serialized"
                );
                return Ok(None);
            }
            Err(payload_error) => {
                warn!(
                    customer_id = %customer.id(),
                    event_type = %event_type,
                    error = %payload_error,
                    "dropping customer system event, payload could not be built"
                );
                return Ok(None);
            }
        };

        let event_id = SystemEventId::new_v7();
        let relationships = vec![
            Relationship::new(
                RelationshipType::OrganisationEvent,
                customer.organisation_id().into_uuid(),
                event_id.into_uuid(),
            ),
            Relationship::new(
                RelationshipType::CustomerEvent,
                customer.id().into_uuid(),
                event_id.into_uuid(),
            ),
            Relationship::new(
                RelationshipType::PersonEvent,
                customer.person_id().into_uuid(),
                event_id.into_uuid(),
            ),
        ];

        let command = CreateSystemEventCommand {
            event_id,
            tenant_id: customer.tenant_id(),
            product_id: None,
            environment: customer.environment(),
            event_type,
            persist_hours: self.retention.persist_hours(event_type),
            payload: Some(payload),
            relationships,
            tags: vec![customer.environment().as_str().to_string()],
        };
        self.channel.deliver(command, delay).await?;
        Ok(Some(event_id))
    }

    /// Dispatches every event in the unsaved buffer, in append order
    pub async fn dispatch_unsaved(
        &self,
        customer: &Customer,
        delay: Duration,
    ) -> Result<Vec<SystemEventId>, EmitError> {
        let mut emitted = Vec::new();
        for envelope in customer.unsaved_events() {
            if let Some(event_id) = self.dispatch(customer, envelope, delay).await? {
                emitted.push(event_id);
            }
        }
        Ok(emitted)
    }
}
