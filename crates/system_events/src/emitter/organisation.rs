//! Organisation event emitter

use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use core_kernel::{EventEnvelope, EventSourced, OrganisationId, SystemEventId};
use domain_party::{Organisation, OrganisationEvent};

use crate::emitter::{EmissionChannel, EmitError};
use crate::jobs::CreateSystemEventCommand;
use crate::payload::EventPayloadFactory;
use crate::retention::RetentionTable;
use crate::types::{Relationship, RelationshipType, SystemEventType};

pub struct OrganisationEventEmitter {
    payload_factory: Arc<dyn EventPayloadFactory>,
    channel: EmissionChannel,
    retention: RetentionTable,
}

impl OrganisationEventEmitter {
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

    /// The system event type for one organisation domain event, if any
    pub fn system_event_type(event: &OrganisationEvent) -> Option<SystemEventType> {
        match event {
            OrganisationEvent::Initialized { .. } => Some(SystemEventType::OrganisationCreated),
            OrganisationEvent::NameChanged { .. } => Some(SystemEventType::OrganisationNameUpdated),
            OrganisationEvent::AliasChanged { .. } => {
                Some(SystemEventType::OrganisationAliasUpdated)
            }
            OrganisationEvent::Activated => Some(SystemEventType::OrganisationActivated),
            OrganisationEvent::Disabled => Some(SystemEventType::OrganisationDisabled),
        }
    }

    /// Emits the system event for one appended organisation event
    ///
    /// An organisation is its own organisation context, so the
    /// OrganisationEvent relationship points at the aggregate itself.
    pub async fn dispatch(
        &self,
        organisation: &Organisation,
        envelope: &EventEnvelope<OrganisationId, OrganisationEvent>,
        delay: Duration,
    ) -> Result<Option<SystemEventId>, EmitError> {
        let Some(event_type) = Self::system_event_type(&envelope.event) else {
            return Ok(None);
        };

        let payload = match self
            .payload_factory
            .create_organisation_payload(organisation, envelope.performing_user_id)
            .await
            .map(|payload| serde_json::to_value(&payload))
        {
            Ok(Ok(payload)) => payload,
            Ok(Err(serialize_error)) => {
                warn!(
                    organisation_id = %organisation.id(),
                    event_type = %event_type,
                    error = %serialize_error,
                    "dropping organisation system event, payload could not be serialized"
                );
                return Ok(None);
            }
            Err(payload_error) => {
                warn!(
                    organisation_id = %organisation.id(),
                    event_type = %event_type,
                    error = %payload_error,
                    "dropping organisation system event, payload could not be built"
                );
                return Ok(None);
            }
        };

        let event_id = SystemEventId::new_v7();
        let relationships = vec![Relationship::new(
            RelationshipType::OrganisationEvent,
            organisation.id().into_uuid(),
            event_id.into_uuid(),
        )];

        let command = CreateSystemEventCommand {
            event_id,
            tenant_id: organisation.tenant_id(),
            product_id: None,
            environment: organisation.environment(),
            event_type,
            persist_hours: self.retention.persist_hours(event_type),
            payload: Some(payload),
            relationships,
            tags: vec![organisation.environment().as_str().to_string()],
        };
        self.channel.deliver(command, delay).await?;
        Ok(Some(event_id))
    }

    /// Dispatches every event in the unsaved buffer, in append order
    pub async fn dispatch_unsaved(
        &self,
        organisation: &Organisation,
        delay: Duration,
    ) -> Result<Vec<SystemEventId>, EmitError> {
        let mut emitted = Vec::new();
        for envelope in organisation.unsaved_events() {
            if let Some(event_id) = self.dispatch(organisation, envelope, delay).await? {
                emitted.push(event_id);
            }
        }
        Ok(emitted)
    }
}
