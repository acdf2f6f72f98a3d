//! User event emitter
//!
//! Alongside the aggregate-event path this emitter carries the login flow:
//! login attempts never touch the user aggregate, so they are emitted from
//! the authentication read model via `create_and_emit_system_events`.

use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use core_kernel::{EventEnvelope, EventSourced, SystemEventId, UserId};
use domain_party::{User, UserEvent};

use crate::emitter::{EmissionChannel, EmitError};
use crate::jobs::CreateSystemEventCommand;
use crate::payload::{EventPayloadFactory, UserLoginView};
use crate::retention::RetentionTable;
use crate::types::{Relationship, RelationshipType, SystemEventType};

pub struct UserEventEmitter {
    payload_factory: Arc<dyn EventPayloadFactory>,
    channel: EmissionChannel,
    retention: RetentionTable,
}

impl UserEventEmitter {
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

    /// The system event type for one user domain event, if any
    pub fn system_event_type(event: &UserEvent) -> Option<SystemEventType> {
        match event {
            UserEvent::Initialized { .. } => Some(SystemEventType::UserCreated),
            UserEvent::LoginEmailChanged { .. } => Some(SystemEventType::UserLoginEmailUpdated),
            UserEvent::Activated => Some(SystemEventType::UserActivated),
            UserEvent::Blocked => Some(SystemEventType::UserBlocked),
            UserEvent::Unblocked => Some(SystemEventType::UserUnblocked),
            UserEvent::RoleAssigned { .. } => Some(SystemEventType::UserRoleAssigned),
        }
    }

    /// Emits the system event for one appended user event
    pub async fn dispatch(
        &self,
        user: &User,
        envelope: &EventEnvelope<UserId, UserEvent>,
        delay: Duration,
    ) -> Result<Option<SystemEventId>, EmitError> {
        let Some(event_type) = Self::system_event_type(&envelope.event) else {
            return Ok(None);
        };

        let payload = match self
            .payload_factory
            .create_user_payload(user, envelope.performing_user_id)
            .await
            .map(|payload| serde_json::to_value(&payload))
        {
            Ok(Ok(payload)) => payload,
            Ok(Err(serialize_error)) => {
                warn!(
                    user_id = %user.id(),
                    event_type = %event_type,
                    error = %serialize_error,
                    "dropping user system event, payload could not be serialized"
                );
                return Ok(None);
            }
            Err(payload_error) => {
                warn!(
                    user_id = %user.id(),
                    event_type = %event_type,
                    error = %payload_error,
                    "dropping user system event, payload could not be built"
                );
                return Ok(None);
            }
        };

        let event_id = SystemEventId::new_v7();
        let relationships = vec![
            Relationship::new(
                RelationshipType::OrganisationEvent,
                user.organisation_id().into_uuid(),
                event_id.into_uuid(),
            ),
            Relationship::new(RelationshipType::UserEvent, user.id().into_uuid(), event_id.into_uuid()),
            Relationship::new(
                RelationshipType::PersonEvent,
                user.person_id().into_uuid(),
                event_id.into_uuid(),
            ),
        ];

        let command = CreateSystemEventCommand {
            event_id,
            tenant_id: user.tenant_id(),
            product_id: None,
            environment: user.environment(),
            event_type,
            persist_hours: self.retention.persist_hours(event_type),
            payload: Some(payload),
            relationships,
            tags: vec![user.environment().as_str().to_string()],
        };
        self.channel.deliver(command, delay).await?;
        Ok(Some(event_id))
    }

    /// Dispatches every event in the unsaved buffer, in append order
    pub async fn dispatch_unsaved(
        &self,
        user: &User,
        delay: Duration,
    ) -> Result<Vec<SystemEventId>, EmitError> {
        let mut emitted = Vec::new();
        for envelope in user.unsaved_events() {
            if let Some(event_id) = self.dispatch(user, envelope, delay).await? {
                emitted.push(event_id);
            }
        }
        Ok(emitted)
    }

    /// Emits an explicit list of event types for a login attempt
    ///
    /// One payload is built from the login read model and shared by every
    /// emitted event. An unresolvable payload (unknown tenant, unknown
    /// organisation alias) is logged and dropped without failing the login.
    pub async fn create_and_emit_system_events(
        &self,
        login: &UserLoginView,
        event_types: &[SystemEventType],
        delay: Duration,
    ) -> Result<Vec<SystemEventId>, EmitError> {
        let resolved = match self.payload_factory.create_login_payload(login).await {
            Ok(resolved) => resolved,
            Err(payload_error) => {
                warn!(
                    user_id = %login.user_id,
                    organisation_alias = %login.organisation_alias,
                    error = %payload_error,
                    "dropping login system events, payload could not be built"
                );
                return Ok(Vec::new());
            }
        };

        let mut emitted = Vec::with_capacity(event_types.len());
        for &event_type in event_types {
            let event_id = SystemEventId::new_v7();
            let relationships = vec![
                Relationship::new(
                    RelationshipType::OrganisationEvent,
                    resolved.organisation_id.into_uuid(),
                    event_id.into_uuid(),
                ),
                Relationship::new(
                    RelationshipType::UserEvent,
                    login.user_id.into_uuid(),
                    event_id.into_uuid(),
                ),
                Relationship::new(
                    RelationshipType::PersonEvent,
                    login.person_id.into_uuid(),
                    event_id.into_uuid(),
                ),
            ];

            let command = CreateSystemEventCommand {
                event_id,
                tenant_id: login.tenant_id,
                product_id: None,
                environment: login.environment,
                event_type,
                persist_hours: self.retention.persist_hours(event_type),
                payload: Some(resolved.payload.clone()),
                relationships,
                tags: vec![login.environment.as_str().to_string()],
            };
            self.channel.deliver(command, delay).await?;
            emitted.push(event_id);
        }
        Ok(emitted)
    }
}
