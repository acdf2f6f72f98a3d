//! Claim event emitter

use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use core_kernel::{ClaimId, EventEnvelope, EventSourced, SystemEventId};
use domain_claim::{Claim, ClaimEvent};

use crate::emitter::{EmissionChannel, EmitError};
use crate::jobs::CreateSystemEventCommand;
use crate::payload::EventPayloadFactory;
use crate::retention::RetentionTable;
use crate::types::{Relationship, RelationshipType, SystemEventType};

pub struct ClaimEventEmitter {
    payload_factory: Arc<dyn EventPayloadFactory>,
    channel: EmissionChannel,
    retention: RetentionTable,
}

impl ClaimEventEmitter {
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

    /// The system event type for one claim domain event, if any
    pub fn system_event_type(event: &ClaimEvent) -> Option<SystemEventType> {
        match event {
            ClaimEvent::Initialized { .. } => Some(SystemEventType::ClaimCreated),
            ClaimEvent::AssociatedWithPolicy { .. } => {
                Some(SystemEventType::ClaimAssociatedWithPolicy)
            }
            ClaimEvent::DisassociatedFromPolicy { .. } => {
                Some(SystemEventType::ClaimDisassociatedFromPolicy)
            }
            ClaimEvent::AmountUpdated { .. } => Some(SystemEventType::ClaimAmountUpdated),
            ClaimEvent::DetailsUpdated { .. } => Some(SystemEventType::ClaimDetailsUpdated),
            ClaimEvent::StatusChanged { .. } => Some(SystemEventType::ClaimStatusUpdated),
            ClaimEvent::WorkflowStepChanged { .. } => None,
        }
    }

    /// Emits the system event for one appended claim event
    pub async fn dispatch(
        &self,
        claim: &Claim,
        envelope: &EventEnvelope<ClaimId, ClaimEvent>,
        delay: Duration,
    ) -> Result<Option<SystemEventId>, EmitError> {
        let Some(event_type) = Self::system_event_type(&envelope.event) else {
            return Ok(None);
        };

        let payload = match self
            .payload_factory
            .create_claim_payload(claim, envelope.performing_user_id)
            .await
            .map(|payload| serde_json::to_value(&payload))
        {
            Ok(Ok(payload)) => payload,
            Ok(Err(serialize_error)) => {
                warn!(
                    claim_id = %claim.id(),
                    event_type = %event_type,
                    error = %serialize_error,
                    "dropping claim system event, payload could not be serialized"
                );
                return Ok(None);
            }
            Err(payload_error) => {
                warn!(
                    claim_id = %claim.id(),
                    event_type = %event_type,
                    error = %payload_error,
                    "dropping claim system event, payload could not be built"
                );
                return Ok(None);
            }
        };

        let event_id = SystemEventId::new_v7();
        let mut relationships = vec![
            Relationship::new(
                RelationshipType::OrganisationEvent,
                claim.organisation_id().into_uuid(),
                event_id.into_uuid(),
            ),
            Relationship::new(RelationshipType::ClaimEvent, claim.id().into_uuid(), event_id.into_uuid()),
        ];
        if let Some(customer_id) = claim.customer_id() {
            relationships.push(Relationship::new(
                RelationshipType::CustomerEvent,
                customer_id.into_uuid(),
                event_id.into_uuid(),
            ));
        }
        if let Some(policy_id) = claim.policy_id() {
            relationships.push(Relationship::new(
                RelationshipType::PolicyEvent,
                policy_id.into_uuid(),
                event_id.into_uuid(),
            ));
        }

        let command = CreateSystemEventCommand {
            event_id,
            tenant_id: claim.tenant_id(),
            product_id: Some(claim.product_id()),
            environment: claim.environment(),
            event_type,
            persist_hours: self.retention.persist_hours(event_type),
            payload: Some(payload),
            relationships,
            tags: vec![claim.environment().as_str().to_string()],
        };
        self.channel.deliver(command, delay).await?;
        Ok(Some(event_id))
    }

    /// Dispatches every event in the unsaved buffer, in append order
    pub async fn dispatch_unsaved(
        &self,
        claim: &Claim,
        delay: Duration,
    ) -> Result<Vec<SystemEventId>, EmitError> {
        let mut emitted = Vec::new();
        for envelope in claim.unsaved_events() {
            if let Some(event_id) = self.dispatch(claim, envelope, delay).await? {
                emitted.push(event_id);
            }
        }
        Ok(emitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use core_kernel::{DeploymentEnvironment, OrganisationId, PolicyId, ProductId, TenantId};
    use domain_claim::ClaimStatus;

    #[test]
    fn test_event_type_mapping() {
        let mut claim = Claim::create_for_policy(
            TenantId::new(),
            OrganisationId::new(),
            ProductId::new(),
            DeploymentEnvironment::Development,
            "CLM-0001",
            PolicyId::new(),
            "POL-0001",
            None,
            "Hail damage to the roof",
            Utc::now(),
            None,
        );
        claim.change_workflow_step("assessment", None).unwrap();
        claim.change_status(ClaimStatus::Acknowledged, None).unwrap();

        let mapped: Vec<Option<SystemEventType>> = claim
            .unsaved_events()
            .iter()
            .map(|envelope| ClaimEventEmitter::system_event_type(&envelope.event))
            .collect();

        assert_eq!(
            mapped,
            vec![
                Some(SystemEventType::ClaimCreated),
                None,
                Some(SystemEventType::ClaimStatusUpdated),
            ]
        );
    }
}
