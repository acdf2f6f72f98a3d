//! Quote event emitter

use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use core_kernel::{EventEnvelope, EventSourced, QuoteId, SystemEventId, UserId};
use domain_quote::{Quote, QuoteEvent};

use crate::emitter::{EmissionChannel, EmitError};
use crate::jobs::CreateSystemEventCommand;
use crate::payload::{EventPayloadFactory, QuoteSummaryView};
use crate::retention::RetentionTable;
use crate::types::{Relationship, RelationshipType, SystemEventType};

pub struct QuoteEventEmitter {
    payload_factory: Arc<dyn EventPayloadFactory>,
    channel: EmissionChannel,
    retention: RetentionTable,
}

impl QuoteEventEmitter {
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

    /// The system event type for one quote domain event, if any
    pub fn system_event_type(event: &QuoteEvent) -> Option<SystemEventType> {
        match event {
            QuoteEvent::Initialized { .. } => Some(SystemEventType::QuoteCreated),
            QuoteEvent::FormDataUpdated { .. } => Some(SystemEventType::QuoteFormDataUpdated),
            QuoteEvent::CalculationCompleted { .. } => {
                Some(SystemEventType::QuoteCalculationCompleted)
            }
            QuoteEvent::CustomerAssigned { .. } => Some(SystemEventType::QuoteCustomerAssigned),
            // Workflow navigation is internal and never leaves the platform
            QuoteEvent::WorkflowStepChanged { .. } => None,
            QuoteEvent::Submitted => Some(SystemEventType::QuoteSubmitted),
            QuoteEvent::PolicyIssued { .. } => Some(SystemEventType::QuotePolicyIssued),
            QuoteEvent::Discarded => Some(SystemEventType::QuoteDiscarded),
            QuoteEvent::Expired { .. } => Some(SystemEventType::QuoteExpired),
        }
    }

    /// Emits the system event for one appended quote event
    ///
    /// Returns the pre-generated event id, or `None` when the variant is
    /// unmapped or the payload could not be built.
    pub async fn dispatch(
        &self,
        quote: &Quote,
        envelope: &EventEnvelope<QuoteId, QuoteEvent>,
        delay: Duration,
    ) -> Result<Option<SystemEventId>, EmitError> {
        let Some(event_type) = Self::system_event_type(&envelope.event) else {
            return Ok(None);
        };

        let payload = match self
            .payload_factory
            .create_quote_payload(quote, envelope.performing_user_id)
            .await
            .map(|payload| serde_json::to_value(&payload))
        {
            Ok(Ok(payload)) => payload,
            Ok(Err(serialize_error)) => {
                warn!(
                    quote_id = %quote.id(),
                    event_type = %event_type,
                    error = %serialize_error,
                    "dropping quote system event, payload could not be serialized"
                );
                return Ok(None);
            }
            Err(payload_error) => {
                warn!(
                    quote_id = %quote.id(),
                    event_type = %event_type,
                    error = %payload_error,
                    "dropping quote system event, payload could not be built"
                );
                return Ok(None);
            }
        };

        let event_id = SystemEventId::new_v7();
        let mut relationships = vec![
            Relationship::new(
                RelationshipType::OrganisationEvent,
                quote.organisation_id().into_uuid(),
                event_id.into_uuid(),
            ),
            Relationship::new(RelationshipType::QuoteEvent, quote.id().into_uuid(), event_id.into_uuid()),
        ];
        if let Some(customer_id) = quote.customer_id() {
            relationships.push(Relationship::new(
                RelationshipType::CustomerEvent,
                customer_id.into_uuid(),
                event_id.into_uuid(),
            ));
        }
        if let Some(policy_id) = quote.policy_id() {
            relationships.push(Relationship::new(
                RelationshipType::PolicyEvent,
                policy_id.into_uuid(),
                event_id.into_uuid(),
            ));
        }

        let command = CreateSystemEventCommand {
            event_id,
            tenant_id: quote.tenant_id(),
            product_id: Some(quote.product_id()),
            environment: quote.environment(),
            event_type,
            persist_hours: self.retention.persist_hours(event_type),
            payload: Some(payload),
            relationships,
            tags: vec![quote.environment().as_str().to_string()],
        };
        self.channel.deliver(command, delay).await?;
        Ok(Some(event_id))
    }

    /// Dispatches every event in the unsaved buffer, in append order
    pub async fn dispatch_unsaved(
        &self,
        quote: &Quote,
        delay: Duration,
    ) -> Result<Vec<SystemEventId>, EmitError> {
        let mut emitted = Vec::new();
        for envelope in quote.unsaved_events() {
            if let Some(event_id) = self.dispatch(quote, envelope, delay).await? {
                emitted.push(event_id);
            }
        }
        Ok(emitted)
    }

    /// Emits an explicit list of event types from a read-model snapshot
    ///
    /// Used by scheduled flows (expiry sweeps, reminders) that act on quote
    /// rows rather than freshly appended aggregate events. One payload is
    /// built and shared by every emitted event.
    pub async fn create_and_emit_system_events(
        &self,
        summary: &QuoteSummaryView,
        event_types: &[SystemEventType],
        performing_user_id: Option<UserId>,
        delay: Duration,
    ) -> Result<Vec<SystemEventId>, EmitError> {
        let resolved = match self
            .payload_factory
            .create_quote_summary_payload(summary, performing_user_id)
            .await
        {
            Ok(resolved) => resolved,
            Err(payload_error) => {
                warn!(
                    quote_id = %summary.quote.id,
                    error = %payload_error,
                    "dropping quote system events, payload could not be built"
                );
                return Ok(Vec::new());
            }
        };

        let mut emitted = Vec::with_capacity(event_types.len());
        for &event_type in event_types {
            let event_id = SystemEventId::new_v7();
            let mut relationships = vec![
                Relationship::new(
                    RelationshipType::OrganisationEvent,
                    resolved.organisation_id.into_uuid(),
                    event_id.into_uuid(),
                ),
                Relationship::new(
                    RelationshipType::QuoteEvent,
                    summary.quote.id.into_uuid(),
                    event_id.into_uuid(),
                ),
            ];
            if let Some(customer_id) = summary.customer_id {
                relationships.push(Relationship::new(
                    RelationshipType::CustomerEvent,
                    customer_id.into_uuid(),
                    event_id.into_uuid(),
                ));
            }
            if let Some(policy_id) = summary.quote.policy_id {
                relationships.push(Relationship::new(
                    RelationshipType::PolicyEvent,
                    policy_id.into_uuid(),
                    event_id.into_uuid(),
                ));
            }

            let command = CreateSystemEventCommand {
                event_id,
                tenant_id: summary.tenant_id,
                product_id: Some(summary.product_id),
                environment: summary.environment,
                event_type,
                persist_hours: self.retention.persist_hours(event_type),
                payload: Some(resolved.payload.clone()),
                relationships,
                tags: vec![summary.environment.as_str().to_string()],
            };
            self.channel.deliver(command, delay).await?;
            emitted.push(event_id);
        }
        Ok(emitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::{CustomerId, DeploymentEnvironment, OrganisationId, PolicyId, ProductId, TenantId};

    #[test]
    fn test_event_type_mapping() {
        let mut quote = Quote::create_new_business(
            TenantId::new(),
            OrganisationId::new(),
            ProductId::new(),
            DeploymentEnvironment::Development,
            "Q-0001",
            None,
        );
        quote
            .update_form_data(serde_json::json!({"street": "1 High St"}), None)
            .unwrap();
        quote.change_workflow_step("payment", None).unwrap();
        quote.assign_customer(CustomerId::new(), None).unwrap();
        quote.submit(None).unwrap();
        quote.issue_policy(PolicyId::new(), "POL-0001", None).unwrap();

        let mapped: Vec<Option<SystemEventType>> = quote
            .unsaved_events()
            .iter()
            .map(|envelope| QuoteEventEmitter::system_event_type(&envelope.event))
            .collect();

        assert_eq!(
            mapped,
            vec![
                Some(SystemEventType::QuoteCreated),
                Some(SystemEventType::QuoteFormDataUpdated),
                // Workflow navigation is filtered
                None,
                Some(SystemEventType::QuoteCustomerAssigned),
                Some(SystemEventType::QuoteSubmitted),
                Some(SystemEventType::QuotePolicyIssued),
            ]
        );
    }
}
