//! System event emitters
//!
//! One emitter per aggregate type. An emitter watches freshly appended
//! domain events, maps each to at most one [`SystemEventType`], resolves the
//! retention duration, builds the relationship set and denormalized payload,
//! and hands a [`CreateSystemEventCommand`] to its channel. Unmapped event
//! variants emit nothing; that is intentional filtering, not an error.
//!
//! Emission is decoupled from the aggregate's persistence transaction. In
//! production the channel enqueues onto the durable job queue with a small
//! delay so the triggering transaction can commit first; inline delivery
//! exists for tests and single-process flows. A payload that cannot be built
//! is logged and dropped, never failing the caller; a failed enqueue does
//! propagate, since losing the enqueue loses the event.
//!
//! [`SystemEventType`]: crate::types::SystemEventType

mod claim;
mod customer;
mod organisation;
mod quote;
mod user;

pub use claim::ClaimEventEmitter;
pub use customer::CustomerEventEmitter;
pub use organisation::OrganisationEventEmitter;
pub use quote::QuoteEventEmitter;
pub use user::UserEventEmitter;

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::jobs::{CreateSystemEventCommand, JobClient, JobQueueError};
use crate::service::{SystemEventError, SystemEventService};

#[derive(Debug, Error)]
pub enum EmitError {
    #[error(transparent)]
    Queue(#[from] JobQueueError),
    #[error(transparent)]
    Service(#[from] SystemEventError),
}

/// Where emitted commands are delivered
pub enum EmissionChannel {
    /// Invoke the service inline and await the write
    Service(Arc<SystemEventService>),
    /// Enqueue onto the durable queue; only the enqueue is awaited
    Jobs(JobClient),
}

impl EmissionChannel {
    pub(crate) async fn deliver(
        &self,
        command: CreateSystemEventCommand,
        delay: Duration,
    ) -> Result<(), EmitError> {
        match self {
            EmissionChannel::Service(service) => {
                service.create_system_event(command).await?;
                Ok(())
            }
            EmissionChannel::Jobs(client) => {
                client.enqueue_create_system_event(&command, delay).await?;
                Ok(())
            }
        }
    }
}
