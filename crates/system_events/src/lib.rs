//! System Event Emission and Persistence
//!
//! This crate turns domain events appended by the aggregates into immutable,
//! tenant-scoped system event records, and carries them from emission to
//! persistence and automation hand-off.
//!
//! # Pipeline
//!
//! ```text
//! aggregate event
//!       |
//!       v
//! per-aggregate emitter        (type mapping, payload, relationships, tags)
//!       |
//!       v
//! emission channel ---- Service: persist inline
//!       |
//!       \--- Jobs: enqueue CreateSystemEvent
//!                  |
//!                  v
//!             job worker ----> SystemEventService
//!                                  |         |
//!                                  v         v
//!                            repository   automation trigger
//!                            (exactly     (best effort, after
//!                             once)        the write)
//! ```
//!
//! Emitters decide which domain events leave the platform at all: internal
//! events such as workflow navigation map to no system event type and are
//! silently skipped. Payload resolution failures are logged and dropped so a
//! broken read model never blocks the command path; queue and service
//! failures propagate, because losing the hand-off loses the event.
//!
//! # Example
//!
//! ```rust,ignore
//! use system_events::{EmissionChannel, QuoteEventEmitter, RetentionTable};
//!
//! let emitter = QuoteEventEmitter::new(
//!     payload_factory,
//!     EmissionChannel::Jobs(job_client),
//!     RetentionTable::default(),
//! );
//! emitter.dispatch_unsaved(&quote, Duration::ZERO).await?;
//! ```

pub mod emitter;
pub mod jobs;
pub mod payload;
pub mod retention;
pub mod service;
pub mod system_event;
pub mod types;
pub mod worker;

pub use emitter::{
    ClaimEventEmitter, CustomerEventEmitter, EmissionChannel, EmitError, OrganisationEventEmitter,
    QuoteEventEmitter, UserEventEmitter,
};
pub use jobs::{
    CreateSystemEventCommand, InMemoryJobQueue, JobClient, JobEnvelope, JobQueue, JobQueueError,
    JobType, DEFAULT_MAX_ATTEMPTS,
};
pub use payload::{
    ClaimEventPayload, ClaimSnapshot, CustomerEventPayload, CustomerSnapshot, EventPayloadFactory,
    OrganisationEventPayload, OrganisationSnapshot, PayloadError, ProductSnapshot,
    QuoteEventPayload, QuoteSnapshot, QuoteSummaryView, ReferenceData, ResolvedPayload,
    SnapshotPayloadFactory, TenantSnapshot, UserEventPayload, UserLoginView, UserSnapshot,
};
pub use retention::RetentionTable;
pub use service::{
    AutomationEventTrigger, InsertOutcome, RepositoryError, SystemEventError, SystemEventRepository,
    SystemEventService,
};
pub use system_event::SystemEvent;
pub use types::{
    ParseRelationshipTypeError, ParseSystemEventTypeError, Relationship, RelationshipType,
    SystemEventType,
};
pub use worker::JobWorker;
