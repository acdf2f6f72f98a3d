//! Event-sourcing kernel
//!
//! Aggregates in this platform never mutate state directly. Every change is
//! expressed as a domain event wrapped in an [`EventEnvelope`], applied to the
//! in-memory state immediately and appended to the aggregate's uncommitted
//! buffer. State is always exactly the fold of all events in order, so
//! replaying the stored stream (rehydration) reproduces the live aggregate.
//!
//! # Invariants
//!
//! - An envelope is immutable once constructed; its identity is
//!   `(aggregate_id, sequence)`.
//! - Sequence numbers are contiguous from 0 within one aggregate stream.
//! - The first envelope of a stream carries the aggregate's initializing event.
//! - `on_saved_changes` clears the uncommitted buffer only; history is never
//!   deleted.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::identifiers::{TenantId, UserId};

/// A domain event that can be written to the append-only log
///
/// Implementations are closed enums with one variant per state change. The
/// event type name is stable and used as the discriminator in storage.
pub trait DomainEvent: Serialize + DeserializeOwned {
    /// Returns the stable event type name
    fn event_type(&self) -> &'static str;
}

/// One recorded state change to one aggregate instance
///
/// The envelope carries the context shared by every event (tenant, aggregate
/// identity, position in the stream, instant, acting user); the `event` itself
/// carries only the data specific to the change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope<Id, E> {
    pub tenant_id: TenantId,
    pub aggregate_id: Id,
    /// Position within the aggregate's stream, starting at 0
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub performing_user_id: Option<UserId>,
    pub event: E,
}

/// Contract implemented by every event-sourced aggregate
///
/// Mutators on the aggregate validate against the current folded state, build
/// an envelope, apply it and push it onto the uncommitted buffer. The
/// repository calls [`EventSourced::on_saved_changes`] once the buffer has
/// been written, after which the emitter has already consumed the events.
pub trait EventSourced: Sized {
    type Id: Copy;
    type Event: DomainEvent;

    /// Stable aggregate type name used in the event log
    const AGGREGATE_TYPE: &'static str;

    fn id(&self) -> Self::Id;
    fn tenant_id(&self) -> TenantId;

    /// Number of events applied so far (the next envelope's sequence)
    fn sequence(&self) -> u64;

    /// Folds one envelope into the aggregate state
    ///
    /// Must be deterministic: identical state results whether events arrive
    /// incrementally (live) or in bulk (rehydration).
    fn apply(&mut self, envelope: &EventEnvelope<Self::Id, Self::Event>);

    /// Events appended since the last save
    fn unsaved_events(&self) -> &[EventEnvelope<Self::Id, Self::Event>];

    /// Clears the uncommitted buffer after a successful save
    fn on_saved_changes(&mut self);
}

/// Errors raised while rebuilding an aggregate from its event stream
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RehydrateError {
    #[error("Cannot rehydrate {aggregate_type} from an empty event stream")]
    EmptyStream { aggregate_type: &'static str },

    #[error("First event of a {aggregate_type} stream must be {expected}, found {found}")]
    NotInitializingEvent {
        aggregate_type: &'static str,
        expected: &'static str,
        found: String,
    },

    #[error("Event stream sequence gap: expected {expected}, found {found}")]
    SequenceGap { expected: u64, found: u64 },
}

/// Verifies that an event stream is non-empty and contiguous from 0
///
/// Aggregate `rehydrate` implementations call this before folding.
pub fn verify_contiguous<Id, E>(
    aggregate_type: &'static str,
    events: &[EventEnvelope<Id, E>],
) -> Result<(), RehydrateError> {
    if events.is_empty() {
        return Err(RehydrateError::EmptyStream { aggregate_type });
    }
    for (position, envelope) in events.iter().enumerate() {
        let expected = position as u64;
        if envelope.sequence != expected {
            return Err(RehydrateError::SequenceGap {
                expected,
                found: envelope.sequence,
            });
        }
    }
    Ok(())
}

/// Serialized form of one envelope in the append-only log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEvent {
    pub tenant_id: TenantId,
    pub aggregate_type: String,
    pub aggregate_id: Uuid,
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub performing_user_id: Option<UserId>,
    pub event_type: String,
    pub payload: serde_json::Value,
}

impl StoredEvent {
    /// Serializes an envelope for storage
    pub fn from_envelope<Id, E>(
        aggregate_type: &str,
        envelope: &EventEnvelope<Id, E>,
    ) -> Result<Self, EventStoreError>
    where
        Id: Copy + Into<Uuid>,
        E: DomainEvent,
    {
        let payload = serde_json::to_value(&envelope.event)
            .map_err(|e| EventStoreError::Serialization(e.to_string()))?;
        Ok(Self {
            tenant_id: envelope.tenant_id,
            aggregate_type: aggregate_type.to_string(),
            aggregate_id: envelope.aggregate_id.into(),
            sequence: envelope.sequence,
            timestamp: envelope.timestamp,
            performing_user_id: envelope.performing_user_id,
            event_type: envelope.event.event_type().to_string(),
            payload,
        })
    }

    /// Deserializes a stored row back into an envelope
    pub fn to_envelope<Id, E>(&self) -> Result<EventEnvelope<Id, E>, EventStoreError>
    where
        Id: Copy + From<Uuid>,
        E: DomainEvent,
    {
        let event: E = serde_json::from_value(self.payload.clone())
            .map_err(|e| EventStoreError::Serialization(e.to_string()))?;
        Ok(EventEnvelope {
            tenant_id: self.tenant_id,
            aggregate_id: Id::from(self.aggregate_id),
            sequence: self.sequence,
            timestamp: self.timestamp,
            performing_user_id: self.performing_user_id,
            event,
        })
    }
}

/// Errors surfaced by event store adapters
#[derive(Debug, Error)]
pub enum EventStoreError {
    /// An append reused a (tenant, aggregate, sequence) key
    ///
    /// Appends race only across processes; the storage layer's unique key is
    /// the authority on stream order.
    #[error("Sequence {sequence} already written for aggregate {aggregate_id}")]
    SequenceConflict { aggregate_id: Uuid, sequence: u64 },

    #[error("Event serialization failed: {0}")]
    Serialization(String),

    #[error("Event storage failed: {0}")]
    Storage(String),
}

/// Append-only storage port for aggregate event streams
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends the events in order; all or nothing
    async fn append(&self, events: &[StoredEvent]) -> Result<(), EventStoreError>;

    /// Loads one aggregate's stream ordered by sequence
    async fn load(
        &self,
        tenant_id: TenantId,
        aggregate_type: &str,
        aggregate_id: Uuid,
    ) -> Result<Vec<StoredEvent>, EventStoreError>;
}
