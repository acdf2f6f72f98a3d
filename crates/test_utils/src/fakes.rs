//! In-Memory Fakes
//!
//! Substitutes for the persistence and notification ports. Each fake keeps
//! the contract of its production counterpart (idempotent inserts, newest-first
//! reads, all-or-nothing appends) so service and emitter tests exercise the
//! same control flow they would against Postgres.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use core_kernel::{
    CustomerId, DeploymentEnvironment, EventStore, EventStoreError, OrganisationId, ProductId,
    StoredEvent, SystemEventId, TenantId, UserId,
};
use system_events::{
    AutomationEventTrigger, CustomerSnapshot, InsertOutcome, OrganisationSnapshot, ProductSnapshot,
    ReferenceData, RepositoryError, SystemEvent, SystemEventRepository, SystemEventType,
    TenantSnapshot, UserSnapshot,
};

pub use system_events::InMemoryJobQueue;

/// System event repository backed by a vector
#[derive(Default)]
pub struct InMemorySystemEventRepository {
    events: Mutex<Vec<SystemEvent>>,
}

impl InMemorySystemEventRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored event, in insertion order
    pub async fn all(&self) -> Vec<SystemEvent> {
        self.events.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.events.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.lock().await.is_empty()
    }
}

#[async_trait]
impl SystemEventRepository for InMemorySystemEventRepository {
    async fn insert_new(&self, event: &SystemEvent) -> Result<InsertOutcome, RepositoryError> {
        let mut events = self.events.lock().await;
        if events.iter().any(|existing| existing.id == event.id) {
            return Ok(InsertOutcome::AlreadyExists);
        }
        events.push(event.clone());
        Ok(InsertOutcome::Inserted)
    }

    async fn get(&self, id: SystemEventId) -> Result<Option<SystemEvent>, RepositoryError> {
        let events = self.events.lock().await;
        Ok(events.iter().find(|event| event.id == id).cloned())
    }

    async fn find_active(
        &self,
        tenant_id: TenantId,
        environment: DeploymentEnvironment,
        event_types: &[SystemEventType],
        now: DateTime<Utc>,
    ) -> Result<Vec<SystemEvent>, RepositoryError> {
        let events = self.events.lock().await;
        let mut matching: Vec<SystemEvent> = events
            .iter()
            .filter(|event| {
                event.tenant_id == tenant_id
                    && event.environment == environment
                    && event_types.contains(&event.event_type)
                    && !event.is_expired(now)
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_timestamp.cmp(&a.created_timestamp));
        Ok(matching)
    }
}

/// Aggregate event store backed by a vector
///
/// Appends are validated as a batch: a sequence collision, with stored rows
/// or within the batch itself, rejects the whole append and leaves the log
/// untouched.
#[derive(Default)]
pub struct InMemoryEventStore {
    events: Mutex<Vec<StoredEvent>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn total_events(&self) -> usize {
        self.events.lock().await.len()
    }
}

fn stream_key(event: &StoredEvent) -> (TenantId, String, Uuid, u64) {
    (
        event.tenant_id,
        event.aggregate_type.clone(),
        event.aggregate_id,
        event.sequence,
    )
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, events: &[StoredEvent]) -> Result<(), EventStoreError> {
        let mut stored = self.events.lock().await;
        let mut occupied: Vec<(TenantId, String, Uuid, u64)> =
            stored.iter().map(stream_key).collect();
        for event in events {
            let key = stream_key(event);
            if occupied.contains(&key) {
                return Err(EventStoreError::SequenceConflict {
                    aggregate_id: event.aggregate_id,
                    sequence: event.sequence,
                });
            }
            occupied.push(key);
        }
        stored.extend(events.iter().cloned());
        Ok(())
    }

    async fn load(
        &self,
        tenant_id: TenantId,
        aggregate_type: &str,
        aggregate_id: Uuid,
    ) -> Result<Vec<StoredEvent>, EventStoreError> {
        let stored = self.events.lock().await;
        let mut stream: Vec<StoredEvent> = stored
            .iter()
            .filter(|event| {
                event.tenant_id == tenant_id
                    && event.aggregate_type == aggregate_type
                    && event.aggregate_id == aggregate_id
            })
            .cloned()
            .collect();
        stream.sort_by_key(|event| event.sequence);
        Ok(stream)
    }
}

/// Automation trigger that records every notification
///
/// Failures are injected per call: each queued failure consumes one
/// notification, which is still recorded before the error returns. This
/// mirrors a real trigger failing after the event was persisted.
#[derive(Default)]
pub struct RecordingAutomationTrigger {
    notified: Mutex<Vec<SystemEventId>>,
    failures_remaining: AtomicUsize,
}

impl RecordingAutomationTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` notifications return an error
    pub fn inject_failures(&self, count: usize) {
        self.failures_remaining.store(count, Ordering::SeqCst);
    }

    /// The ids of every event notified so far, in order
    pub async fn notified(&self) -> Vec<SystemEventId> {
        self.notified.lock().await.clone()
    }

    pub async fn notification_count(&self) -> usize {
        self.notified.lock().await.len()
    }
}

#[async_trait]
impl AutomationEventTrigger for RecordingAutomationTrigger {
    async fn system_event_created(&self, event: &SystemEvent) -> anyhow::Result<()> {
        self.notified.lock().await.push(event.id);
        let remaining = self.failures_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_remaining.store(remaining - 1, Ordering::SeqCst);
            return Err(anyhow!("injected automation trigger failure"));
        }
        Ok(())
    }
}

/// Reference data source answering from pre-registered snapshots
#[derive(Default)]
pub struct StaticReferenceData {
    tenants: HashMap<TenantId, TenantSnapshot>,
    organisations: HashMap<(TenantId, OrganisationId), OrganisationSnapshot>,
    products: HashMap<(TenantId, ProductId), ProductSnapshot>,
    customers: HashMap<(TenantId, CustomerId), CustomerSnapshot>,
    users: HashMap<(TenantId, UserId), UserSnapshot>,
}

impl StaticReferenceData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tenant(mut self, snapshot: TenantSnapshot) -> Self {
        self.tenants.insert(snapshot.id, snapshot);
        self
    }

    pub fn with_organisation(mut self, tenant_id: TenantId, snapshot: OrganisationSnapshot) -> Self {
        self.organisations.insert((tenant_id, snapshot.id), snapshot);
        self
    }

    pub fn with_product(mut self, tenant_id: TenantId, snapshot: ProductSnapshot) -> Self {
        self.products.insert((tenant_id, snapshot.id), snapshot);
        self
    }

    pub fn with_customer(mut self, tenant_id: TenantId, snapshot: CustomerSnapshot) -> Self {
        self.customers.insert((tenant_id, snapshot.id), snapshot);
        self
    }

    pub fn with_user(mut self, tenant_id: TenantId, snapshot: UserSnapshot) -> Self {
        self.users.insert((tenant_id, snapshot.id), snapshot);
        self
    }
}

#[async_trait]
impl ReferenceData for StaticReferenceData {
    async fn tenant(&self, id: TenantId) -> anyhow::Result<Option<TenantSnapshot>> {
        Ok(self.tenants.get(&id).cloned())
    }

    async fn organisation(
        &self,
        tenant_id: TenantId,
        id: OrganisationId,
    ) -> anyhow::Result<Option<OrganisationSnapshot>> {
        Ok(self.organisations.get(&(tenant_id, id)).cloned())
    }

    async fn organisation_by_alias(
        &self,
        tenant_id: TenantId,
        alias: &str,
    ) -> anyhow::Result<Option<OrganisationSnapshot>> {
        Ok(self
            .organisations
            .iter()
            .find(|((owner, _), snapshot)| *owner == tenant_id && snapshot.alias == alias)
            .map(|(_, snapshot)| snapshot.clone()))
    }

    async fn product(
        &self,
        tenant_id: TenantId,
        id: ProductId,
    ) -> anyhow::Result<Option<ProductSnapshot>> {
        Ok(self.products.get(&(tenant_id, id)).cloned())
    }

    async fn customer(
        &self,
        tenant_id: TenantId,
        id: CustomerId,
    ) -> anyhow::Result<Option<CustomerSnapshot>> {
        Ok(self.customers.get(&(tenant_id, id)).cloned())
    }

    async fn user(
        &self,
        tenant_id: TenantId,
        id: UserId,
    ) -> anyhow::Result<Option<UserSnapshot>> {
        Ok(self.users.get(&(tenant_id, id)).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::SystemEventBuilder;
    use crate::fixtures::{IdFixtures, InstantFixtures};

    #[tokio::test]
    async fn test_insert_is_idempotent_by_id() {
        let repository = InMemorySystemEventRepository::new();
        let event = SystemEventBuilder::new().build();

        let first = repository.insert_new(&event).await.unwrap();
        let second = repository.insert_new(&event).await.unwrap();

        assert_eq!(first, InsertOutcome::Inserted);
        assert_eq!(second, InsertOutcome::AlreadyExists);
        assert_eq!(repository.len().await, 1);
    }

    #[tokio::test]
    async fn test_find_active_orders_newest_first_and_drops_expired() {
        let repository = InMemorySystemEventRepository::new();
        let older = SystemEventBuilder::new()
            .created_at(InstantFixtures::yesterday())
            .build();
        let newer = SystemEventBuilder::new()
            .created_at(InstantFixtures::an_hour_ago())
            .build();
        let expired = SystemEventBuilder::new()
            .created_at(InstantFixtures::yesterday())
            .expiring_at(InstantFixtures::an_hour_ago())
            .build();
        for event in [&older, &newer, &expired] {
            repository.insert_new(event).await.unwrap();
        }

        let active = repository
            .find_active(
                older.tenant_id,
                older.environment,
                &[older.event_type],
                InstantFixtures::now(),
            )
            .await
            .unwrap();

        let ids: Vec<SystemEventId> = active.iter().map(|event| event.id).collect();
        assert_eq!(ids, vec![newer.id, older.id]);
    }

    #[tokio::test]
    async fn test_append_rejects_conflicts_within_the_batch() {
        let store = InMemoryEventStore::new();
        let tenant_id = IdFixtures::tenant();
        let aggregate_id = IdFixtures::quote().into_uuid();
        let event = |sequence: u64| StoredEvent {
            tenant_id,
            aggregate_type: "quote".to_string(),
            aggregate_id,
            sequence,
            timestamp: InstantFixtures::now(),
            performing_user_id: None,
            event_type: "Probe".to_string(),
            payload: serde_json::json!({}),
        };

        let result = store.append(&[event(0), event(1), event(1)]).await;

        assert!(matches!(
            result,
            Err(EventStoreError::SequenceConflict { sequence: 1, .. })
        ));
        assert_eq!(store.total_events().await, 0);
    }

    #[tokio::test]
    async fn test_injected_failure_still_records_the_notification() {
        let trigger = RecordingAutomationTrigger::new();
        trigger.inject_failures(1);
        let event = SystemEventBuilder::new().build();

        let first = trigger.system_event_created(&event).await;
        let second = trigger.system_event_created(&event).await;

        assert!(first.is_err());
        assert!(second.is_ok());
        assert_eq!(trigger.notification_count().await, 2);
    }
}
