//! System event service
//!
//! The single write path for system events. The service builds the persisted
//! record from a [`CreateSystemEventCommand`], writes it through the
//! repository port, and notifies the automation trigger best-effort. Commands
//! may be redelivered by the job infrastructure, so creation is idempotent:
//! a duplicate event id returns the already stored record and does not
//! re-notify automations.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error};

use core_kernel::{DeploymentEnvironment, SystemEventId, TenantId};

use crate::jobs::CreateSystemEventCommand;
use crate::system_event::SystemEvent;
use crate::types::SystemEventType;

/// Result of an insert attempt keyed by event id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    AlreadyExists,
}

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("system event store unavailable: {0}")]
    Unavailable(String),
    #[error("system event serialization error: {0}")]
    Serialization(String),
    #[error("system event operation failed: {0}")]
    Operation(String),
}

/// Storage port for system events
///
/// `insert_new` writes the event with its relationships and tags in one unit
/// of work. An existing id must report `AlreadyExists` without touching the
/// stored record.
#[async_trait]
pub trait SystemEventRepository: Send + Sync {
    async fn insert_new(&self, event: &SystemEvent) -> Result<InsertOutcome, RepositoryError>;

    async fn get(&self, id: SystemEventId) -> Result<Option<SystemEvent>, RepositoryError>;

    /// Unexpired events of the given types, newest first
    async fn find_active(
        &self,
        tenant_id: TenantId,
        environment: DeploymentEnvironment,
        event_types: &[SystemEventType],
        now: DateTime<Utc>,
    ) -> Result<Vec<SystemEvent>, RepositoryError>;
}

/// External collaborator deciding whether a persisted event fires automations
#[async_trait]
pub trait AutomationEventTrigger: Send + Sync {
    async fn system_event_created(&self, event: &SystemEvent) -> anyhow::Result<()>;
}

#[derive(Debug, Error)]
pub enum SystemEventError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// The store reported a duplicate id but the stored record could not be
    /// loaded (an expiry sweep can race a redelivered job)
    #[error("System event {id} reported as existing but could not be loaded")]
    DuplicateNotFound { id: SystemEventId },
}

/// Orchestrates system event persistence and automation notification
pub struct SystemEventService {
    repository: Arc<dyn SystemEventRepository>,
    automation_trigger: Arc<dyn AutomationEventTrigger>,
}

impl SystemEventService {
    pub fn new(
        repository: Arc<dyn SystemEventRepository>,
        automation_trigger: Arc<dyn AutomationEventTrigger>,
    ) -> Self {
        Self {
            repository,
            automation_trigger,
        }
    }

    /// Persists one system event and notifies automations
    ///
    /// The expiry is computed against the service's clock at persistence
    /// time, not at enqueue time. A trigger failure is logged and never
    /// undoes the persisted event.
    pub async fn create_system_event(
        &self,
        command: CreateSystemEventCommand,
    ) -> Result<SystemEvent, SystemEventError> {
        let created_timestamp = Utc::now();
        let event = SystemEvent {
            id: command.event_id,
            tenant_id: command.tenant_id,
            product_id: command.product_id,
            environment: command.environment,
            event_type: command.event_type,
            created_timestamp,
            expiry_timestamp: command
                .persist_hours
                .map(|hours| created_timestamp + Duration::hours(hours)),
            payload: command.payload,
            relationships: command.relationships,
            tags: command.tags,
        };

        match self.repository.insert_new(&event).await? {
            InsertOutcome::Inserted => {
                if let Err(trigger_error) =
                    self.automation_trigger.system_event_created(&event).await
                {
                    error!(
                        event_id = %event.id,
                        event_type = %event.event_type,
                        error = %trigger_error,
                        "automation trigger failed for persisted system event"
                    );
                }
                Ok(event)
            }
            InsertOutcome::AlreadyExists => {
                debug!(
                    event_id = %event.id,
                    event_type = %event.event_type,
                    "system event already persisted, skipping automation trigger"
                );
                self.repository
                    .get(event.id)
                    .await?
                    .ok_or(SystemEventError::DuplicateNotFound { id: event.id })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct MapRepository {
        events: Mutex<HashMap<SystemEventId, SystemEvent>>,
    }

    #[async_trait]
    impl SystemEventRepository for MapRepository {
        async fn insert_new(&self, event: &SystemEvent) -> Result<InsertOutcome, RepositoryError> {
            let mut events = self.events.lock().await;
            if events.contains_key(&event.id) {
                return Ok(InsertOutcome::AlreadyExists);
            }
            events.insert(event.id, event.clone());
            Ok(InsertOutcome::Inserted)
        }

        async fn get(&self, id: SystemEventId) -> Result<Option<SystemEvent>, RepositoryError> {
            Ok(self.events.lock().await.get(&id).cloned())
        }

        async fn find_active(
            &self,
            _tenant_id: TenantId,
            _environment: DeploymentEnvironment,
            _event_types: &[SystemEventType],
            _now: DateTime<Utc>,
        ) -> Result<Vec<SystemEvent>, RepositoryError> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct CountingTrigger {
        calls: AtomicUsize,
        fail: AtomicBool,
    }

    #[async_trait]
    impl AutomationEventTrigger for CountingTrigger {
        async fn system_event_created(&self, _event: &SystemEvent) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                anyhow::bail!("trigger backend is down");
            }
            Ok(())
        }
    }

    fn command(persist_hours: Option<i64>) -> CreateSystemEventCommand {
        CreateSystemEventCommand {
            event_id: SystemEventId::new(),
            tenant_id: TenantId::new(),
            product_id: None,
            environment: DeploymentEnvironment::Development,
            event_type: SystemEventType::ClaimCreated,
            persist_hours,
            payload: Some(serde_json::json!({"claim": {"number": "CLM-1"}})),
            relationships: Vec::new(),
            tags: vec!["development".to_string()],
        }
    }

    #[tokio::test]
    async fn test_persists_and_triggers_once() {
        let repository = Arc::new(MapRepository::default());
        let trigger = Arc::new(CountingTrigger::default());
        let service = SystemEventService::new(repository.clone(), trigger.clone());

        let persisted = service.create_system_event(command(None)).await.unwrap();
        assert!(persisted.never_expires());
        assert_eq!(trigger.calls.load(Ordering::SeqCst), 1);
        assert!(repository.get(persisted.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_expiry_computed_from_persist_hours() {
        let service = SystemEventService::new(
            Arc::new(MapRepository::default()),
            Arc::new(CountingTrigger::default()),
        );

        let persisted = service.create_system_event(command(Some(720))).await.unwrap();
        let expiry = persisted.expiry_timestamp.unwrap();
        assert_eq!(expiry, persisted.created_timestamp + Duration::hours(720));
    }

    #[tokio::test]
    async fn test_duplicate_delivery_is_idempotent() {
        let repository = Arc::new(MapRepository::default());
        let trigger = Arc::new(CountingTrigger::default());
        let service = SystemEventService::new(repository.clone(), trigger.clone());

        let command = command(None);
        let first = service.create_system_event(command.clone()).await.unwrap();
        let second = service.create_system_event(command).await.unwrap();

        assert_eq!(second, first);
        assert_eq!(repository.events.lock().await.len(), 1);
        // Redelivery must not re-notify automations
        assert_eq!(trigger.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_trigger_failure_does_not_undo_the_write() {
        let repository = Arc::new(MapRepository::default());
        let trigger = Arc::new(CountingTrigger::default());
        trigger.fail.store(true, Ordering::SeqCst);
        let service = SystemEventService::new(repository.clone(), trigger.clone());

        let persisted = service.create_system_event(command(None)).await.unwrap();
        assert!(repository.get(persisted.id).await.unwrap().is_some());
        assert_eq!(trigger.calls.load(Ordering::SeqCst), 1);
    }
}
