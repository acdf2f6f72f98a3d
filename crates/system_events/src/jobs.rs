//! Background job plumbing
//!
//! System event creation is decoupled from the calling transaction by
//! placing an explicit, fully serializable command on a durable queue. The
//! job id equals the command's pre-generated event id, so a retried job
//! re-creates the same event and the persistence layer can deduplicate.
//!
//! The queue port models three lanes: ready (dequeue order), delayed
//! (scheduled by `run_at_ms`, promoted by `promote_due`), and processing
//! (dequeued but not yet acked). Writers only append jobs; they never read
//! or mutate anyone else's.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;

use core_kernel::{DeploymentEnvironment, ProductId, SystemEventId, TenantId};

use crate::types::{Relationship, SystemEventType};

/// Default delivery attempt limit for enqueued jobs
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Milliseconds since the Unix epoch
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// The deferred request to create one system event
///
/// Everything the service needs travels in the command; `event_id` is
/// generated at enqueue time so redelivery is idempotent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSystemEventCommand {
    pub event_id: SystemEventId,
    pub tenant_id: TenantId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
    pub environment: DeploymentEnvironment,
    pub event_type: SystemEventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persist_hours: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<Relationship>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[derive(Debug, Error)]
pub enum JobQueueError {
    #[error("job queue unavailable: {0}")]
    Unavailable(String),
    #[error("job queue serialization error: {0}")]
    Serialization(String),
    #[error("job queue operation failed: {0}")]
    Operation(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    CreateSystemEvent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobEnvelope {
    pub job_id: String,
    pub job_type: JobType,
    pub payload: serde_json::Value,
    pub attempt: u32,
    pub max_attempts: u32,
    pub run_at_ms: i64,
    pub created_at_ms: i64,
}

impl JobEnvelope {
    pub fn next_attempt(&self) -> u32 {
        self.attempt.saturating_add(1)
    }

    pub fn is_due(&self, now_ms: i64) -> bool {
        self.run_at_ms <= now_ms
    }
}

/// Durable queue port
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, job: &JobEnvelope) -> Result<(), JobQueueError>;

    /// Takes the next ready job, moving it to the processing lane. Returns
    /// `None` when nothing is ready within `timeout`.
    async fn dequeue(&self, timeout: Duration) -> Result<Option<JobEnvelope>, JobQueueError>;

    /// Removes a processed job for good
    async fn ack(&self, job_id: &str) -> Result<(), JobQueueError>;

    /// Moves delayed jobs whose `run_at_ms` has passed into the ready lane;
    /// returns how many were moved
    async fn promote_due(&self, now_ms: i64, limit: usize) -> Result<usize, JobQueueError>;
}

/// Enqueues system event creation commands
#[derive(Clone)]
pub struct JobClient {
    queue: Arc<dyn JobQueue>,
}

impl JobClient {
    pub fn new(queue: Arc<dyn JobQueue>) -> Self {
        Self { queue }
    }

    /// Schedules a creation command to run after `delay`
    ///
    /// The enqueue itself completes before this returns; only the system
    /// event write is deferred.
    pub async fn enqueue_create_system_event(
        &self,
        command: &CreateSystemEventCommand,
        delay: Duration,
    ) -> Result<(), JobQueueError> {
        let payload = serde_json::to_value(command)
            .map_err(|error| JobQueueError::Serialization(error.to_string()))?;
        let created_at_ms = now_ms();
        let job = JobEnvelope {
            job_id: command.event_id.to_string(),
            job_type: JobType::CreateSystemEvent,
            payload,
            attempt: 0,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            run_at_ms: created_at_ms + delay.as_millis() as i64,
            created_at_ms,
        };
        self.queue.enqueue(&job).await
    }
}

#[derive(Default)]
struct QueueLanes {
    payloads: HashMap<String, JobEnvelope>,
    ready: VecDeque<String>,
    // Sorted ascending by run_at_ms
    delayed: Vec<(i64, String)>,
    processing: Vec<String>,
}

/// In-memory queue with the same lane semantics as the durable backends
///
/// Used by tests and single-process deployments. `dequeue` never blocks:
/// when nothing is ready it returns `None` immediately, regardless of the
/// timeout a durable backend would honour.
#[derive(Default)]
pub struct InMemoryJobQueue {
    lanes: Mutex<QueueLanes>,
}

impl InMemoryJobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lane sizes, for assertions: (ready, delayed, processing)
    pub async fn depths(&self) -> (usize, usize, usize) {
        let lanes = self.lanes.lock().await;
        (lanes.ready.len(), lanes.delayed.len(), lanes.processing.len())
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn enqueue(&self, job: &JobEnvelope) -> Result<(), JobQueueError> {
        let mut lanes = self.lanes.lock().await;
        lanes.payloads.insert(job.job_id.clone(), job.clone());
        if job.is_due(now_ms()) {
            lanes.ready.push_back(job.job_id.clone());
        } else {
            let position = lanes
                .delayed
                .partition_point(|(run_at, _)| *run_at <= job.run_at_ms);
            lanes.delayed.insert(position, (job.run_at_ms, job.job_id.clone()));
        }
        Ok(())
    }

    async fn dequeue(&self, _timeout: Duration) -> Result<Option<JobEnvelope>, JobQueueError> {
        let mut lanes = self.lanes.lock().await;
        let Some(job_id) = lanes.ready.pop_front() else {
            return Ok(None);
        };
        let Some(job) = lanes.payloads.get(&job_id).cloned() else {
            return Err(JobQueueError::Operation(format!(
                "missing payload for job_id {job_id}"
            )));
        };
        lanes.processing.push(job_id);
        Ok(Some(job))
    }

    async fn ack(&self, job_id: &str) -> Result<(), JobQueueError> {
        let mut lanes = self.lanes.lock().await;
        lanes.processing.retain(|id| id != job_id);
        lanes.payloads.remove(job_id);
        Ok(())
    }

    async fn promote_due(&self, now_ms: i64, limit: usize) -> Result<usize, JobQueueError> {
        let mut lanes = self.lanes.lock().await;
        let due = lanes
            .delayed
            .partition_point(|(run_at, _)| *run_at <= now_ms)
            .min(limit);
        let promoted: Vec<String> = lanes.delayed.drain(..due).map(|(_, id)| id).collect();
        let moved = promoted.len();
        lanes.ready.extend(promoted);
        Ok(moved)
    }
}
