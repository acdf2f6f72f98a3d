//! Background job worker
//!
//! Dequeues job envelopes and invokes the system event service. A job that
//! fails stays unacked in the processing lane; redelivery is the queue
//! infrastructure's business. A job whose payload cannot be decoded is acked
//! and dropped, since redelivering it can never succeed.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

use crate::jobs::{CreateSystemEventCommand, JobEnvelope, JobQueue, JobQueueError, JobType};
use crate::service::SystemEventService;

pub struct JobWorker {
    queue: Arc<dyn JobQueue>,
    service: Arc<SystemEventService>,
}

impl JobWorker {
    pub fn new(queue: Arc<dyn JobQueue>, service: Arc<SystemEventService>) -> Self {
        Self { queue, service }
    }

    /// Takes and handles the next ready job; returns whether one was taken
    pub async fn process_next(&self, timeout: Duration) -> Result<bool, JobQueueError> {
        let Some(job) = self.queue.dequeue(timeout).await? else {
            return Ok(false);
        };
        self.handle(job).await;
        Ok(true)
    }

    /// Promotes due jobs and processes until the ready lane is empty;
    /// returns how many jobs were taken
    pub async fn drain_ready(&self, now_ms: i64) -> Result<usize, JobQueueError> {
        self.queue.promote_due(now_ms, usize::MAX).await?;
        let mut processed = 0;
        while self.process_next(Duration::ZERO).await? {
            processed += 1;
        }
        Ok(processed)
    }

    async fn handle(&self, job: JobEnvelope) {
        match job.job_type {
            JobType::CreateSystemEvent => {
                let command: CreateSystemEventCommand =
                    match serde_json::from_value(job.payload.clone()) {
                        Ok(command) => command,
                        Err(decode_error) => {
                            error!(
                                job_id = %job.job_id,
                                error = %decode_error,
                                "dropping job with undecodable payload"
                            );
                            self.ack(&job.job_id).await;
                            return;
                        }
                    };

                match self.service.create_system_event(command).await {
                    Ok(event) => {
                        debug!(
                            job_id = %job.job_id,
                            event_id = %event.id,
                            event_type = %event.event_type,
                            "system event job processed"
                        );
                        self.ack(&job.job_id).await;
                    }
                    Err(service_error) => {
                        error!(
                            job_id = %job.job_id,
                            attempt = job.attempt,
                            error = %service_error,
                            "system event job failed, leaving for redelivery"
                        );
                    }
                }
            }
        }
    }

    async fn ack(&self, job_id: &str) {
        if let Err(ack_error) = self.queue.ack(job_id).await {
            error!(job_id = %job_id, error = %ack_error, "failed to ack job");
        }
    }
}
