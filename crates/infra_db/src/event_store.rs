//! PostgreSQL event store
//!
//! One row per envelope in `aggregate_events`. The primary key
//! `(tenant_id, aggregate_type, aggregate_id, sequence)` is the concurrency
//! control: two processes appending the same sequence race on the key and the
//! loser surfaces `SequenceConflict`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_kernel::{EventStore, EventStoreError, StoredEvent, TenantId, UserId};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DatabaseError;

/// Event store adapter over a shared connection pool
#[derive(Debug, Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn append(&self, events: &[StoredEvent]) -> Result<(), EventStoreError> {
        if events.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        for event in events {
            let result = sqlx::query(
                r#"
                INSERT INTO aggregate_events (
                    tenant_id, aggregate_type, aggregate_id, sequence,
                    recorded_at, performing_user_id, event_type, payload
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(event.tenant_id.into_uuid())
            .bind(&event.aggregate_type)
            .bind(event.aggregate_id)
            .bind(event.sequence as i64)
            .bind(event.timestamp)
            .bind(event.performing_user_id.map(UserId::into_uuid))
            .bind(&event.event_type)
            .bind(&event.payload)
            .execute(&mut *tx)
            .await;

            if let Err(error) = result {
                let database_error = DatabaseError::from_sqlx(error);
                if database_error.is_unique_violation() {
                    return Err(EventStoreError::SequenceConflict {
                        aggregate_id: event.aggregate_id,
                        sequence: event.sequence,
                    });
                }
                return Err(EventStoreError::Storage(database_error.to_string()));
            }
        }

        tx.commit().await.map_err(storage_error)?;

        debug!(
            count = events.len(),
            aggregate_id = %events[0].aggregate_id,
            "events appended"
        );
        Ok(())
    }

    async fn load(
        &self,
        tenant_id: TenantId,
        aggregate_type: &str,
        aggregate_id: Uuid,
    ) -> Result<Vec<StoredEvent>, EventStoreError> {
        let rows = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT tenant_id, aggregate_type, aggregate_id, sequence,
                   recorded_at, performing_user_id, event_type, payload
            FROM aggregate_events
            WHERE tenant_id = $1 AND aggregate_type = $2 AND aggregate_id = $3
            ORDER BY sequence ASC
            "#,
        )
        .bind(tenant_id.into_uuid())
        .bind(aggregate_type)
        .bind(aggregate_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(rows.into_iter().map(EventRow::into_stored).collect())
    }
}

fn storage_error(error: sqlx::Error) -> EventStoreError {
    EventStoreError::Storage(DatabaseError::from_sqlx(error).to_string())
}

#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    tenant_id: Uuid,
    aggregate_type: String,
    aggregate_id: Uuid,
    sequence: i64,
    recorded_at: DateTime<Utc>,
    performing_user_id: Option<Uuid>,
    event_type: String,
    payload: serde_json::Value,
}

impl EventRow {
    fn into_stored(self) -> StoredEvent {
        StoredEvent {
            tenant_id: TenantId::from_uuid(self.tenant_id),
            aggregate_type: self.aggregate_type,
            aggregate_id: self.aggregate_id,
            sequence: self.sequence as u64,
            timestamp: self.recorded_at,
            performing_user_id: self.performing_user_id.map(UserId::from_uuid),
            event_type: self.event_type,
            payload: self.payload,
        }
    }
}
