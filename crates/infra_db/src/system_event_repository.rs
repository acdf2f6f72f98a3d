//! PostgreSQL system event repository
//!
//! A system event spans three tables: the record in `system_events`, its
//! entity edges in `system_event_relationships`, and its tags in
//! `system_event_tags`. `insert_new` writes all three in one transaction with
//! `ON CONFLICT (id) DO NOTHING` on the record, so a redelivered job either
//! lands the full shape or touches nothing.

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_kernel::{DeploymentEnvironment, ProductId, SystemEventId, TenantId};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use system_events::{
    InsertOutcome, Relationship, RelationshipType, RepositoryError, SystemEvent,
    SystemEventRepository, SystemEventType,
};

use crate::error::DatabaseError;

/// System event repository adapter over a shared connection pool
#[derive(Debug, Clone)]
pub struct PgSystemEventRepository {
    pool: PgPool,
}

impl PgSystemEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_relationships(
        &self,
        ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<Relationship>>, RepositoryError> {
        let rows = sqlx::query_as::<_, RelationshipRow>(
            r#"
            SELECT system_event_id, relationship_type, from_entity_id, to_entity_id
            FROM system_event_relationships
            WHERE system_event_id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?;

        let mut by_event: HashMap<Uuid, Vec<Relationship>> = HashMap::new();
        for row in rows {
            let relationship_type = RelationshipType::from_str(&row.relationship_type)
                .map_err(|error| RepositoryError::Serialization(error.to_string()))?;
            by_event.entry(row.system_event_id).or_default().push(
                Relationship::new(relationship_type, row.from_entity_id, row.to_entity_id),
            );
        }
        Ok(by_event)
    }

    async fn load_tags(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<String>>, RepositoryError> {
        let rows = sqlx::query_as::<_, TagRow>(
            r#"
            SELECT system_event_id, tag
            FROM system_event_tags
            WHERE system_event_id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?;

        let mut by_event: HashMap<Uuid, Vec<String>> = HashMap::new();
        for row in rows {
            by_event.entry(row.system_event_id).or_default().push(row.tag);
        }
        Ok(by_event)
    }

    /// Attaches relationships and tags to already-fetched records
    async fn assemble(
        &self,
        rows: Vec<SystemEventRow>,
    ) -> Result<Vec<SystemEvent>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let mut relationships = self.load_relationships(&ids).await?;
        let mut tags = self.load_tags(&ids).await?;

        rows.into_iter()
            .map(|row| {
                let id = row.id;
                row.into_event(
                    relationships.remove(&id).unwrap_or_default(),
                    tags.remove(&id).unwrap_or_default(),
                )
            })
            .collect()
    }
}

#[async_trait]
impl SystemEventRepository for PgSystemEventRepository {
    async fn insert_new(&self, event: &SystemEvent) -> Result<InsertOutcome, RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(DatabaseError::from_sqlx)?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO system_events (
                id, tenant_id, product_id, environment, event_type,
                created_timestamp, expiry_timestamp, payload
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(event.id.into_uuid())
        .bind(event.tenant_id.into_uuid())
        .bind(event.product_id.map(ProductId::into_uuid))
        .bind(event.environment.as_str())
        .bind(event.event_type.as_str())
        .bind(event.created_timestamp)
        .bind(event.expiry_timestamp)
        .bind(&event.payload)
        .execute(&mut *tx)
        .await
        .map_err(DatabaseError::from_sqlx)?;

        if inserted.rows_affected() == 0 {
            tx.rollback().await.map_err(DatabaseError::from_sqlx)?;
            debug!(event_id = %event.id, "system event already stored");
            return Ok(InsertOutcome::AlreadyExists);
        }

        for relationship in &event.relationships {
            sqlx::query(
                r#"
                INSERT INTO system_event_relationships (
                    system_event_id, relationship_type, from_entity_id, to_entity_id
                ) VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(event.id.into_uuid())
            .bind(relationship.relationship_type.as_str())
            .bind(relationship.from_entity_id)
            .bind(relationship.to_entity_id)
            .execute(&mut *tx)
            .await
            .map_err(DatabaseError::from_sqlx)?;
        }

        for tag in &event.tags {
            sqlx::query(
                r#"
                INSERT INTO system_event_tags (system_event_id, tag)
                VALUES ($1, $2)
                "#,
            )
            .bind(event.id.into_uuid())
            .bind(tag)
            .execute(&mut *tx)
            .await
            .map_err(DatabaseError::from_sqlx)?;
        }

        tx.commit().await.map_err(DatabaseError::from_sqlx)?;

        debug!(event_id = %event.id, event_type = %event.event_type, "system event stored");
        Ok(InsertOutcome::Inserted)
    }

    async fn get(&self, id: SystemEventId) -> Result<Option<SystemEvent>, RepositoryError> {
        let row = sqlx::query_as::<_, SystemEventRow>(
            r#"
            SELECT id, tenant_id, product_id, environment, event_type,
                   created_timestamp, expiry_timestamp, payload
            FROM system_events
            WHERE id = $1
            "#,
        )
        .bind(id.into_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(self.assemble(vec![row]).await?.into_iter().next())
    }

    async fn find_active(
        &self,
        tenant_id: TenantId,
        environment: DeploymentEnvironment,
        event_types: &[SystemEventType],
        now: DateTime<Utc>,
    ) -> Result<Vec<SystemEvent>, RepositoryError> {
        let type_names: Vec<String> = event_types
            .iter()
            .map(|event_type| event_type.as_str().to_string())
            .collect();

        let rows = sqlx::query_as::<_, SystemEventRow>(
            r#"
            SELECT id, tenant_id, product_id, environment, event_type,
                   created_timestamp, expiry_timestamp, payload
            FROM system_events
            WHERE tenant_id = $1
              AND environment = $2
              AND event_type = ANY($3)
              AND (expiry_timestamp IS NULL OR expiry_timestamp > $4)
            ORDER BY created_timestamp DESC
            "#,
        )
        .bind(tenant_id.into_uuid())
        .bind(environment.as_str())
        .bind(&type_names)
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?;

        self.assemble(rows).await
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SystemEventRow {
    id: Uuid,
    tenant_id: Uuid,
    product_id: Option<Uuid>,
    environment: String,
    event_type: String,
    created_timestamp: DateTime<Utc>,
    expiry_timestamp: Option<DateTime<Utc>>,
    payload: Option<serde_json::Value>,
}

impl SystemEventRow {
    fn into_event(
        self,
        relationships: Vec<Relationship>,
        tags: Vec<String>,
    ) -> Result<SystemEvent, RepositoryError> {
        let environment = DeploymentEnvironment::from_str(&self.environment)
            .map_err(|error| RepositoryError::Serialization(error.to_string()))?;
        let event_type = SystemEventType::from_str(&self.event_type)
            .map_err(|error| RepositoryError::Serialization(error.to_string()))?;

        Ok(SystemEvent {
            id: SystemEventId::from_uuid(self.id),
            tenant_id: TenantId::from_uuid(self.tenant_id),
            product_id: self.product_id.map(ProductId::from_uuid),
            environment,
            event_type,
            created_timestamp: self.created_timestamp,
            expiry_timestamp: self.expiry_timestamp,
            payload: self.payload,
            relationships,
            tags,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RelationshipRow {
    system_event_id: Uuid,
    relationship_type: String,
    from_entity_id: Uuid,
    to_entity_id: Uuid,
}

#[derive(Debug, sqlx::FromRow)]
struct TagRow {
    system_event_id: Uuid,
    tag: String,
}
