//! Emission Pipeline Tests
//!
//! Runs the emitters and the persistence service against the in-memory
//! fakes, using the shared builders and assertions throughout. These tests
//! double as the reference usage for the crate's own helpers.

use std::sync::Arc;
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use proptest::prelude::*;

use core_kernel::EventSourced;
use domain_claim::Claim;
use domain_quote::Quote;
use system_events::jobs::now_ms;
use system_events::{
    ClaimEventEmitter, CustomerSnapshot, EmissionChannel, JobClient, JobWorker,
    OrganisationSnapshot, ProductSnapshot, QuoteEventEmitter, RelationshipType, RetentionTable,
    SnapshotPayloadFactory, SystemEventRepository, SystemEventService, SystemEventType,
    TenantSnapshot, UserEventEmitter, UserSnapshot,
};

use test_utils::assertions::{
    assert_expires_after_hours, assert_has_relationship, assert_never_expires,
    assert_relationships_point_at_event, assert_tagged_with,
};
use test_utils::builders::{CreateSystemEventCommandBuilder, UserLoginViewBuilder};
use test_utils::fakes::{
    InMemoryJobQueue, InMemorySystemEventRepository, RecordingAutomationTrigger,
    StaticReferenceData,
};
use test_utils::fixtures::{
    test_environment, IdFixtures, InstantFixtures, MoneyFixtures, StringFixtures,
};
use test_utils::generators::{
    created_timestamp_strategy, retention_hours_strategy, system_event_type_strategy,
};
use test_utils::logging::init_test_tracing;

// ============================================================================
// TEST FIXTURES
// ============================================================================

fn reference_data() -> StaticReferenceData {
    StaticReferenceData::new()
        .with_tenant(TenantSnapshot {
            id: IdFixtures::tenant(),
            alias: StringFixtures::tenant_alias(),
        })
        .with_organisation(
            IdFixtures::tenant(),
            OrganisationSnapshot {
                id: IdFixtures::organisation(),
                alias: StringFixtures::organisation_alias(),
                name: StringFixtures::organisation_name(),
            },
        )
        .with_product(
            IdFixtures::tenant(),
            ProductSnapshot {
                id: IdFixtures::product(),
                alias: StringFixtures::product_alias(),
                name: StringFixtures::product_name(),
            },
        )
        .with_customer(
            IdFixtures::tenant(),
            CustomerSnapshot {
                id: IdFixtures::customer(),
                person_id: IdFixtures::person(),
                display_name: StringFixtures::display_name(),
                email: StringFixtures::email(),
            },
        )
        .with_user(
            IdFixtures::tenant(),
            UserSnapshot {
                id: IdFixtures::user(),
                person_id: IdFixtures::person(),
                display_name: StringFixtures::display_name(),
                email: StringFixtures::email(),
            },
        )
}

struct Pipeline {
    repository: Arc<InMemorySystemEventRepository>,
    trigger: Arc<RecordingAutomationTrigger>,
    service: Arc<SystemEventService>,
}

impl Pipeline {
    fn new() -> Self {
        let repository = Arc::new(InMemorySystemEventRepository::new());
        let trigger = Arc::new(RecordingAutomationTrigger::new());
        let service = Arc::new(SystemEventService::new(
            repository.clone(),
            trigger.clone(),
        ));
        Self {
            repository,
            trigger,
            service,
        }
    }

    fn channel(&self) -> EmissionChannel {
        EmissionChannel::Service(self.service.clone())
    }
}

fn lodged_claim() -> Claim {
    let mut claim = Claim::create_unassociated(
        IdFixtures::tenant(),
        IdFixtures::organisation(),
        IdFixtures::product(),
        test_environment(),
        StringFixtures::claim_number(),
        Some(IdFixtures::customer()),
        "Storm damage to the roof",
        InstantFixtures::incident_date(),
        Some(IdFixtures::user()),
    );
    claim
        .associate_with_policy(
            IdFixtures::policy(),
            StringFixtures::policy_number(),
            Some(IdFixtures::user()),
        )
        .expect("open claim accepts an association");
    claim
        .update_amount(MoneyFixtures::aud_claimed(), Some(IdFixtures::user()))
        .expect("open claim accepts an amount");
    claim
}

// ============================================================================
// CLAIM EMISSION
// ============================================================================

mod claim_emission {
    use super::*;

    #[tokio::test]
    async fn association_lifecycle_lands_in_the_repository() {
        init_test_tracing();
        let pipeline = Pipeline::new();
        let emitter = ClaimEventEmitter::new(
            Arc::new(SnapshotPayloadFactory::new(Arc::new(reference_data()))),
            pipeline.channel(),
            RetentionTable::default(),
        );
        let claim = lodged_claim();

        let emitted = emitter
            .dispatch_unsaved(&claim, Duration::ZERO)
            .await
            .unwrap();

        assert_eq!(emitted.len(), 3);
        assert_eq!(pipeline.repository.len().await, 3);
        assert_eq!(pipeline.trigger.notification_count().await, 3);

        let stored = pipeline.repository.all().await;
        let types: Vec<SystemEventType> = stored.iter().map(|event| event.event_type).collect();
        assert_eq!(
            types,
            vec![
                SystemEventType::ClaimCreated,
                SystemEventType::ClaimAssociatedWithPolicy,
                SystemEventType::ClaimAmountUpdated,
            ]
        );

        for event in &stored {
            assert_relationships_point_at_event(event);
            assert_has_relationship(
                event,
                RelationshipType::OrganisationEvent,
                IdFixtures::organisation().into_uuid(),
            );
            assert_has_relationship(
                event,
                RelationshipType::ClaimEvent,
                EventSourced::id(&claim).into_uuid(),
            );
            assert_has_relationship(
                event,
                RelationshipType::CustomerEvent,
                IdFixtures::customer().into_uuid(),
            );
            // Relationships reflect the claim state at dispatch time, so the
            // policy link is present on every event of the batch
            assert_has_relationship(
                event,
                RelationshipType::PolicyEvent,
                IdFixtures::policy().into_uuid(),
            );
            assert_tagged_with(event, test_environment().as_str());
            assert_never_expires(event);
        }
    }

    #[tokio::test]
    async fn unknown_customer_drops_the_payload_without_failing() {
        init_test_tracing();
        let pipeline = Pipeline::new();
        let sparse = StaticReferenceData::new().with_tenant(TenantSnapshot {
            id: IdFixtures::tenant(),
            alias: StringFixtures::tenant_alias(),
        });
        let emitter = ClaimEventEmitter::new(
            Arc::new(SnapshotPayloadFactory::new(Arc::new(sparse))),
            pipeline.channel(),
            RetentionTable::default(),
        );
        let claim = lodged_claim();

        let emitted = emitter
            .dispatch_unsaved(&claim, Duration::ZERO)
            .await
            .unwrap();

        assert!(emitted.is_empty());
        assert!(pipeline.repository.is_empty().await);
    }

    #[tokio::test]
    async fn trigger_failure_does_not_undo_persistence() {
        init_test_tracing();
        let pipeline = Pipeline::new();
        pipeline.trigger.inject_failures(1);
        let emitter = ClaimEventEmitter::new(
            Arc::new(SnapshotPayloadFactory::new(Arc::new(reference_data()))),
            pipeline.channel(),
            RetentionTable::default(),
        );
        let claim = lodged_claim();

        let emitted = emitter
            .dispatch_unsaved(&claim, Duration::ZERO)
            .await
            .unwrap();

        // The first trigger failed, yet all three events persisted
        assert_eq!(emitted.len(), 3);
        assert_eq!(pipeline.repository.len().await, 3);
        assert_eq!(pipeline.trigger.notification_count().await, 3);
    }
}

// ============================================================================
// QUOTE PIPELINE THROUGH THE QUEUE
// ============================================================================

mod quote_pipeline {
    use super::*;

    #[tokio::test]
    async fn queued_emission_reaches_the_repository_after_a_drain() {
        init_test_tracing();
        let pipeline = Pipeline::new();
        let queue = Arc::new(InMemoryJobQueue::new());
        let emitter = QuoteEventEmitter::new(
            Arc::new(SnapshotPayloadFactory::new(Arc::new(reference_data()))),
            EmissionChannel::Jobs(JobClient::new(queue.clone())),
            RetentionTable::default(),
        );
        let worker = JobWorker::new(queue.clone(), pipeline.service.clone());

        let mut quote = Quote::create_new_business(
            IdFixtures::tenant(),
            IdFixtures::organisation(),
            IdFixtures::product(),
            test_environment(),
            StringFixtures::quote_number(),
            Some(IdFixtures::user()),
        );
        quote.assign_customer(IdFixtures::customer(), None).unwrap();

        let emitted = emitter
            .dispatch_unsaved(&quote, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(emitted.len(), 2);

        // Nothing persisted until the worker picks the jobs up
        assert!(pipeline.repository.is_empty().await);

        let processed = worker.drain_ready(now_ms()).await.unwrap();
        assert_eq!(processed, 2);
        assert_eq!(pipeline.repository.len().await, 2);
        assert_eq!(pipeline.trigger.notification_count().await, 2);

        let created = pipeline.repository.get(emitted[0]).await.unwrap().unwrap();
        assert_eq!(created.event_type, SystemEventType::QuoteCreated);
        assert_has_relationship(
            &created,
            RelationshipType::OrganisationEvent,
            IdFixtures::organisation().into_uuid(),
        );
        assert_has_relationship(
            &created,
            RelationshipType::QuoteEvent,
            EventSourced::id(&quote).into_uuid(),
        );
        assert_relationships_point_at_event(&created);
    }

    #[tokio::test]
    async fn delayed_jobs_wait_for_promotion() {
        init_test_tracing();
        let pipeline = Pipeline::new();
        let queue = Arc::new(InMemoryJobQueue::new());
        let emitter = QuoteEventEmitter::new(
            Arc::new(SnapshotPayloadFactory::new(Arc::new(reference_data()))),
            EmissionChannel::Jobs(JobClient::new(queue.clone())),
            RetentionTable::default(),
        );
        let worker = JobWorker::new(queue.clone(), pipeline.service.clone());

        let quote = Quote::create_new_business(
            IdFixtures::tenant(),
            IdFixtures::organisation(),
            IdFixtures::product(),
            test_environment(),
            StringFixtures::quote_number(),
            None,
        );
        emitter
            .dispatch_unsaved(&quote, Duration::from_secs(60))
            .await
            .unwrap();

        // Draining now finds nothing; the job is scheduled a minute out
        assert_eq!(worker.drain_ready(now_ms()).await.unwrap(), 0);
        assert!(pipeline.repository.is_empty().await);

        let after_delay = now_ms() + 61_000;
        assert_eq!(worker.drain_ready(after_delay).await.unwrap(), 1);
        assert_eq!(pipeline.repository.len().await, 1);
    }
}

// ============================================================================
// LOGIN EMISSION
// ============================================================================

mod login_emission {
    use super::*;

    #[tokio::test]
    async fn successful_login_expires_after_thirty_days() {
        init_test_tracing();
        let pipeline = Pipeline::new();
        let emitter = UserEventEmitter::new(
            Arc::new(SnapshotPayloadFactory::new(Arc::new(reference_data()))),
            pipeline.channel(),
            RetentionTable::default(),
        );
        let login = UserLoginViewBuilder::new().build();

        let emitted = emitter
            .create_and_emit_system_events(
                &login,
                &[SystemEventType::UserLoginAttemptSucceeded],
                Duration::ZERO,
            )
            .await
            .unwrap();

        assert_eq!(emitted.len(), 1);
        let stored = pipeline.repository.get(emitted[0]).await.unwrap().unwrap();
        assert_eq!(
            stored.event_type,
            SystemEventType::UserLoginAttemptSucceeded
        );
        assert_expires_after_hours(&stored, 720);
        assert_has_relationship(
            &stored,
            RelationshipType::UserEvent,
            IdFixtures::user().into_uuid(),
        );
        assert_has_relationship(
            &stored,
            RelationshipType::PersonEvent,
            IdFixtures::person().into_uuid(),
        );
        assert_has_relationship(
            &stored,
            RelationshipType::OrganisationEvent,
            IdFixtures::organisation().into_uuid(),
        );
        assert!(stored.product_id.is_none());
    }

    #[tokio::test]
    async fn unknown_organisation_alias_drops_the_login_events() {
        init_test_tracing();
        let pipeline = Pipeline::new();
        let emitter = UserEventEmitter::new(
            Arc::new(SnapshotPayloadFactory::new(Arc::new(reference_data()))),
            pipeline.channel(),
            RetentionTable::default(),
        );
        let login = UserLoginViewBuilder::new()
            .with_organisation_alias("no-such-organisation")
            .build();

        let emitted = emitter
            .create_and_emit_system_events(
                &login,
                &[SystemEventType::UserLoginAttemptFailed],
                Duration::ZERO,
            )
            .await
            .unwrap();

        assert!(emitted.is_empty());
        assert!(pipeline.repository.is_empty().await);
    }
}

// ============================================================================
// SERVICE IDEMPOTENCY
// ============================================================================

mod service_idempotency {
    use super::*;

    #[tokio::test]
    async fn redelivered_command_triggers_automations_once() {
        init_test_tracing();
        let pipeline = Pipeline::new();
        let command = CreateSystemEventCommandBuilder::new()
            .with_event_type(SystemEventType::QuoteSubmitted)
            .relating(
                RelationshipType::QuoteEvent,
                IdFixtures::quote().into_uuid(),
            )
            .tagged(test_environment().as_str())
            .build();

        let first = pipeline
            .service
            .create_system_event(command.clone())
            .await
            .unwrap();
        let second = pipeline
            .service
            .create_system_event(command)
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(pipeline.repository.len().await, 1);
        assert_eq!(pipeline.trigger.notification_count().await, 1);
    }
}

// ============================================================================
// RETENTION PROPERTIES
// ============================================================================

proptest! {
    #[test]
    fn expiry_is_always_created_plus_retention(
        event_type in system_event_type_strategy(),
        hours in retention_hours_strategy(),
        created in created_timestamp_strategy(),
    ) {
        let table = RetentionTable::empty().with_hours(event_type, hours);
        let expiry = table.expiry_for(event_type, created);
        prop_assert_eq!(expiry, Some(created + ChronoDuration::hours(hours)));
    }

    #[test]
    fn absent_types_never_expire(
        event_type in system_event_type_strategy(),
        created in created_timestamp_strategy(),
    ) {
        let table = RetentionTable::empty();
        prop_assert_eq!(table.expiry_for(event_type, created), None);
        prop_assert_eq!(table.persist_hours(event_type), None);
    }
}
