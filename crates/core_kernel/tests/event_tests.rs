//! Unit tests for the event-sourcing kernel
//!
//! Exercises the aggregate contract through a minimal probe aggregate:
//! envelopes fold deterministically, the uncommitted buffer clears on save,
//! and stream verification rejects gaps and empty streams.

use chrono::{TimeZone, Utc};
use core_kernel::{
    verify_contiguous, DomainEvent, EventEnvelope, EventSourced, QuoteId, RehydrateError,
    StoredEvent, TenantId,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum LedgerEvent {
    Opened { label: String },
    Deposited { amount: i64 },
    Withdrawn { amount: i64 },
}

impl DomainEvent for LedgerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LedgerEvent::Opened { .. } => "Opened",
            LedgerEvent::Deposited { .. } => "Deposited",
            LedgerEvent::Withdrawn { .. } => "Withdrawn",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Ledger {
    tenant_id: TenantId,
    id: QuoteId,
    label: String,
    balance: i64,
    sequence: u64,
    unsaved: Vec<EventEnvelope<QuoteId, LedgerEvent>>,
}

impl Ledger {
    fn open(tenant_id: TenantId, id: QuoteId, label: &str) -> Self {
        let mut ledger = Self {
            tenant_id,
            id,
            label: String::new(),
            balance: 0,
            sequence: 0,
            unsaved: Vec::new(),
        };
        ledger.record(LedgerEvent::Opened {
            label: label.to_string(),
        });
        ledger
    }

    fn deposit(&mut self, amount: i64) {
        self.record(LedgerEvent::Deposited { amount });
    }

    fn withdraw(&mut self, amount: i64) {
        self.record(LedgerEvent::Withdrawn { amount });
    }

    fn record(&mut self, event: LedgerEvent) {
        let envelope = EventEnvelope {
            tenant_id: self.tenant_id,
            aggregate_id: self.id,
            sequence: self.sequence,
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
            performing_user_id: None,
            event,
        };
        self.apply(&envelope);
        self.unsaved.push(envelope);
    }

    fn rehydrate(events: Vec<EventEnvelope<QuoteId, LedgerEvent>>) -> Result<Self, RehydrateError> {
        verify_contiguous(Self::AGGREGATE_TYPE, &events)?;
        let first = &events[0];
        let LedgerEvent::Opened { .. } = &first.event else {
            return Err(RehydrateError::NotInitializingEvent {
                aggregate_type: Self::AGGREGATE_TYPE,
                expected: "Opened",
                found: first.event.event_type().to_string(),
            });
        };
        let mut ledger = Self {
            tenant_id: first.tenant_id,
            id: first.aggregate_id,
            label: String::new(),
            balance: 0,
            sequence: 0,
            unsaved: Vec::new(),
        };
        for envelope in &events {
            ledger.apply(envelope);
        }
        Ok(ledger)
    }
}

impl EventSourced for Ledger {
    type Id = QuoteId;
    type Event = LedgerEvent;

    const AGGREGATE_TYPE: &'static str = "ledger";

    fn id(&self) -> QuoteId {
        self.id
    }

    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    fn sequence(&self) -> u64 {
        self.sequence
    }

    fn apply(&mut self, envelope: &EventEnvelope<QuoteId, LedgerEvent>) {
        match &envelope.event {
            LedgerEvent::Opened { label } => self.label = label.clone(),
            LedgerEvent::Deposited { amount } => self.balance += amount,
            LedgerEvent::Withdrawn { amount } => self.balance -= amount,
        }
        self.sequence = envelope.sequence + 1;
    }

    fn unsaved_events(&self) -> &[EventEnvelope<QuoteId, LedgerEvent>] {
        &self.unsaved
    }

    fn on_saved_changes(&mut self) {
        self.unsaved.clear();
    }
}

fn fixed_ids() -> (TenantId, QuoteId) {
    (
        TenantId::from_uuid(Uuid::from_u128(1)),
        QuoteId::from_uuid(Uuid::from_u128(2)),
    )
}

mod aggregate_contract {
    use super::*;

    #[test]
    fn test_mutators_append_to_unsaved_buffer_in_order() {
        let (tenant_id, id) = fixed_ids();
        let mut ledger = Ledger::open(tenant_id, id, "fees");
        ledger.deposit(100);
        ledger.withdraw(30);

        let sequences: Vec<u64> = ledger.unsaved_events().iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![0, 1, 2]);
        assert_eq!(ledger.balance, 70);
        assert_eq!(ledger.sequence(), 3);
    }

    #[test]
    fn test_on_saved_changes_clears_buffer_but_not_state() {
        let (tenant_id, id) = fixed_ids();
        let mut ledger = Ledger::open(tenant_id, id, "fees");
        ledger.deposit(50);

        ledger.on_saved_changes();

        assert!(ledger.unsaved_events().is_empty());
        assert_eq!(ledger.balance, 50);
        assert_eq!(ledger.sequence(), 2);
    }

    #[test]
    fn test_rehydrate_reproduces_live_state() {
        let (tenant_id, id) = fixed_ids();
        let mut live = Ledger::open(tenant_id, id, "fees");
        live.deposit(100);
        live.withdraw(25);

        let history = live.unsaved_events().to_vec();
        live.on_saved_changes();

        let rebuilt = Ledger::rehydrate(history).unwrap();
        assert_eq!(rebuilt, live);
    }

    #[test]
    fn test_rehydrate_is_deterministic_under_refold() {
        let (tenant_id, id) = fixed_ids();
        let mut live = Ledger::open(tenant_id, id, "fees");
        live.deposit(10);
        live.deposit(20);
        let history = live.unsaved_events().to_vec();

        let first = Ledger::rehydrate(history.clone()).unwrap();
        let second = Ledger::rehydrate(history).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_rehydrate_rejects_stream_not_starting_with_initializer() {
        let (tenant_id, id) = fixed_ids();
        let mut ledger = Ledger::open(tenant_id, id, "fees");
        ledger.deposit(10);

        // Drop the initializing event and renumber to keep the stream contiguous.
        let mut history = ledger.unsaved_events().to_vec();
        history.remove(0);
        history[0].sequence = 0;

        let result = Ledger::rehydrate(history);
        assert_eq!(
            result,
            Err(RehydrateError::NotInitializingEvent {
                aggregate_type: "ledger",
                expected: "Opened",
                found: "Deposited".to_string(),
            })
        );
    }

    #[test]
    fn test_rehydrate_rejects_sequence_gap() {
        let (tenant_id, id) = fixed_ids();
        let mut ledger = Ledger::open(tenant_id, id, "fees");
        ledger.deposit(10);
        ledger.deposit(20);

        let mut history = ledger.unsaved_events().to_vec();
        history.remove(1);

        let result = Ledger::rehydrate(history);
        assert_eq!(
            result,
            Err(RehydrateError::SequenceGap {
                expected: 1,
                found: 2
            })
        );
    }
}

mod stored_events {
    use super::*;

    #[test]
    fn test_envelope_survives_storage_round_trip() {
        let (tenant_id, id) = fixed_ids();
        let mut ledger = Ledger::open(tenant_id, id, "fees");
        ledger.deposit(42);

        let stored: Vec<StoredEvent> = ledger
            .unsaved_events()
            .iter()
            .map(|e| StoredEvent::from_envelope(Ledger::AGGREGATE_TYPE, e).unwrap())
            .collect();

        assert_eq!(stored[0].event_type, "Opened");
        assert_eq!(stored[1].event_type, "Deposited");
        assert!(stored.iter().all(|s| s.aggregate_type == "ledger"));

        let restored: Vec<EventEnvelope<QuoteId, LedgerEvent>> =
            stored.iter().map(|s| s.to_envelope().unwrap()).collect();
        assert_eq!(restored, ledger.unsaved_events());
    }
}
