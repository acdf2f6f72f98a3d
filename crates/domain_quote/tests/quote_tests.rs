//! Quote Aggregate Tests
//!
//! This module contains comprehensive tests for the Quote aggregate root,
//! covering creation, form data capture, calculation, customer assignment,
//! submission, policy issue, discard, and expiry.
//!
//! # Test Organization
//!
//! Tests are grouped by functionality:
//! - `creation` - factory methods and policy-linkage validation
//! - `working_state` - form data, calculations, customer and workflow changes
//! - `submission` - submit preconditions and the frozen complete state
//! - `issue_and_closure` - policy issue, discard, and expiry rules
//! - `event_stream` - uncommitted buffer handling and rehydration

use chrono::{Duration, Utc};
use core_kernel::{
    Currency, CustomerId, DeploymentEnvironment, DomainEvent, EventSourced, Money, OrganisationId,
    PolicyId, ProductId, TenantId, UserId,
};
use domain_quote::{Quote, QuoteError, QuoteEvent, QuoteStatus, QuoteType};
use rust_decimal_macros::dec;
use serde_json::json;
use uuid::Uuid;

// ============================================================================
// TEST FIXTURES
// ============================================================================

fn tenant() -> TenantId {
    TenantId::from_uuid(Uuid::from_u128(0x11))
}

fn organisation() -> OrganisationId {
    OrganisationId::from_uuid(Uuid::from_u128(0x22))
}

fn product() -> ProductId {
    ProductId::from_uuid(Uuid::from_u128(0x33))
}

fn acting_user() -> UserId {
    UserId::from_uuid(Uuid::from_u128(0x44))
}

/// Creates a new-business quote in the Incomplete state
fn create_test_quote() -> Quote {
    Quote::create_new_business(
        tenant(),
        organisation(),
        product(),
        DeploymentEnvironment::Development,
        "Q-1001",
        Some(acting_user()),
    )
}

/// Creates a quote with form data captured, ready to submit
fn create_submittable_quote() -> Quote {
    let mut quote = create_test_quote();
    quote
        .update_form_data(json!({"street": "George St", "suburb": "Sydney"}), None)
        .unwrap();
    quote
}

// ============================================================================
// CREATION
// ============================================================================

mod creation {
    use super::*;

    #[test]
    fn test_new_business_quote_has_no_policy_linkage() {
        let quote = create_test_quote();

        assert_eq!(quote.status(), QuoteStatus::Incomplete);
        assert_eq!(quote.quote_type(), QuoteType::NewBusiness);
        assert_eq!(quote.quote_number(), "Q-1001");
        assert_eq!(quote.tenant_id(), tenant());
        assert_eq!(quote.organisation_id(), organisation());
        assert!(quote.policy_id().is_none());
        assert!(quote.policy_number().is_none());
        assert!(!quote.policy_issued());
    }

    #[test]
    fn test_policy_derived_quote_records_source_policy() {
        let policy_id = PolicyId::new();
        let quote = Quote::create_for_policy(
            tenant(),
            organisation(),
            product(),
            DeploymentEnvironment::Production,
            QuoteType::Adjustment,
            "Q-2001",
            policy_id,
            "P-9000",
            None,
        )
        .unwrap();

        assert_eq!(quote.quote_type(), QuoteType::Adjustment);
        assert_eq!(quote.policy_id(), Some(policy_id));
        assert_eq!(quote.policy_number(), Some("P-9000"));
        assert!(!quote.policy_issued(), "Source linkage is not an issue");
    }

    #[test]
    fn test_renewal_and_cancellation_types_accepted_for_policy() {
        for quote_type in [QuoteType::Renewal, QuoteType::Cancellation] {
            let result = Quote::create_for_policy(
                tenant(),
                organisation(),
                product(),
                DeploymentEnvironment::Staging,
                quote_type,
                "Q-2002",
                PolicyId::new(),
                "P-9001",
                None,
            );
            assert!(result.is_ok(), "{quote_type} should accept a policy");
        }
    }

    #[test]
    fn test_new_business_rejected_for_policy() {
        let result = Quote::create_for_policy(
            tenant(),
            organisation(),
            product(),
            DeploymentEnvironment::Development,
            QuoteType::NewBusiness,
            "Q-2003",
            PolicyId::new(),
            "P-9002",
            None,
        );

        let error = result.unwrap_err();
        assert_eq!(error.code(), "quote.type.requires.policy");
    }

    #[test]
    fn test_initializing_event_carries_performing_user() {
        let quote = create_test_quote();
        let envelope = &quote.unsaved_events()[0];

        assert_eq!(envelope.sequence, 0);
        assert_eq!(envelope.performing_user_id, Some(acting_user()));
        assert_eq!(envelope.event.event_type(), "Initialized");
    }
}

// ============================================================================
// WORKING STATE
// ============================================================================

mod working_state {
    use super::*;

    #[test]
    fn test_form_data_update_replaces_previous_capture() {
        let mut quote = create_test_quote();
        quote.update_form_data(json!({"street": "Old"}), None).unwrap();
        quote.update_form_data(json!({"street": "New"}), None).unwrap();

        assert_eq!(quote.form_data(), Some(&json!({"street": "New"})));
    }

    #[test]
    fn test_calculation_records_result_and_total() {
        let mut quote = create_test_quote();
        let total = Money::new(dec!(1234.56), Currency::AUD);
        quote
            .record_calculation(json!({"basePremium": 1200}), Some(total), None)
            .unwrap();

        assert_eq!(quote.calculation_result(), Some(&json!({"basePremium": 1200})));
        assert_eq!(quote.total_payable(), Some(total));
    }

    #[test]
    fn test_customer_assignment_and_reassignment() {
        let mut quote = create_test_quote();
        let first = CustomerId::new();
        let second = CustomerId::new();

        quote.assign_customer(first, None).unwrap();
        assert_eq!(quote.customer_id(), Some(first));

        // Moving to a different customer is allowed
        quote.assign_customer(second, None).unwrap();
        assert_eq!(quote.customer_id(), Some(second));

        // Re-assigning the current customer is rejected
        let result = quote.assign_customer(second, None);
        assert_eq!(result.unwrap_err().code(), "quote.customer.already.assigned");
    }

    #[test]
    fn test_workflow_step_changes_are_recorded() {
        let mut quote = create_test_quote();
        quote.change_workflow_step("details", None).unwrap();
        quote.change_workflow_step("payment", None).unwrap();

        assert_eq!(quote.workflow_step(), Some("payment"));
    }
}

// ============================================================================
// SUBMISSION
// ============================================================================

mod submission {
    use super::*;

    #[test]
    fn test_submit_without_form_data_is_rejected() {
        let mut quote = create_test_quote();
        let error = quote.submit(None).unwrap_err();

        assert_eq!(error.code(), "quote.submission.requires.form.data");
        assert_eq!(quote.status(), QuoteStatus::Incomplete);
    }

    #[test]
    fn test_submit_completes_the_quote() {
        let mut quote = create_submittable_quote();
        quote.submit(Some(acting_user())).unwrap();

        assert_eq!(quote.status(), QuoteStatus::Complete);
    }

    #[test]
    fn test_complete_quote_rejects_further_modification() {
        let mut quote = create_submittable_quote();
        quote.submit(None).unwrap();

        let form = quote.update_form_data(json!({}), None).unwrap_err();
        assert_eq!(form.code(), "quote.cannot.be.modified.when.complete");

        let calc = quote.record_calculation(json!({}), None, None).unwrap_err();
        assert_eq!(calc.code(), "quote.cannot.be.modified.when.complete");

        let second_submit = quote.submit(None).unwrap_err();
        assert_eq!(second_submit.code(), "quote.cannot.be.modified.when.complete");
    }

    #[test]
    fn test_discarded_quote_reports_discarded_code() {
        let mut quote = create_test_quote();
        quote.discard(None).unwrap();

        let error = quote.update_form_data(json!({}), None).unwrap_err();
        assert_eq!(error.code(), "quote.cannot.be.modified.when.discarded");
    }

    #[test]
    fn test_expired_quote_reports_expired_code() {
        let mut quote = create_test_quote();
        quote.expire(Utc::now(), None).unwrap();

        let error = quote.update_form_data(json!({}), None).unwrap_err();
        assert_eq!(error.code(), "quote.cannot.be.modified.when.expired");
    }
}

// ============================================================================
// ISSUE AND CLOSURE
// ============================================================================

mod issue_and_closure {
    use super::*;

    #[test]
    fn test_issue_requires_complete_status() {
        let mut quote = create_submittable_quote();

        let error = quote.issue_policy(PolicyId::new(), "P-1", None).unwrap_err();
        assert_eq!(error.code(), "quote.must.be.complete");
    }

    #[test]
    fn test_issue_records_policy_and_blocks_reissue() {
        let mut quote = create_submittable_quote();
        quote.submit(None).unwrap();

        let policy_id = PolicyId::new();
        quote.issue_policy(policy_id, "P-1", None).unwrap();

        assert!(quote.policy_issued());
        assert_eq!(quote.policy_id(), Some(policy_id));
        assert_eq!(quote.policy_number(), Some("P-1"));

        let error = quote.issue_policy(PolicyId::new(), "P-2", None).unwrap_err();
        assert_eq!(error.code(), "quote.policy.already.issued");
    }

    #[test]
    fn test_discard_blocked_after_issue() {
        let mut quote = create_submittable_quote();
        quote.submit(None).unwrap();
        quote.issue_policy(PolicyId::new(), "P-1", None).unwrap();

        let error = quote.discard(None).unwrap_err();
        assert_eq!(error.code(), "quote.cannot.discard.issued");
    }

    #[test]
    fn test_double_discard_rejected() {
        let mut quote = create_test_quote();
        quote.discard(None).unwrap();

        let error = quote.discard(None).unwrap_err();
        assert_eq!(error.code(), "quote.already.discarded");
    }

    #[test]
    fn test_expire_only_from_incomplete() {
        let mut quote = create_submittable_quote();
        quote.submit(None).unwrap();

        let error = quote.expire(Utc::now(), None).unwrap_err();
        assert_eq!(error.code(), "quote.expiry.requires.incomplete");
    }

    #[test]
    fn test_expire_records_the_supplied_instant() {
        let mut quote = create_test_quote();
        let at = Utc::now() - Duration::minutes(5);
        quote.expire(at, None).unwrap();

        assert_eq!(quote.status(), QuoteStatus::Expired);
        let last = quote.unsaved_events().last().unwrap();
        assert_eq!(last.event, QuoteEvent::Expired { expired_at: at });
    }
}

// ============================================================================
// EVENT STREAM
// ============================================================================

mod event_stream {
    use super::*;

    #[test]
    fn test_every_mutation_appends_exactly_one_event() {
        let mut quote = create_test_quote();
        quote.update_form_data(json!({"a": 1}), None).unwrap();
        quote.assign_customer(CustomerId::new(), None).unwrap();
        quote.submit(None).unwrap();

        let types: Vec<&str> = quote
            .unsaved_events()
            .iter()
            .map(|e| e.event.event_type())
            .collect();
        assert_eq!(
            types,
            vec!["Initialized", "FormDataUpdated", "CustomerAssigned", "Submitted"]
        );

        let sequences: Vec<u64> = quote.unsaved_events().iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_on_saved_changes_clears_buffer_only() {
        let mut quote = create_submittable_quote();
        quote.submit(None).unwrap();
        quote.on_saved_changes();

        assert!(quote.unsaved_events().is_empty());
        assert_eq!(quote.status(), QuoteStatus::Complete);
        assert_eq!(quote.sequence(), 3);

        // The next mutation continues the sequence
        let mut reopened = create_test_quote();
        reopened.on_saved_changes();
        reopened.update_form_data(json!({}), None).unwrap();
        assert_eq!(reopened.unsaved_events()[0].sequence, 1);
    }

    #[test]
    fn test_rehydrated_quote_matches_live_aggregate() {
        let mut quote = create_submittable_quote();
        quote
            .record_calculation(
                json!({"levies": 12.5}),
                Some(Money::new(dec!(980.00), Currency::AUD)),
                None,
            )
            .unwrap();
        quote.submit(None).unwrap();
        quote.issue_policy(PolicyId::new(), "P-77", None).unwrap();

        let history = quote.unsaved_events().to_vec();
        quote.on_saved_changes();

        let rebuilt = Quote::rehydrate(history).unwrap();
        assert_eq!(rebuilt, quote);
        assert_eq!(rebuilt.sequence(), quote.sequence());
    }

    #[test]
    fn test_rehydrate_rejects_streams_missing_the_initializer() {
        let mut quote = create_test_quote();
        quote.update_form_data(json!({}), None).unwrap();

        let mut history = quote.unsaved_events().to_vec();
        history.remove(0);
        history[0].sequence = 0;

        let result = Quote::rehydrate(history);
        assert!(result.is_err());
    }
}
