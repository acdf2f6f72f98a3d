//! End-to-end tests for the PatchObject provider, driving it through the
//! configuration JSON exactly as the product console stores it.

use automations::{FailureReason, OperationKind, PatchObject, PatchObjectError, ResolveOutcome};
use core_kernel::DomainError;
use serde_json::{json, Value};

// ============================================================================
// Fixtures
// ============================================================================

fn address_document() -> Value {
    json!({
        "street": { "name": "George Street", "number": "100" },
        "suburb": "Sydney",
        "postcode": 2000
    })
}

/// Configuration JSON with the address seed and the given operation list
fn config_with(seed: &Value, operations: Value) -> String {
    json!({
        "object": { "jsonObject": seed.to_string() },
        "operations": operations
    })
    .to_string()
}

fn resolve(seed: &Value, operations: Value) -> Result<(Value, ResolveOutcome), PatchObjectError> {
    let patch = PatchObject::from_json(&config_with(seed, operations))?;
    let resolution = patch.resolve()?;
    Ok((resolution.document, resolution.outcome))
}

// ============================================================================
// Configuration parsing
// ============================================================================

mod configuration {
    use super::*;

    #[test]
    fn parses_seed_and_operations_from_configuration_json() {
        let raw = config_with(
            &address_document(),
            json!([
                { "add": { "path": "/house", "value": "12" } },
                { "remove": { "path": "/postcode", "whenPropertyNotFound": "continue" } }
            ]),
        );
        let patch = PatchObject::from_json(&raw).unwrap();
        assert_eq!(patch.document(), &address_document());
        assert_eq!(patch.operations().len(), 2);
        assert_eq!(patch.operations()[0].kind(), OperationKind::Add);
        assert_eq!(patch.operations()[1].kind(), OperationKind::Remove);
    }

    #[test]
    fn absent_seed_starts_from_an_empty_document() {
        let patch = PatchObject::from_json(
            r#"{ "operations": [ { "add": { "path": "/house", "value": "12" } } ] }"#,
        )
        .unwrap();
        let resolution = patch.resolve().unwrap();
        assert_eq!(resolution.document, json!({ "house": "12" }));
    }

    #[test]
    fn invalid_seed_json_is_rejected() {
        let error = PatchObject::from_json(
            r#"{ "object": { "jsonObject": "{not json" }, "operations": [] }"#,
        )
        .unwrap_err();
        assert!(matches!(error, PatchObjectError::InvalidDefinition(_)));
        assert_eq!(
            error.code(),
            "automation.providers.patchObject.definition.invalid"
        );
    }

    #[test]
    fn non_object_seed_is_rejected() {
        let error = PatchObject::from_json(
            r#"{ "object": { "jsonObject": "[1, 2, 3]" }, "operations": [] }"#,
        )
        .unwrap_err();
        assert!(matches!(error, PatchObjectError::InvalidDefinition(_)));
    }

    #[test]
    fn unknown_operation_name_is_rejected() {
        let error = PatchObject::from_json(
            r#"{ "operations": [ { "transmogrify": { "path": "/house" } } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(error, PatchObjectError::InvalidDefinition(_)));
    }
}

// ============================================================================
// Resolution scenarios
// ============================================================================

mod scenarios {
    use super::*;

    #[test]
    fn add_inserts_a_new_property_and_leaves_the_rest_untouched() {
        let (document, outcome) = resolve(
            &address_document(),
            json!([
                { "add": { "path": "/house", "value": "12" } }
            ]),
        )
        .unwrap();

        assert_eq!(outcome, ResolveOutcome::Completed);
        assert_eq!(document["house"], "12");
        assert_eq!(document["street"]["name"], "George Street");
        assert_eq!(document["suburb"], "Sydney");
        assert_eq!(document["postcode"], 2000);
    }

    #[test]
    fn end_policy_halts_the_remaining_operations() {
        let (document, outcome) = resolve(
            &address_document(),
            json!([
                { "add": { "path": "/house", "value": "12" } },
                { "add": {
                    "path": "/street1/newName",
                    "value": "Pitt Street",
                    "whenParentPropertyNotFound": "end"
                }},
                { "add": { "path": "/postcode", "value": "9999" } }
            ]),
        )
        .unwrap();

        assert_eq!(outcome, ResolveOutcome::Ended { at: 1 });
        // The first operation landed, the one after the end never ran
        assert_eq!(document["house"], "12");
        assert_eq!(document["postcode"], 2000);
        assert!(document.get("street1").is_none());
    }

    #[test]
    fn continue_policy_skips_only_the_failing_operation() {
        let (document, outcome) = resolve(
            &address_document(),
            json!([
                { "add": { "path": "/house", "value": "12" } },
                { "add": {
                    "path": "/street1/newName",
                    "value": "Pitt Street",
                    "whenParentPropertyNotFound": "continue"
                }},
                { "add": { "path": "/floor", "value": "3" } }
            ]),
        )
        .unwrap();

        assert_eq!(outcome, ResolveOutcome::Completed);
        assert_eq!(document["house"], "12");
        assert_eq!(document["floor"], "3");
        assert!(document.get("street1").is_none());
    }

    #[test]
    fn copy_duplicates_the_value_and_keeps_the_source() {
        let (document, outcome) = resolve(
            &address_document(),
            json!([
                { "copy": { "from": "/suburb", "to": "/newSubUrb" } }
            ]),
        )
        .unwrap();

        assert_eq!(outcome, ResolveOutcome::Completed);
        assert_eq!(document["newSubUrb"], "Sydney");
        assert_eq!(document["suburb"], "Sydney");
    }

    #[test]
    fn move_onto_an_existing_property_raises_by_default() {
        let mut seed = address_document();
        seed["person"] = json!({ "firstName": "Imogen", "lastName": "Clarke" });

        let error = resolve(
            &seed,
            json!([
                { "move": { "from": "/person", "to": "/street" } }
            ]),
        )
        .unwrap_err();

        match &error {
            PatchObjectError::OperationFailed {
                operation_index,
                kind,
                reason,
            } => {
                assert_eq!(*operation_index, 0);
                assert_eq!(*kind, OperationKind::Move);
                assert_eq!(*reason, FailureReason::DestinationPropertyAlreadyExists);
            }
            other => panic!("expected an operation failure, got {other:?}"),
        }

        let domain_error: DomainError = error.into();
        assert_eq!(
            domain_error.code,
            "automation.providers.patchObject.operaton.failed"
        );
        assert_eq!(
            domain_error.additional_details,
            vec![
                "Operation: Move".to_string(),
                "Error Message: Destination property already exists".to_string(),
            ]
        );
    }

    #[test]
    fn move_transfers_the_value_and_removes_the_source() {
        let mut seed = address_document();
        seed["person"] = json!({ "firstName": "Imogen" });

        let (document, _) = resolve(
            &seed,
            json!([
                { "move": { "from": "/person", "to": "/occupant" } }
            ]),
        )
        .unwrap();

        assert_eq!(document["occupant"]["firstName"], "Imogen");
        assert!(document.get("person").is_none());
    }

    #[test]
    fn replace_with_add_policy_creates_the_missing_property() {
        let (document, _) = resolve(
            &address_document(),
            json!([
                { "replace": {
                    "path": "/country",
                    "value": "Australia",
                    "whenPropertyNotFound": "add"
                }}
            ]),
        )
        .unwrap();

        assert_eq!(document["country"], "Australia");
    }

    #[test]
    fn structured_object_values_expand_before_applying() {
        let (document, _) = resolve(
            &address_document(),
            json!([
                { "add": {
                    "path": "/owner",
                    "value": [
                        { "propertyName": "name", "value": "Imogen Clarke" },
                        { "propertyName": "contact", "value": [
                            { "propertyName": "email", "value": "imogen.clarke@example.com" }
                        ]}
                    ]
                }}
            ]),
        )
        .unwrap();

        assert_eq!(
            document["owner"],
            json!({
                "name": "Imogen Clarke",
                "contact": { "email": "imogen.clarke@example.com" }
            })
        );
    }

    #[test]
    fn add_over_an_existing_object_merges_by_default() {
        let (document, _) = resolve(
            &address_document(),
            json!([
                { "add": { "path": "/street", "value": { "number": "12" } } }
            ]),
        )
        .unwrap();

        assert_eq!(
            document["street"],
            json!({ "name": "George Street", "number": "12" })
        );
    }
}
