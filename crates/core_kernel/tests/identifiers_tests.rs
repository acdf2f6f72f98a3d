//! Unit tests for strongly-typed identifiers

use core_kernel::{ClaimId, OrganisationId, QuoteId, SystemEventId, TenantId};
use uuid::Uuid;

mod display {
    use super::*;

    #[test]
    fn test_each_id_type_has_its_own_prefix() {
        assert!(TenantId::new().to_string().starts_with("TEN-"));
        assert!(OrganisationId::new().to_string().starts_with("ORG-"));
        assert!(QuoteId::new().to_string().starts_with("QTE-"));
        assert!(ClaimId::new().to_string().starts_with("CLM-"));
        assert!(SystemEventId::new().to_string().starts_with("EVT-"));
    }
}

mod parsing {
    use super::*;

    #[test]
    fn test_parses_prefixed_form() {
        let original = QuoteId::new();
        let parsed: QuoteId = original.to_string().parse().unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_parses_bare_uuid() {
        let uuid = Uuid::new_v4();
        let parsed: ClaimId = uuid.to_string().parse().unwrap();
        assert_eq!(parsed.as_uuid(), &uuid);
    }

    #[test]
    fn test_rejects_garbage() {
        let result: Result<TenantId, _> = "TEN-not-a-uuid".parse();
        assert!(result.is_err());
    }
}

mod conversions {
    use super::*;

    #[test]
    fn test_uuid_round_trip() {
        let uuid = Uuid::new_v4();
        let id = OrganisationId::from(uuid);
        let back: Uuid = id.into();
        assert_eq!(back, uuid);
    }

    #[test]
    fn test_serde_is_transparent() {
        let id = SystemEventId::from_uuid(Uuid::from_u128(42));
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.as_uuid()));

        let parsed: SystemEventId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_v7_ids_are_time_ordered() {
        let first = QuoteId::new_v7();
        let second = QuoteId::new_v7();
        assert!(first.as_uuid() <= second.as_uuid());
    }
}
