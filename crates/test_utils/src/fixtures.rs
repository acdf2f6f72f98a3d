//! Pre-built Test Fixtures
//!
//! Ready-to-use test data for the entities that flow through system events.
//! Identifiers are derived from fixed integers so assertions can name the
//! exact row they expect, and so two test runs always agree.

use chrono::{DateTime, TimeZone, Utc};
use core_kernel::{
    ClaimId, Currency, CustomerId, DeploymentEnvironment, Money, OrganisationId, PersonId,
    PolicyId, ProductId, QuoteId, SystemEventId, TenantId, UserId,
};
use rust_decimal_macros::dec;
use uuid::Uuid;

/// Deterministic identifiers for every entity family
pub struct IdFixtures;

impl IdFixtures {
    pub fn tenant() -> TenantId {
        TenantId::from_uuid(Uuid::from_u128(0x1001))
    }

    /// A second tenant for isolation tests
    pub fn other_tenant() -> TenantId {
        TenantId::from_uuid(Uuid::from_u128(0x1002))
    }

    pub fn organisation() -> OrganisationId {
        OrganisationId::from_uuid(Uuid::from_u128(0x2001))
    }

    pub fn product() -> ProductId {
        ProductId::from_uuid(Uuid::from_u128(0x3001))
    }

    pub fn quote() -> QuoteId {
        QuoteId::from_uuid(Uuid::from_u128(0x4001))
    }

    pub fn policy() -> PolicyId {
        PolicyId::from_uuid(Uuid::from_u128(0x5001))
    }

    pub fn claim() -> ClaimId {
        ClaimId::from_uuid(Uuid::from_u128(0x6001))
    }

    pub fn customer() -> CustomerId {
        CustomerId::from_uuid(Uuid::from_u128(0x7001))
    }

    pub fn person() -> PersonId {
        PersonId::from_uuid(Uuid::from_u128(0x8001))
    }

    pub fn user() -> UserId {
        UserId::from_uuid(Uuid::from_u128(0x9001))
    }

    pub fn system_event() -> SystemEventId {
        SystemEventId::from_uuid(Uuid::from_u128(0xA001))
    }
}

/// Fixed instants for expiry and ordering tests
pub struct InstantFixtures;

impl InstantFixtures {
    /// The reference "now" most tests measure expiry against
    pub fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 15, 10, 30, 0).unwrap()
    }

    /// One hour before [`InstantFixtures::now`]
    pub fn an_hour_ago() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 15, 9, 30, 0).unwrap()
    }

    /// The previous day, for created-timestamp ordering
    pub fn yesterday() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 10, 30, 0).unwrap()
    }

    /// A week out, for events that have not expired yet
    pub fn next_week() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 22, 10, 30, 0).unwrap()
    }

    /// An incident date safely in the past
    pub fn incident_date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 28, 14, 0, 0).unwrap()
    }
}

/// Human-readable test values shared across builders and tests
pub struct StringFixtures;

impl StringFixtures {
    pub fn tenant_alias() -> String {
        "meridian".to_string()
    }

    pub fn organisation_alias() -> String {
        "harbour-mutual".to_string()
    }

    pub fn organisation_name() -> String {
        "Harbour Mutual".to_string()
    }

    pub fn product_alias() -> String {
        "home-standard".to_string()
    }

    pub fn product_name() -> String {
        "Home Standard".to_string()
    }

    pub fn quote_number() -> String {
        "Q-00042".to_string()
    }

    pub fn policy_number() -> String {
        "P-00042".to_string()
    }

    pub fn claim_number() -> String {
        "C-00017".to_string()
    }

    pub fn display_name() -> String {
        "Priya Raman".to_string()
    }

    pub fn email() -> String {
        "priya.raman@example.com".to_string()
    }
}

/// Claim amounts for settlement scenarios
pub struct MoneyFixtures;

impl MoneyFixtures {
    pub fn aud_claimed() -> Money {
        Money::new(dec!(4200.00), Currency::AUD)
    }

    pub fn aud_revised() -> Money {
        Money::new(dec!(3850.50), Currency::AUD)
    }

    pub fn aud_zero() -> Money {
        Money::zero(Currency::AUD)
    }
}

/// The environment most tests run their fixtures in
pub fn test_environment() -> DeploymentEnvironment {
    DeploymentEnvironment::Development
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_fixtures_are_stable() {
        assert_eq!(IdFixtures::tenant(), IdFixtures::tenant());
        assert_ne!(
            IdFixtures::tenant().into_uuid(),
            IdFixtures::other_tenant().into_uuid()
        );
    }

    #[test]
    fn test_instants_are_ordered() {
        assert!(InstantFixtures::yesterday() < InstantFixtures::an_hour_ago());
        assert!(InstantFixtures::an_hour_ago() < InstantFixtures::now());
        assert!(InstantFixtures::now() < InstantFixtures::next_week());
    }
}
