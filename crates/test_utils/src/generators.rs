//! Property-Based Test Generators
//!
//! Proptest strategies for the system event vocabulary, plus fake-data
//! helpers for person details where realistic-looking values matter more
//! than shrinkability.

use chrono::{DateTime, Duration, TimeZone, Utc};
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::{FirstName, Name};
use fake::faker::phone_number::en::PhoneNumber;
use fake::Fake;
use proptest::prelude::*;
use proptest::sample::select;
use uuid::Uuid;

use core_kernel::{DeploymentEnvironment, SystemEventId, TenantId};
use domain_party::PersonDetails;
use system_events::{Relationship, RelationshipType, SystemEventType};

/// Strategy drawing from the full system event vocabulary
pub fn system_event_type_strategy() -> impl Strategy<Value = SystemEventType> {
    select(SystemEventType::all())
}

/// Strategy drawing from every relationship category
pub fn relationship_type_strategy() -> impl Strategy<Value = RelationshipType> {
    select(RelationshipType::all())
}

/// Strategy for generating a relationship between two arbitrary entities
pub fn relationship_strategy() -> impl Strategy<Value = Relationship> {
    (relationship_type_strategy(), any::<[u8; 16]>(), any::<[u8; 16]>()).prop_map(
        |(relationship_type, from, to)| {
            Relationship::new(
                relationship_type,
                Uuid::from_bytes(from),
                Uuid::from_bytes(to),
            )
        },
    )
}

/// Strategy for generating a deployment environment
pub fn environment_strategy() -> impl Strategy<Value = DeploymentEnvironment> {
    prop_oneof![
        Just(DeploymentEnvironment::Development),
        Just(DeploymentEnvironment::Staging),
        Just(DeploymentEnvironment::Production),
    ]
}

/// Strategy for retention windows, one hour up to a year
pub fn retention_hours_strategy() -> impl Strategy<Value = i64> {
    1i64..=8760i64
}

/// Strategy for TenantId
pub fn tenant_id_strategy() -> impl Strategy<Value = TenantId> {
    any::<[u8; 16]>().prop_map(|bytes| TenantId::from_uuid(Uuid::from_bytes(bytes)))
}

/// Strategy for SystemEventId
pub fn system_event_id_strategy() -> impl Strategy<Value = SystemEventId> {
    any::<[u8; 16]>().prop_map(|bytes| SystemEventId::from_uuid(Uuid::from_bytes(bytes)))
}

/// Strategy for created timestamps across one year of activity
pub fn created_timestamp_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..365i64, 0i64..86_400i64).prop_map(|(days, seconds)| {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
            + Duration::days(days)
            + Duration::seconds(seconds)
    })
}

/// Generates a realistic display name
pub fn fake_display_name() -> String {
    Name().fake()
}

/// Generates a plausible email address
pub fn fake_email() -> String {
    SafeEmail().fake()
}

/// Generates fully-populated person details
pub fn fake_person_details() -> PersonDetails {
    PersonDetails::new(fake_display_name(), fake_email())
        .with_preferred_name(FirstName().fake::<String>())
        .with_phone_number(PhoneNumber().fake::<String>())
}
