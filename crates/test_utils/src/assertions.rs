//! Custom Test Assertions
//!
//! Assertion helpers for system events that report the relationship set,
//! expiry window, or tag list they actually saw, so a failing emitter test
//! reads like a diff rather than a bare boolean.

use chrono::Duration;
use uuid::Uuid;

use system_events::{RelationshipType, SystemEvent};

/// Asserts the event carries a relationship of the given type from an entity
///
/// # Panics
///
/// Panics if no relationship matches, listing the relationships present.
pub fn assert_has_relationship(
    event: &SystemEvent,
    relationship_type: RelationshipType,
    from_entity_id: Uuid,
) {
    let found = event.relationships.iter().any(|relationship| {
        relationship.relationship_type == relationship_type
            && relationship.from_entity_id == from_entity_id
    });
    assert!(
        found,
        "Expected {} relationship from {} on event {}, found: {:?}",
        relationship_type, from_entity_id, event.id, event.relationships
    );
}

/// Asserts every relationship points at the event itself
pub fn assert_relationships_point_at_event(event: &SystemEvent) {
    for relationship in &event.relationships {
        assert_eq!(
            relationship.to_entity_id,
            event.id.into_uuid(),
            "Relationship {:?} does not point at event {}",
            relationship,
            event.id
        );
    }
}

/// Asserts the event has no expiry timestamp
pub fn assert_never_expires(event: &SystemEvent) {
    assert!(
        event.never_expires(),
        "Expected event {} to never expire, but it expires at {:?}",
        event.id,
        event.expiry_timestamp
    );
}

/// Asserts the event expires exactly `hours` after its creation
pub fn assert_expires_after_hours(event: &SystemEvent, hours: i64) {
    let Some(expiry) = event.expiry_timestamp else {
        panic!(
            "Expected event {} to expire {} hours after creation, but it never expires",
            event.id, hours
        );
    };
    let actual = expiry - event.created_timestamp;
    assert_eq!(
        actual,
        Duration::hours(hours),
        "Expected event {} to expire after {} hours, got {} minutes",
        event.id,
        hours,
        actual.num_minutes()
    );
}

/// Asserts the event carries the given tag
pub fn assert_tagged_with(event: &SystemEvent, tag: &str) {
    assert!(
        event.tags.iter().any(|candidate| candidate == tag),
        "Expected event {} to be tagged with '{}', found tags: {:?}",
        event.id,
        tag,
        event.tags
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::SystemEventBuilder;
    use crate::fixtures::{IdFixtures, InstantFixtures};

    #[test]
    fn test_relationship_assertions_accept_a_matching_event() {
        let quote_uuid = IdFixtures::quote().into_uuid();
        let event = SystemEventBuilder::new()
            .relating(RelationshipType::QuoteEvent, quote_uuid)
            .relating(
                RelationshipType::OrganisationEvent,
                IdFixtures::organisation().into_uuid(),
            )
            .tagged("development")
            .build();

        assert_has_relationship(&event, RelationshipType::QuoteEvent, quote_uuid);
        assert_relationships_point_at_event(&event);
        assert_tagged_with(&event, "development");
    }

    #[test]
    #[should_panic(expected = "Expected quoteEvent relationship")]
    fn test_missing_relationship_panics_with_the_type_name() {
        let event = SystemEventBuilder::new().build();
        assert_has_relationship(
            &event,
            RelationshipType::QuoteEvent,
            IdFixtures::quote().into_uuid(),
        );
    }

    #[test]
    fn test_expiry_assertions_measure_from_creation() {
        let event = SystemEventBuilder::new()
            .created_at(InstantFixtures::now())
            .expiring_at(InstantFixtures::now() + Duration::hours(48))
            .build();
        assert_expires_after_hours(&event, 48);

        let permanent = SystemEventBuilder::new().build();
        assert_never_expires(&permanent);
    }
}
