//! System event types and relationships
//!
//! `SystemEventType` is the closed set of externally visible event names.
//! Consumers filter and subscribe by these strings, so the camelCase wire
//! names are stable API. A `Relationship` ties one persisted system event to
//! a business entity, letting consumers query "all events about this quote"
//! without parsing payloads.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// The externally visible type of a system event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SystemEventType {
    // Organisation
    OrganisationCreated,
    OrganisationNameUpdated,
    OrganisationAliasUpdated,
    OrganisationActivated,
    OrganisationDisabled,

    // User
    UserCreated,
    UserActivated,
    UserBlocked,
    UserUnblocked,
    UserRoleAssigned,
    UserLoginEmailUpdated,
    UserLoginAttemptSucceeded,
    UserLoginAttemptFailed,

    // Customer
    CustomerCreated,
    CustomerDetailsUpdated,
    CustomerOwnershipAssigned,

    // Quote
    QuoteCreated,
    QuoteFormDataUpdated,
    QuoteCalculationCompleted,
    QuoteCustomerAssigned,
    QuoteSubmitted,
    QuoteDiscarded,
    QuoteExpired,
    QuotePolicyIssued,

    // Claim
    ClaimCreated,
    ClaimDetailsUpdated,
    ClaimAmountUpdated,
    ClaimStatusUpdated,
    ClaimAssociatedWithPolicy,
    ClaimDisassociatedFromPolicy,
}

impl SystemEventType {
    /// Returns the canonical camelCase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            SystemEventType::OrganisationCreated => "organisationCreated",
            SystemEventType::OrganisationNameUpdated => "organisationNameUpdated",
            SystemEventType::OrganisationAliasUpdated => "organisationAliasUpdated",
            SystemEventType::OrganisationActivated => "organisationActivated",
            SystemEventType::OrganisationDisabled => "organisationDisabled",
            SystemEventType::UserCreated => "userCreated",
            SystemEventType::UserActivated => "userActivated",
            SystemEventType::UserBlocked => "userBlocked",
            SystemEventType::UserUnblocked => "userUnblocked",
            SystemEventType::UserRoleAssigned => "userRoleAssigned",
            SystemEventType::UserLoginEmailUpdated => "userLoginEmailUpdated",
            SystemEventType::UserLoginAttemptSucceeded => "userLoginAttemptSucceeded",
            SystemEventType::UserLoginAttemptFailed => "userLoginAttemptFailed",
            SystemEventType::CustomerCreated => "customerCreated",
            SystemEventType::CustomerDetailsUpdated => "customerDetailsUpdated",
            SystemEventType::CustomerOwnershipAssigned => "customerOwnershipAssigned",
            SystemEventType::QuoteCreated => "quoteCreated",
            SystemEventType::QuoteFormDataUpdated => "quoteFormDataUpdated",
            SystemEventType::QuoteCalculationCompleted => "quoteCalculationCompleted",
            SystemEventType::QuoteCustomerAssigned => "quoteCustomerAssigned",
            SystemEventType::QuoteSubmitted => "quoteSubmitted",
            SystemEventType::QuoteDiscarded => "quoteDiscarded",
            SystemEventType::QuoteExpired => "quoteExpired",
            SystemEventType::QuotePolicyIssued => "quotePolicyIssued",
            SystemEventType::ClaimCreated => "claimCreated",
            SystemEventType::ClaimDetailsUpdated => "claimDetailsUpdated",
            SystemEventType::ClaimAmountUpdated => "claimAmountUpdated",
            SystemEventType::ClaimStatusUpdated => "claimStatusUpdated",
            SystemEventType::ClaimAssociatedWithPolicy => "claimAssociatedWithPolicy",
            SystemEventType::ClaimDisassociatedFromPolicy => "claimDisassociatedFromPolicy",
        }
    }

    /// All known event types, in declaration order
    pub fn all() -> &'static [SystemEventType] {
        &[
            SystemEventType::OrganisationCreated,
            SystemEventType::OrganisationNameUpdated,
            SystemEventType::OrganisationAliasUpdated,
            SystemEventType::OrganisationActivated,
            SystemEventType::OrganisationDisabled,
            SystemEventType::UserCreated,
            SystemEventType::UserActivated,
            SystemEventType::UserBlocked,
            SystemEventType::UserUnblocked,
            SystemEventType::UserRoleAssigned,
            SystemEventType::UserLoginEmailUpdated,
            SystemEventType::UserLoginAttemptSucceeded,
            SystemEventType::UserLoginAttemptFailed,
            SystemEventType::CustomerCreated,
            SystemEventType::CustomerDetailsUpdated,
            SystemEventType::CustomerOwnershipAssigned,
            SystemEventType::QuoteCreated,
            SystemEventType::QuoteFormDataUpdated,
            SystemEventType::QuoteCalculationCompleted,
            SystemEventType::QuoteCustomerAssigned,
            SystemEventType::QuoteSubmitted,
            SystemEventType::QuoteDiscarded,
            SystemEventType::QuoteExpired,
            SystemEventType::QuotePolicyIssued,
            SystemEventType::ClaimCreated,
            SystemEventType::ClaimDetailsUpdated,
            SystemEventType::ClaimAmountUpdated,
            SystemEventType::ClaimStatusUpdated,
            SystemEventType::ClaimAssociatedWithPolicy,
            SystemEventType::ClaimDisassociatedFromPolicy,
        ]
    }
}

impl fmt::Display for SystemEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unknown system event type name
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown system event type: {0}")]
pub struct ParseSystemEventTypeError(pub String);

impl FromStr for SystemEventType {
    type Err = ParseSystemEventTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SystemEventType::all()
            .iter()
            .find(|candidate| candidate.as_str() == s)
            .copied()
            .ok_or_else(|| ParseSystemEventTypeError(s.to_string()))
    }
}

/// The kind of business entity a relationship points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationshipType {
    OrganisationEvent,
    QuoteEvent,
    PolicyEvent,
    ClaimEvent,
    CustomerEvent,
    PersonEvent,
    UserEvent,
}

impl RelationshipType {
    /// Returns the canonical camelCase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipType::OrganisationEvent => "organisationEvent",
            RelationshipType::QuoteEvent => "quoteEvent",
            RelationshipType::PolicyEvent => "policyEvent",
            RelationshipType::ClaimEvent => "claimEvent",
            RelationshipType::CustomerEvent => "customerEvent",
            RelationshipType::PersonEvent => "personEvent",
            RelationshipType::UserEvent => "userEvent",
        }
    }

    pub fn all() -> &'static [RelationshipType] {
        &[
            RelationshipType::OrganisationEvent,
            RelationshipType::QuoteEvent,
            RelationshipType::PolicyEvent,
            RelationshipType::ClaimEvent,
            RelationshipType::CustomerEvent,
            RelationshipType::PersonEvent,
            RelationshipType::UserEvent,
        ]
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unknown relationship type name
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown relationship type: {0}")]
pub struct ParseRelationshipTypeError(pub String);

impl FromStr for RelationshipType {
    type Err = ParseRelationshipTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RelationshipType::all()
            .iter()
            .find(|candidate| candidate.as_str() == s)
            .copied()
            .ok_or_else(|| ParseRelationshipTypeError(s.to_string()))
    }
}

/// A typed edge from a business entity to a system event
///
/// `to_entity_id` is always the system event's own id; `from_entity_id` is
/// the business entity the event is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub relationship_type: RelationshipType,
    pub from_entity_id: Uuid,
    pub to_entity_id: Uuid,
}

impl Relationship {
    pub fn new(relationship_type: RelationshipType, from_entity_id: Uuid, to_entity_id: Uuid) -> Self {
        Self {
            relationship_type,
            from_entity_id,
            to_entity_id,
        }
    }
}
