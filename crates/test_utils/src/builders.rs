//! Test Data Builders
//!
//! Builder patterns for constructing system events and the read models that
//! feed them. Tests name only the fields under test; everything else falls
//! back to the shared fixtures.

use chrono::{DateTime, Utc};
use core_kernel::{
    CustomerId, DeploymentEnvironment, OrganisationId, PersonId, ProductId, QuoteId,
    SystemEventId, TenantId, UserId,
};
use serde_json::Value;
use uuid::Uuid;

use domain_quote::{QuoteStatus, QuoteType};
use system_events::{
    CreateSystemEventCommand, QuoteSnapshot, QuoteSummaryView, Relationship, RelationshipType,
    SystemEvent, SystemEventType, UserLoginView,
};

use crate::fixtures::{test_environment, IdFixtures, InstantFixtures, StringFixtures};

/// Builder for a fully-formed [`SystemEvent`]
pub struct SystemEventBuilder {
    id: SystemEventId,
    tenant_id: TenantId,
    product_id: Option<ProductId>,
    environment: DeploymentEnvironment,
    event_type: SystemEventType,
    created_timestamp: DateTime<Utc>,
    expiry_timestamp: Option<DateTime<Utc>>,
    payload: Option<Value>,
    relationships: Vec<Relationship>,
    tags: Vec<String>,
}

impl Default for SystemEventBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemEventBuilder {
    /// Creates a builder for a never-expiring quote-created event
    pub fn new() -> Self {
        Self {
            id: SystemEventId::new(),
            tenant_id: IdFixtures::tenant(),
            product_id: Some(IdFixtures::product()),
            environment: test_environment(),
            event_type: SystemEventType::QuoteCreated,
            created_timestamp: InstantFixtures::now(),
            expiry_timestamp: None,
            payload: None,
            relationships: Vec::new(),
            tags: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: SystemEventId) -> Self {
        self.id = id;
        self
    }

    pub fn with_tenant_id(mut self, tenant_id: TenantId) -> Self {
        self.tenant_id = tenant_id;
        self
    }

    pub fn with_product_id(mut self, product_id: Option<ProductId>) -> Self {
        self.product_id = product_id;
        self
    }

    pub fn with_environment(mut self, environment: DeploymentEnvironment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_event_type(mut self, event_type: SystemEventType) -> Self {
        self.event_type = event_type;
        self
    }

    pub fn created_at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.created_timestamp = timestamp;
        self
    }

    pub fn expiring_at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.expiry_timestamp = Some(timestamp);
        self
    }

    pub fn never_expiring(mut self) -> Self {
        self.expiry_timestamp = None;
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Appends one relationship pointing at this event
    pub fn relating(mut self, relationship_type: RelationshipType, from_entity_id: Uuid) -> Self {
        self.relationships.push(Relationship::new(
            relationship_type,
            from_entity_id,
            self.id.into_uuid(),
        ));
        self
    }

    pub fn tagged(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn build(self) -> SystemEvent {
        SystemEvent {
            id: self.id,
            tenant_id: self.tenant_id,
            product_id: self.product_id,
            environment: self.environment,
            event_type: self.event_type,
            created_timestamp: self.created_timestamp,
            expiry_timestamp: self.expiry_timestamp,
            payload: self.payload,
            relationships: self.relationships,
            tags: self.tags,
        }
    }
}

/// Builder for a [`CreateSystemEventCommand`] as an emitter would produce it
pub struct CreateSystemEventCommandBuilder {
    event_id: SystemEventId,
    tenant_id: TenantId,
    product_id: Option<ProductId>,
    environment: DeploymentEnvironment,
    event_type: SystemEventType,
    persist_hours: Option<i64>,
    payload: Option<Value>,
    relationships: Vec<Relationship>,
    tags: Vec<String>,
}

impl Default for CreateSystemEventCommandBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CreateSystemEventCommandBuilder {
    pub fn new() -> Self {
        Self {
            event_id: SystemEventId::new(),
            tenant_id: IdFixtures::tenant(),
            product_id: Some(IdFixtures::product()),
            environment: test_environment(),
            event_type: SystemEventType::QuoteCreated,
            persist_hours: None,
            payload: None,
            relationships: Vec::new(),
            tags: Vec::new(),
        }
    }

    pub fn with_event_id(mut self, event_id: SystemEventId) -> Self {
        self.event_id = event_id;
        self
    }

    pub fn with_tenant_id(mut self, tenant_id: TenantId) -> Self {
        self.tenant_id = tenant_id;
        self
    }

    pub fn with_product_id(mut self, product_id: Option<ProductId>) -> Self {
        self.product_id = product_id;
        self
    }

    pub fn with_environment(mut self, environment: DeploymentEnvironment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_event_type(mut self, event_type: SystemEventType) -> Self {
        self.event_type = event_type;
        self
    }

    pub fn persisted_for_hours(mut self, hours: i64) -> Self {
        self.persist_hours = Some(hours);
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn relating(mut self, relationship_type: RelationshipType, from_entity_id: Uuid) -> Self {
        self.relationships.push(Relationship::new(
            relationship_type,
            from_entity_id,
            self.event_id.into_uuid(),
        ));
        self
    }

    pub fn tagged(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn build(self) -> CreateSystemEventCommand {
        CreateSystemEventCommand {
            event_id: self.event_id,
            tenant_id: self.tenant_id,
            product_id: self.product_id,
            environment: self.environment,
            event_type: self.event_type,
            persist_hours: self.persist_hours,
            payload: self.payload,
            relationships: self.relationships,
            tags: self.tags,
        }
    }
}

/// Builder for the login read model fed into the user emitter
pub struct UserLoginViewBuilder {
    tenant_id: TenantId,
    organisation_alias: String,
    environment: DeploymentEnvironment,
    user_id: UserId,
    person_id: PersonId,
    display_name: String,
    email: String,
}

impl Default for UserLoginViewBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl UserLoginViewBuilder {
    pub fn new() -> Self {
        Self {
            tenant_id: IdFixtures::tenant(),
            organisation_alias: StringFixtures::organisation_alias(),
            environment: test_environment(),
            user_id: IdFixtures::user(),
            person_id: IdFixtures::person(),
            display_name: StringFixtures::display_name(),
            email: StringFixtures::email(),
        }
    }

    pub fn with_tenant_id(mut self, tenant_id: TenantId) -> Self {
        self.tenant_id = tenant_id;
        self
    }

    pub fn with_organisation_alias(mut self, alias: impl Into<String>) -> Self {
        self.organisation_alias = alias.into();
        self
    }

    pub fn with_environment(mut self, environment: DeploymentEnvironment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_user_id(mut self, user_id: UserId) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn with_person_id(mut self, person_id: PersonId) -> Self {
        self.person_id = person_id;
        self
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn build(self) -> UserLoginView {
        UserLoginView {
            tenant_id: self.tenant_id,
            organisation_alias: self.organisation_alias,
            environment: self.environment,
            user_id: self.user_id,
            person_id: self.person_id,
            display_name: self.display_name,
            email: self.email,
        }
    }
}

/// Builder for the quote summary read model used by scheduled sweeps
pub struct QuoteSummaryViewBuilder {
    tenant_id: TenantId,
    organisation_id: OrganisationId,
    product_id: ProductId,
    environment: DeploymentEnvironment,
    quote: QuoteSnapshot,
    customer_id: Option<CustomerId>,
}

impl Default for QuoteSummaryViewBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl QuoteSummaryViewBuilder {
    /// Creates a builder around an incomplete new-business quote
    pub fn new() -> Self {
        Self {
            tenant_id: IdFixtures::tenant(),
            organisation_id: IdFixtures::organisation(),
            product_id: IdFixtures::product(),
            environment: test_environment(),
            quote: QuoteSnapshot {
                id: IdFixtures::quote(),
                quote_number: StringFixtures::quote_number(),
                quote_type: QuoteType::NewBusiness,
                status: QuoteStatus::Incomplete,
                policy_id: None,
                policy_number: None,
                total_payable: None,
            },
            customer_id: None,
        }
    }

    pub fn with_tenant_id(mut self, tenant_id: TenantId) -> Self {
        self.tenant_id = tenant_id;
        self
    }

    pub fn with_organisation_id(mut self, organisation_id: OrganisationId) -> Self {
        self.organisation_id = organisation_id;
        self
    }

    pub fn with_product_id(mut self, product_id: ProductId) -> Self {
        self.product_id = product_id;
        self
    }

    pub fn with_environment(mut self, environment: DeploymentEnvironment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_quote_id(mut self, quote_id: QuoteId) -> Self {
        self.quote.id = quote_id;
        self
    }

    pub fn with_quote_number(mut self, quote_number: impl Into<String>) -> Self {
        self.quote.quote_number = quote_number.into();
        self
    }

    pub fn with_quote_status(mut self, status: QuoteStatus) -> Self {
        self.quote.status = status;
        self
    }

    pub fn with_quote_type(mut self, quote_type: QuoteType) -> Self {
        self.quote.quote_type = quote_type;
        self
    }

    pub fn with_customer_id(mut self, customer_id: CustomerId) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    pub fn build(self) -> QuoteSummaryView {
        QuoteSummaryView {
            tenant_id: self.tenant_id,
            organisation_id: self.organisation_id,
            product_id: self.product_id,
            environment: self.environment,
            quote: self.quote,
            customer_id: self.customer_id,
        }
    }
}
