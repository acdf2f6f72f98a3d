//! Event payloads
//!
//! A system event's payload is a denormalized snapshot of everything a
//! consumer needs to read the event without touching platform data: tenant,
//! organisation, product, customer, the subject entity, and the performing
//! user. Snapshots are built once at emission time and never refreshed, so
//! the event stays readable after the source aggregate evolves.
//!
//! The [`SnapshotPayloadFactory`] resolves aliases and display names through
//! the [`ReferenceData`] port; the read-model variants back the
//! `create_and_emit` flows (logins, scheduled sweeps) that are not driven by
//! a freshly appended aggregate event.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use core_kernel::{
    ClaimId, CustomerId, DeploymentEnvironment, DomainError, EventSourced, Money, OrganisationId,
    PersonId, PolicyId, ProductId, QuoteId, TenantId, UserId,
};
use domain_claim::{Claim, ClaimStatus};
use domain_party::{Customer, Organisation, User};
use domain_quote::{Quote, QuoteStatus, QuoteType};

// ============================================================================
// Snapshots
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantSnapshot {
    pub id: TenantId,
    pub alias: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganisationSnapshot {
    pub id: OrganisationId,
    pub alias: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    pub id: ProductId,
    pub alias: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSnapshot {
    pub id: CustomerId,
    pub person_id: PersonId,
    pub display_name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSnapshot {
    pub id: UserId,
    pub person_id: PersonId,
    pub display_name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSnapshot {
    pub id: QuoteId,
    pub quote_number: String,
    pub quote_type: QuoteType,
    pub status: QuoteStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_id: Option<PolicyId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_payable: Option<Money>,
}

impl From<&Quote> for QuoteSnapshot {
    fn from(quote: &Quote) -> Self {
        Self {
            id: EventSourced::id(quote),
            quote_number: quote.quote_number().to_string(),
            quote_type: quote.quote_type(),
            status: quote.status(),
            policy_id: quote.policy_id(),
            policy_number: quote.policy_number().map(str::to_string),
            total_payable: quote.total_payable(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimSnapshot {
    pub id: ClaimId,
    pub claim_number: String,
    pub status: ClaimStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_id: Option<PolicyId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_amount: Option<Money>,
}

impl From<&Claim> for ClaimSnapshot {
    fn from(claim: &Claim) -> Self {
        Self {
            id: EventSourced::id(claim),
            claim_number: claim.claim_number().to_string(),
            status: claim.status(),
            policy_id: claim.policy_id(),
            policy_number: claim.policy_number().map(str::to_string),
            amount: claim.amount(),
            approved_amount: claim.approved_amount(),
        }
    }
}

// ============================================================================
// Per-category payloads
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteEventPayload {
    pub tenant: TenantSnapshot,
    pub organisation: OrganisationSnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerSnapshot>,
    pub quote: QuoteSnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performing_user: Option<UserSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimEventPayload {
    pub tenant: TenantSnapshot,
    pub organisation: OrganisationSnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerSnapshot>,
    pub claim: ClaimSnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performing_user: Option<UserSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerEventPayload {
    pub tenant: TenantSnapshot,
    pub organisation: OrganisationSnapshot,
    pub customer: CustomerSnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performing_user: Option<UserSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganisationEventPayload {
    pub tenant: TenantSnapshot,
    pub organisation: OrganisationSnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performing_user: Option<UserSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEventPayload {
    pub tenant: TenantSnapshot,
    pub organisation: OrganisationSnapshot,
    pub user: UserSnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performing_user: Option<UserSnapshot>,
}

// ============================================================================
// Read-model views for create_and_emit flows
// ============================================================================

/// A login attempt as seen by the authentication layer
///
/// Logins arrive keyed by the organisation alias in the portal URL, not by
/// id, which is why payload building can fail with
/// `organisation.with.alias.not.found`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLoginView {
    pub tenant_id: TenantId,
    pub organisation_alias: String,
    pub environment: DeploymentEnvironment,
    pub user_id: UserId,
    pub person_id: PersonId,
    pub display_name: String,
    pub email: String,
}

/// A quote row as seen by scheduled sweeps (expiry, reminders)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSummaryView {
    pub tenant_id: TenantId,
    pub organisation_id: OrganisationId,
    pub product_id: ProductId,
    pub environment: DeploymentEnvironment,
    pub quote: QuoteSnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<CustomerId>,
}

/// A payload built from a read model, paired with the resolved organisation
/// id the emitter needs for the relationship set
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPayload {
    pub organisation_id: OrganisationId,
    pub payload: serde_json::Value,
}

// ============================================================================
// Ports and factory
// ============================================================================

/// Read-side lookups the payload factory needs
///
/// `Ok(None)` means the entity does not exist; `Err` means the lookup itself
/// failed.
#[async_trait]
pub trait ReferenceData: Send + Sync {
    async fn tenant(&self, id: TenantId) -> anyhow::Result<Option<TenantSnapshot>>;

    async fn organisation(
        &self,
        tenant_id: TenantId,
        id: OrganisationId,
    ) -> anyhow::Result<Option<OrganisationSnapshot>>;

    async fn organisation_by_alias(
        &self,
        tenant_id: TenantId,
        alias: &str,
    ) -> anyhow::Result<Option<OrganisationSnapshot>>;

    async fn product(
        &self,
        tenant_id: TenantId,
        id: ProductId,
    ) -> anyhow::Result<Option<ProductSnapshot>>;

    async fn customer(
        &self,
        tenant_id: TenantId,
        id: CustomerId,
    ) -> anyhow::Result<Option<CustomerSnapshot>>;

    async fn user(&self, tenant_id: TenantId, id: UserId)
        -> anyhow::Result<Option<UserSnapshot>>;
}

/// Error raised while building a payload
#[derive(Debug, Error)]
pub enum PayloadError {
    /// A referenced entity could not be found
    #[error(transparent)]
    NotFound(#[from] DomainError),

    /// The reference data source failed
    #[error("reference data lookup failed: {0}")]
    Lookup(String),

    /// The payload could not be serialized
    #[error("payload serialization failed: {0}")]
    Serialization(String),
}

/// Builds the serialized payload for each event category
#[async_trait]
pub trait EventPayloadFactory: Send + Sync {
    async fn create_quote_payload(
        &self,
        quote: &Quote,
        performing_user_id: Option<UserId>,
    ) -> Result<QuoteEventPayload, PayloadError>;

    async fn create_claim_payload(
        &self,
        claim: &Claim,
        performing_user_id: Option<UserId>,
    ) -> Result<ClaimEventPayload, PayloadError>;

    async fn create_customer_payload(
        &self,
        customer: &Customer,
        performing_user_id: Option<UserId>,
    ) -> Result<CustomerEventPayload, PayloadError>;

    async fn create_organisation_payload(
        &self,
        organisation: &Organisation,
        performing_user_id: Option<UserId>,
    ) -> Result<OrganisationEventPayload, PayloadError>;

    async fn create_user_payload(
        &self,
        user: &User,
        performing_user_id: Option<UserId>,
    ) -> Result<UserEventPayload, PayloadError>;

    /// Builds a login payload from the authentication read model
    async fn create_login_payload(
        &self,
        login: &UserLoginView,
    ) -> Result<ResolvedPayload, PayloadError>;

    /// Builds a quote payload from a scheduled-sweep read model
    async fn create_quote_summary_payload(
        &self,
        summary: &QuoteSummaryView,
        performing_user_id: Option<UserId>,
    ) -> Result<ResolvedPayload, PayloadError>;
}

/// Default payload factory resolving snapshots through [`ReferenceData`]
pub struct SnapshotPayloadFactory {
    reference_data: Arc<dyn ReferenceData>,
}

impl SnapshotPayloadFactory {
    pub fn new(reference_data: Arc<dyn ReferenceData>) -> Self {
        Self { reference_data }
    }

    async fn tenant(&self, id: TenantId) -> Result<TenantSnapshot, PayloadError> {
        self.reference_data
            .tenant(id)
            .await
            .map_err(|error| PayloadError::Lookup(error.to_string()))?
            .ok_or_else(|| DomainError::tenant_not_found(id).into())
    }

    async fn organisation(
        &self,
        tenant_id: TenantId,
        id: OrganisationId,
    ) -> Result<OrganisationSnapshot, PayloadError> {
        self.reference_data
            .organisation(tenant_id, id)
            .await
            .map_err(|error| PayloadError::Lookup(error.to_string()))?
            .ok_or_else(|| DomainError::organisation_not_found(id).into())
    }

    async fn organisation_by_alias(
        &self,
        tenant_id: TenantId,
        alias: &str,
    ) -> Result<OrganisationSnapshot, PayloadError> {
        self.reference_data
            .organisation_by_alias(tenant_id, alias)
            .await
            .map_err(|error| PayloadError::Lookup(error.to_string()))?
            .ok_or_else(|| DomainError::organisation_alias_not_found(alias).into())
    }

    async fn product(
        &self,
        tenant_id: TenantId,
        id: ProductId,
    ) -> Result<ProductSnapshot, PayloadError> {
        self.reference_data
            .product(tenant_id, id)
            .await
            .map_err(|error| PayloadError::Lookup(error.to_string()))?
            .ok_or_else(|| DomainError::product_not_found(id).into())
    }

    async fn customer(
        &self,
        tenant_id: TenantId,
        id: CustomerId,
    ) -> Result<CustomerSnapshot, PayloadError> {
        self.reference_data
            .customer(tenant_id, id)
            .await
            .map_err(|error| PayloadError::Lookup(error.to_string()))?
            .ok_or_else(|| DomainError::customer_not_found(id).into())
    }

    async fn performing_user(
        &self,
        tenant_id: TenantId,
        id: Option<UserId>,
    ) -> Result<Option<UserSnapshot>, PayloadError> {
        let Some(id) = id else {
            return Ok(None);
        };
        self.reference_data
            .user(tenant_id, id)
            .await
            .map_err(|error| PayloadError::Lookup(error.to_string()))?
            .ok_or_else(|| PayloadError::NotFound(DomainError::user_not_found(id)))
            .map(Some)
    }

    async fn optional_customer(
        &self,
        tenant_id: TenantId,
        id: Option<CustomerId>,
    ) -> Result<Option<CustomerSnapshot>, PayloadError> {
        match id {
            Some(id) => self.customer(tenant_id, id).await.map(Some),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl EventPayloadFactory for SnapshotPayloadFactory {
    async fn create_quote_payload(
        &self,
        quote: &Quote,
        performing_user_id: Option<UserId>,
    ) -> Result<QuoteEventPayload, PayloadError> {
        let tenant_id = EventSourced::tenant_id(quote);
        Ok(QuoteEventPayload {
            tenant: self.tenant(tenant_id).await?,
            organisation: self.organisation(tenant_id, quote.organisation_id()).await?,
            product: Some(self.product(tenant_id, quote.product_id()).await?),
            customer: self.optional_customer(tenant_id, quote.customer_id()).await?,
            quote: QuoteSnapshot::from(quote),
            performing_user: self.performing_user(tenant_id, performing_user_id).await?,
        })
    }

    async fn create_claim_payload(
        &self,
        claim: &Claim,
        performing_user_id: Option<UserId>,
    ) -> Result<ClaimEventPayload, PayloadError> {
        let tenant_id = EventSourced::tenant_id(claim);
        Ok(ClaimEventPayload {
            tenant: self.tenant(tenant_id).await?,
            organisation: self.organisation(tenant_id, claim.organisation_id()).await?,
            product: Some(self.product(tenant_id, claim.product_id()).await?),
            customer: self.optional_customer(tenant_id, claim.customer_id()).await?,
            claim: ClaimSnapshot::from(claim),
            performing_user: self.performing_user(tenant_id, performing_user_id).await?,
        })
    }

    async fn create_customer_payload(
        &self,
        customer: &Customer,
        performing_user_id: Option<UserId>,
    ) -> Result<CustomerEventPayload, PayloadError> {
        let tenant_id = EventSourced::tenant_id(customer);
        Ok(CustomerEventPayload {
            tenant: self.tenant(tenant_id).await?,
            organisation: self
                .organisation(tenant_id, customer.organisation_id())
                .await?,
            customer: CustomerSnapshot {
                id: EventSourced::id(customer),
                person_id: customer.person_id(),
                display_name: customer.display_name().to_string(),
                email: customer.details().email.clone(),
            },
            performing_user: self.performing_user(tenant_id, performing_user_id).await?,
        })
    }

    async fn create_organisation_payload(
        &self,
        organisation: &Organisation,
        performing_user_id: Option<UserId>,
    ) -> Result<OrganisationEventPayload, PayloadError> {
        let tenant_id = EventSourced::tenant_id(organisation);
        Ok(OrganisationEventPayload {
            tenant: self.tenant(tenant_id).await?,
            // Snapshot the aggregate itself; the record being emitted about
            // may not have reached the read side yet
            organisation: OrganisationSnapshot {
                id: EventSourced::id(organisation),
                alias: organisation.alias().to_string(),
                name: organisation.name().to_string(),
            },
            performing_user: self.performing_user(tenant_id, performing_user_id).await?,
        })
    }

    async fn create_user_payload(
        &self,
        user: &User,
        performing_user_id: Option<UserId>,
    ) -> Result<UserEventPayload, PayloadError> {
        let tenant_id = EventSourced::tenant_id(user);
        Ok(UserEventPayload {
            tenant: self.tenant(tenant_id).await?,
            organisation: self.organisation(tenant_id, user.organisation_id()).await?,
            user: UserSnapshot {
                id: EventSourced::id(user),
                person_id: user.person_id(),
                display_name: user.display_name().to_string(),
                email: user.login_email().to_string(),
            },
            performing_user: self.performing_user(tenant_id, performing_user_id).await?,
        })
    }

    async fn create_login_payload(
        &self,
        login: &UserLoginView,
    ) -> Result<ResolvedPayload, PayloadError> {
        let tenant = self.tenant(login.tenant_id).await?;
        let organisation = self
            .organisation_by_alias(login.tenant_id, &login.organisation_alias)
            .await?;
        let organisation_id = organisation.id;
        // The subject of a login event performed it themselves
        let subject = UserSnapshot {
            id: login.user_id,
            person_id: login.person_id,
            display_name: login.display_name.clone(),
            email: login.email.clone(),
        };
        let payload = UserEventPayload {
            tenant,
            organisation,
            user: subject.clone(),
            performing_user: Some(subject),
        };
        serialize(&payload).map(|value| ResolvedPayload {
            organisation_id,
            payload: value,
        })
    }

    async fn create_quote_summary_payload(
        &self,
        summary: &QuoteSummaryView,
        performing_user_id: Option<UserId>,
    ) -> Result<ResolvedPayload, PayloadError> {
        let payload = QuoteEventPayload {
            tenant: self.tenant(summary.tenant_id).await?,
            organisation: self
                .organisation(summary.tenant_id, summary.organisation_id)
                .await?,
            product: Some(self.product(summary.tenant_id, summary.product_id).await?),
            customer: self
                .optional_customer(summary.tenant_id, summary.customer_id)
                .await?,
            quote: summary.quote.clone(),
            performing_user: self
                .performing_user(summary.tenant_id, performing_user_id)
                .await?,
        };
        serialize(&payload).map(|value| ResolvedPayload {
            organisation_id: payload.organisation.id,
            payload: value,
        })
    }
}

fn serialize<T: Serialize>(payload: &T) -> Result<serde_json::Value, PayloadError> {
    serde_json::to_value(payload).map_err(|error| PayloadError::Serialization(error.to_string()))
}
